/// Bit accumulator for the MOSI/MISO lines.
///
/// Only the clock handler touches this state. It is reset every time a
/// full byte has been shifted in.

use crate::mode::{BitOrder, Level};
use crate::transaction::BytePair;

pub const BITS_PER_BYTE: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleState {
    mosi: u8,
    miso: u8,
    bit_count: u8,
}

impl SampleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shift one bit from each data line into its accumulator.
    ///
    /// MSB-first shifts left and inserts at bit 0; LSB-first shifts right and
    /// inserts at bit 7. Returns the completed pair on the eighth bit.
    pub fn shift_in(&mut self, order: BitOrder, mosi: Level, miso: Level) -> Option<BytePair> {
        match order {
            BitOrder::MsbFirst => {
                self.mosi = (self.mosi << 1) | mosi.is_high() as u8;
                self.miso = (self.miso << 1) | miso.is_high() as u8;
            }
            BitOrder::LsbFirst => {
                self.mosi = (self.mosi >> 1) | ((mosi.is_high() as u8) << 7);
                self.miso = (self.miso >> 1) | ((miso.is_high() as u8) << 7);
            }
        }

        self.bit_count += 1;
        if self.bit_count < BITS_PER_BYTE {
            return None;
        }

        let pair = BytePair::new(self.mosi, self.miso);
        self.reset();
        Some(pair)
    }

    /// Drop any partially assembled byte.
    pub fn reset(&mut self) {
        self.mosi = 0;
        self.miso = 0;
        self.bit_count = 0;
    }

    pub fn bit_count(&self) -> u8 {
        self.bit_count
    }
}
