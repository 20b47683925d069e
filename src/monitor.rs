/// Passive SPI transaction monitor
///
/// Ties the bit sampler, the transaction buffer and the completion flag
/// together. `on_clock_edge` and `on_select_edge` are called from GPIO
/// interrupt callbacks; `try_take_completed` is called from the polling loop.
///
/// All state that is updated as a group lives behind one short critical
/// section. The completion flag is an atomic so the poller can check it
/// without taking the lock.

use crate::mode::{BitOrder, Level, SpiMode, SpiModeConfig};
use crate::sampler::SampleState;
use crate::transaction::{BytePair, Transaction, DEFAULT_CAPACITY};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorSettings {
    pub mode: SpiMode,
    pub bit_order: BitOrder,
    pub capacity: usize,
    /// Discard a partial byte when chip-select asserts.
    pub resync_on_select: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        MonitorSettings {
            mode: SpiMode::Mode0,
            bit_order: BitOrder::MsbFirst,
            capacity: DEFAULT_CAPACITY,
            resync_on_select: false,
        }
    }
}

/// Snapshot of a finished transaction handed to the consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedTransaction {
    pub pairs: Vec<BytePair>,
    /// Pairs lost because the buffer was full.
    pub overflowed: usize,
    pub clock_hz: Option<f64>,
}

impl CompletedTransaction {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Mean interval between capture edges, one per clock period.
#[derive(Debug, Default)]
struct ClockEstimator {
    last_capture: Option<Duration>,
    period_sum: Duration,
    periods: u32,
}

impl ClockEstimator {
    fn record(&mut self, timestamp: Duration) {
        if let Some(last) = self.last_capture {
            if let Some(period) = timestamp.checked_sub(last) {
                self.period_sum += period;
                self.periods = self.periods.saturating_add(1);
            }
        }
        self.last_capture = Some(timestamp);
    }

    fn estimate_hz(&self) -> Option<f64> {
        if self.periods == 0 || self.period_sum.is_zero() {
            return None;
        }
        Some(self.periods as f64 / self.period_sum.as_secs_f64())
    }

    fn reset(&mut self) {
        *self = ClockEstimator::default();
    }
}

struct Shared {
    mode: SpiModeConfig,
    // chip-select asserted; clock edges outside the window are ignored
    selected: bool,
    sample: SampleState,
    transaction: Transaction,
    clock: ClockEstimator,
    // frozen at deassert so idle clocking afterwards does not skew it
    completed_clock_hz: Option<f64>,
}

pub struct Monitor {
    shared: Mutex<Shared>,
    complete: AtomicBool,
    resync_on_select: bool,
}

impl Monitor {
    pub fn new(settings: MonitorSettings) -> Self {
        Monitor {
            shared: Mutex::new(Shared {
                mode: SpiModeConfig::new(settings.mode, settings.bit_order),
                selected: false,
                sample: SampleState::new(),
                transaction: Transaction::with_capacity(settings.capacity),
                clock: ClockEstimator::default(),
                completed_clock_hz: None,
            }),
            complete: AtomicBool::new(false),
            resync_on_select: settings.resync_on_select,
        }
    }

    /// Clock line transition. `clock` is the clock level after the edge,
    /// `mosi`/`miso` are the data lines read at the same moment. Edges while
    /// chip-select is inactive belong to another device and are ignored.
    pub fn on_clock_edge(&self, clock: Level, mosi: Level, miso: Level, timestamp: Duration) {
        let mut shared = self.shared.lock();
        if !shared.selected || !shared.mode.is_capture_edge(clock) {
            return;
        }

        shared.clock.record(timestamp);
        let order = shared.mode.bit_order;
        if let Some(pair) = shared.sample.shift_in(order, mosi, miso) {
            shared.transaction.push(pair);
        }
    }

    /// Chip-select transition. Select is active low.
    pub fn on_select_edge(&self, select: Level) {
        let mut shared = self.shared.lock();
        match select {
            Level::Low => {
                // An undrained transaction is overwritten here.
                self.complete.store(false, Ordering::Release);
                shared.selected = true;
                shared.transaction.clear();
                shared.clock.reset();
                shared.completed_clock_hz = None;
                if self.resync_on_select {
                    shared.sample.reset();
                }
            }
            Level::High => {
                shared.selected = false;
                shared.completed_clock_hz = shared.clock.estimate_hz();
                self.complete.store(true, Ordering::Release);
            }
        }
    }

    /// Take the finished transaction, if any, clearing the completion flag.
    /// The live buffer stays readable until the next select assertion.
    pub fn try_take_completed(&self) -> Option<CompletedTransaction> {
        if !self.complete.load(Ordering::Acquire) {
            return None;
        }

        let shared = self.shared.lock();
        if !self.complete.swap(false, Ordering::AcqRel) {
            return None;
        }
        Some(CompletedTransaction {
            pairs: shared.transaction.pairs().to_vec(),
            overflowed: shared.transaction.overflowed(),
            clock_hz: shared.completed_clock_hz,
        })
    }

    /// Switch mode and bit order. Any partial byte is discarded.
    pub fn reconfigure(&self, mode: SpiMode, bit_order: BitOrder) {
        let mut shared = self.shared.lock();
        shared.mode = SpiModeConfig::new(mode, bit_order);
        shared.sample.reset();
    }

    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }

    pub fn transaction_len(&self) -> usize {
        self.shared.lock().transaction.len()
    }

    pub fn capacity(&self) -> usize {
        self.shared.lock().transaction.capacity()
    }

    pub fn mode_config(&self) -> SpiModeConfig {
        self.shared.lock().mode
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new(MonitorSettings::default())
    }
}
