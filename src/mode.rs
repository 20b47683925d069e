/// SPI mode and bit order handling for the passive sampler.
///
/// The monitor never drives the bus, so of CPOL/CPHA only the edge on which
/// data is valid matters. That edge is folded into `capture_on_rising_edge`.

use crate::error::MonitorError;
use serde::{Deserialize, Deserializer, Serialize};

/// Logic level of a sampled line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<rppal::gpio::Level> for Level {
    fn from(level: rppal::gpio::Level) -> Self {
        match level {
            rppal::gpio::Level::High => Level::High,
            rppal::gpio::Level::Low => Level::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpiMode {
    #[default]
    Mode0,
    Mode1,
    Mode2,
    Mode3,
}

impl SpiMode {
    pub fn from_number(mode: u8) -> Result<Self, MonitorError> {
        match mode {
            0 => Ok(SpiMode::Mode0),
            1 => Ok(SpiMode::Mode1),
            2 => Ok(SpiMode::Mode2),
            3 => Ok(SpiMode::Mode3),
            other => Err(MonitorError::Config(format!(
                "SPI mode must be 0..=3, got {}",
                other
            ))),
        }
    }

    pub fn number(self) -> u8 {
        match self {
            SpiMode::Mode0 => 0,
            SpiMode::Mode1 => 1,
            SpiMode::Mode2 => 2,
            SpiMode::Mode3 => 3,
        }
    }

    /// CPOL = 1
    pub fn clock_idle_high(self) -> bool {
        matches!(self, SpiMode::Mode2 | SpiMode::Mode3)
    }

    /// Modes 0 and 3 latch data on the rising edge, modes 1 and 2 on the falling edge.
    pub fn capture_on_rising_edge(self) -> bool {
        matches!(self, SpiMode::Mode0 | SpiMode::Mode3)
    }
}

// Accept both `mode: 2` and `mode: mode2` in the config file.
impl<'de> Deserialize<'de> for SpiMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u8),
            Name(String),
        }

        let number = match Raw::deserialize(deserializer)? {
            Raw::Number(n) => n,
            Raw::Name(name) => match name.to_ascii_lowercase().as_str() {
                "mode0" => 0,
                "mode1" => 1,
                "mode2" => 2,
                "mode3" => 3,
                _ => {
                    return Err(serde::de::Error::custom(format!(
                        "unknown SPI mode: {}",
                        name
                    )))
                }
            },
        };
        SpiMode::from_number(number).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitOrder {
    #[default]
    MsbFirst,
    LsbFirst,
}

/// Immutable sampling configuration derived from mode and bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiModeConfig {
    pub capture_on_rising_edge: bool,
    pub bit_order: BitOrder,
}

impl SpiModeConfig {
    pub fn new(mode: SpiMode, bit_order: BitOrder) -> Self {
        SpiModeConfig {
            capture_on_rising_edge: mode.capture_on_rising_edge(),
            bit_order,
        }
    }

    /// `clock` is the level read after the transition: high means the edge was rising.
    pub fn is_capture_edge(&self, clock: Level) -> bool {
        clock.is_high() == self.capture_on_rising_edge
    }
}

impl Default for SpiModeConfig {
    fn default() -> Self {
        Self::new(SpiMode::default(), BitOrder::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_edge_table() {
        let rising = |m| SpiModeConfig::new(m, BitOrder::MsbFirst).is_capture_edge(Level::High);
        let falling = |m| SpiModeConfig::new(m, BitOrder::MsbFirst).is_capture_edge(Level::Low);

        assert!(rising(SpiMode::Mode0) && !falling(SpiMode::Mode0));
        assert!(!rising(SpiMode::Mode1) && falling(SpiMode::Mode1));
        assert!(!rising(SpiMode::Mode2) && falling(SpiMode::Mode2));
        assert!(rising(SpiMode::Mode3) && !falling(SpiMode::Mode3));
    }

    #[test]
    fn test_mode_numbers() {
        for n in 0..=3u8 {
            assert_eq!(SpiMode::from_number(n).unwrap().number(), n);
        }
        assert!(SpiMode::from_number(4).is_err());
        assert!(SpiMode::Mode2.clock_idle_high());
        assert!(!SpiMode::Mode1.clock_idle_high());
    }

    #[test]
    fn test_mode_deserialize() {
        let numeric: SpiMode = serde_yaml::from_str("3").unwrap();
        assert_eq!(numeric, SpiMode::Mode3);
        let named: SpiMode = serde_yaml::from_str("mode1").unwrap();
        assert_eq!(named, SpiMode::Mode1);
        assert!(serde_yaml::from_str::<SpiMode>("7").is_err());
        assert!(serde_yaml::from_str::<SpiMode>("fast").is_err());

        let order: BitOrder = serde_yaml::from_str("lsb_first").unwrap();
        assert_eq!(order, BitOrder::LsbFirst);
    }
}
