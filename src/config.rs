use crate::error::{MonitorError, Result};
use crate::format::OutputFormat;
use crate::mode::{BitOrder, SpiMode};
use crate::monitor::MonitorSettings;
use crate::transaction::DEFAULT_CAPACITY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/spi-monitor/config.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pins: PinConfig,
    pub spi: SpiConfig,
    pub capture: CaptureConfig,
    pub output: OutputConfig,
    pub polling: PollingConfig,
    pub logging: LoggingConfig,
}

/// BCM GPIO numbers of the sniffed lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    pub sclk: u8,
    pub mosi: u8,
    pub miso: u8,
    pub cs: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiConfig {
    pub mode: SpiMode,
    pub bit_order: BitOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Byte pairs kept per transaction; the rest of a longer transaction is dropped.
    pub capacity: usize,
    pub resync_on_select: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogTarget {
    #[default]
    Stderr,
    Syslog,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub target: LogTarget,
    /// Used when RUST_LOG is unset.
    pub level: String,
}

impl Default for PinConfig {
    fn default() -> Self {
        // SPI0 on the 40-pin header
        Self {
            sclk: 11,
            mosi: 10,
            miso: 9,
            cs: 8,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            resync_on_select: false,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_ms: 10 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            target: LogTarget::Stderr,
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capture.capacity == 0 {
            return Err(MonitorError::Config(
                "capture.capacity must be at least 1".to_string(),
            ));
        }
        if self.polling.interval_ms == 0 {
            return Err(MonitorError::Config(
                "polling.interval_ms must be greater than 0".to_string(),
            ));
        }

        let pins = [self.pins.sclk, self.pins.mosi, self.pins.miso, self.pins.cs];
        for (i, pin) in pins.iter().enumerate() {
            if pins[i + 1..].contains(pin) {
                return Err(MonitorError::Config(format!(
                    "GPIO {} is assigned to more than one line",
                    pin
                )));
            }
        }
        Ok(())
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            mode: self.spi.mode,
            bit_order: self.spi.bit_order,
            capacity: self.capture.capacity,
            resync_on_select: self.capture.resync_on_select,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.capture.capacity, 64);
        assert_eq!(config.spi.mode, SpiMode::Mode0);
        assert_eq!(config.output.format, OutputFormat::Hex);
        assert_eq!(config.logging.target, LogTarget::Stderr);
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
pins:
  sclk: 21
  mosi: 20
  miso: 19
  cs: 18
spi:
  mode: 3
  bit_order: lsb_first
capture:
  capacity: 128
  resync_on_select: true
output:
  format: ascii
polling:
  interval_ms: 50
logging:
  target: syslog
  level: debug
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.pins.sclk, 21);
        assert_eq!(config.pins.cs, 18);
        assert_eq!(config.output.format, OutputFormat::Ascii);
        assert_eq!(config.polling.interval_ms, 50);
        assert_eq!(config.logging.target, LogTarget::Syslog);
        assert_eq!(config.logging.level, "debug");

        let settings = config.monitor_settings();
        assert_eq!(settings.mode, SpiMode::Mode3);
        assert_eq!(settings.bit_order, BitOrder::LsbFirst);
        assert_eq!(settings.capacity, 128);
        assert!(settings.resync_on_select);
    }

    #[test]
    fn test_rejects_invalid() {
        assert!(Config::from_yaml("capture:\n  capacity: 0\n").is_err());
        assert!(Config::from_yaml("polling:\n  interval_ms: 0\n").is_err());
        assert!(Config::from_yaml("spi:\n  mode: 4\n").is_err());

        let err = Config::from_yaml("pins:\n  mosi: 11\n").unwrap_err();
        assert!(err.to_string().contains("GPIO 11"));
    }

    #[test]
    fn test_example_config_parses() {
        let config = Config::from_yaml(include_str!("../config.example.yaml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/spi-monitor.yaml").unwrap_err();
        assert!(matches!(err, MonitorError::Io(_)));
    }
}
