//! SPI Monitor - passive SPI bus sniffer for Linux single-board computers
//!
//! Samples SCLK/MOSI/MISO/CS through GPIO edge interrupts, assembles byte
//! pairs according to the configured SPI mode and bit order, and prints each
//! chip-select window as text.

pub mod config;
pub mod daemon;
pub mod error;
pub mod format;
pub mod gpio;
pub mod mode;
pub mod monitor;
pub mod sampler;
pub mod transaction;

pub use config::Config;
pub use daemon::Daemon;
pub use error::{MonitorError, Result};
pub use format::OutputFormat;
pub use mode::{BitOrder, Level, SpiMode, SpiModeConfig};
pub use monitor::{CompletedTransaction, Monitor, MonitorSettings};
pub use transaction::{BytePair, Transaction};
