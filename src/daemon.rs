use crate::config::Config;
use crate::error::Result;
use crate::format::format_transaction;
use crate::gpio::EdgeSource;
use crate::monitor::{CompletedTransaction, Monitor};
use log::{info, warn};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

pub struct Daemon {
    monitor: Arc<Monitor>,
    config: Config,
    output: Box<dyn Write + Send>,
    // Keeps the GPIO interrupts registered for the daemon's lifetime.
    _edges: Option<EdgeSource>,
    transactions: u64,
}

impl Daemon {
    /// Build the monitor and attach it to the configured GPIO lines.
    pub fn new(config: Config) -> Result<Self> {
        let monitor = Arc::new(Monitor::new(config.monitor_settings()));
        let edges = EdgeSource::attach(config.pins, Arc::clone(&monitor))?;

        info!(
            "SPI mode {} ({:?}), capacity {} byte pairs, output {:?}",
            config.spi.mode.number(),
            config.spi.bit_order,
            monitor.capacity(),
            config.output.format
        );
        info!("Polling interval: {}ms", config.polling.interval_ms);

        Ok(Daemon {
            monitor,
            config,
            output: Box::new(io::stdout()),
            _edges: Some(edges),
            transactions: 0,
        })
    }

    /// Daemon over an existing monitor, with no GPIO attached. Edges are fed
    /// by whoever else holds the monitor.
    pub fn with_monitor(config: Config, monitor: Arc<Monitor>, output: Box<dyn Write + Send>) -> Self {
        Daemon {
            monitor,
            config,
            output,
            _edges: None,
            transactions: 0,
        }
    }

    pub fn monitor(&self) -> &Arc<Monitor> {
        &self.monitor
    }

    pub fn transactions(&self) -> u64 {
        self.transactions
    }

    /// One loop iteration: emit the completed transaction if there is one
    /// and hand it back.
    pub fn drain(&mut self) -> Result<Option<CompletedTransaction>> {
        let Some(transaction) = self.monitor.try_take_completed() else {
            return Ok(None);
        };

        let block = format_transaction(self.config.output.format, &transaction.pairs);
        self.output.write_all(&block)?;
        self.output.flush()?;

        self.transactions += 1;
        self.report(&transaction);
        Ok(Some(transaction))
    }

    pub async fn poll(&mut self) -> Result<()> {
        self.drain()?;

        sleep(Duration::from_millis(self.config.polling.interval_ms)).await;

        Ok(())
    }

    fn report(&self, transaction: &CompletedTransaction) {
        match transaction.clock_hz {
            Some(hz) => info!(
                "Transaction #{}: {} byte pair(s), estimated clock {:.0} Hz",
                self.transactions,
                transaction.len(),
                hz
            ),
            None => info!(
                "Transaction #{}: {} byte pair(s)",
                self.transactions,
                transaction.len()
            ),
        }

        if transaction.overflowed > 0 {
            warn!(
                "Transaction #{} exceeded capacity of {} byte pairs, {} dropped",
                self.transactions,
                self.monitor.capacity(),
                transaction.overflowed
            );
        }
    }

    /// Apply a new configuration. Mode, bit order, format and poll interval
    /// take effect immediately; pin, capture and logging changes need a restart.
    pub fn reload_config(&mut self, mut new_config: Config) -> Result<()> {
        new_config.validate()?;

        if new_config.pins != self.config.pins {
            warn!("GPIO pin changes require a restart, keeping current pins");
            new_config.pins = self.config.pins;
        }
        if new_config.capture != self.config.capture {
            warn!("Capture setting changes require a restart, keeping current settings");
            new_config.capture = self.config.capture;
        }
        if new_config.logging != self.config.logging {
            warn!("Logging changes require a restart, keeping current logger");
            new_config.logging = self.config.logging.clone();
        }
        if new_config.spi != self.config.spi {
            self.monitor
                .reconfigure(new_config.spi.mode, new_config.spi.bit_order);
            info!(
                "Switched to SPI mode {} ({:?})",
                new_config.spi.mode.number(),
                new_config.spi.bit_order
            );
        }

        self.config = new_config;
        info!("Configuration reloaded successfully");
        Ok(())
    }
}
