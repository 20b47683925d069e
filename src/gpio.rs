/// GPIO edge source feeding the monitor.
///
/// SCLK and CS get asynchronous both-edge interrupts. MOSI and MISO are
/// plain inputs read from inside the SCLK callback at the moment of the edge.

use crate::config::PinConfig;
use crate::error::Result;
use crate::monitor::Monitor;
use log::{debug, info, warn};
use rppal::gpio::{Gpio, InputPin, Level, Trigger};
use std::sync::Arc;
use std::time::Instant;

pub struct EdgeSource {
    sclk: InputPin,
    cs: InputPin,
    pins: PinConfig,
}

/// Body of the SCLK callback. `clock` is the level rppal reports for the
/// edge; timestamps are relative to when the source was attached.
fn forward_clock_edge(monitor: &Monitor, attached: Instant, clock: Level, mosi: &InputPin, miso: &InputPin) {
    forward_levels(monitor, attached, clock, mosi.read(), miso.read());
}

fn forward_levels(monitor: &Monitor, attached: Instant, clock: Level, mosi: Level, miso: Level) {
    monitor.on_clock_edge(clock.into(), mosi.into(), miso.into(), attached.elapsed());
}

impl EdgeSource {
    pub fn attach(pins: PinConfig, monitor: Arc<Monitor>) -> Result<Self> {
        let gpio = Gpio::new()?;

        let mut sclk = gpio.get(pins.sclk)?.into_input();
        let mut cs = gpio.get(pins.cs)?.into_input();
        let mosi = gpio.get(pins.mosi)?.into_input();
        let miso = gpio.get(pins.miso)?.into_input();

        if cs.is_low() {
            warn!("Chip-select GPIO {} is already active, first transaction will be partial", pins.cs);
            monitor.on_select_edge(Level::Low.into());
        }

        let attached = Instant::now();
        let clock_monitor = Arc::clone(&monitor);
        sclk.set_async_interrupt(Trigger::Both, move |clock: Level| {
            forward_clock_edge(&clock_monitor, attached, clock, &mosi, &miso);
        })?;
        debug!("Clock interrupt attached on GPIO {}", pins.sclk);

        let select_monitor = Arc::clone(&monitor);
        cs.set_async_interrupt(Trigger::Both, move |select: Level| {
            select_monitor.on_select_edge(select.into());
        })?;
        debug!("Chip-select interrupt attached on GPIO {}", pins.cs);

        info!(
            "Sniffing SCLK={} MOSI={} MISO={} CS={}",
            pins.sclk, pins.mosi, pins.miso, pins.cs
        );

        Ok(EdgeSource { sclk, cs, pins })
    }
}

impl Drop for EdgeSource {
    fn drop(&mut self) {
        if let Err(e) = self.sclk.clear_async_interrupt() {
            warn!("Failed to clear clock interrupt on GPIO {}: {}", self.pins.sclk, e);
        }
        if let Err(e) = self.cs.clear_async_interrupt() {
            warn!("Failed to clear chip-select interrupt on GPIO {}: {}", self.pins.cs, e);
        }
        debug!("Edge source detached");
    }
}
