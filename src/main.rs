use anyhow::{anyhow, Context, Result};
use log::{error, info, LevelFilter};
use spi_monitor::config::{self, Config, LogTarget, LoggingConfig};
use spi_monitor::Daemon;
use tokio::signal::unix::{signal, SignalKind};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());

    let config = Config::load(&config_path)
        .context(format!("Failed to load config file: {}", config_path))?;

    init_logger(&config.logging)?;

    info!("SPI Monitor starting...");
    info!("Configuration loaded from: {}", config_path);

    let mut daemon = Daemon::new(config).context("Failed to attach to GPIO")?;

    // Setup signal handling via tokio
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;
    let mut sighup = signal(SignalKind::hangup()).context("Failed to setup SIGHUP handler")?;

    info!("SPI Monitor initialized");

    loop {
        tokio::select! {
            result = daemon.poll() => {
                if let Err(e) = result {
                    error!("Monitor poll error: {}", e);
                    return Err(e.into());
                }
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully");
                break;
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully");
                break;
            }
            _ = sighup.recv() => {
                info!("Received SIGHUP, reloading configuration");
                match Config::load(&config_path) {
                    Ok(new_config) => {
                        if let Err(e) = daemon.reload_config(new_config) {
                            error!("Rejected new configuration: {}", e);
                        }
                    }
                    Err(e) => error!("Failed to reload {}: {}", config_path, e),
                }
            }
        }
    }

    info!(
        "SPI Monitor shutdown complete, {} transaction(s) captured",
        daemon.transactions()
    );
    Ok(())
}

fn init_logger(logging: &LoggingConfig) -> Result<()> {
    match logging.target {
        LogTarget::Stderr => {
            // RUST_LOG wins over the configured level. Systemd/journald captures stderr.
            env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or(logging.level.as_str()),
            )
            .init();
        }
        LogTarget::Syslog => {
            let level: LevelFilter = logging
                .level
                .parse()
                .context(format!("Invalid log level: {}", logging.level))?;
            let formatter = syslog::Formatter3164 {
                facility: syslog::Facility::LOG_DAEMON,
                process: "spi-monitor".to_string(),
                ..Default::default()
            };
            let logger = syslog::unix(formatter)
                .map_err(|e| anyhow!("Failed to connect to syslog: {}", e))?;
            log::set_boxed_logger(Box::new(syslog::BasicLogger::new(logger)))
                .map(|()| log::set_max_level(level))
                .context("Failed to install syslog logger")?;
        }
    }
    Ok(())
}
