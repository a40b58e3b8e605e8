//! Top-level CLI definition and dispatch.

use std::path::PathBuf;

use clap::Parser;

use crate::core::config::{self, DEFAULT_CONFIG_FILE, DEFAULT_TARGETS_FILE};
use crate::core::errors::Result;
use crate::logger::MonitorLogger;
use crate::monitor::Monitor;

/// Ping every configured target once and mail operators about unreachable hosts.
#[derive(Debug, Parser)]
#[command(name = "ping-monitor", version, about)]
pub struct Cli {
    /// Global settings file (TOML with a [global] table).
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
    /// Targets file (YAML mapping of name to host and mail overrides).
    #[arg(long, default_value = DEFAULT_TARGETS_FILE)]
    pub targets: PathBuf,
}

/// Load configuration, build the logging context, and run one pass.
///
/// # Errors
/// Returns startup errors only: unreadable or invalid configuration and an
/// unopenable log file. Failures inside the pass are logged, not returned.
pub fn run(cli: &Cli) -> Result<()> {
    let (global, targets) = config::load(&cli.config, &cli.targets)?;
    let logger = MonitorLogger::from_config(&global)?;
    let monitor = Monitor::new(global, targets, logger);
    monitor.run_pass();
    Ok(())
}
