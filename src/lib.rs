//! ping_monitor — one-shot ICMP reachability monitor with mail alerts.
//!
//! A run loads the global settings and target list, probes each target once
//! with the system `ping` utility, and mails operators about every target whose
//! probe reports total packet loss. Failures are isolated per target.

pub mod core;
pub mod logger;
pub mod monitor;
pub mod notify;

#[cfg(feature = "cli")]
pub mod cli_app;

pub use crate::core::config::{GlobalConfig, LogLevel, Target, TargetSet, load};
pub use crate::core::errors::{MonitorError, Result};
pub use crate::logger::MonitorLogger;
pub use crate::monitor::{Monitor, ProbeResult, ProbeRunner, TargetOutcome};
pub use crate::notify::{Notifier, Recipients};
