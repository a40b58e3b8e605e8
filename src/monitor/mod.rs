//! Reachability monitoring: probe execution/classification and the per-pass loop.

pub mod pass;
pub mod probe;

pub use pass::{Monitor, TargetOutcome};
pub use probe::{ProbeResult, ProbeRunner, SystemPing, classify_output, probe};
