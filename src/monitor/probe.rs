//! Reachability probing through the system `ping` utility.
//!
//! Classification is purely textual. The exit status of the probe command is
//! recorded for logging but never decides reachability.

use std::process::{Command, ExitStatus, Stdio};

use crate::core::config::Target;
use crate::core::errors::{MonitorError, Result};

/// Substrings of the probe utility's output that classification depends on.
///
/// These follow the iputils / BSD `ping` summary wording. Locale or version
/// changes in the utility land here and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputMarkers {
    /// Present on the statistics line when no reply came back.
    pub total_loss: &'static str,
    /// Precedes the round-trip details of the first echo reply.
    pub first_reply: &'static str,
}

/// Markers understood by [`classify_output`].
pub const PING_MARKERS: OutputMarkers = OutputMarkers {
    total_loss: "0 received",
    first_reply: "icmp_seq=1 ",
};

/// Outcome of classifying one probe's output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub reachable: bool,
    /// Round-trip details of the first reply, empty when absent.
    pub message: String,
}

/// Raw output of one probe command.
#[derive(Debug, Clone)]
pub struct ProbeOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the runner has no process status to report.
    pub status: Option<ExitStatus>,
}

impl ProbeOutput {
    #[must_use]
    pub fn from_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            status: None,
        }
    }
}

/// Result of probing one target within a pass. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub target: String,
    pub reachable: bool,
    pub message: Option<String>,
}

/// Sends one echo request to a host and returns the utility's output.
pub trait ProbeRunner {
    fn run(&self, host: &str) -> Result<ProbeOutput>;
}

/// Runs `<program> -c 1 <host>` and waits for it to finish.
#[derive(Debug, Clone)]
pub struct SystemPing {
    program: String,
}

impl SystemPing {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SystemPing {
    fn default() -> Self {
        Self::new("ping")
    }
}

impl ProbeRunner for SystemPing {
    fn run(&self, host: &str) -> Result<ProbeOutput> {
        let output = Command::new(&self.program)
            .args(["-c", "1", host])
            .stdin(Stdio::null())
            .output()
            .map_err(|source| MonitorError::ProbeSpawn {
                program: self.program.clone(),
                host: host.to_string(),
                source,
            })?;

        Ok(ProbeOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: Some(output.status),
        })
    }
}

/// Classify probe output line by line.
///
/// Any line carrying the total-loss marker makes the host unreachable. The
/// last line carrying the first-reply marker supplies the message: everything
/// after the first occurrence of the marker, up to a repeated marker.
#[must_use]
pub fn classify_output(stdout: &str) -> Classification {
    classify_with(&PING_MARKERS, stdout)
}

/// [`classify_output`] with explicit markers.
#[must_use]
pub fn classify_with(markers: &OutputMarkers, stdout: &str) -> Classification {
    let mut result = Classification {
        reachable: true,
        message: String::new(),
    };
    for line in stdout.lines() {
        if let Some((_, rest)) = line.split_once(markers.first_reply) {
            let rest = rest.split(markers.first_reply).next().unwrap_or(rest);
            result.message = rest.to_string();
        }
        if line.contains(markers.total_loss) {
            result.reachable = false;
        }
    }
    result
}

/// Probe `target` once. Spawn failures propagate; they are not "unreachable".
pub fn probe(runner: &dyn ProbeRunner, target: &Target) -> Result<ProbeResult> {
    let output = runner.run(&target.host)?;
    for line in output.stdout.lines() {
        tracing::debug!("ping out: {line}");
    }
    for line in output.stderr.lines().filter(|l| !l.trim().is_empty()) {
        tracing::debug!("ping err: {line}");
    }
    if let Some(status) = output.status {
        tracing::debug!("ping exit: {status}");
    }

    let classification = classify_output(&output.stdout);
    tracing::debug!("captured: {}", classification.message);

    Ok(ProbeResult {
        target: target.name.clone(),
        reachable: classification.reachable,
        message: Some(classification.message).filter(|m| !m.is_empty()),
    })
}
