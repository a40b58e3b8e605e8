//! Shared fixtures for integration tests: scripted probes, recording
//! notifier, and a CLI runner for the built binary.

#![allow(dead_code, missing_docs)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::rc::Rc;

use ping_monitor::monitor::probe::ProbeOutput;
use ping_monitor::{MonitorError, Notifier, ProbeRunner, Recipients, Result};

pub const LOSS_OUTPUT: &str = "\
PING 10.0.0.5 (10.0.0.5) 56(84) bytes of data.

--- 10.0.0.5 ping statistics ---
1 packets transmitted, 0 received, 100% packet loss, time 0ms
";

pub const REPLY_OUTPUT: &str = "\
PING 10.0.0.5 (10.0.0.5) 56(84) bytes of data.
64 bytes from 10.0.0.5: icmp_seq=1 ttl=64 time=0.210 ms

--- 10.0.0.5 ping statistics ---
1 packets transmitted, 1 received, 0% packet loss, time 0ms
";

/// What a scripted probe does for one host.
#[derive(Debug, Clone)]
pub enum Script {
    Output(&'static str),
    SpawnFailure,
}

/// Probe runner answering from a per-host script and recording every call.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRunner {
    scripts: HashMap<String, Script>,
    pub calls: Rc<RefCell<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn with(mut self, host: &str, script: Script) -> Self {
        self.scripts.insert(host.to_string(), script);
        self
    }
}

impl ProbeRunner for ScriptedRunner {
    fn run(&self, host: &str) -> Result<ProbeOutput> {
        self.calls.borrow_mut().push(host.to_string());
        match self.scripts.get(host) {
            Some(Script::Output(text)) => Ok(ProbeOutput::from_stdout(*text)),
            Some(Script::SpawnFailure) | None => Err(MonitorError::ProbeSpawn {
                program: "ping".to_string(),
                host: host.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub sender: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Notifier that keeps every mail instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    pub sent: Rc<RefCell<Vec<SentMail>>>,
}

impl Notifier for RecordingNotifier {
    fn notify(
        &self,
        sender: &str,
        recipients: &Recipients,
        subject: &str,
        body: &str,
    ) -> Result<()> {
        self.sent.borrow_mut().push(SentMail {
            sender: sender.to_string(),
            recipients: recipients.to_vec(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Captured result of one binary invocation.
#[derive(Debug)]
pub struct CliResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

/// Run the `ping-monitor` binary in `dir` and keep a transcript next to it.
pub fn run_cli_case(case_name: &str, dir: &Path, args: &[&str]) -> CliResult {
    let output = Command::new(env!("CARGO_BIN_EXE_ping-monitor"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("ping-monitor binary should start");
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    let log_path = dir.join(format!("{case_name}.transcript"));
    let transcript = format!(
        "args: {args:?}\nstatus: {}\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}\n",
        output.status
    );
    std::fs::write(&log_path, transcript).expect("transcript should be writable");

    CliResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}
