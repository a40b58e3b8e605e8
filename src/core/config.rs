//! Configuration loading: global settings (TOML) and the target list (YAML).

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::errors::{MonitorError, Result};
use crate::notify::Recipients;

/// Default global settings file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "ping-monitor.toml";
/// Default targets file, relative to the working directory.
pub const DEFAULT_TARGETS_FILE: &str = "targets.yaml";

// ---------------------------------------------------------------------------
// Log level
// ---------------------------------------------------------------------------

/// Verbosity of the monitor's log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(from = "String")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Parse a level name case-insensitively. Unknown names fall back to `Info`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" => Self::Debug,
            "warning" | "warn" => Self::Warning,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl From<String> for LogLevel {
    fn from(value: String) -> Self {
        Self::from_name(&value)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Global settings
// ---------------------------------------------------------------------------

/// Process-wide settings read from the `[global]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default envelope sender.
    #[serde(rename = "mailfrom")]
    pub mail_from: String,
    /// Default recipients.
    #[serde(rename = "mailto")]
    pub mail_to: Recipients,
    /// Optional append-mode log file in addition to stdout.
    #[serde(rename = "logfile")]
    pub log_file: Option<PathBuf>,
    #[serde(rename = "loglevel")]
    pub log_level: LogLevel,
    /// Probe utility, invoked as `<ping_command> -c 1 <host>`.
    #[serde(rename = "pingcommand")]
    pub ping_command: String,
    /// Mail relay host.
    #[serde(rename = "smtphost")]
    pub smtp_host: String,
    #[serde(rename = "smtpport")]
    pub smtp_port: u16,
    /// Domain appended to bare local names (`root`) on the SMTP envelope.
    #[serde(rename = "maildomain")]
    pub mail_domain: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            mail_from: "root".to_string(),
            mail_to: Recipients::from("root"),
            log_file: None,
            log_level: LogLevel::Info,
            ping_command: "ping".to_string(),
            smtp_host: "localhost".to_string(),
            smtp_port: 25,
            mail_domain: "localhost".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    global: Option<GlobalConfig>,
}

impl GlobalConfig {
    /// Load the `[global]` table from a TOML file, overlaying it onto defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = read_config_file(path)?;
        Self::from_toml_str(&text)
    }

    /// Parse settings from TOML text. Keys present in the text win over defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: SettingsFile = toml::from_str(text)?;
        let mut config = file.global.ok_or_else(|| MonitorError::ConfigParse {
            context: "global",
            details: "missing [global] section".to_string(),
        })?;
        if config
            .log_file
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            config.log_file = None;
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.mail_from.trim().is_empty() {
            return Err(MonitorError::InvalidConfig {
                details: "mailfrom must not be empty".to_string(),
            });
        }
        if self.mail_to.is_empty() {
            return Err(MonitorError::InvalidConfig {
                details: "mailto must name at least one recipient".to_string(),
            });
        }
        if self.ping_command.trim().is_empty() {
            return Err(MonitorError::InvalidConfig {
                details: "pingcommand must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// `host:port` of the mail relay, for log lines and error context.
    #[must_use]
    pub fn relay(&self) -> String {
        relay_address(&self.smtp_host, self.smtp_port)
    }
}

/// `host:port` form of a mail relay address.
#[must_use]
pub fn relay_address(host: &str, port: u16) -> String {
    format!("{host}:{port}")
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// A named host checked on every pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub host: String,
    pub mail_from: Option<String>,
    pub mail_to: Option<Recipients>,
}

impl Target {
    #[must_use]
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            mail_from: None,
            mail_to: None,
        }
    }

    #[must_use]
    pub fn with_mail_from(mut self, sender: impl Into<String>) -> Self {
        self.mail_from = Some(sender.into());
        self
    }

    #[must_use]
    pub fn with_mail_to(mut self, recipients: impl Into<Recipients>) -> Self {
        self.mail_to = Some(recipients.into());
        self
    }

    /// Sender for this target: its own override, else the global default.
    #[must_use]
    pub fn sender<'a>(&'a self, global: &'a GlobalConfig) -> &'a str {
        self.mail_from.as_deref().unwrap_or(&global.mail_from)
    }

    /// Recipients for this target: its own override, else the global default.
    #[must_use]
    pub fn recipients<'a>(&'a self, global: &'a GlobalConfig) -> &'a Recipients {
        self.mail_to.as_ref().unwrap_or(&global.mail_to)
    }
}

#[derive(Debug, Deserialize)]
struct TargetEntry {
    host: Option<String>,
    #[serde(rename = "mailfrom")]
    mail_from: Option<String>,
    #[serde(rename = "mailto")]
    mail_to: Option<Recipients>,
}

/// All configured targets, keyed by name. Read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSet {
    targets: BTreeMap<String, Target>,
}

impl TargetSet {
    #[must_use]
    pub fn new(targets: impl IntoIterator<Item = Target>) -> Self {
        Self {
            targets: targets
                .into_iter()
                .map(|target| (target.name.clone(), target))
                .collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = read_config_file(path)?;
        Self::from_yaml_str(&text)
    }

    /// Parse a YAML mapping of `name -> {host, mailfrom?, mailto?}`.
    ///
    /// Every target must carry a non-empty `host`.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: Option<BTreeMap<String, Option<TargetEntry>>> = serde_yaml::from_str(text)?;
        let mut targets = BTreeMap::new();
        for (name, entry) in raw.unwrap_or_default() {
            let entry = entry.ok_or_else(|| MonitorError::MissingHost {
                target: name.clone(),
            })?;
            let host = entry
                .host
                .map(|host| host.trim().to_string())
                .filter(|host| !host.is_empty())
                .ok_or_else(|| MonitorError::MissingHost {
                    target: name.clone(),
                })?;
            if host.starts_with('-') {
                return Err(MonitorError::InvalidConfig {
                    details: format!("host '{host}' of target '{name}' looks like a command-line flag"),
                });
            }
            if entry.mail_to.as_ref().is_some_and(Recipients::is_empty) {
                return Err(MonitorError::InvalidConfig {
                    details: format!("mailto of target '{name}' must name at least one recipient"),
                });
            }
            if entry
                .mail_from
                .as_ref()
                .is_some_and(|sender| sender.trim().is_empty())
            {
                return Err(MonitorError::InvalidConfig {
                    details: format!("mailfrom of target '{name}' must not be empty"),
                });
            }
            targets.insert(
                name.clone(),
                Target {
                    name,
                    host,
                    mail_from: entry.mail_from,
                    mail_to: entry.mail_to,
                },
            );
        }
        Ok(Self { targets })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Target> {
        self.targets.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Load both configuration files. No network or mail resources are touched.
pub fn load(config_path: &Path, targets_path: &Path) -> Result<(GlobalConfig, TargetSet)> {
    let global = GlobalConfig::load(config_path)?;
    let targets = TargetSet::load(targets_path)?;
    Ok((global, targets))
}

fn read_config_file(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(MonitorError::MissingConfig {
                path: path.to_path_buf(),
            })
        }
        Err(err) => Err(MonitorError::io(path, err)),
    }
}
