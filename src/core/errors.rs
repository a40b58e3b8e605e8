//! PM-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Top-level error type for the ping monitor.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("[PM-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[PM-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[PM-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[PM-1004] property 'host' must be set for target '{target}'")]
    MissingHost { target: String },

    #[error("[PM-2001] failed to run probe command '{program}' for {host}: {source}")]
    ProbeSpawn {
        program: String,
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("[PM-3001] invalid mail address '{address}': {details}")]
    MailAddress { address: String, details: String },

    #[error("[PM-3002] failed to build notification message: {details}")]
    MailBuild { details: String },

    #[error("[PM-3003] mail transport failure via {relay}: {details}")]
    MailTransport { relay: String, details: String },

    #[error("[PM-4001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MonitorError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "PM-1001",
            Self::MissingConfig { .. } => "PM-1002",
            Self::ConfigParse { .. } => "PM-1003",
            Self::MissingHost { .. } => "PM-1004",
            Self::ProbeSpawn { .. } => "PM-2001",
            Self::MailAddress { .. } => "PM-3001",
            Self::MailBuild { .. } => "PM-3002",
            Self::MailTransport { .. } => "PM-3003",
            Self::Io { .. } => "PM-4001",
        }
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<toml::de::Error> for MonitorError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for MonitorError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::ConfigParse {
            context: "yaml",
            details: value.to_string(),
        }
    }
}

impl From<lettre::error::Error> for MonitorError {
    fn from(value: lettre::error::Error) -> Self {
        Self::MailBuild {
            details: value.to_string(),
        }
    }
}
