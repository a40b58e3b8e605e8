//! Operator notification: recipient normalization, failure mail composition,
//! and the transport seam used by the monitor loop.

pub mod smtp;

use std::fmt;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::core::config::Target;
use crate::core::errors::Result;

pub use smtp::SmtpNotifier;

/// Separator used when recipients are rendered into one header or log line.
pub const RECIPIENT_SEPARATOR: &str = ", ";

/// Timestamp layout used in mail bodies and log lines.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One recipient or several. Both shapes are accepted in configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Recipients {
    One(String),
    Many(Vec<String>),
}

impl Recipients {
    /// Normalize to a list of addresses.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(address) => vec![address.clone()],
            Self::Many(addresses) => addresses.clone(),
        }
    }

    /// Comma-joined form used for the `To` header and log lines.
    #[must_use]
    pub fn header_value(&self) -> String {
        self.to_vec().join(RECIPIENT_SEPARATOR)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::One(address) => address.trim().is_empty(),
            Self::Many(addresses) => addresses.iter().all(|a| a.trim().is_empty()),
        }
    }
}

impl From<&str> for Recipients {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<String> for Recipients {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<Vec<String>> for Recipients {
    fn from(value: Vec<String>) -> Self {
        Self::Many(value)
    }
}

impl fmt::Display for Recipients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header_value())
    }
}

/// Delivers one notification. Implementations must not retry.
pub trait Notifier {
    fn notify(&self, sender: &str, recipients: &Recipients, subject: &str, body: &str)
    -> Result<()>;
}

/// Subject and body of an unreachable-host mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureMail {
    pub subject: String,
    pub body: String,
}

/// Build the mail sent when `target` is classified unreachable at `at`.
#[must_use]
pub fn compose_failure_mail(target: &Target, at: NaiveDateTime) -> FailureMail {
    FailureMail {
        subject: format!("Ping to {} failed", target.name),
        body: format!(
            "{} ping to {} failed.\n\nmessage sent by ping-monitor",
            at.format(TIMESTAMP_FORMAT),
            target.host
        ),
    }
}
