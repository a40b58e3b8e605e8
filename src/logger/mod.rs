//! Leveled line logging to stdout and an optional append-mode file.
//!
//! The monitor never installs a global subscriber. A [`MonitorLogger`] owns its
//! own [`Dispatch`] and the monitor loop runs inside [`MonitorLogger::in_scope`],
//! so the logging context is created at startup and dropped at exit.

pub mod capture;
pub mod format;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing::Dispatch;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::{Layer, Registry};

use crate::core::config::{GlobalConfig, LogLevel};
use crate::core::errors::{MonitorError, Result};

pub use capture::LogCapture;
pub use format::LineFormat;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warning => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Explicitly constructed logging context for one monitor run.
#[derive(Clone)]
pub struct MonitorLogger {
    dispatch: Dispatch,
    level: LogLevel,
}

impl std::fmt::Debug for MonitorLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorLogger")
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

impl MonitorLogger {
    /// Stdout sink plus, when `logfile` is set, an append-mode file sink.
    pub fn from_config(config: &GlobalConfig) -> Result<Self> {
        let mut layers = vec![line_layer(config.log_level, std::io::stdout)];
        if let Some(path) = &config.log_file {
            layers.push(line_layer(config.log_level, open_log_file(path)?));
        }
        Ok(Self::from_layers(config.log_level, layers))
    }

    /// Single sink writing through `writer`.
    pub fn with_writer<W>(level: LogLevel, writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        Self::from_layers(level, vec![line_layer(level, writer)])
    }

    fn from_layers(level: LogLevel, layers: Vec<BoxedLayer>) -> Self {
        let subscriber = Registry::default().with(layers);
        Self {
            dispatch: Dispatch::new(subscriber),
            level,
        }
    }

    /// Run `f` with this logger as the active subscriber on the current thread.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

fn line_layer<W>(level: LogLevel, writer: W) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .event_format(LineFormat)
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(LevelFilter::from(level))
        .boxed()
}

fn open_log_file(path: &Path) -> Result<Mutex<std::fs::File>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| MonitorError::io(path, err))?;
    Ok(Mutex::new(file))
}
