//! Human-readable log stream for front-ends
//!
//! Every line is also emitted as a `tracing` event, so a headless deployment gets
//! the same information from its subscriber that a UI gets from [`LogStream::subscribe`].

use crate::error::{Error, ToDiagnostic};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

/// Buffered lines per subscriber before the slowest one starts lagging
const LOG_CHANNEL_CAPACITY: usize = 1000;

/// Diagnostic code for "downloading image" progress lines
pub const CODE_IMAGE_DOWNLOAD: u16 = 200;

/// Severity of a log line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Progress
    Info,
    /// Recoverable oddity (e.g. resuming an interrupted job)
    Warn,
    /// A failure that stopped work
    Error,
}

/// One line of the log stream
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    /// When the line was emitted
    pub timestamp: DateTime<Utc>,
    /// Severity
    pub level: LogLevel,
    /// Optional numeric diagnostic code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    /// Message text
    pub message: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Broadcast sender for [`LogLine`]s (cloneable; clones share subscribers)
#[derive(Clone, Debug)]
pub struct LogStream {
    tx: broadcast::Sender<LogLine>,
}

impl Default for LogStream {
    fn default() -> Self {
        Self::new()
    }
}

impl LogStream {
    /// Create a stream with no subscribers
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(LOG_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Receive every line emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<LogLine> {
        self.tx.subscribe()
    }

    /// Emit a progress line
    pub fn info(&self, code: Option<u16>, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(code, "{}", message);
        self.send(LogLevel::Info, code, message);
    }

    /// Emit a warning line
    pub fn warn(&self, code: Option<u16>, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(code, "{}", message);
        self.send(LogLevel::Warn, code, message);
    }

    /// Emit an error line
    pub fn error(&self, code: Option<u16>, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(code, "{}", message);
        self.send(LogLevel::Error, code, message);
    }

    /// Emit an error line carrying the error's own diagnostic code
    pub fn report(&self, error: &Error) {
        let code = error.diagnostic_code();
        tracing::error!(
            code,
            error_code = error.error_code(),
            severity = ?error.severity(),
            error = %error,
            "Sync error"
        );
        self.send(LogLevel::Error, Some(code), error.to_string());
    }

    fn send(&self, level: LogLevel, code: Option<u16>, message: String) {
        // No subscribers is the normal headless case
        let _ = self.tx.send(LogLine {
            timestamp: Utc::now(),
            level,
            code,
            message,
        });
    }
}
