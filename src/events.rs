//! Progress events for whatever presentation layer is attached.
//!
//! The engine reports per-tick, per-leg and error progress as
//! `{level, message, timestamp}` events over an unbounded channel. Every
//! event is also mirrored into `tracing`, so a sink with no receiver
//! still leaves a log trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for ProgressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressLevel::Info => write!(f, "INFO"),
            ProgressLevel::Warn => write!(f, "WARN"),
            ProgressLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// One human-readable progress line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub level: ProgressLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}) {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.message
        )
    }
}

/// Sending half handed to the engine. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl ProgressSink {
    /// A connected sink and the receiver the presentation layer drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that only logs.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(ProgressLevel::Info, message.into());
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.emit(ProgressLevel::Warn, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(ProgressLevel::Error, message.into());
    }

    fn emit(&self, level: ProgressLevel, message: String) {
        match level {
            ProgressLevel::Info => info!(target: "triarb::progress", "{message}"),
            ProgressLevel::Warn => warn!(target: "triarb::progress", "{message}"),
            ProgressLevel::Error => error!(target: "triarb::progress", "{message}"),
        }

        if let Some(tx) = &self.tx {
            // A dropped receiver only means nobody is watching.
            let _ = tx.send(ProgressEvent {
                level,
                message,
                timestamp: Utc::now(),
            });
        }
    }
}
