//! User Feedback Notices
//!
//! Machines map selected transitions (created, deleted, rejected, forced
//! logout ...) to a [`Notice`]. Display is left to whatever implements
//! [`NoticeSink`]: a snackbar, a terminal, a test channel.

use std::fmt;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One piece of user feedback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
    /// Name of the emitting machine
    pub source: &'static str,
}

impl Notice {
    pub fn new(source: &'static str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            source,
        }
    }

    pub fn success(source: &'static str, message: impl Into<String>) -> Self {
        Self::new(source, Severity::Success, message)
    }

    pub fn info(source: &'static str, message: impl Into<String>) -> Self {
        Self::new(source, Severity::Info, message)
    }

    pub fn warning(source: &'static str, message: impl Into<String>) -> Self {
        Self::new(source, Severity::Warning, message)
    }

    pub fn error(source: &'static str, message: impl Into<String>) -> Self {
        Self::new(source, Severity::Error, message)
    }
}

/// Consumer of machine notices
pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotices;

impl NoticeSink for TracingNotices {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Success | Severity::Info => {
                info!(source = notice.source, "{}", notice.message)
            }
            Severity::Warning => warn!(source = notice.source, "{}", notice.message),
            Severity::Error => error!(source = notice.source, "{}", notice.message),
        }
    }
}

/// Forwards notices to an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelNotices {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotices {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NoticeSink for ChannelNotices {
    fn notify(&self, notice: Notice) {
        // Receiver gone means nobody renders feedback anymore
        let _ = self.tx.send(notice);
    }
}
