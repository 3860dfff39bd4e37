//! Timestamped entries a debugging session records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Severity of a debug log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugLogKind {
    Info,
    Success,
    Error,
    Debug,
}

impl DebugLogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebugLogKind::Info => "info",
            DebugLogKind::Success => "success",
            DebugLogKind::Error => "error",
            DebugLogKind::Debug => "debug",
        }
    }
}

impl fmt::Display for DebugLogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A human-readable record of something the session did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DebugLog {
    pub kind: DebugLogKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl DebugLog {
    pub fn new(kind: DebugLogKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(DebugLogKind::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(DebugLogKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DebugLogKind::Error, message)
    }
}

impl fmt::Display for DebugLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.timestamp.format("%H:%M:%S"),
            self.kind,
            self.message
        )
    }
}

/// Which side of an exchange a network log entry describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Request,
    Response,
}

/// One half of a request/response pair sent to the RPC endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NetworkLog {
    pub direction: Direction,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Status label on responses, e.g. `Success (200)` or `Error (400)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl NetworkLog {
    pub fn request(message: impl Into<String>) -> Self {
        Self {
            direction: Direction::Request,
            message: message.into(),
            timestamp: Utc::now(),
            status: None,
        }
    }

    pub fn response(message: impl Into<String>, status: ResponseStatus) -> Self {
        Self {
            direction: Direction::Response,
            message: message.into(),
            timestamp: Utc::now(),
            status: Some(status.label().to_string()),
        }
    }

    pub fn is_request(&self) -> bool {
        self.direction == Direction::Request
    }
}

/// Coarse outcome attached to a response log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseStatus {
    /// The exchange produced a usable result.
    Success,
    /// The node answered but the call failed.
    Rejected,
    /// The exchange itself failed.
    Failed,
}

impl ResponseStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ResponseStatus::Success => "Success (200)",
            ResponseStatus::Rejected => "Error (400)",
            ResponseStatus::Failed => "Error (500)",
        }
    }
}
