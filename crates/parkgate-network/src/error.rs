//! Error types for relay link exchanges.
//!
//! Every failure of a link call lands in exactly one of four kinds so callers
//! can tell an input mistake, an unreachable gate, a slow gate and a firmware
//! mismatch apart without inspecting messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type alias for relay link operations.
pub type Result<T> = std::result::Result<T, LinkError>;

/// Errors that can occur during a relay link call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    /// Caller input rejected before any network I/O.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Socket-level failure (refused, reset, unreachable, DNS).
    #[error("Transport error: {reason}")]
    Transport { reason: String },

    /// No connection or reply within the link timeout.
    #[error("Relay did not answer within {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// A reply arrived but does not have the expected shape.
    #[error("Protocol error: unexpected reply '{raw}'")]
    Protocol { raw: String },
}

/// Discriminant of [`LinkError`], for callers that track failure history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkErrorKind {
    Validation,
    Transport,
    Timeout,
    Protocol,
}

impl fmt::Display for LinkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            LinkErrorKind::Validation => "validation",
            LinkErrorKind::Transport => "transport",
            LinkErrorKind::Timeout => "timeout",
            LinkErrorKind::Protocol => "protocol",
        };
        f.write_str(kind)
    }
}

impl LinkError {
    /// Create a new validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new transport error.
    pub fn transport(reason: impl fmt::Display) -> Self {
        Self::Transport {
            reason: reason.to_string(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a new protocol error carrying the raw reply.
    pub fn protocol(raw: impl Into<String>) -> Self {
        Self::Protocol { raw: raw.into() }
    }

    #[must_use]
    pub fn kind(&self) -> LinkErrorKind {
        match self {
            Self::Validation { .. } => LinkErrorKind::Validation,
            Self::Transport { .. } => LinkErrorKind::Transport,
            Self::Timeout { .. } => LinkErrorKind::Timeout,
            Self::Protocol { .. } => LinkErrorKind::Protocol,
        }
    }

    /// Returns `true` for failures that mean "gate offline/unreachable".
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }
}

impl From<parkgate_core::Error> for LinkError {
    fn from(err: parkgate_core::Error) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<parkgate_protocol::ReplyError> for LinkError {
    fn from(err: parkgate_protocol::ReplyError) -> Self {
        Self::protocol(err.raw)
    }
}
