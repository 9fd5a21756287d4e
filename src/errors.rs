//! Error types for aerosense.
//!
//! Uses `thiserror` for library-style error definitions.

use std::fmt;

use thiserror::Error;

/// Pipeline step that produced an upstream error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Geocode,
    Pollution,
    Weather,
    History,
}

impl Step {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Geocode => "geocode",
            Self::Pollution => "pollution",
            Self::Weather => "weather",
            Self::History => "history",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur in aerosense operations.
#[derive(Error, Debug)]
pub enum AirError {
    /// Precondition violated on a pure function
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Geocoding found no match for the query
    #[error("No location found for \"{0}\"")]
    NotFound(String),

    /// Network failure, non-success status, unreadable payload or timeout
    #[error("{step} lookup unavailable: {reason}")]
    UpstreamUnavailable { step: Step, reason: String },

    /// Payload parsed but lacks fields we need
    #[error("{step} lookup returned incomplete data: {reason}")]
    PartialData { step: Step, reason: String },

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AirError {
    pub fn upstream(step: Step, reason: impl fmt::Display) -> Self {
        Self::UpstreamUnavailable {
            step,
            reason: reason.to_string(),
        }
    }

    pub fn partial(step: Step, reason: impl fmt::Display) -> Self {
        Self::PartialData {
            step,
            reason: reason.to_string(),
        }
    }

    /// Both upstream kinds propagate the same way; they differ only for diagnostics.
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable { .. } | Self::PartialData { .. }
        )
    }
}
