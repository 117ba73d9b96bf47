//! Error types for the Quantum Tarot application.

use crate::session::Phase;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// A shared error type for the tarot domain.
///
/// Variants are typed so that callers can tell validation problems apart
/// from backend failures without string matching.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum TarotError {
    /// The submitted question was empty or whitespace only.
    #[error("Question must not be empty")]
    EmptyQuestion,

    /// The submitted follow-up message was empty or whitespace only.
    #[error("Follow-up message must not be empty")]
    EmptyMessage,

    /// An operation was attempted in a phase that does not allow it.
    #[error("Operation '{operation}' is not allowed in phase {actual:?}")]
    InvalidPhase {
        operation: &'static str,
        actual: Phase,
    },

    /// Every card position of the active spread is already filled.
    #[error("Spread '{spread_id}' already has all {positions} cards drawn")]
    SpreadFull { spread_id: String, positions: usize },

    /// A follow-up reply is still streaming into the transcript.
    #[error("A reply is still streaming")]
    ReplyInFlight,

    /// The reading stream has not finished yet.
    #[error("The reading has not finished yet")]
    ReadingInProgress,

    /// No randomness could be obtained, not even from the local generator.
    #[error("Randomness unavailable: {0}")]
    Randomness(String),

    /// Generative backend failure.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },
}

impl TarotError {
    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Randomness error
    pub fn randomness(message: impl Into<String>) -> Self {
        Self::Randomness(message.into())
    }

    /// Creates an InvalidPhase error
    pub fn invalid_phase(operation: &'static str, actual: Phase) -> Self {
        Self::InvalidPhase { operation, actual }
    }

    /// Check if this is a phase-gating rejection
    pub fn is_invalid_phase(&self) -> bool {
        matches!(self, Self::InvalidPhase { .. })
    }

    /// Check if this is a backend error
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}

/// Failure reported by a generative-AI or randomness backend.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum BackendError {
    /// The backend answered with a non-success status or could not be reached.
    #[error("Backend request failed{}: {message}", .status_code.map(|c| format!(" ({c})")).unwrap_or_default())]
    Process {
        status_code: Option<u16>,
        message: String,
        is_retryable: bool,
        #[serde(default)]
        retry_after: Option<Duration>,
    },

    /// The backend answered but the payload could not be understood.
    #[error("Malformed backend response: {0}")]
    Malformed(String),

    /// The backend answered without any usable text.
    #[error("Backend returned no text")]
    EmptyResponse,

    /// The stream broke off after it had started.
    #[error("Stream interrupted: {0}")]
    Stream(String),

    /// No fragment arrived within the idle timeout.
    #[error("Stream idle for more than {0:?}")]
    Timeout(Duration),

    /// The request could not be built (e.g. a prompt template failed).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The backend is not configured (e.g. missing API key).
    #[error("Backend not configured: {0}")]
    NotConfigured(String),
}

impl BackendError {
    /// Creates a Process error without status code.
    pub fn request(message: impl Into<String>, is_retryable: bool) -> Self {
        Self::Process {
            status_code: None,
            message: message.into(),
            is_retryable,
            retry_after: None,
        }
    }

    /// Whether the failure is transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Process { is_retryable, .. } => *is_retryable,
            Self::Stream(_) | Self::Timeout(_) => true,
            _ => false,
        }
    }
}

impl From<std::io::Error> for TarotError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for TarotError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for TarotError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, TarotError>`.
pub type Result<T> = std::result::Result<T, TarotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display_includes_status() {
        let err = BackendError::Process {
            status_code: Some(503),
            message: "UNAVAILABLE: overloaded".into(),
            is_retryable: true,
            retry_after: None,
        };
        assert_eq!(
            err.to_string(),
            "Backend request failed (503): UNAVAILABLE: overloaded"
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn test_backend_error_converts_into_tarot_error() {
        let err: TarotError = BackendError::EmptyResponse.into();
        assert!(err.is_backend());
        assert!(!err.is_invalid_phase());
    }

    #[test]
    fn test_invalid_phase_message() {
        let err = TarotError::invalid_phase("draw", Phase::Input);
        assert!(err.to_string().contains("draw"));
        assert!(err.is_invalid_phase());
    }
}
