//! Error types for the vidway gateway.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire gateway.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait. Every failure a caller can
/// observe is one of these variants; nothing is surfaced as free text only.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum GatewayError {
    /// The quota window has no room left for the requested reservation.
    ///
    /// Carries the remaining budget and the time until the window resets so
    /// the caller can decide to wait or abort. Never retried internally.
    #[error("quota exceeded: {remaining} units remaining, window resets in {reset_in_secs}s")]
    QuotaExceeded { remaining: u64, reset_in_secs: u64 },

    /// A transient upstream failure (network, 5xx, remote throttling).
    #[error("transient upstream failure: {0}")]
    Transient(String),

    /// A permanent upstream failure (bad input, not found, authorization).
    #[error("permanent upstream failure: {0}")]
    Permanent(String),

    /// All retry attempts failed; wraps the last transient cause.
    #[error("retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// A resource URI did not match the `vidway://{kind}/{id}` form.
    #[error("invalid resource URI: {0}")]
    InvalidUri(String),

    /// Entity not found with type information.
    #[error("not found: {entity} '{id}'")]
    NotFound { entity: &'static str, id: String },

    /// A durable write or read against the backing store failed.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation).
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Creates a NotFound error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates a Transient error.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    /// Creates a Permanent error.
    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Permanent(message.into())
    }

    /// Creates a Storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates a Config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a QuotaExceeded error.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }

    /// Check if this failure could succeed on a later attempt.
    ///
    /// True for `Transient` and `RetriesExhausted` (the underlying cause was
    /// transient); quota exhaustion is not transient within a window.
    pub fn is_retryable_later(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::RetriesExhausted { .. })
    }

    /// Check if this is a storage failure.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for GatewayError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, GatewayError>`.
pub type Result<T> = std::result::Result<T, GatewayError>;
