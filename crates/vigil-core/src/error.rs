// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Vigil alerting service.

use thiserror::Error;

use crate::alert::{AlertValidationError, LifecycleError};
use crate::rule::RuleValidationError;
use crate::valueobject::{EmailError, PasswordError};

/// The primary error type used across all Vigil crates.
///
/// Storage-specific failures are translated into the generic variants
/// (`NotFound`, `DuplicateKey`, `ForeignKeyViolation`, `InvalidData`,
/// `Connection`) at the storage boundary so callers never see backend types.
#[derive(Debug, Error)]
pub enum VigilError {
    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Alert entity validation failed.
    #[error(transparent)]
    InvalidAlert(#[from] AlertValidationError),

    /// Alert rule validation failed.
    #[error(transparent)]
    InvalidRule(#[from] RuleValidationError),

    /// Email address validation failed.
    #[error(transparent)]
    InvalidEmail(#[from] EmailError),

    /// Password policy validation failed.
    #[error(transparent)]
    InvalidPassword(#[from] PasswordError),

    /// Generic input validation failure (pagination bounds, enum parses).
    #[error("validation error: {0}")]
    Validation(String),

    /// An alert lifecycle transition was rejected by the state machine.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// The requested alert does not exist.
    #[error("alert not found")]
    AlertNotFound,

    /// The requested resource does not exist.
    #[error("resource not found")]
    NotFound,

    /// Unique constraint violation.
    #[error("duplicate key violation")]
    DuplicateKey,

    /// Reference to a non-existent resource.
    #[error("foreign key violation")]
    ForeignKeyViolation,

    /// The stored or provided data violates a constraint.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Connection problem with a storage backend.
    #[error("connection error: {0}")]
    Connection(String),

    /// Other storage backend errors.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Event bus errors (publish failure, stream read failure).
    #[error("bus error: {message}")]
    Bus {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A circuit breaker rejected the call without reaching the sink.
    #[error("circuit breaker '{name}' is open")]
    CircuitOpen { name: String },

    /// Operation exceeded its deadline.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// The caller's scope was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// Notification sink failure.
    #[error("notification error: {0}")]
    Notification(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VigilError {
    /// Whether a failed operation may be retried.
    ///
    /// Cancellation and deadline expiry are never retried; validation and
    /// lifecycle rejections are deterministic and retrying cannot help.
    /// Everything else is treated as transient.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            VigilError::Cancelled
                | VigilError::Timeout { .. }
                | VigilError::Validation(_)
                | VigilError::InvalidAlert(_)
                | VigilError::InvalidRule(_)
                | VigilError::InvalidEmail(_)
                | VigilError::InvalidPassword(_)
                | VigilError::Lifecycle(_)
        )
    }
}
