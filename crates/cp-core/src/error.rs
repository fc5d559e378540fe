//! # AppError
//!
//! Centralized error handling for the Commonplace ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all cp-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., User, Content, Comment)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Registration collision on the unique username column
    #[error("username '{0}' is already taken")]
    DuplicateUsername(String),

    /// Login mismatch; unknown name and wrong password are indistinguishable
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Validation failure (e.g., empty title, reply on a video)
    #[error("validation error: {0}")]
    Validation(String),

    /// A gated mutation attempted without the required session or role
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Infrastructure failure (e.g., DB down, blob store unwritable)
    #[error("internal service error: {0}")]
    Internal(String),
}

/// A specialized Result type for Commonplace logic.
pub type Result<T> = std::result::Result<T, AppError>;
