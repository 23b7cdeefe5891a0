//! # AppError
//!
//! Centralized error handling for the Hearthline ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all hl-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Referenced entity id has no document (e.g., Thread, Post, User)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Authorization failure: the actor is not the creator/author
    #[error("not allowed: {0}")]
    NotAllowed(String),

    /// Validation failure (e.g., empty title, invalid profile choice)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Session/credential failure (e.g., bad password, missing session)
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Resource already exists (e.g., duplicate username)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure, including a failed second step of a
    /// multi-document orchestration (DB down, compensation failed)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for the common "entity X with id Y is gone" case.
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        AppError::NotFound(entity.to_string(), id.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

/// A specialized Result type for Hearthline logic.
pub type Result<T> = std::result::Result<T, AppError>;
