//! # AppError
//!
//! Centralized error handling for the PinPoint ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all domain operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// No signed-in identity where one is required (submit, update, delete)
    #[error("user is not authenticated")]
    Unauthenticated,

    /// Caller identity does not match the record's owner on a mutation
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found (e.g., lost-item document, blob path)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Client-side validation failure (e.g., required field left blank)
    #[error("validation error: {0}")]
    Validation(String),

    /// Blob upload or deletion failed (network/store-side)
    #[error("upload error: {0}")]
    Upload(String),

    /// Document-store write failure, carrying the store's message verbatim
    #[error("write error: {0}")]
    Write(String),

    /// Document-store read failure
    #[error("read error: {0}")]
    Read(String),

    /// An individual document failed to parse into a `LostItemRecord`.
    /// Point-recovered during stream processing: the document is dropped
    /// from the snapshot instead of failing the whole subscription.
    #[error("malformed record {0}: {1}")]
    MalformedRecord(String, String),
}

/// A specialized Result type for PinPoint logic.
pub type Result<T> = std::result::Result<T, AppError>;
