//! Error types for drive-gateway
//!
//! This module provides the error taxonomy for the gateway:
//! - A coarse I/O-class category (local I/O, network, Drive API failures)
//! - Gateway lifecycle failures (shutdown, saturated queue, aborted jobs)
//! - Parsing of the Drive REST error envelope into structured errors

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for drive-gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message used when the storage collaborator answers a create request with nothing
pub const NULL_CREATE_RESULT: &str = "Null result when requesting file creation.";

/// Message used when a document handle has no metadata row
pub const EMPTY_CURSOR: &str = "Empty cursor returned for file.";

/// Main error type for drive-gateway
///
/// Every pending operation resolves to either its value or one of these variants.
/// Underlying failures are carried unmodified so the caller decides how to present them.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "queue_capacity")
        key: Option<String>,
    },

    /// I/O error (local file access, stream reads, empty results)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error talking to the remote storage service
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The remote storage service answered with a non-success status
    #[error("Drive API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the service
        status: u16,
        /// Message from the service's error envelope, or the raw body
        message: String,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Document handle could not be interpreted by the content resolver
    #[error("invalid document handle: {0}")]
    InvalidHandle(String),

    /// Shutdown in progress - not accepting new operations
    #[error("shutdown in progress: not accepting new operations")]
    ShuttingDown,

    /// The bounded work queue was full when the operation was submitted
    #[error("work queue is full ({capacity} operations pending)")]
    QueueFull {
        /// Configured capacity of the work queue
        capacity: usize,
    },

    /// The worker dropped the operation before producing a result
    #[error("operation aborted before completion")]
    Aborted,
}

impl Error {
    /// Create an I/O-class error for a create request that produced no file
    pub(crate) fn null_create_result() -> Self {
        Error::Io(std::io::Error::other(NULL_CREATE_RESULT))
    }

    /// Create an I/O-class error for a document handle without metadata
    pub(crate) fn empty_cursor() -> Self {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            EMPTY_CURSOR,
        ))
    }

    /// Whether this error belongs to the coarse I/O failure category
    ///
    /// Local I/O, network and Drive API failures are all I/O-class, as is a
    /// document handle the resolver cannot interpret. Lifecycle errors of the
    /// gateway itself and configuration errors are not.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::Network(_) | Error::Api { .. } | Error::InvalidHandle(_)
        )
    }

    /// Build an [`Error::Api`] from a Drive error response body
    ///
    /// Falls back to the raw body (or the status reason) when the body is not
    /// a Drive error envelope.
    pub(crate) fn from_api_response(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<DriveErrorEnvelope>(body) {
            Ok(envelope) => envelope.error.message,
            Err(_) if body.trim().is_empty() => reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("unknown error")
                .to_string(),
            Err(_) => body.trim().to_string(),
        };
        Error::Api { status, message }
    }
}

/// Error envelope returned by the Drive REST API
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": 404,
///     "message": "File not found: abc123."
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveErrorEnvelope {
    /// The error details
    pub error: DriveErrorDetail,
}

/// Detailed error information from a Drive error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveErrorDetail {
    /// HTTP status code echoed by the service
    #[serde(default)]
    pub code: u16,

    /// Human-readable error message
    pub message: String,

    /// Per-reason breakdown, when the service provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<serde_json::Value>,
}
