// Error types for the relay
//
// Every variant belongs to exactly one ErrorCategory. The server maps categories
// to HTTP statuses; the enrichment queue only logs and reports them.

use thiserror::Error;

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

/// How an error surfaces to the webhook caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Signature mismatch (401)
    AuthenticationFailure,
    /// Request could not be classified or parsed (400)
    MalformedRequest,
    /// Anything unexpected on the synchronous path (500)
    InternalFault,
    /// Read or write API failure during deferred enrichment (logged only)
    DownstreamFault,
}

/// Errors that can occur while relaying a webhook
#[derive(Debug, Error)]
pub enum RelayError {
    /// Supplied signature does not match the computed digest
    #[error("Signature mismatch")]
    SignatureMismatch,

    /// Neither handshake nor signature header was present
    #[error("Request carries neither x-hook-secret nor x-hook-signature")]
    UnrecognizedRequest,

    /// Request body or header could not be decoded
    #[error("Malformed request: {0}")]
    Malformed(String),

    /// Task detail fetch failed
    #[error("Task source error: {0}")]
    TaskSource(String),

    /// Record submission failed
    #[error("Record sink error: {0}")]
    RecordSink(String),

    /// Enrichment queue has no room for another job
    #[error("Enrichment queue full ({0} jobs waiting)")]
    QueueFull(usize),

    /// Enrichment queue no longer accepts jobs
    #[error("Enrichment queue closed")]
    QueueClosed,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl RelayError {
    /// Create a malformed request error
    pub fn malformed(msg: impl Into<String>) -> Self {
        RelayError::Malformed(msg.into())
    }

    /// Create a task source error
    pub fn task_source(msg: impl Into<String>) -> Self {
        RelayError::TaskSource(msg.into())
    }

    /// Create a record sink error
    pub fn record_sink(msg: impl Into<String>) -> Self {
        RelayError::RecordSink(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        RelayError::Configuration(msg.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            RelayError::SignatureMismatch => ErrorCategory::AuthenticationFailure,
            RelayError::UnrecognizedRequest | RelayError::Malformed(_) => {
                ErrorCategory::MalformedRequest
            }
            RelayError::TaskSource(_) | RelayError::RecordSink(_) => ErrorCategory::DownstreamFault,
            RelayError::QueueFull(_)
            | RelayError::QueueClosed
            | RelayError::Configuration(_)
            | RelayError::Internal(_) => ErrorCategory::InternalFault,
        }
    }
}
