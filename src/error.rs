//! Error types for mcmeta
//!
//! Provides a unified error type for all client operations.

use thiserror::Error;

/// Result type alias using MetaError
pub type Result<T> = std::result::Result<T, MetaError>;

/// Unified error type for mcmeta operations
#[derive(Debug, Error)]
pub enum MetaError {
    // -------------------------------------------------------------------------
    // Wire Errors (connection is discarded)
    // -------------------------------------------------------------------------
    /// Status line or flag token did not match the meta grammar
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Declared value length could not be satisfied
    #[error("Framing error: {0}")]
    Framing(String),

    // -------------------------------------------------------------------------
    // Transport Errors (connection is discarded, reconnect on next call)
    // -------------------------------------------------------------------------
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    // -------------------------------------------------------------------------
    // Semantic Errors (connection stays usable)
    // -------------------------------------------------------------------------
    #[error("Key not found")]
    NotFound,

    #[error("CAS conflict: token is stale")]
    CasConflict,

    #[error("Precondition failed: item not stored")]
    PreconditionFailed,

    /// `SERVER_ERROR`, `CLIENT_ERROR` or bare `ERROR` replies
    #[error("Server error: {0}")]
    Server(String),

    // -------------------------------------------------------------------------
    // Caller Errors (raised before any I/O)
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MetaError {
    /// True for transport-level failures, timeouts included
    pub fn is_connection_error(&self) -> bool {
        matches!(self, MetaError::Connection(_) | MetaError::Timeout(_))
    }

    /// True when the connection can no longer be trusted mid-stream
    pub fn invalidates_connection(&self) -> bool {
        matches!(
            self,
            MetaError::Protocol(_)
                | MetaError::Framing(_)
                | MetaError::Connection(_)
                | MetaError::Timeout(_)
        )
    }

    /// True when a read-only request may be replayed on a fresh connection
    pub fn is_retryable(&self) -> bool {
        self.is_connection_error()
    }

    /// Short, stable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            MetaError::Protocol(_) => "protocol",
            MetaError::Framing(_) => "framing",
            MetaError::Connection(_) => "connection",
            MetaError::Timeout(_) => "timeout",
            MetaError::NotFound => "not_found",
            MetaError::CasConflict => "cas_conflict",
            MetaError::PreconditionFailed => "precondition_failed",
            MetaError::Server(_) => "server",
            MetaError::Configuration(_) => "configuration",
            MetaError::Serialization(_) => "serialization",
        }
    }
}

impl From<bincode::Error> for MetaError {
    fn from(err: bincode::Error) -> Self {
        MetaError::Serialization(err.to_string())
    }
}
