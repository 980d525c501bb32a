//! Error types for the ticket cache.

use crate::types::TicketId;
use thiserror::Error;

/// Main error type for cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Unknown event type: {0}")]
    UnknownEvent(String),

    #[error("Source unavailable: {0}")]
    Source(#[from] SourceError),

    #[error("Index inconsistent for ticket {id}: {detail}")]
    Inconsistent { id: TicketId, detail: String },
}

/// Failure reported by an external collaborator (event source or repository).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Backend(String),
}

impl SourceError {
    pub fn backend(msg: impl Into<String>) -> Self {
        SourceError::Backend(msg.into())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::Decode(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for CacheError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        CacheError::Encode(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for CacheError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        CacheError::Decode(e.to_string())
    }
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
