//! Error contracts for the opaque store and cache adapters.
//!
//! The relational store and the ephemeral code cache are external
//! collaborators; these enums are the whole of what the service layer is
//! allowed to know about their failures.

use thiserror::Error;

/// Errors surfaced by the credential / problem store adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A native uniqueness constraint rejected a write.
    ///
    /// This is the canonical duplicate-detection signal: the pre-insert
    /// existence checks are a fast path, not the correctness mechanism,
    /// so a duplicate surfaced at write time must be mapped to the same
    /// status as a pre-check hit.
    #[error("duplicate value for unique field {field}")]
    Duplicate { field: &'static str },

    /// The addressed record does not exist.
    #[error("record not found")]
    NotFound,

    /// Anything else the backend reports (connection loss, I/O, ...).
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by the ephemeral code cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The challenge is absent or past its nominal lifetime.
    /// Absent and expired are indistinguishable by design.
    #[error("verification code expired")]
    Expired,

    /// Backend failure (connection loss, serialization, ...).
    #[error("cache backend error: {0}")]
    Backend(String),
}
