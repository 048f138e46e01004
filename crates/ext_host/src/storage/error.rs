//! Storage error taxonomy shared by both tiers.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Errors raised by storage tiers and codec helpers.
pub enum StorageError {
    /// The write would exceed the tier's storage quota.
    #[error("storage quota exceeded while writing `{key}`")]
    QuotaExceeded {
        /// Key whose write was rejected.
        key: String,
    },
    /// The backing storage API is not reachable in this context.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// Any other backend failure.
    #[error("storage backend failure: {0}")]
    Backend(String),
    /// A value could not be encoded or decoded as JSON.
    #[error("json codec failure: {0}")]
    Codec(String),
}

impl StorageError {
    /// Returns `true` for capacity failures.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}
