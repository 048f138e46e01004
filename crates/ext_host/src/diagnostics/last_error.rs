//! Persisted record of the most recent user-facing error.

use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::storage::{error::StorageError, tiers::AsyncKv};

/// Asynchronous-tier key holding the serialized [`LastError`].
pub const LAST_ERROR_KEY: &str = "lastError";

/// Title used when none is supplied.
pub const DEFAULT_TITLE: &str = "An error occurred";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// The last error shown to (or hidden from) the user, kept so an options page can display it.
pub struct LastError {
    /// Short title.
    pub title: String,
    /// Error message. Empty means "no error".
    pub message: String,
    /// Optional stack or context text.
    pub stack: String,
}

impl Default for LastError {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            message: String::new(),
            stack: String::new(),
        }
    }
}

impl LastError {
    /// Creates a record with `title` and `message` and no stack.
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            stack: String::new(),
        }
    }

    /// Returns `true` when the record carries no message.
    pub fn is_empty(&self) -> bool {
        self.message.is_empty()
    }

    /// Loads the stored record, or an empty one when none is stored.
    ///
    /// # Errors
    ///
    /// Returns the tier error, or [`StorageError::Codec`] for a malformed record.
    pub async fn load<A: AsyncKv + ?Sized>(tier: &A) -> Result<Self, StorageError> {
        let mut found = tier.read_many(&[LAST_ERROR_KEY]).await?;
        match found.remove(LAST_ERROR_KEY) {
            Some(value) if !value.is_null() => {
                serde_json::from_value(value).map_err(|err| StorageError::Codec(err.to_string()))
            }
            _ => Ok(Self::default()),
        }
    }

    /// Stores this record, replacing the previous one.
    ///
    /// # Errors
    ///
    /// Returns the tier error.
    pub async fn save<A: AsyncKv + ?Sized>(&self, tier: &A) -> Result<(), StorageError> {
        let value =
            serde_json::to_value(self).map_err(|err| StorageError::Codec(err.to_string()))?;
        let mut entries = Map::new();
        entries.insert(LAST_ERROR_KEY.to_string(), value);
        tier.write_many(&entries).await
    }

    /// Replaces the stored record with an empty one.
    ///
    /// # Errors
    ///
    /// Returns the tier error.
    pub async fn reset<A: AsyncKv + ?Sized>(tier: &A) -> Result<(), StorageError> {
        Self::default().save(tier).await
    }
}
