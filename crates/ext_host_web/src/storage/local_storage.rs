//! `localStorage`-backed synchronous tier.
//!
//! The browser API is synchronous and throws `QuotaExceededError` on overflow, which surfaces as
//! [`StorageError::QuotaExceeded`].

use ext_host::{StorageError, SyncKv};

#[derive(Debug, Clone, Copy, Default)]
/// Synchronous tier backed by `window.localStorage`.
pub struct WebLocalStorageKv;

impl SyncKv for WebLocalStorageKv {
    fn read_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        crate::bridge::local_storage_get(key)
    }

    fn write_raw(&self, key: &str, raw_json: &str) -> Result<(), StorageError> {
        crate::bridge::local_storage_set(key, raw_json)
    }

    fn delete_raw(&self, key: &str) -> Result<(), StorageError> {
        crate::bridge::local_storage_remove(key)
    }
}
