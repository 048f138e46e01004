//! `chrome.storage.local`-backed asynchronous tier.

use ext_host::{AsyncKv, AsyncKvFuture, StorageError};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default)]
/// Asynchronous tier backed by the extension's `chrome.storage.local` area.
pub struct ChromeLocalStorageKv;

impl AsyncKv for ChromeLocalStorageKv {
    fn read_many<'a>(
        &'a self,
        keys: &'a [&'a str],
    ) -> AsyncKvFuture<'a, Result<Map<String, Value>, StorageError>> {
        Box::pin(async move { crate::bridge::storage_local_get(keys).await })
    }

    fn write_many<'a>(
        &'a self,
        entries: &'a Map<String, Value>,
    ) -> AsyncKvFuture<'a, Result<(), StorageError>> {
        Box::pin(async move { crate::bridge::storage_local_set(entries).await })
    }

    fn remove_many<'a>(
        &'a self,
        keys: &'a [&'a str],
    ) -> AsyncKvFuture<'a, Result<(), StorageError>> {
        Box::pin(async move { crate::bridge::storage_local_remove(keys).await })
    }
}
