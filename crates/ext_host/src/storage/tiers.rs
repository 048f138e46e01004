//! Synchronous and asynchronous key/value tier contracts and adapters.
//!
//! The two tiers are separate traits because their failure and suspension semantics differ: the
//! synchronous tier stores raw JSON text and fails inline, the asynchronous tier stores structured
//! JSON values and fails when its future resolves.

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

use serde_json::{Map, Value};

use super::error::StorageError;

/// Object-safe boxed future used by [`AsyncKv`] methods.
pub type AsyncKvFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Synchronous raw-string key/value tier (bounded capacity, fails inline on overflow).
pub trait SyncKv {
    /// Reads the raw JSON string stored under `key`.
    fn read_raw(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes a raw JSON string under `key`.
    ///
    /// Returns [`StorageError::QuotaExceeded`] when the write does not fit.
    fn write_raw(&self, key: &str, raw_json: &str) -> Result<(), StorageError>;

    /// Deletes `key`. Deleting a missing key succeeds.
    fn delete_raw(&self, key: &str) -> Result<(), StorageError>;
}

/// Asynchronous structured key/value tier.
pub trait AsyncKv {
    /// Reads the subset of `keys` that are present.
    fn read_many<'a>(
        &'a self,
        keys: &'a [&'a str],
    ) -> AsyncKvFuture<'a, Result<Map<String, Value>, StorageError>>;

    /// Writes every entry of `entries` as one batch; either all entries land or none do.
    fn write_many<'a>(
        &'a self,
        entries: &'a Map<String, Value>,
    ) -> AsyncKvFuture<'a, Result<(), StorageError>>;

    /// Removes `keys`. Missing keys are ignored.
    fn remove_many<'a>(
        &'a self,
        keys: &'a [&'a str],
    ) -> AsyncKvFuture<'a, Result<(), StorageError>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op synchronous tier for unsupported targets.
pub struct NoopSyncKv;

impl SyncKv for NoopSyncKv {
    fn read_raw(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn write_raw(&self, _key: &str, _raw_json: &str) -> Result<(), StorageError> {
        Ok(())
    }

    fn delete_raw(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op asynchronous tier for unsupported targets.
pub struct NoopAsyncKv;

impl AsyncKv for NoopAsyncKv {
    fn read_many<'a>(
        &'a self,
        _keys: &'a [&'a str],
    ) -> AsyncKvFuture<'a, Result<Map<String, Value>, StorageError>> {
        Box::pin(async { Ok(Map::new()) })
    }

    fn write_many<'a>(
        &'a self,
        _entries: &'a Map<String, Value>,
    ) -> AsyncKvFuture<'a, Result<(), StorageError>> {
        Box::pin(async { Ok(()) })
    }

    fn remove_many<'a>(
        &'a self,
        _keys: &'a [&'a str],
    ) -> AsyncKvFuture<'a, Result<(), StorageError>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory synchronous tier with an optional byte quota.
///
/// Usage is the sum of key and value lengths. Clones share the same entries.
pub struct MemorySyncKv {
    inner: Rc<RefCell<HashMap<String, String>>>,
    quota_bytes: Option<usize>,
}

impl MemorySyncKv {
    /// Creates an empty tier that rejects writes once usage would exceed `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            inner: Rc::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Returns current usage in bytes.
    pub fn used_bytes(&self) -> usize {
        self.inner
            .borrow()
            .iter()
            .map(|(key, value)| key.len() + value.len())
            .sum()
    }

    /// Returns the number of stored keys.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Returns `true` when no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl SyncKv for MemorySyncKv {
    fn read_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner.borrow().get(key).cloned())
    }

    fn write_raw(&self, key: &str, raw_json: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota_bytes {
            let replaced = self
                .inner
                .borrow()
                .get(key)
                .map_or(0, |old| key.len() + old.len());
            let projected = self.used_bytes() - replaced + key.len() + raw_json.len();
            if projected > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                });
            }
        }
        self.inner
            .borrow_mut()
            .insert(key.to_string(), raw_json.to_string());
        Ok(())
    }

    fn delete_raw(&self, key: &str) -> Result<(), StorageError> {
        self.inner.borrow_mut().remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory asynchronous tier with an optional byte quota and atomic batches.
///
/// Usage is the sum of key lengths and serialized value lengths. Clones share the same entries.
pub struct MemoryAsyncKv {
    inner: Rc<RefCell<HashMap<String, Value>>>,
    quota_bytes: Option<usize>,
}

impl MemoryAsyncKv {
    /// Creates an empty tier that rejects batches once usage would exceed `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            inner: Rc::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Returns current usage in bytes.
    pub fn used_bytes(&self) -> usize {
        self.inner
            .borrow()
            .iter()
            .map(|(key, value)| entry_bytes(key, value))
            .sum()
    }

    /// Returns a clone of the value stored under `key`.
    pub fn peek(&self, key: &str) -> Option<Value> {
        self.inner.borrow().get(key).cloned()
    }
}

fn entry_bytes(key: &str, value: &Value) -> usize {
    key.len() + value.to_string().len()
}

impl AsyncKv for MemoryAsyncKv {
    fn read_many<'a>(
        &'a self,
        keys: &'a [&'a str],
    ) -> AsyncKvFuture<'a, Result<Map<String, Value>, StorageError>> {
        Box::pin(async move {
            let inner = self.inner.borrow();
            let found: Map<String, Value> = keys
                .iter()
                .filter_map(|key| inner.get(*key).map(|value| (key.to_string(), value.clone())))
                .collect();
            Ok(found)
        })
    }

    fn write_many<'a>(
        &'a self,
        entries: &'a Map<String, Value>,
    ) -> AsyncKvFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            if let Some(quota) = self.quota_bytes {
                let inner = self.inner.borrow();
                let mut projected = self.used_bytes();
                for (key, value) in entries {
                    projected -= inner.get(key).map_or(0, |old| entry_bytes(key, old));
                    projected += entry_bytes(key, value);
                }
                if projected > quota {
                    let key = entries.keys().next().cloned().unwrap_or_default();
                    return Err(StorageError::QuotaExceeded { key });
                }
            }
            let mut inner = self.inner.borrow_mut();
            for (key, value) in entries {
                inner.insert(key.clone(), value.clone());
            }
            Ok(())
        })
    }

    fn remove_many<'a>(
        &'a self,
        keys: &'a [&'a str],
    ) -> AsyncKvFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let mut inner = self.inner.borrow_mut();
            for key in keys {
                inner.remove(*key);
            }
            Ok(())
        })
    }
}
