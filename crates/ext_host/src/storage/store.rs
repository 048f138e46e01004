//! JSON key/value store over a synchronous and an asynchronous tier.
//!
//! Values are JSON-encoded. Anything that encodes to `null` (`None`, `()`, `Value::Null`) is the
//! empty sentinel: writing it deletes the key. The `safe_set` family never fails loudly; a
//! rejected write is rolled back, optionally mirrored into a companion boolean key, and announced
//! with a best-effort [`Message::StorageExceeded`] broadcast.

use std::rc::Rc;

use futures::task::{LocalSpawn, LocalSpawnExt};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use super::{
    codec::{self, NULL_JSON},
    error::StorageError,
    tiers::{AsyncKv, SyncKv},
};
use crate::diagnostics::reporter::ErrorReporter;
use crate::messaging::{Message, Messenger};

/// Origin tag for synchronous tier read failures.
pub const GET_ORIGIN: &str = "ExtStorage.get";
/// Origin tag for asynchronous tier read failures.
pub const ASYNC_GET_ORIGIN: &str = "ExtStorage.asyncGet";

/// Collaborators shared by the store: error reporting and the failure broadcast.
#[derive(Clone)]
pub struct StoreServices {
    /// Sink for codec and read failures.
    pub reporter: Rc<dyn ErrorReporter>,
    /// Channel used for [`Message::StorageExceeded`].
    pub messenger: Rc<dyn Messenger>,
    /// Executor for detached notifications.
    pub spawner: Rc<dyn LocalSpawn>,
}

/// JSON store with get/set/safe-set over both storage tiers.
#[derive(Clone)]
pub struct KeyValueStore {
    sync_tier: Rc<dyn SyncKv>,
    async_tier: Rc<dyn AsyncKv>,
    services: StoreServices,
}

impl KeyValueStore {
    /// Creates a store over the given tiers.
    pub fn new(
        sync_tier: Rc<dyn SyncKv>,
        async_tier: Rc<dyn AsyncKv>,
        services: StoreServices,
    ) -> Self {
        Self {
            sync_tier,
            async_tier,
            services,
        }
    }

    /// Returns the injected collaborators.
    pub fn services(&self) -> &StoreServices {
        &self.services
    }

    fn reporter(&self) -> &dyn ErrorReporter {
        self.services.reporter.as_ref()
    }

    fn read_raw(&self, key: &str) -> Option<String> {
        match self.sync_tier.read_raw(key) {
            Ok(raw) => raw,
            Err(err) => {
                self.reporter().report_error(&err.to_string(), GET_ORIGIN);
                None
            }
        }
    }

    fn lookup<T: DeserializeOwned>(&self, key: &str, default: Option<T>) -> Option<T> {
        match self.read_raw(key) {
            Some(raw) => codec::parse(self.reporter(), &raw),
            None => default,
        }
    }

    /// Reads and decodes `key` from the synchronous tier.
    ///
    /// Undecodable content is reported and reads as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.lookup(key, None)
    }

    /// Like [`KeyValueStore::get`], returning `default` when the key is absent.
    ///
    /// A present but undecodable value still reads as `None`.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Option<T> {
        self.lookup(key, Some(default))
    }

    fn write_encoded(&self, key: &str, raw: &str) -> Result<(), StorageError> {
        if raw == NULL_JSON {
            tracing::debug!(key, "null sentinel written, deleting key");
            self.sync_tier.delete_raw(key)
        } else {
            self.sync_tier.write_raw(key, raw)
        }
    }

    /// Encodes and writes `value`; the null sentinel deletes `key`.
    ///
    /// An encoding failure is reported and the write is skipped, leaving `key` unchanged.
    ///
    /// # Errors
    ///
    /// Returns the tier error, typically [`StorageError::QuotaExceeded`].
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let Some(raw) = codec::stringify(self.reporter(), value) else {
            return Ok(());
        };
        self.write_encoded(key, &raw)
    }

    /// Deletes `key` from the synchronous tier.
    ///
    /// # Errors
    ///
    /// Returns the tier error.
    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.sync_tier.delete_raw(key)
    }

    /// Writes `value` only if it fits, restoring the previous value otherwise.
    ///
    /// On a rejected write the previous raw value is written back (or the key deleted when there
    /// was none), `companion_key` is set to whether the restored value is non-empty, and one
    /// [`Message::StorageExceeded`] is dispatched. Returns `false` on any failure, including a
    /// value that cannot be encoded (which writes nothing and broadcasts nothing).
    pub fn safe_set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        companion_key: Option<&str>,
    ) -> bool {
        let Some(raw) = codec::stringify(self.reporter(), value) else {
            return false;
        };
        let previous = self.read_raw(key);
        let Err(err) = self.write_encoded(key, &raw) else {
            return true;
        };

        tracing::debug!(key, error = %err, "write rejected, restoring previous value");
        let restored = match previous.as_deref() {
            Some(old) => self.sync_tier.write_raw(key, old),
            None => self.sync_tier.delete_raw(key),
        };
        if let Err(err) = restored {
            tracing::warn!(key, error = %err, "failed to restore previous value");
        }

        if let Some(companion) = companion_key {
            let non_empty = previous.as_deref().is_some_and(codec::is_raw_non_empty);
            if let Err(err) = self.set(companion, &non_empty) {
                tracing::warn!(key = companion, error = %err, "failed to update companion key");
            }
        }

        self.notify_storage_exceeded();
        false
    }

    async fn async_lookup<T: DeserializeOwned>(&self, key: &str, default: Option<T>) -> Option<T> {
        let keys = [key];
        match self.async_tier.read_many(&keys).await {
            Ok(mut found) => match found.remove(key) {
                None => default,
                Some(Value::Null) => None,
                Some(value) => codec::from_value(self.reporter(), value),
            },
            Err(err) => {
                self.reporter()
                    .report_error(&err.to_string(), ASYNC_GET_ORIGIN);
                default
            }
        }
    }

    /// Reads and decodes `key` from the asynchronous tier.
    ///
    /// Tier failures are reported and read as `None`.
    pub async fn async_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.async_lookup(key, None).await
    }

    /// Like [`KeyValueStore::async_get`], returning `default` when the key is absent or the tier
    /// read fails. A stored `null` still reads as `None`.
    pub async fn async_get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Option<T> {
        self.async_lookup(key, Some(default)).await
    }

    /// Writes `value` to the asynchronous tier if it fits; the null sentinel removes `key`.
    ///
    /// Tier batches are atomic, so a rejected write leaves `key` untouched and needs no rollback.
    /// As with [`KeyValueStore::safe_set`], `companion_key` is only written on failure, set to
    /// whether the current value is non-empty, and one [`Message::StorageExceeded`] is
    /// dispatched. Returns `false` on any failure.
    pub async fn async_set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        companion_key: Option<&str>,
    ) -> bool {
        let Some(value) = codec::to_value(self.reporter(), value) else {
            return false;
        };
        let keys = [key];
        let written = if value.is_null() {
            self.async_tier.remove_many(&keys).await
        } else {
            let mut entries = Map::new();
            entries.insert(key.to_string(), value);
            self.async_tier.write_many(&entries).await
        };
        let Err(err) = written else {
            return true;
        };
        tracing::debug!(key, error = %err, "async write rejected");

        if let Some(companion) = companion_key {
            let current: Option<Value> = self.async_get(key).await;
            let non_empty = current.as_ref().is_some_and(codec::is_non_empty);
            let mut entries = Map::new();
            entries.insert(companion.to_string(), Value::Bool(non_empty));
            if let Err(err) = self.async_tier.write_many(&entries).await {
                tracing::warn!(key = companion, error = %err, "failed to update companion key");
            }
        }

        self.notify_storage_exceeded();
        false
    }

    fn notify_storage_exceeded(&self) {
        let delivery = self.services.messenger.send(&Message::StorageExceeded);
        let spawned = self.services.spawner.spawn_local(async move {
            let _ = delivery.await;
        });
        if let Err(err) = spawned {
            tracing::debug!(error = %err, "storage exceeded notification not dispatched");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, collections::BTreeMap};

    use futures::executor::{block_on, LocalPool};
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::diagnostics::reporter::MemoryErrorReporter;
    use crate::messaging::{MemoryMessenger, MessageError};
    use crate::storage::codec::{PARSE_ORIGIN, STRINGIFY_ORIGIN};
    use crate::storage::tiers::{AsyncKvFuture, MemoryAsyncKv, MemorySyncKv};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Settings {
        enabled: bool,
        photos: Vec<String>,
    }

    fn backend_failure() -> StorageError {
        StorageError::Backend("disk I/O error".into())
    }

    fn take_failure(remaining: &Cell<usize>) -> bool {
        match remaining.get() {
            0 => false,
            n => {
                remaining.set(n - 1);
                true
            }
        }
    }

    /// Memory tier that can be told to fail reads or the next few writes.
    #[derive(Clone, Default)]
    struct FlakySyncKv {
        inner: MemorySyncKv,
        fail_reads: Rc<Cell<bool>>,
        failing_writes: Rc<Cell<usize>>,
    }

    impl SyncKv for FlakySyncKv {
        fn read_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
            if self.fail_reads.get() {
                return Err(backend_failure());
            }
            self.inner.read_raw(key)
        }

        fn write_raw(&self, key: &str, raw_json: &str) -> Result<(), StorageError> {
            if take_failure(&self.failing_writes) {
                return Err(backend_failure());
            }
            self.inner.write_raw(key, raw_json)
        }

        fn delete_raw(&self, key: &str) -> Result<(), StorageError> {
            self.inner.delete_raw(key)
        }
    }

    #[derive(Clone, Default)]
    struct FlakyAsyncKv {
        inner: MemoryAsyncKv,
        fail_reads: Rc<Cell<bool>>,
        failing_writes: Rc<Cell<usize>>,
    }

    impl AsyncKv for FlakyAsyncKv {
        fn read_many<'a>(
            &'a self,
            keys: &'a [&'a str],
        ) -> AsyncKvFuture<'a, Result<Map<String, Value>, StorageError>> {
            if self.fail_reads.get() {
                return Box::pin(async { Err(backend_failure()) });
            }
            self.inner.read_many(keys)
        }

        fn write_many<'a>(
            &'a self,
            entries: &'a Map<String, Value>,
        ) -> AsyncKvFuture<'a, Result<(), StorageError>> {
            if take_failure(&self.failing_writes) {
                return Box::pin(async { Err(backend_failure()) });
            }
            self.inner.write_many(entries)
        }

        fn remove_many<'a>(
            &'a self,
            keys: &'a [&'a str],
        ) -> AsyncKvFuture<'a, Result<(), StorageError>> {
            self.inner.remove_many(keys)
        }
    }

    struct Harness {
        pool: LocalPool,
        sync_tier: MemorySyncKv,
        async_tier: MemoryAsyncKv,
        flaky_sync: FlakySyncKv,
        flaky_async: FlakyAsyncKv,
        reporter: MemoryErrorReporter,
        messenger: MemoryMessenger,
        store: KeyValueStore,
    }

    impl Harness {
        fn new(sync_tier: MemorySyncKv, async_tier: MemoryAsyncKv) -> Self {
            let pool = LocalPool::new();
            let reporter = MemoryErrorReporter::default();
            let messenger = MemoryMessenger::default();
            let flaky_sync = FlakySyncKv {
                inner: sync_tier.clone(),
                ..FlakySyncKv::default()
            };
            let flaky_async = FlakyAsyncKv {
                inner: async_tier.clone(),
                ..FlakyAsyncKv::default()
            };
            let store = KeyValueStore::new(
                Rc::new(flaky_sync.clone()),
                Rc::new(flaky_async.clone()),
                StoreServices {
                    reporter: Rc::new(reporter.clone()),
                    messenger: Rc::new(messenger.clone()),
                    spawner: Rc::new(pool.spawner()),
                },
            );
            Self {
                pool,
                sync_tier,
                async_tier,
                flaky_sync,
                flaky_async,
                reporter,
                messenger,
                store,
            }
        }

        fn unbounded() -> Self {
            Self::new(MemorySyncKv::default(), MemoryAsyncKv::default())
        }

        fn exceeded_count(&mut self) -> usize {
            self.pool.run_until_stalled();
            self.messenger
                .delivered()
                .iter()
                .filter(|message| **message == Message::StorageExceeded)
                .count()
        }
    }

    #[test]
    fn get_or_distinguishes_absent_from_corrupt() {
        let h = Harness::unbounded();
        assert_eq!(h.store.get::<u32>("missing"), None);
        assert_eq!(h.store.get_or("missing", 7_u32), Some(7));

        h.sync_tier.write_raw("corrupt", "{oops").expect("seed");
        assert_eq!(h.store.get_or("corrupt", 7_u32), None);
        assert_eq!(h.reporter.origins(), vec![PARSE_ORIGIN]);
    }

    #[test]
    fn set_stores_json_text_and_null_deletes() {
        let h = Harness::unbounded();
        let settings = Settings {
            enabled: true,
            photos: vec!["a".into()],
        };
        h.store.set("settings", &settings).expect("set");
        assert_eq!(
            h.sync_tier.read_raw("settings").expect("read"),
            Some("{\"enabled\":true,\"photos\":[\"a\"]}".to_string())
        );

        h.store.set("settings", &None::<Settings>).expect("clear");
        assert_eq!(h.sync_tier.read_raw("settings").expect("read"), None);
        assert_eq!(h.store.get_or("settings", json!("d")), Some(json!("d")));
    }

    #[test]
    fn set_skips_unencodable_values() {
        let h = Harness::unbounded();
        h.store.set("k", &1_u8).expect("seed");
        let mut bad = BTreeMap::new();
        bad.insert((1_u8, 1_u8), 1_u8);

        h.store.set("k", &bad).expect("skipped write is not an error");
        assert_eq!(h.store.get::<u8>("k"), Some(1));
        assert_eq!(h.reporter.origins(), vec![STRINGIFY_ORIGIN]);
    }

    #[test]
    fn set_surfaces_quota_errors() {
        let h = Harness::new(MemorySyncKv::with_quota(4), MemoryAsyncKv::default());
        let err = h.store.set("key", &"too long").expect_err("quota");
        assert!(err.is_quota_exceeded());
    }

    #[test]
    fn safe_set_success_does_not_notify() {
        let mut h = Harness::unbounded();
        assert!(h.store.safe_set("k", &[1, 2, 3], Some("hasK")));
        assert_eq!(h.store.get::<Vec<u8>>("k"), Some(vec![1, 2, 3]));
        assert_eq!(h.store.get::<bool>("hasK"), None);
        assert_eq!(h.exceeded_count(), 0);
    }

    #[test]
    fn safe_set_rolls_back_and_marks_companion() {
        let mut h = Harness::new(MemorySyncKv::with_quota(48), MemoryAsyncKv::default());
        h.store.set("photos", &vec!["a", "b"]).expect("seed");

        let huge = vec!["x".repeat(64)];
        assert!(!h.store.safe_set("photos", &huge, Some("hasPhotos")));
        assert_eq!(h.store.get::<Vec<String>>("photos"), Some(vec!["a".into(), "b".into()]));
        assert_eq!(h.store.get::<bool>("hasPhotos"), Some(true));
        assert_eq!(h.exceeded_count(), 1);
    }

    #[test]
    fn safe_set_clears_key_without_snapshot() {
        let mut h = Harness::new(MemorySyncKv::with_quota(32), MemoryAsyncKv::default());
        assert!(!h.store.safe_set("photos", &"y".repeat(64), Some("hasPhotos")));
        assert_eq!(h.sync_tier.read_raw("photos").expect("read"), None);
        assert_eq!(h.store.get::<bool>("hasPhotos"), Some(false));
        assert_eq!(h.exceeded_count(), 1);
    }

    #[test]
    fn safe_set_swallows_notification_failures() {
        let mut h = Harness::new(MemorySyncKv::with_quota(8), MemoryAsyncKv::default());
        h.messenger
            .fail_with(MessageError::from_platform("Receiving end does not exist."));
        assert!(!h.store.safe_set("k", &"0123456789", None));
        assert_eq!(h.exceeded_count(), 1);
        assert!(h.reporter.is_empty());
    }

    #[test]
    fn safe_set_unencodable_value_reports_without_broadcast() {
        let mut h = Harness::unbounded();
        let mut bad = BTreeMap::new();
        bad.insert((0_u8, 0_u8), 0_u8);
        assert!(!h.store.safe_set("k", &bad, Some("hasK")));
        assert_eq!(h.store.get::<bool>("hasK"), None);
        assert_eq!(h.exceeded_count(), 0);
        assert_eq!(h.reporter.origins(), vec![STRINGIFY_ORIGIN]);
    }

    #[test]
    fn async_round_trip_and_null_removal() {
        let h = Harness::unbounded();
        let settings = Settings {
            enabled: false,
            photos: vec![],
        };
        assert!(block_on(h.store.async_set("settings", &settings, None)));
        assert_eq!(
            block_on(h.store.async_get::<Settings>("settings")),
            Some(settings)
        );

        assert!(block_on(h.store.async_set("settings", &Value::Null, None)));
        assert_eq!(h.async_tier.peek("settings"), None);
        assert_eq!(
            block_on(h.store.async_get_or("settings", 3_u8)),
            Some(3)
        );
    }

    #[test]
    fn async_get_reports_undecodable_values() {
        let h = Harness::unbounded();
        assert!(block_on(h.store.async_set("n", &"text", None)));
        assert_eq!(block_on(h.store.async_get::<u32>("n")), None);
        assert_eq!(h.reporter.origins(), vec![PARSE_ORIGIN]);
    }

    #[test]
    fn async_set_failure_keeps_value_sets_companion_and_notifies_once() {
        let mut h = Harness::new(MemorySyncKv::default(), MemoryAsyncKv::with_quota(40));
        assert!(block_on(h.store.async_set("photos", &["a"], None)));

        let huge = vec!["z".repeat(64)];
        assert!(!block_on(h.store.async_set("photos", &huge, Some("hasPhotos"))));
        assert_eq!(h.async_tier.peek("photos"), Some(json!(["a"])));
        assert_eq!(h.async_tier.peek("hasPhotos"), Some(json!(true)));
        assert_eq!(h.exceeded_count(), 1);
    }

    #[test]
    fn async_set_failure_without_companion_only_notifies() {
        let mut h = Harness::new(MemorySyncKv::default(), MemoryAsyncKv::with_quota(8));
        assert!(!block_on(h.store.async_set("photos", &"q".repeat(32), None)));
        assert_eq!(h.async_tier.peek("photos"), None);
        assert_eq!(h.exceeded_count(), 1);
    }

    #[test]
    fn get_treats_tier_read_errors_as_absent() {
        let h = Harness::unbounded();
        h.flaky_sync.fail_reads.set(true);

        assert_eq!(h.store.get_or("k", 9_u32), Some(9));
        assert_eq!(h.store.get::<u32>("k"), None);
        assert_eq!(h.reporter.origins(), vec![GET_ORIGIN, GET_ORIGIN]);
        assert_eq!(
            h.reporter.reports()[0].message,
            "storage backend failure: disk I/O error"
        );
    }

    #[test]
    fn async_get_treats_tier_read_errors_as_default() {
        let h = Harness::unbounded();
        assert!(block_on(h.store.async_set("k", &1_u8, None)));
        h.flaky_async.fail_reads.set(true);

        assert_eq!(block_on(h.store.async_get_or("k", 4_u8)), Some(4));
        assert_eq!(block_on(h.store.async_get::<u8>("k")), None);
        assert_eq!(h.reporter.origins(), vec![ASYNC_GET_ORIGIN, ASYNC_GET_ORIGIN]);
    }

    #[test]
    fn async_get_returns_none_for_stored_null() {
        let h = Harness::unbounded();
        let mut entries = Map::new();
        entries.insert("k".into(), Value::Null);
        block_on(h.async_tier.write_many(&entries)).expect("seed");

        assert_eq!(block_on(h.store.async_get_or("k", 4_u8)), None);
        assert!(h.reporter.is_empty());
    }

    #[test]
    fn safe_set_rolls_back_on_backend_failure() {
        let mut h = Harness::unbounded();
        h.store.set("photos", &["a"]).expect("seed");
        h.flaky_sync.failing_writes.set(1);

        assert!(!h.store.safe_set("photos", &["a", "b"], Some("hasPhotos")));
        assert_eq!(h.store.get::<Vec<String>>("photos"), Some(vec!["a".into()]));
        assert_eq!(h.store.get::<bool>("hasPhotos"), Some(true));
        assert_eq!(h.exceeded_count(), 1);
    }

    #[test]
    fn async_set_success_leaves_companion_untouched() {
        let mut h = Harness::unbounded();
        assert!(block_on(h.store.async_set("photos", &["a"], Some("hasPhotos"))));
        assert_eq!(h.async_tier.peek("photos"), Some(json!(["a"])));
        assert_eq!(h.async_tier.peek("hasPhotos"), None);
        assert_eq!(h.exceeded_count(), 0);
    }

    #[test]
    fn async_set_backend_failure_marks_companion_and_notifies() {
        let mut h = Harness::unbounded();
        assert!(block_on(h.store.async_set("photos", &Vec::<String>::new(), None)));
        h.flaky_async.failing_writes.set(1);

        assert!(!block_on(h.store.async_set("photos", &["b"], Some("hasPhotos"))));
        assert_eq!(h.async_tier.peek("photos"), Some(json!([])));
        assert_eq!(h.async_tier.peek("hasPhotos"), Some(json!(false)));
        assert_eq!(h.exceeded_count(), 1);
    }
}
