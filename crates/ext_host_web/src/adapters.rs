use std::rc::Rc;

use chrono::NaiveTime;
use ext_host::{
    AsyncKv, AsyncKvFuture, ClockWindow, KeyValueStore, ListenerId, LocaleService, Logger,
    MemoryAsyncKv, MemoryMessageListeners, MemorySyncKv, Message, MessageError, MessageFuture,
    MessageListener, MessageListeners, Messenger, NoopLocale, NoopMessenger, StorageError,
    StoreServices, SyncKv, SystemClock, TracingErrorReporter,
};
use futures::future::LocalFutureObj;
use futures::task::{LocalSpawn, SpawnError};
use serde_json::{Map, Value};

use crate::{
    BrowserSpawner, ChromeLocalStorageKv, ChromeLocale, QueuedSpawner, RuntimeMessageListeners,
    RuntimeMessenger, WebLocalStorageKv,
};

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Compile-time selected host strategy for `ext_host_web` adapters.
pub enum HostStrategy {
    /// Extension-backed adapters talking to `localStorage` and the `chrome.*` APIs.
    Browser,
    /// In-memory tiers and no-op services for hosts without extension APIs.
    Stub,
}

/// Returns the compile-time selected host strategy for the active build.
pub const fn selected_host_strategy() -> HostStrategy {
    #[cfg(feature = "host-stub")]
    {
        HostStrategy::Stub
    }

    #[cfg(not(feature = "host-stub"))]
    {
        HostStrategy::Browser
    }
}

/// Returns the selected host strategy as a stable string token.
pub fn host_strategy_name() -> &'static str {
    match selected_host_strategy() {
        HostStrategy::Browser => "browser",
        HostStrategy::Stub => "stub",
    }
}

/// Adapter enum that erases the concrete synchronous tier behind [`SyncKv`].
#[derive(Debug, Clone)]
pub enum SyncKvAdapter {
    /// `window.localStorage`.
    Browser(WebLocalStorageKv),
    /// Process-local map used by stub builds.
    Stub(MemorySyncKv),
}

impl SyncKv for SyncKvAdapter {
    fn read_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            Self::Browser(tier) => tier.read_raw(key),
            Self::Stub(tier) => tier.read_raw(key),
        }
    }

    fn write_raw(&self, key: &str, raw_json: &str) -> Result<(), StorageError> {
        match self {
            Self::Browser(tier) => tier.write_raw(key, raw_json),
            Self::Stub(tier) => tier.write_raw(key, raw_json),
        }
    }

    fn delete_raw(&self, key: &str) -> Result<(), StorageError> {
        match self {
            Self::Browser(tier) => tier.delete_raw(key),
            Self::Stub(tier) => tier.delete_raw(key),
        }
    }
}

/// Adapter enum that erases the concrete asynchronous tier behind [`AsyncKv`].
#[derive(Debug, Clone)]
pub enum AsyncKvAdapter {
    /// `chrome.storage.local`.
    Browser(ChromeLocalStorageKv),
    /// Process-local map used by stub builds.
    Stub(MemoryAsyncKv),
}

impl AsyncKv for AsyncKvAdapter {
    fn read_many<'a>(
        &'a self,
        keys: &'a [&'a str],
    ) -> AsyncKvFuture<'a, Result<Map<String, Value>, StorageError>> {
        match self {
            Self::Browser(tier) => tier.read_many(keys),
            Self::Stub(tier) => tier.read_many(keys),
        }
    }

    fn write_many<'a>(
        &'a self,
        entries: &'a Map<String, Value>,
    ) -> AsyncKvFuture<'a, Result<(), StorageError>> {
        match self {
            Self::Browser(tier) => tier.write_many(entries),
            Self::Stub(tier) => tier.write_many(entries),
        }
    }

    fn remove_many<'a>(
        &'a self,
        keys: &'a [&'a str],
    ) -> AsyncKvFuture<'a, Result<(), StorageError>> {
        match self {
            Self::Browser(tier) => tier.remove_many(keys),
            Self::Stub(tier) => tier.remove_many(keys),
        }
    }
}

/// Adapter enum that erases the concrete broadcast channel behind [`Messenger`].
#[derive(Debug, Clone, Copy)]
pub enum MessengerAdapter {
    /// `chrome.runtime.sendMessage`.
    Browser(RuntimeMessenger),
    /// Discards every message.
    Stub(NoopMessenger),
}

impl Messenger for MessengerAdapter {
    fn send(&self, message: &Message) -> MessageFuture<Result<Value, MessageError>> {
        match self {
            Self::Browser(messenger) => messenger.send(message),
            Self::Stub(messenger) => messenger.send(message),
        }
    }
}

/// Adapter enum that erases the concrete receive side behind [`MessageListeners`].
#[derive(Debug, Clone)]
pub enum MessageListenersAdapter {
    /// `chrome.runtime.onMessage`.
    Browser(RuntimeMessageListeners),
    /// Process-local registry; stub hosts feed it with [`MemoryMessageListeners::dispatch`].
    Stub(MemoryMessageListeners),
}

impl MessageListeners for MessageListenersAdapter {
    fn add_listener(&self, listener: MessageListener) -> Result<ListenerId, MessageError> {
        match self {
            Self::Browser(listeners) => listeners.add_listener(listener),
            Self::Stub(listeners) => listeners.add_listener(listener),
        }
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        match self {
            Self::Browser(listeners) => listeners.remove_listener(id),
            Self::Stub(listeners) => listeners.remove_listener(id),
        }
    }
}

/// Adapter enum that erases the concrete executor behind [`LocalSpawn`].
#[derive(Debug, Clone)]
pub enum SpawnerAdapter {
    /// Browser microtask queue.
    Browser(BrowserSpawner),
    /// Host-drained queue.
    Stub(QueuedSpawner),
}

impl LocalSpawn for SpawnerAdapter {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        match self {
            Self::Browser(spawner) => spawner.spawn_local_obj(future),
            Self::Stub(spawner) => spawner.spawn_local_obj(future),
        }
    }
}

/// Adapter enum that erases the concrete message catalog behind [`LocaleService`].
#[derive(Debug, Clone, Copy)]
pub enum LocaleAdapter {
    /// `chrome.i18n` plus the browser's time formatter.
    Browser(ChromeLocale),
    /// Empty catalog without a formatter.
    Stub(NoopLocale),
}

impl LocaleService for LocaleAdapter {
    fn message(&self, key: &str) -> Option<String> {
        match self {
            Self::Browser(locale) => locale.message(key),
            Self::Stub(locale) => locale.message(key),
        }
    }

    fn ui_locale(&self) -> Option<String> {
        match self {
            Self::Browser(locale) => locale.ui_locale(),
            Self::Stub(locale) => locale.ui_locale(),
        }
    }

    fn format_time(&self, time: NaiveTime, hour12: bool) -> Result<String, String> {
        match self {
            Self::Browser(locale) => locale.format_time(time, hour12),
            Self::Stub(locale) => locale.format_time(time, hour12),
        }
    }
}

/// Builds the synchronous tier for the compile-time selected host strategy.
pub fn sync_kv() -> SyncKvAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => SyncKvAdapter::Browser(WebLocalStorageKv),
        HostStrategy::Stub => SyncKvAdapter::Stub(MemorySyncKv::default()),
    }
}

/// Builds the asynchronous tier for the compile-time selected host strategy.
pub fn async_kv() -> AsyncKvAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => AsyncKvAdapter::Browser(ChromeLocalStorageKv),
        HostStrategy::Stub => AsyncKvAdapter::Stub(MemoryAsyncKv::default()),
    }
}

/// Builds the broadcast channel for the compile-time selected host strategy.
pub fn messenger() -> MessengerAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => MessengerAdapter::Browser(RuntimeMessenger),
        HostStrategy::Stub => MessengerAdapter::Stub(NoopMessenger),
    }
}

/// Builds the locale service for the compile-time selected host strategy.
pub fn locale_service() -> LocaleAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => LocaleAdapter::Browser(ChromeLocale),
        HostStrategy::Stub => LocaleAdapter::Stub(NoopLocale),
    }
}

/// Builds the receive side of runtime messaging for the compile-time selected host strategy.
pub fn message_listeners() -> MessageListenersAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => MessageListenersAdapter::Browser(RuntimeMessageListeners),
        HostStrategy::Stub => MessageListenersAdapter::Stub(MemoryMessageListeners::default()),
    }
}

/// Builds the detached-task executor for the compile-time selected host strategy.
pub fn spawner() -> SpawnerAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => SpawnerAdapter::Browser(BrowserSpawner),
        HostStrategy::Stub => SpawnerAdapter::Stub(QueuedSpawner::new()),
    }
}

/// Builds the collaborators shared by the store's failure paths, spawning on `spawner`.
pub fn store_services(spawner: Rc<dyn LocalSpawn>) -> StoreServices {
    StoreServices {
        reporter: Rc::new(TracingErrorReporter),
        messenger: Rc::new(messenger()),
        spawner,
    }
}

/// Builds a [`KeyValueStore`] over both tiers of the selected host strategy.
pub fn key_value_store() -> KeyValueStore {
    KeyValueStore::new(
        Rc::new(sync_kv()),
        Rc::new(async_kv()),
        store_services(Rc::new(spawner())),
    )
}

/// Builds a [`ClockWindow`] over the system clock and the selected locale service.
pub fn clock_window() -> ClockWindow {
    ClockWindow::new(Rc::new(SystemClock), Rc::new(locale_service()))
}

/// Builds a [`Logger`] that persists the last error into `last_error_tier`.
///
/// Reporting and the persistence task use the collaborators already injected into `store`.
pub fn logger(store: &KeyValueStore, last_error_tier: Rc<dyn AsyncKv>) -> Logger {
    let services = store.services();
    Logger::new(
        Rc::clone(&services.reporter),
        Rc::new(locale_service()),
        last_error_tier,
        Rc::clone(&services.spawner),
    )
}

/// Host service bundle for one extension page, built for the selected host strategy.
///
/// The store and the logger share one asynchronous tier, so the persisted last error is visible
/// through [`KeyValueStore::async_get`].
#[derive(Clone)]
pub struct ExtHostServices {
    /// JSON store over both tiers.
    pub store: KeyValueStore,
    /// Error logger writing into the store's asynchronous tier.
    pub logger: Logger,
    /// Active-window evaluation over the system clock.
    pub clock: ClockWindow,
    /// Receive side of runtime messaging.
    pub listeners: MessageListenersAdapter,
    /// Executor for detached notifications; stub hosts drain it.
    pub spawner: SpawnerAdapter,
    /// Stable strategy identifier for diagnostics.
    pub host_strategy: HostStrategy,
}

/// Builds the [`ExtHostServices`] bundle for the compile-time selected host strategy.
pub fn build_ext_host_services() -> ExtHostServices {
    assemble_services(sync_kv(), async_kv(), message_listeners(), spawner())
}

fn assemble_services(
    sync_tier: SyncKvAdapter,
    async_tier: AsyncKvAdapter,
    listeners: MessageListenersAdapter,
    spawner: SpawnerAdapter,
) -> ExtHostServices {
    let async_tier: Rc<dyn AsyncKv> = Rc::new(async_tier);
    let store = KeyValueStore::new(
        Rc::new(sync_tier),
        Rc::clone(&async_tier),
        store_services(Rc::new(spawner.clone())),
    );
    let logger = logger(&store, async_tier);
    ExtHostServices {
        store,
        logger,
        clock: clock_window(),
        listeners,
        spawner,
        host_strategy: selected_host_strategy(),
    }
}

#[cfg(test)]
mod tests {
    use ext_host::{LastError, LAST_ERROR_KEY};
    use futures::executor::block_on;

    use super::*;

    #[test]
    fn strategy_name_matches_selected_strategy() {
        let expected = match selected_host_strategy() {
            HostStrategy::Browser => "browser",
            HostStrategy::Stub => "stub",
        };
        assert_eq!(host_strategy_name(), expected);
    }

    #[cfg(not(feature = "host-stub"))]
    #[test]
    fn default_build_selects_browser_adapters() {
        assert_eq!(selected_host_strategy(), HostStrategy::Browser);
        assert!(matches!(sync_kv(), SyncKvAdapter::Browser(_)));
        assert!(matches!(async_kv(), AsyncKvAdapter::Browser(_)));
        assert!(matches!(messenger(), MessengerAdapter::Browser(_)));
        assert!(matches!(locale_service(), LocaleAdapter::Browser(_)));
        assert!(matches!(message_listeners(), MessageListenersAdapter::Browser(_)));
        assert!(matches!(spawner(), SpawnerAdapter::Browser(_)));
    }

    #[cfg(feature = "host-stub")]
    #[test]
    fn stub_build_selects_memory_adapters() {
        assert_eq!(selected_host_strategy(), HostStrategy::Stub);
        assert!(matches!(sync_kv(), SyncKvAdapter::Stub(_)));
        assert!(matches!(async_kv(), AsyncKvAdapter::Stub(_)));
        assert!(matches!(messenger(), MessengerAdapter::Stub(_)));
        assert!(matches!(locale_service(), LocaleAdapter::Stub(_)));
        assert!(matches!(message_listeners(), MessageListenersAdapter::Stub(_)));
        assert!(matches!(spawner(), SpawnerAdapter::Stub(_)));
    }

    #[cfg(feature = "host-stub")]
    #[test]
    fn stub_build_runs_store_notifications() {
        use futures::task::LocalSpawnExt;

        let services = build_ext_host_services();
        assert_eq!(services.host_strategy, HostStrategy::Stub);
        let ran = Rc::new(std::cell::Cell::new(false));
        let flag = Rc::clone(&ran);
        services
            .store
            .services()
            .spawner
            .spawn_local(async move { flag.set(true) })
            .expect("stub spawner accepts tasks");
        let SpawnerAdapter::Stub(queue) = &services.spawner else {
            panic!("stub build must queue tasks");
        };
        queue.run_until_stalled();
        assert!(ran.get());
    }

    #[test]
    fn stub_adapters_delegate_to_memory_tiers() {
        let sync = SyncKvAdapter::Stub(MemorySyncKv::default());
        sync.write_raw("ext.flag", "true").expect("write");
        assert_eq!(sync.read_raw("ext.flag").expect("read").as_deref(), Some("true"));
        sync.delete_raw("ext.flag").expect("delete");
        assert_eq!(sync.read_raw("ext.flag").expect("read"), None);

        let tier = MemoryAsyncKv::default();
        let adapter = AsyncKvAdapter::Stub(tier.clone());
        let mut entries = Map::new();
        entries.insert("ext.list".into(), Value::from(vec![1, 2]));
        block_on(adapter.write_many(&entries)).expect("write");
        assert_eq!(tier.peek("ext.list"), Some(Value::from(vec![1, 2])));
        block_on(adapter.remove_many(&["ext.list"])).expect("remove");
        assert!(block_on(adapter.read_many(&["ext.list"])).expect("read").is_empty());
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn non_wasm_browser_store_reads_as_absent() {
        let store = KeyValueStore::new(
            Rc::new(SyncKvAdapter::Browser(WebLocalStorageKv)),
            Rc::new(AsyncKvAdapter::Browser(ChromeLocalStorageKv)),
            store_services(Rc::new(BrowserSpawner)),
        );
        assert_eq!(store.get_or("ext.count", 3_u32), Some(3));
        assert_eq!(block_on(store.async_get_or("ext.count", 4_u32)), Some(4));
    }

    #[test]
    fn stub_locale_adapter_has_no_formatter() {
        let locale = LocaleAdapter::Stub(NoopLocale);
        let time = NaiveTime::from_hms_opt(9, 5, 0).expect("time");
        assert!(locale.format_time(time, false).is_err());
        assert_eq!(locale.message("err_error"), None);
    }

    #[test]
    fn logger_and_store_share_the_async_tier() {
        let tier = MemoryAsyncKv::default();
        let queue = QueuedSpawner::new();
        let services = assemble_services(
            SyncKvAdapter::Stub(MemorySyncKv::default()),
            AsyncKvAdapter::Stub(tier.clone()),
            MessageListenersAdapter::Stub(MemoryMessageListeners::default()),
            SpawnerAdapter::Stub(queue.clone()),
        );

        services.logger.error("photo feed offline", Some("feed.load"), None, None);
        assert!(tier.peek(LAST_ERROR_KEY).is_none());
        queue.run_until_stalled();

        let stored: LastError =
            block_on(services.store.async_get(LAST_ERROR_KEY)).expect("last error");
        assert_eq!(stored.message, "photo feed offline");
        assert!(tier.peek(LAST_ERROR_KEY).is_some());
    }

    #[test]
    fn stub_listeners_adapter_dispatches_through_memory_registry() {
        let registry = MemoryMessageListeners::default();
        let adapter = MessageListenersAdapter::Stub(registry.clone());
        let id = adapter
            .add_listener(Rc::new(|message: &Message| Some(Value::from(message.name()))))
            .expect("add");
        assert_eq!(
            registry.dispatch(&Message::HighlightTab),
            Some(Value::from("highlightTab"))
        );
        assert!(adapter.remove_listener(id));
        assert!(registry.is_empty());
    }
}
