//! Browser-extension (`wasm32`) implementations of [`ext_host`] contracts.
//!
//! This crate wires the storage tiers, runtime messaging, locale catalog, task spawning and
//! global exception handlers to the extension platform.
//!
//! Bridge bindings live under `bridge/`, with `bridge::interop` holding the shared
//! wasm/non-wasm transport glue.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

/// Compile-time host-strategy selection and concrete adapter factories for runtime wiring.
pub mod adapters;
mod bridge;
pub mod exceptions;
pub mod locale;
pub mod messaging;
pub mod spawner;
pub mod storage;

pub use adapters::{
    async_kv, build_ext_host_services, clock_window, host_strategy_name, key_value_store,
    locale_service, logger, message_listeners, messenger, selected_host_strategy, spawner,
    store_services, sync_kv, AsyncKvAdapter, ExtHostServices, HostStrategy, LocaleAdapter,
    MessageListenersAdapter, MessengerAdapter, SpawnerAdapter, SyncKvAdapter,
};
pub use exceptions::install_exception_handlers;
pub use locale::ChromeLocale;
pub use messaging::{RuntimeMessageListeners, RuntimeMessenger};
pub use spawner::{BrowserSpawner, QueuedSpawner};
pub use storage::chrome_local::ChromeLocalStorageKv;
pub use storage::local_storage::WebLocalStorageKv;
