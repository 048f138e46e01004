//! Typed contracts and core logic for browser-extension host services.
//!
//! This crate is the target-independent boundary for extension utilities. It owns the JSON
//! key/value store with capacity-aware rollback, the `HH:MM` clock-window helpers, typed runtime
//! messages, locale lookup and error diagnostics. Concrete browser adapters live in
//! `ext_host_web`; everything here is injected through small object-safe traits so it runs and
//! tests on any target.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod diagnostics;
pub mod locale;
pub mod messaging;
pub mod storage;
pub mod time;

pub use diagnostics::last_error::{LastError, LAST_ERROR_KEY};
pub use diagnostics::log::Logger;
pub use diagnostics::panic_hook::{install_panic_hook, uninstall_panic_hook};
pub use diagnostics::reporter::{
    ErrorReporter, MemoryErrorReporter, ReportedError, TracingErrorReporter,
};
pub use locale::{localize, LocaleService, MemoryLocale, NoopLocale};
pub use messaging::{
    send_message, ListenerId, MemoryMessageListeners, MemoryMessenger, Message, MessageError,
    MessageFuture, MessageListener, MessageListeners, Messenger, NoopMessenger,
};
pub use storage::codec;
pub use storage::error::StorageError;
pub use storage::store::{KeyValueStore, StoreServices};
pub use storage::tiers::{
    AsyncKv, AsyncKvFuture, MemoryAsyncKv, MemorySyncKv, NoopAsyncKv, NoopSyncKv, SyncKv,
};
pub use time::clock::{Clock, FixedClock, SystemClock};
pub use time::clock_time::{ClockParseError, ClockTime, TimeFormat};
pub use time::window::ClockWindow;
pub use time::{DEF_TIME, MIN_IN_DAY, MIN_IN_HOUR, MSEC_IN_DAY, MSEC_IN_HOUR, MSEC_IN_MIN};
