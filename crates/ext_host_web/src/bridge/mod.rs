//! Extension capability bridge for `ext_host_web` service adapters.
//!
//! Domain wrappers here keep adapter code independent of the wasm/non-wasm split handled in
//! `interop`.

mod interop;

use std::rc::Rc;

use ext_host::{ListenerId, Message, MessageError, MessageListener, StorageError};
use serde_json::{Map, Value};

pub(crate) fn local_storage_get(key: &str) -> Result<Option<String>, StorageError> {
    interop::local_storage_get(key)
}

pub(crate) fn local_storage_set(key: &str, raw_json: &str) -> Result<(), StorageError> {
    interop::local_storage_set(key, raw_json)
}

pub(crate) fn local_storage_remove(key: &str) -> Result<(), StorageError> {
    interop::local_storage_remove(key)
}

pub(crate) async fn storage_local_get(keys: &[&str]) -> Result<Map<String, Value>, StorageError> {
    interop::storage_local_get(keys).await
}

pub(crate) async fn storage_local_set(entries: &Map<String, Value>) -> Result<(), StorageError> {
    interop::storage_local_set(entries).await
}

pub(crate) async fn storage_local_remove(keys: &[&str]) -> Result<(), StorageError> {
    interop::storage_local_remove(keys).await
}

pub(crate) async fn runtime_send_message(message: Message) -> Result<Value, MessageError> {
    interop::runtime_send_message(message).await
}

pub(crate) fn add_message_listener(
    listener: MessageListener,
) -> Result<ListenerId, MessageError> {
    interop::add_message_listener(listener)
}

pub(crate) fn remove_message_listener(id: ListenerId) -> bool {
    interop::remove_message_listener(id)
}

pub(crate) fn add_exception_listener(handler: Rc<dyn Fn(String)>) -> Result<(), String> {
    interop::add_exception_listener(handler)
}

pub(crate) fn i18n_message(key: &str) -> Option<String> {
    interop::i18n_message(key)
}

pub(crate) fn format_time(hour: u32, minute: u32, hour12: bool) -> Result<String, String> {
    interop::format_time(hour, minute, hour12)
}
