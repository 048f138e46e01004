//! Shared transport interop for browser bridge domains.
//!
//! This module routes calls to target-specific implementations while preserving a uniform API
//! for the storage, messaging and locale bridge wrappers.

use std::rc::Rc;

use ext_host::{ListenerId, Message, MessageError, MessageListener, StorageError};
use serde_json::{Map, Value};

#[cfg(not(target_arch = "wasm32"))]
mod non_wasm;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(not(target_arch = "wasm32"))]
use non_wasm as imp;
#[cfg(target_arch = "wasm32")]
use wasm as imp;

pub fn local_storage_get(key: &str) -> Result<Option<String>, StorageError> {
    imp::local_storage_get(key)
}

pub fn local_storage_set(key: &str, raw_json: &str) -> Result<(), StorageError> {
    imp::local_storage_set(key, raw_json)
}

pub fn local_storage_remove(key: &str) -> Result<(), StorageError> {
    imp::local_storage_remove(key)
}

pub async fn storage_local_get(keys: &[&str]) -> Result<Map<String, Value>, StorageError> {
    imp::storage_local_get(keys).await
}

pub async fn storage_local_set(entries: &Map<String, Value>) -> Result<(), StorageError> {
    imp::storage_local_set(entries).await
}

pub async fn storage_local_remove(keys: &[&str]) -> Result<(), StorageError> {
    imp::storage_local_remove(keys).await
}

pub async fn runtime_send_message(message: Message) -> Result<Value, MessageError> {
    imp::runtime_send_message(message).await
}

pub fn add_message_listener(listener: MessageListener) -> Result<ListenerId, MessageError> {
    imp::add_message_listener(listener)
}

pub fn remove_message_listener(id: ListenerId) -> bool {
    imp::remove_message_listener(id)
}

pub fn add_exception_listener(handler: Rc<dyn Fn(String)>) -> Result<(), String> {
    imp::add_exception_listener(handler)
}

pub fn i18n_message(key: &str) -> Option<String> {
    imp::i18n_message(key)
}

pub fn format_time(hour: u32, minute: u32, hour12: bool) -> Result<String, String> {
    imp::format_time(hour, minute, hour12)
}
