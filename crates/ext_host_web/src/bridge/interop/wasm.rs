use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use js_sys::Promise;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, Serializer};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use super::*;

#[wasm_bindgen(inline_js = r#"
function ext() {
  if (typeof chrome === 'undefined' || !chrome.runtime) {
    throw new Error('extension APIs unavailable');
  }
  return chrome;
}

export function jsStorageLocalGet(keys) { return ext().storage.local.get(keys); }
export function jsStorageLocalSet(items) { return ext().storage.local.set(items); }
export function jsStorageLocalRemove(keys) { return ext().storage.local.remove(keys); }
export function jsRuntimeSendMessage(message) { return ext().runtime.sendMessage(message); }

export function jsAddMessageListener(handler) {
  const listener = (message, sender, sendResponse) => {
    const response = handler(message);
    if (response !== undefined) {
      sendResponse(response);
    }
    return false;
  };
  ext().runtime.onMessage.addListener(listener);
  return listener;
}

export function jsRemoveMessageListener(listener) {
  ext().runtime.onMessage.removeListener(listener);
}

export function jsAddExceptionListeners(handler) {
  globalThis.addEventListener('unhandledrejection', (ev) => {
    const reason = ev ? ev.reason : undefined;
    const msg = reason && reason.message ? String(reason.message) : 'Uncaught promise rejection';
    handler(msg);
  });
  globalThis.addEventListener('error', (ev) => {
    if (ev && ev.error) {
      handler(String(ev.error.message || ev.message || ev.error));
    }
  });
}

export function jsI18nGetMessage(key) {
  try {
    const msg = ext().i18n.getMessage(key);
    return msg ? msg : null;
  } catch (err) {
    return null;
  }
}

export function jsFormatTime(hour, minute, hour12) {
  const date = new Date();
  date.setHours(hour, minute, 0, 0);
  const languages = [];
  if (navigator.language) {
    languages.push(navigator.language);
  }
  languages.push('en-US');
  return date.toLocaleTimeString(languages, { hour: 'numeric', minute: '2-digit', hour12 });
}
"#)]
extern "C" {
    #[wasm_bindgen(js_name = jsStorageLocalGet, catch)]
    fn js_storage_local_get(keys: JsValue) -> Result<Promise, JsValue>;
    #[wasm_bindgen(js_name = jsStorageLocalSet, catch)]
    fn js_storage_local_set(items: JsValue) -> Result<Promise, JsValue>;
    #[wasm_bindgen(js_name = jsStorageLocalRemove, catch)]
    fn js_storage_local_remove(keys: JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(js_name = jsRuntimeSendMessage, catch)]
    fn js_runtime_send_message(message: JsValue) -> Result<Promise, JsValue>;
    #[wasm_bindgen(js_name = jsAddMessageListener, catch)]
    fn js_add_message_listener(
        handler: &Closure<dyn FnMut(JsValue) -> JsValue>,
    ) -> Result<JsValue, JsValue>;
    #[wasm_bindgen(js_name = jsRemoveMessageListener, catch)]
    fn js_remove_message_listener(listener: &JsValue) -> Result<(), JsValue>;
    #[wasm_bindgen(js_name = jsAddExceptionListeners, catch)]
    fn js_add_exception_listeners(handler: &Closure<dyn FnMut(String)>) -> Result<(), JsValue>;

    #[wasm_bindgen(js_name = jsI18nGetMessage)]
    fn js_i18n_get_message(key: &str) -> Option<String>;
    #[wasm_bindgen(js_name = jsFormatTime, catch)]
    fn js_format_time(hour: u32, minute: u32, hour12: bool) -> Result<String, JsValue>;
}

fn js_error_to_string(err: &JsValue) -> String {
    if let Some(text) = err.as_string() {
        return text;
    }
    if let Ok(message) = js_sys::Reflect::get(err, &JsValue::from_str("message")) {
        if let Some(text) = message.as_string() {
            return text;
        }
    }
    format!("{err:?}")
}

fn js_error_name(err: &JsValue) -> Option<String> {
    js_sys::Reflect::get(err, &JsValue::from_str("name"))
        .ok()
        .and_then(|name| name.as_string())
}

// localStorage throws a `QuotaExceededError` DOMException; chrome.storage rejects with a
// `QUOTA_BYTES` message.
fn storage_error(err: &JsValue, key: &str) -> StorageError {
    let message = js_error_to_string(err);
    let quota = js_error_name(err).as_deref() == Some("QuotaExceededError")
        || message.contains("QUOTA_BYTES")
        || message.to_ascii_lowercase().contains("quota");
    if quota {
        tracing::debug!(key, %message, "storage quota exceeded");
        StorageError::QuotaExceeded {
            key: key.to_string(),
        }
    } else {
        StorageError::Backend(message)
    }
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, StorageError> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(|e| StorageError::Codec(e.to_string()))
}

fn local_storage() -> Result<web_sys::Storage, StorageError> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .ok_or_else(|| StorageError::Unavailable("localStorage unavailable".to_string()))
}

pub fn local_storage_get(key: &str) -> Result<Option<String>, StorageError> {
    local_storage()?.get_item(key).map_err(|e| {
        StorageError::Backend(format!(
            "localStorage get_item failed: {}",
            js_error_to_string(&e)
        ))
    })
}

pub fn local_storage_set(key: &str, raw_json: &str) -> Result<(), StorageError> {
    local_storage()?
        .set_item(key, raw_json)
        .map_err(|e| storage_error(&e, key))
}

pub fn local_storage_remove(key: &str) -> Result<(), StorageError> {
    local_storage()?.remove_item(key).map_err(|e| {
        StorageError::Backend(format!(
            "localStorage remove_item failed: {}",
            js_error_to_string(&e)
        ))
    })
}

async fn await_storage(
    promise: Result<Promise, JsValue>,
    key: &str,
) -> Result<JsValue, StorageError> {
    let promise = promise.map_err(|e| StorageError::Unavailable(js_error_to_string(&e)))?;
    JsFuture::from(promise)
        .await
        .map_err(|e| storage_error(&e, key))
}

pub async fn storage_local_get(keys: &[&str]) -> Result<Map<String, Value>, StorageError> {
    let first = keys.first().copied().unwrap_or_default();
    let value = await_storage(js_storage_local_get(to_js(keys)?), first).await?;
    if value.is_null() || value.is_undefined() {
        return Ok(Map::new());
    }
    from_value(value).map_err(|e| StorageError::Codec(e.to_string()))
}

pub async fn storage_local_set(entries: &Map<String, Value>) -> Result<(), StorageError> {
    let first = entries.keys().next().map(String::as_str).unwrap_or_default();
    await_storage(js_storage_local_set(to_js(entries)?), first).await?;
    Ok(())
}

pub async fn storage_local_remove(keys: &[&str]) -> Result<(), StorageError> {
    let first = keys.first().copied().unwrap_or_default();
    await_storage(js_storage_local_remove(to_js(keys)?), first).await?;
    Ok(())
}

pub async fn runtime_send_message(message: Message) -> Result<Value, MessageError> {
    let payload = message
        .serialize(&Serializer::json_compatible())
        .map_err(|e| MessageError::Transport(e.to_string()))?;
    let promise = js_runtime_send_message(payload)
        .map_err(|e| MessageError::from_platform(js_error_to_string(&e)))?;
    let response = JsFuture::from(promise)
        .await
        .map_err(|e| MessageError::from_platform(js_error_to_string(&e)))?;
    if response.is_null() || response.is_undefined() {
        return Ok(Value::Null);
    }
    from_value(response).map_err(|e| MessageError::Transport(e.to_string()))
}

struct RegisteredListener {
    // Dropping the closure invalidates the JS callback, so it lives as long as the registration.
    _handler: Closure<dyn FnMut(JsValue) -> JsValue>,
    token: JsValue,
}

thread_local! {
    static MESSAGE_LISTENERS: RefCell<HashMap<u64, RegisteredListener>> =
        RefCell::new(HashMap::new());
    static NEXT_LISTENER_ID: Cell<u64> = Cell::new(1);
}

fn answer(listener: &MessageListener, raw: JsValue) -> JsValue {
    let message = match from_value::<Message>(raw) {
        Ok(message) => message,
        Err(err) => {
            tracing::debug!(error = %err, "ignoring unrecognized runtime message");
            return JsValue::UNDEFINED;
        }
    };
    listener(&message)
        .and_then(|response| to_js(&response).ok())
        .unwrap_or(JsValue::UNDEFINED)
}

pub fn add_message_listener(listener: MessageListener) -> Result<ListenerId, MessageError> {
    let handler = Closure::<dyn FnMut(JsValue) -> JsValue>::wrap(Box::new(move |raw: JsValue| {
        answer(&listener, raw)
    }));
    let token = js_add_message_listener(&handler)
        .map_err(|e| MessageError::from_platform(js_error_to_string(&e)))?;
    let raw_id = NEXT_LISTENER_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    });
    MESSAGE_LISTENERS.with(|listeners| {
        listeners.borrow_mut().insert(
            raw_id,
            RegisteredListener {
                _handler: handler,
                token,
            },
        )
    });
    Ok(ListenerId::new(raw_id))
}

pub fn remove_message_listener(id: ListenerId) -> bool {
    let Some(registered) =
        MESSAGE_LISTENERS.with(|listeners| listeners.borrow_mut().remove(&id.raw()))
    else {
        return false;
    };
    if let Err(err) = js_remove_message_listener(&registered.token) {
        tracing::debug!(error = %js_error_to_string(&err), "failed to detach message listener");
    }
    true
}

pub fn add_exception_listener(handler: Rc<dyn Fn(String)>) -> Result<(), String> {
    let closure =
        Closure::<dyn FnMut(String)>::wrap(Box::new(move |message: String| handler(message)));
    js_add_exception_listeners(&closure).map_err(|e| js_error_to_string(&e))?;
    closure.forget();
    Ok(())
}

pub fn i18n_message(key: &str) -> Option<String> {
    js_i18n_get_message(key)
}

pub fn format_time(hour: u32, minute: u32, hour12: bool) -> Result<String, String> {
    js_format_time(hour, minute, hour12).map_err(|e| js_error_to_string(&e))
}
