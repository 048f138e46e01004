//! Runtime messaging adapters backed by `chrome.runtime.sendMessage` and
//! `chrome.runtime.onMessage`.

use ext_host::{
    ListenerId, Message, MessageError, MessageFuture, MessageListener, MessageListeners, Messenger,
};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default)]
/// Broadcasts messages to the extension's other contexts.
pub struct RuntimeMessenger;

impl Messenger for RuntimeMessenger {
    fn send(&self, message: &Message) -> MessageFuture<Result<Value, MessageError>> {
        let message = message.clone();
        Box::pin(async move { crate::bridge::runtime_send_message(message).await })
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Receives messages sent from the extension's other contexts.
///
/// Incoming payloads that do not decode as a [`Message`] are ignored.
pub struct RuntimeMessageListeners;

impl MessageListeners for RuntimeMessageListeners {
    fn add_listener(&self, listener: MessageListener) -> Result<ListenerId, MessageError> {
        crate::bridge::add_message_listener(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        crate::bridge::remove_message_listener(id)
    }
}
