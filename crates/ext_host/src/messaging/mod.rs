//! Typed extension runtime messages, the messenger contract and its receive side.

pub mod listeners;

use std::{cell::RefCell, future::Future, pin::Pin, rc::Rc};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::diagnostics::reporter::ErrorReporter;

pub use listeners::{ListenerId, MemoryMessageListeners, MessageListener, MessageListeners};

/// Origin tag used when [`send_message`] reports a failure.
pub const SEND_ORIGIN: &str = "ExtMsg.send";

/// Object-safe boxed future returned by [`Messenger::send`].
///
/// The future owns everything it needs so it can be spawned as a detached task.
pub type MessageFuture<T> = Pin<Box<dyn Future<Output = T> + 'static>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "message")]
/// Messages exchanged between extension contexts, tagged by their `message` field.
pub enum Message {
    /// Highlight the options tab.
    #[serde(rename = "highlightTab")]
    HighlightTab,
    /// Restore default settings.
    #[serde(rename = "restoreDefaults")]
    RestoreDefaults,
    /// A save to some storage tier failed because it would exceed capacity.
    #[serde(rename = "storageExceeded")]
    StorageExceeded,
    /// Ask the receiver to save `value` under `key` in its local storage.
    #[serde(rename = "store")]
    Store {
        /// Storage key.
        key: String,
        /// Raw value.
        value: String,
    },
}

impl Message {
    /// Returns the wire name carried in the `message` field.
    pub fn name(&self) -> &'static str {
        match self {
            Self::HighlightTab => "highlightTab",
            Self::RestoreDefaults => "restoreDefaults",
            Self::StorageExceeded => "storageExceeded",
            Self::Store { .. } => "store",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Message delivery failures.
pub enum MessageError {
    /// No receiver was listening, or the port closed before a response arrived.
    #[error("{0}")]
    Disconnected(String),
    /// Any other transport failure.
    #[error("{0}")]
    Transport(String),
}

impl MessageError {
    /// Classifies a raw platform error message.
    pub fn from_platform(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.contains("port closed") || message.contains("Receiving end does not exist") {
            Self::Disconnected(message)
        } else {
            Self::Transport(message)
        }
    }

    /// Returns `true` for the benign "nobody is listening" family of failures.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Disconnected(_))
    }
}

/// Host service that broadcasts [`Message`]s to other extension contexts.
pub trait Messenger {
    /// Sends `message` and resolves with the receiver's JSON response.
    fn send(&self, message: &Message) -> MessageFuture<Result<Value, MessageError>>;
}

/// Sends `message`, reporting transport failures other than disconnects.
///
/// # Errors
///
/// Returns the delivery error unchanged, including disconnects.
pub async fn send_message<M: Messenger + ?Sized>(
    messenger: &M,
    reporter: &dyn ErrorReporter,
    message: &Message,
) -> Result<Value, MessageError> {
    let result = messenger.send(message).await;
    if let Err(err) = &result {
        if !err.is_disconnect() {
            reporter.report_error(&format!("type: {}, {err}", message.name()), SEND_ORIGIN);
        }
    }
    result
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op messenger for unsupported targets.
pub struct NoopMessenger;

impl Messenger for NoopMessenger {
    fn send(&self, _message: &Message) -> MessageFuture<Result<Value, MessageError>> {
        Box::pin(async { Ok(Value::Null) })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory messenger that records delivered messages.
///
/// A message is recorded when its send future is polled, not when `send` is called.
pub struct MemoryMessenger {
    delivered: Rc<RefCell<Vec<Message>>>,
    failure: Rc<RefCell<Option<MessageError>>>,
}

impl MemoryMessenger {
    /// Makes every later delivery resolve with `err`.
    pub fn fail_with(&self, err: MessageError) {
        *self.failure.borrow_mut() = Some(err);
    }

    /// Returns the delivered messages in order.
    pub fn delivered(&self) -> Vec<Message> {
        self.delivered.borrow().clone()
    }
}

impl Messenger for MemoryMessenger {
    fn send(&self, message: &Message) -> MessageFuture<Result<Value, MessageError>> {
        let delivered = Rc::clone(&self.delivered);
        let failure = Rc::clone(&self.failure);
        let message = message.clone();
        Box::pin(async move {
            delivered.borrow_mut().push(message);
            match failure.borrow().clone() {
                Some(err) => Err(err),
                None => Ok(Value::Null),
            }
        })
    }
}
