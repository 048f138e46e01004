//! Receive side of runtime messaging: listener registration and in-memory dispatch.

use std::{cell::RefCell, fmt, rc::Rc};

use serde_json::Value;

use super::{Message, MessageError};

/// Callback invoked for every received [`Message`].
///
/// Returning `Some` answers the sender; the first listener to answer wins.
pub type MessageListener = Rc<dyn Fn(&Message) -> Option<Value>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Handle returned by [`MessageListeners::add_listener`], used to remove the listener later.
pub struct ListenerId(u64);

impl ListenerId {
    /// Wraps a raw registration number.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw registration number.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Host service that delivers messages sent from other extension contexts.
pub trait MessageListeners {
    /// Registers `listener` for every later message.
    ///
    /// # Errors
    ///
    /// Returns an error when the host has no message channel to listen on.
    fn add_listener(&self, listener: MessageListener) -> Result<ListenerId, MessageError>;

    /// Unregisters the listener behind `id`, returning `false` when it was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(ListenerId, MessageListener)>,
}

#[derive(Clone, Default)]
/// In-memory listener registry with explicit [`MemoryMessageListeners::dispatch`].
pub struct MemoryMessageListeners {
    registry: Rc<RefCell<Registry>>,
}

impl fmt::Debug for MemoryMessageListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryMessageListeners").finish_non_exhaustive()
    }
}

impl MemoryMessageListeners {
    /// Delivers `message` to every listener in registration order.
    ///
    /// Returns the first response. Listeners may add or remove listeners while being called; the
    /// change applies from the next dispatch.
    pub fn dispatch(&self, message: &Message) -> Option<Value> {
        let listeners: Vec<MessageListener> = self
            .registry
            .borrow()
            .listeners
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        let mut response = None;
        for listener in listeners {
            let answer = listener(message);
            if response.is_none() {
                response = answer;
            }
        }
        response
    }

    /// Returns the number of registered listeners.
    pub fn len(&self) -> usize {
        self.registry.borrow().listeners.len()
    }

    /// Returns `true` when no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MessageListeners for MemoryMessageListeners {
    fn add_listener(&self, listener: MessageListener) -> Result<ListenerId, MessageError> {
        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let id = ListenerId::new(registry.next_id);
        registry.listeners.push((id, listener));
        Ok(id)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut registry = self.registry.borrow_mut();
        let before = registry.listeners.len();
        registry.listeners.retain(|(registered, _)| *registered != id);
        registry.listeners.len() != before
    }
}
