//! Routes panics into [`Logger::exception`] as fatal exceptions.

use std::{any::Any, cell::RefCell, panic, panic::Location, sync::Once};

use super::log::Logger;

thread_local! {
    static PANIC_LOGGER: RefCell<Option<Logger>> = RefCell::new(None);
}

static HOOK: Once = Once::new();

/// Forwards panics raised on the current thread to `logger` as fatal exceptions.
///
/// The process-wide hook is installed on first use and chains to the hook that was in place
/// before. Calling again replaces this thread's logger.
pub fn install_panic_hook(logger: Logger) {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            forward(info.payload(), info.location());
            previous(info);
        }));
    });
    PANIC_LOGGER.with(|slot| *slot.borrow_mut() = Some(logger));
}

/// Stops forwarding panics on the current thread and returns the logger that was installed.
///
/// The process-wide hook stays in place and only defers to the previous hook from then on.
pub fn uninstall_panic_hook() -> Option<Logger> {
    PANIC_LOGGER.with(|slot| slot.borrow_mut().take())
}

fn forward(payload: &(dyn Any + Send), location: Option<&Location<'_>>) {
    let message = panic_message(payload, location);
    // The slot is gone during thread teardown and busy if the logger itself panicked.
    let _ = PANIC_LOGGER.try_with(|slot| {
        if let Ok(slot) = slot.try_borrow() {
            if let Some(logger) = slot.as_ref() {
                logger.exception(None, Some(message.as_str()), true, None);
            }
        }
    });
}

fn panic_message(payload: &(dyn Any + Send), location: Option<&Location<'_>>) -> String {
    let text = payload
        .downcast_ref::<&str>()
        .map(|text| text.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "Unknown panic".to_string());
    match location {
        Some(location) => format!("{text} at {}:{}", location.file(), location.line()),
        None => text,
    }
}
