//! Global exception handlers for extension pages.

use std::rc::Rc;

use ext_host::{install_panic_hook, Logger};

/// Sends Rust panics, uncaught script errors and unhandled promise rejections to `logger` as
/// fatal exceptions.
///
/// The panic hook is installed even when the page-level listeners cannot be attached.
///
/// # Errors
///
/// Returns the platform message when the global error listeners cannot be registered.
pub fn install_exception_handlers(logger: &Logger) -> Result<(), String> {
    install_panic_hook(logger.clone());
    let logger = logger.clone();
    crate::bridge::add_exception_listener(Rc::new(move |message: String| {
        logger.exception(None, Some(message.as_str()), true, None);
    }))
}
