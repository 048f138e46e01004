//! Error reporting, persisted last-error records, the logging helper and the panic hook.

pub mod last_error;
pub mod log;
pub mod panic_hook;
pub mod reporter;
