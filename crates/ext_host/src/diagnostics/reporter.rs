//! Error reporter contract and adapters.

use std::{cell::RefCell, rc::Rc};

/// Fire-and-forget sink for non-fatal errors.
///
/// Storage, messaging and codec helpers report through this trait instead of returning the
/// error to their caller.
pub trait ErrorReporter {
    /// Reports an error `message` raised at `origin` (for example `ExtStorage.get`).
    fn report_error(&self, message: &str, origin: &str);

    /// Reports an exception. Defaults to [`ErrorReporter::report_error`].
    fn report_exception(&self, message: &str, fatal: bool) {
        let origin = if fatal { "exception.fatal" } else { "exception" };
        self.report_error(message, origin);
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Reporter that emits structured `tracing` events.
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report_error(&self, message: &str, origin: &str) {
        tracing::error!(origin, "{message}");
    }

    fn report_exception(&self, message: &str, fatal: bool) {
        tracing::error!(fatal, "exception: {message}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One error captured by [`MemoryErrorReporter`].
pub struct ReportedError {
    /// Reported message.
    pub message: String,
    /// Reporting origin tag.
    pub origin: String,
}

#[derive(Debug, Clone, Default)]
/// In-memory reporter that records every report, for tests and headless hosts.
pub struct MemoryErrorReporter {
    inner: Rc<RefCell<Vec<ReportedError>>>,
}

impl MemoryErrorReporter {
    /// Returns a snapshot of recorded reports in arrival order.
    pub fn reports(&self) -> Vec<ReportedError> {
        self.inner.borrow().clone()
    }

    /// Returns the origin tags of recorded reports in arrival order.
    pub fn origins(&self) -> Vec<String> {
        self.inner
            .borrow()
            .iter()
            .map(|report| report.origin.clone())
            .collect()
    }

    /// Returns `true` when nothing has been reported.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl ErrorReporter for MemoryErrorReporter {
    fn report_error(&self, message: &str, origin: &str) {
        self.inner.borrow_mut().push(ReportedError {
            message: message.to_string(),
            origin: origin.to_string(),
        });
    }
}
