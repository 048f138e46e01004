//! Error and exception logging that also persists a [`LastError`].

use std::{error::Error, rc::Rc};

use futures::task::{LocalSpawn, LocalSpawnExt};

use super::{last_error::LastError, reporter::ErrorReporter};
use crate::locale::{localize, LocaleService};
use crate::storage::tiers::AsyncKv;

/// Logs errors to the reporter and records them as the persisted [`LastError`].
#[derive(Clone)]
pub struct Logger {
    reporter: Rc<dyn ErrorReporter>,
    locale: Rc<dyn LocaleService>,
    last_error_tier: Rc<dyn AsyncKv>,
    spawner: Rc<dyn LocalSpawn>,
}

impl Logger {
    /// Creates a logger that stores [`LastError`] records in `last_error_tier`.
    pub fn new(
        reporter: Rc<dyn ErrorReporter>,
        locale: Rc<dyn LocaleService>,
        last_error_tier: Rc<dyn AsyncKv>,
        spawner: Rc<dyn LocalSpawn>,
    ) -> Self {
        Self {
            reporter,
            locale,
            last_error_tier,
            spawner,
        }
    }

    /// Logs an error.
    ///
    /// Empty `msg`, `method` or `title` fall back to the localized `err_unknown`,
    /// `err_unknownMethod` and `err_error` messages. `extra` is appended to the reported message
    /// but not persisted.
    pub fn error(&self, msg: &str, method: Option<&str>, title: Option<&str>, extra: Option<&str>) {
        let msg = self.or_localized(Some(msg), "err_unknown", "unknown");
        let method = self.or_localized(method, "err_unknownMethod", "unknownMethod");
        let title = self.or_localized(title, "err_error", "An error occurred");
        let reported = match extra.filter(|extra| !extra.is_empty()) {
            Some(extra) => format!("{msg} {extra}"),
            None => msg.clone(),
        };
        self.persist(LastError::new(title, msg));
        self.reporter.report_error(&reported, &method);
    }

    /// Logs an exception.
    ///
    /// The message is `msg` when given, otherwise the error's display text, otherwise
    /// `"Unknown exception"`.
    pub fn exception(
        &self,
        err: Option<&dyn Error>,
        msg: Option<&str>,
        fatal: bool,
        title: Option<&str>,
    ) {
        let message = msg
            .filter(|msg| !msg.is_empty())
            .map(str::to_string)
            .or_else(|| err.map(|err| err.to_string()))
            .unwrap_or_else(|| "Unknown exception".to_string());
        let title = self.or_localized(title, "err_exception", "An exception occurred");
        self.persist(LastError::new(title, message.clone()));
        self.reporter.report_exception(&message, fatal);
    }

    fn or_localized(&self, value: Option<&str>, key: &str, default: &str) -> String {
        match value.filter(|value| !value.is_empty()) {
            Some(value) => value.to_string(),
            None => localize(self.locale.as_ref(), key, default),
        }
    }

    fn persist(&self, record: LastError) {
        let tier = Rc::clone(&self.last_error_tier);
        let spawned = self.spawner.spawn_local(async move {
            if let Err(err) = record.save(tier.as_ref()).await {
                tracing::debug!(error = %err, "failed to persist last error");
            }
        });
        if let Err(err) = spawned {
            tracing::debug!(error = %err, "last error persistence not dispatched");
        }
    }
}
