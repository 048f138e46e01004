//! Localization contracts: message lookup and time formatting.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use chrono::NaiveTime;

/// Host service for localized strings and locale-aware time rendering.
pub trait LocaleService {
    /// Returns the localized message for `key`, if the catalog has one.
    fn message(&self, key: &str) -> Option<String>;

    /// Returns the active UI locale tag (for example `en_US`).
    fn ui_locale(&self) -> Option<String>;

    /// Renders `time` as a display string, with an AM/PM marker when `hour12` is set.
    ///
    /// # Errors
    ///
    /// Returns an error when the platform formatter is unavailable or fails.
    fn format_time(&self, time: NaiveTime, hour12: bool) -> Result<String, String>;
}

/// Looks up `key`, falling back to `default` when the message is missing or empty.
pub fn localize<L: LocaleService + ?Sized>(locale: &L, key: &str, default: &str) -> String {
    locale
        .message(key)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[derive(Debug, Clone, Copy, Default)]
/// Locale service with an empty catalog and no formatter.
pub struct NoopLocale;

impl LocaleService for NoopLocale {
    fn message(&self, _key: &str) -> Option<String> {
        None
    }

    fn ui_locale(&self) -> Option<String> {
        None
    }

    fn format_time(&self, _time: NaiveTime, _hour12: bool) -> Result<String, String> {
        Err("locale time formatting unavailable".to_string())
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory message catalog with `chrono`-based time formatting.
pub struct MemoryLocale {
    messages: Rc<RefCell<HashMap<String, String>>>,
    ui_locale: Option<String>,
}

impl MemoryLocale {
    /// Creates an empty catalog reporting `ui_locale` as the active locale.
    pub fn with_ui_locale(ui_locale: impl Into<String>) -> Self {
        Self {
            messages: Rc::default(),
            ui_locale: Some(ui_locale.into()),
        }
    }

    /// Adds or replaces a catalog message.
    pub fn insert(&self, key: impl Into<String>, message: impl Into<String>) {
        self.messages.borrow_mut().insert(key.into(), message.into());
    }
}

impl LocaleService for MemoryLocale {
    fn message(&self, key: &str) -> Option<String> {
        self.messages.borrow().get(key).cloned()
    }

    fn ui_locale(&self) -> Option<String> {
        self.ui_locale.clone()
    }

    fn format_time(&self, time: NaiveTime, hour12: bool) -> Result<String, String> {
        let pattern = if hour12 { "%-I:%M %p" } else { "%H:%M" };
        Ok(time.format(pattern).to_string())
    }
}
