//! `chrome.i18n` message lookup and `toLocaleTimeString` time rendering.

use chrono::{NaiveTime, Timelike};
use ext_host::LocaleService;

/// Message key the platform resolves to the active UI locale.
pub const UI_LOCALE_KEY: &str = "@@ui_locale";

#[derive(Debug, Clone, Copy, Default)]
/// Locale service backed by the extension's `_locales` catalog.
pub struct ChromeLocale;

impl LocaleService for ChromeLocale {
    fn message(&self, key: &str) -> Option<String> {
        crate::bridge::i18n_message(key)
    }

    fn ui_locale(&self) -> Option<String> {
        crate::bridge::i18n_message(UI_LOCALE_KEY)
    }

    fn format_time(&self, time: NaiveTime, hour12: bool) -> Result<String, String> {
        crate::bridge::format_time(time.hour(), time.minute(), hour12)
    }
}

#[cfg(test)]
mod tests {
    use ext_host::localize;

    use super::*;

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn non_wasm_locale_falls_back_to_defaults() {
        let locale = ChromeLocale;
        assert_eq!(localize(&locale, "err_error", "An error occurred"), "An error occurred");
        assert_eq!(locale.ui_locale(), None);
        let time = NaiveTime::from_hms_opt(8, 30, 0).expect("time");
        assert!(locale.format_time(time, true).is_err());
    }
}
