//! Epoch offsets, wraparound-aware ranges and display strings for `HH:MM` times.

use std::rc::Rc;

use super::{
    clock::Clock,
    clock_time::{ClockTime, TimeFormat},
    DEF_TIME, MIN_IN_DAY, MSEC_IN_MIN,
};
use crate::locale::LocaleService;

/// Answers time-of-day queries against an injected clock and locale.
#[derive(Clone)]
pub struct ClockWindow {
    clock: Rc<dyn Clock>,
    locale: Rc<dyn LocaleService>,
}

impl ClockWindow {
    /// Creates a window over `clock`, rendering through `locale`.
    pub fn new(clock: Rc<dyn Clock>, locale: Rc<dyn LocaleService>) -> Self {
        Self { clock, locale }
    }

    /// Parses `text`, using the current hour and minute when it is absent or empty.
    ///
    /// Malformed text logs a warning and yields [`DEF_TIME`].
    pub fn parse(&self, text: Option<&str>) -> ClockTime {
        match text.filter(|text| !text.is_empty()) {
            None => ClockTime::from_datetime(&self.clock.now()),
            Some(text) => text.parse().unwrap_or_else(|err| {
                tracing::warn!(text, error = %err, "malformed time string, using {DEF_TIME}");
                ClockTime::midnight()
            }),
        }
    }

    /// Returns the epoch milliseconds of today at `text`, seconds zeroed.
    pub fn to_epoch(&self, text: &str) -> i64 {
        let time = self.parse(Some(text));
        self.epoch_today(time)
    }

    fn epoch_today(&self, time: ClockTime) -> i64 {
        let now = self.clock.now();
        let local = now.date_naive().and_time(time.as_naive());
        let offset_ms = i64::from(now.offset().local_minus_utc()) * 1000;
        local.and_utc().timestamp_millis() - offset_ms
    }

    /// Minutes until the next occurrence of `text`, today or tomorrow.
    pub fn minutes_until(&self, text: &str) -> f64 {
        let now = self.clock.now().timestamp_millis();
        let delta = (self.to_epoch(text) - now) as f64 / MSEC_IN_MIN as f64;
        if delta < 0.0 {
            delta + MIN_IN_DAY as f64
        } else {
            delta
        }
    }

    /// Returns `true` when now lies in `[start, stop]`, inclusive.
    ///
    /// Equal strings form an always-open window. A stop at or before the start wraps past
    /// midnight.
    pub fn is_in_range(&self, start: &str, stop: &str) -> bool {
        if start == stop {
            return true;
        }
        let now = self.clock.now().timestamp_millis();
        let start_ms = self.to_epoch(start);
        let stop_ms = self.to_epoch(stop);
        if stop_ms > start_ms {
            now >= start_ms && now <= stop_ms
        } else {
            now >= start_ms || now <= stop_ms
        }
    }

    /// Renders `text` for display in `format`.
    ///
    /// Falls back to a raw `HH:MM:SS` rendering when the locale formatter fails.
    pub fn format(&self, text: &str, format: TimeFormat) -> String {
        self.render(self.parse(Some(text)), format)
    }

    /// Renders the current time as bare `HH:MM` digits, without an AM/PM marker.
    pub fn format_short(&self, format: TimeFormat) -> String {
        let rendered = self.render(self.parse(None), format);
        let digits: String = rendered
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == ':')
            .collect();
        match digits.match_indices(':').nth(1) {
            Some((second_colon, _)) => digits[..second_colon].to_string(),
            None => digits,
        }
    }

    fn render(&self, time: ClockTime, format: TimeFormat) -> String {
        let naive = time.as_naive();
        self.locale
            .format_time(naive, !format.is_24_hour())
            .unwrap_or_else(|err| {
                tracing::debug!(error = %err, "locale time formatting failed");
                naive.format("%H:%M:%S").to_string()
            })
    }
}
