//! Time-of-day helpers over a 24-hour clock.
//!
//! Times are `HH:MM` strings interpreted as today's local wall-clock time. [`window::ClockWindow`]
//! answers offset and wraparound-aware range queries against an injected [`clock::Clock`].

pub mod clock;
pub mod clock_time;
pub mod window;

/// Default time string.
pub const DEF_TIME: &str = "00:00";
/// Milliseconds in a minute.
pub const MSEC_IN_MIN: i64 = 60 * 1000;
/// Minutes in an hour.
pub const MIN_IN_HOUR: i64 = 60;
/// Milliseconds in an hour.
pub const MSEC_IN_HOUR: i64 = MIN_IN_HOUR * MSEC_IN_MIN;
/// Minutes in a day.
pub const MIN_IN_DAY: i64 = 24 * MIN_IN_HOUR;
/// Milliseconds in a day.
pub const MSEC_IN_DAY: i64 = MIN_IN_DAY * MSEC_IN_MIN;
