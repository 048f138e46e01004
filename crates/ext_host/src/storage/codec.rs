//! JSON encode/decode helpers that report failures instead of raising them.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::error::StorageError;
use crate::diagnostics::reporter::ErrorReporter;

/// Origin tag used when [`parse`] fails.
pub const PARSE_ORIGIN: &str = "ExtJson.parse";
/// Origin tag used when [`stringify`] or [`to_value`] fails.
pub const STRINGIFY_ORIGIN: &str = "ExtJson.stringify";
/// Origin tag used when [`shallow_copy`] fails.
pub const SHALLOW_COPY_ORIGIN: &str = "ExtJson.shallowCopy";

/// Encoded form of the null sentinel.
pub const NULL_JSON: &str = "null";

/// Decodes `raw` as JSON, reporting and returning `None` on failure.
pub fn parse<T: DeserializeOwned>(reporter: &dyn ErrorReporter, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            reporter.report_error(&err.to_string(), PARSE_ORIGIN);
            None
        }
    }
}

/// Encodes `value` as JSON text, reporting and returning `None` on failure.
pub fn stringify<T: Serialize + ?Sized>(reporter: &dyn ErrorReporter, value: &T) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(raw) => Some(raw),
        Err(err) => {
            reporter.report_error(&err.to_string(), STRINGIFY_ORIGIN);
            None
        }
    }
}

/// Encodes `value` as a structured JSON value, reporting and returning `None` on failure.
pub fn to_value<T: Serialize + ?Sized>(reporter: &dyn ErrorReporter, value: &T) -> Option<Value> {
    match serde_json::to_value(value) {
        Ok(value) => Some(value),
        Err(err) => {
            reporter.report_error(&err.to_string(), STRINGIFY_ORIGIN);
            None
        }
    }
}

/// Decodes a structured JSON value, reporting and returning `None` on failure.
pub fn from_value<T: DeserializeOwned>(reporter: &dyn ErrorReporter, value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(value) => Some(value),
        Err(err) => {
            reporter.report_error(&err.to_string(), PARSE_ORIGIN);
            None
        }
    }
}

/// Copies `value` through a JSON round trip.
///
/// # Errors
///
/// Returns [`StorageError::Codec`] (after reporting it) when the value cannot be encoded or the
/// encoded form does not decode back into `T`.
pub fn shallow_copy<T: Serialize + DeserializeOwned>(
    reporter: &dyn ErrorReporter,
    value: &T,
) -> Result<T, StorageError> {
    serde_json::to_value(value)
        .and_then(serde_json::from_value)
        .map_err(|err| {
            let message = format!("Failed to copy: {err}");
            reporter.report_error(&message, SHALLOW_COPY_ORIGIN);
            StorageError::Codec(message)
        })
}

/// Returns `true` when `value` carries content: not null, not an empty string, array or object.
pub fn is_non_empty(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// Returns `true` when raw stored JSON carries content. Undecodable text counts as content.
pub fn is_raw_non_empty(raw: &str) -> bool {
    serde_json::from_str::<Value>(raw).map_or(!raw.is_empty(), |value| is_non_empty(&value))
}
