//! Extraction of human-readable messages from error response bodies.
//!
//! The trainer services are not consistent about where they put the message:
//! Flask handlers answer `{"error": ...}`, some proxies use `message`, and
//! validation layers produce `detail` either as a string or as a list of
//! `{loc, msg}` entries.

use serde_json::Value;

const MESSAGE_FIELDS: [&str; 3] = ["error", "message", "detail"];
const VALIDATION_LISTS: [&str; 2] = ["detail", "errors"];
const VALIDATION_MESSAGE_FIELDS: [&str; 2] = ["msg", "message"];

/// Returns the most specific message found in an error body.
///
/// Checked in order: `error`, `message`, `detail` (when a string), then the
/// first entry of a validation-error list (`detail[0]` / `errors[0]`).
#[must_use]
pub fn extract_error_message(body: &Value) -> Option<String> {
    MESSAGE_FIELDS
        .iter()
        .find_map(|field| non_empty(body.get(field)))
        .or_else(|| first_validation_message(body))
}

/// Parses `text` as JSON and runs [`extract_error_message`] on it.
#[must_use]
pub fn error_message_from_text(text: &str) -> Option<String> {
    serde_json::from_str::<Value>(text)
        .ok()
        .as_ref()
        .and_then(extract_error_message)
}

fn first_validation_message(body: &Value) -> Option<String> {
    VALIDATION_LISTS
        .iter()
        .filter_map(|list| body.get(list)?.as_array()?.first())
        .find_map(|entry| match entry {
            Value::String(_) => non_empty(Some(entry)),
            Value::Object(_) => VALIDATION_MESSAGE_FIELDS
                .iter()
                .find_map(|field| non_empty(entry.get(field))),
            _ => None,
        })
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
