//! Typed lookups over loosely-shaped JSON request data
//!
//! Request payloads arrive as free-form JSON. These helpers read optional keys
//! with explicit defaults instead of failing on unexpected shapes.

use serde_json::Value;

/// Tokens accepted as "on" for form options such as `readonly`
pub const FLAG_TOKENS: [&str; 4] = ["1", "true", "on", "yes"];

/// Tokens that check a checkbox
pub const CHECKED_TOKENS: [&str; 5] = ["true", "1", "yes", "on", "x"];

/// Look up `key` when `obj` is an object. `null` counts as missing.
pub fn lookup<'a>(obj: &'a Value, key: &str) -> Option<&'a Value> {
    obj.as_object()
        .and_then(|map| map.get(key))
        .filter(|v| !v.is_null())
}

/// Like [`lookup`], but falsy values (`false`, `0`, `""`, `[]`, `{}`) are
/// treated as missing too.
pub fn lookup_present<'a>(obj: &'a Value, key: &str) -> Option<&'a Value> {
    lookup(obj, key).filter(|v| is_truthy(v))
}

pub fn lookup_str<'a>(obj: &'a Value, key: &str) -> Option<&'a str> {
    lookup(obj, key).and_then(Value::as_str)
}

/// Numeric lookup; numeric strings are accepted as well.
pub fn lookup_f64(obj: &Value, key: &str) -> Option<f64> {
    let number = match lookup(obj, key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

pub fn lookup_u64(obj: &Value, key: &str) -> Option<u64> {
    match lookup(obj, key)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn lookup_bool(obj: &Value, key: &str) -> Option<bool> {
    lookup(obj, key).map(as_flag)
}

/// Boolean option with an explicit default for missing keys
pub fn flag(obj: &Value, key: &str, default: bool) -> bool {
    lookup_bool(obj, key).unwrap_or(default)
}

/// Interpret a JSON value as an on/off option.
///
/// Strings go through [`parse_flag`] so that `"false"` stays off.
pub fn as_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => parse_flag(s),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Null => false,
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Boolean-like string: `1`, `true`, `on`, `yes` in any case
pub fn parse_flag(raw: &str) -> bool {
    let token = raw.trim().to_ascii_lowercase();
    FLAG_TOKENS.contains(&token.as_str())
}

/// Checkbox semantics: the stringified value must be one of
/// [`CHECKED_TOKENS`], case-insensitive. Anything else is unchecked.
pub fn is_checked(value: &Value) -> bool {
    let token = to_field_text(value).to_ascii_lowercase();
    CHECKED_TOKENS.contains(&token.as_str())
}

/// Render a value as the text written into a form field
pub fn to_field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
