//! Small helpers over JSON values shared by the record and batch code

use serde_json::Value;

/// Null, empty or whitespace-only strings, and empty arrays/objects are blank.
///
/// `false` and `0` are values, not blanks.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Equality that tolerates HubSpot returning every property as a string:
/// `5` matches `"5"` and `true` matches `"true"`.
pub fn values_match(local: &Value, remote: &Value) -> bool {
    if local == remote {
        return true;
    }

    match (scalar_text(local), scalar_text(remote)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse an integer id that may arrive as a number or a numeric string
pub fn as_integer_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
