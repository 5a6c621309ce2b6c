//! Type coercion from raw strings into typed JSON values.
//!
//! Raw input reaches the engine as strings, whether typed at a prompt, parsed
//! from a flag, or read out of a payload file. Coercion normalizes a raw
//! string per field type; it never fails, falling back to the raw string when
//! a value does not fit the expected shape.

use serde_json::{Map as JsonMap, Number, Value};
use stratus_types::FieldType;

const GIB: i64 = 1024 * 1024 * 1024;
const MIB: i64 = 1024 * 1024;

/// Coerce a raw string per field type.
pub fn coerce(field_type: FieldType, raw: &str) -> Value {
    match field_type {
        FieldType::Number => coerce_number(raw),
        FieldType::Checkbox => coerce_checkbox(raw),
        FieldType::ByteSize => coerce_byte_size(raw),
        FieldType::KeyValue => coerce_key_value(raw),
        FieldType::TextArray | FieldType::MultiText => coerce_csv(raw),
        FieldType::Text | FieldType::Password | FieldType::Multiline | FieldType::File => {
            Value::String(raw.to_string())
        }
        _ => coerce_default(raw),
    }
}

/// Float when the raw string contains a `.`, integer otherwise; empty input
/// stays empty and anything non-numeric falls back to the raw string.
pub fn coerce_number(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::String(String::new());
    }
    if trimmed.contains('.') {
        if let Ok(parsed) = trimmed.parse::<f64>()
            && let Some(number) = Number::from_f64(parsed)
        {
            return Value::Number(number);
        }
    } else if let Ok(parsed) = trimmed.parse::<i64>() {
        return Value::Number(parsed.into());
    }
    Value::String(raw.to_string())
}

/// Canonical boolean: on/true/yes/1 are truthy, off/false/no/0 falsy.
pub fn coerce_checkbox(raw: &str) -> Value {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Value::Bool(true),
        "off" | "false" | "no" | "0" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

/// Byte count with an optional `G`/`M` suffix multiplying by 1024³/1024².
pub fn coerce_byte_size(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::String(String::new());
    }
    let (digits, multiplier) = match trimmed.chars().next_back() {
        Some('G' | 'g') => (&trimmed[..trimmed.len() - 1], GIB),
        Some('M' | 'm') => (&trimmed[..trimmed.len() - 1], MIB),
        _ => (trimmed, 1),
    };
    match digits.trim().parse::<i64>() {
        Ok(count) => Value::Number((count * multiplier).into()),
        Err(_) => Value::String(raw.to_string()),
    }
}

/// JSON object auto-detected first, else a CSV of `k=v` pairs.
pub fn coerce_key_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.starts_with('{')
        && let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed)
    {
        return Value::Object(map);
    }
    let mut map = JsonMap::new();
    for pair in trimmed.split(',') {
        if let Some((key, value)) = pair.split_once('=') {
            let key = key.trim();
            if !key.is_empty() {
                map.insert(key.to_string(), Value::String(value.trim().to_string()));
            }
        }
    }
    Value::Object(map)
}

/// CSV split with trimmed entries, order preserved, empties dropped.
pub fn coerce_csv(raw: &str) -> Value {
    let entries: Vec<Value> = raw
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| Value::String(entry.to_string()))
        .collect();
    Value::Array(entries)
}

/// Non-text fallback: a raw string that looks like a JSON container is parsed
/// to structured data; parse failure leaves the raw string untouched.
pub fn coerce_default(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(parsed) = serde_json::from_str::<Value>(trimmed) {
            return parsed;
        }
    }
    Value::String(raw.to_string())
}

/// Render an already-typed JSON value back into the raw-token form coercion
/// and candidate matching operate on.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
