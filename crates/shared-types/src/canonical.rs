//! # Canonical JSON
//!
//! Deterministic serialization of a message body: object keys sorted by
//! byte order at every depth, no insignificant whitespace, strings escaped
//! as `serde_json` escapes them. Signer and verifier both sign/verify this
//! form, so the order in which fields travel on the wire is irrelevant.

use crate::ProtocolError;
use serde::Serialize;
use serde_json::Value;

/// Serialize any value to its canonical JSON form.
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ProtocolError> {
    let value =
        serde_json::to_value(value).map_err(|e| ProtocolError::Serialization(e.to_string()))?;
    Ok(canonicalize(&value))
}

/// Canonical JSON form of an already-built value.
pub fn canonicalize(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_value(item, out);
            }
            out.push('}');
        }
    }
}

fn write_string(s: &str, out: &mut String) {
    // Serializing a str cannot fail
    match serde_json::to_string(s) {
        Ok(escaped) => out.push_str(&escaped),
        Err(_) => out.push_str("\"\""),
    }
}
