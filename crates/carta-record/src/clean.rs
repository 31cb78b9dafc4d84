// SPDX-License-Identifier: MIT OR Apache-2.0
//! Helpers for producing the canonical JSON form.
//!
//! The canonical form strips `null` and empty container values recursively and
//! is encoded with sorted keys (the default `serde_json` map is ordered) and
//! ASCII-only escapes for hashing.

use serde_json::{Map, Value};

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn clean_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let cleaned: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, clean_value(v)))
                .filter(|(_, v)| !is_empty(v))
                .collect();
            Value::Object(cleaned)
        }
        Value::Array(items) => {
            let cleaned: Vec<Value> = items
                .into_iter()
                .map(clean_value)
                .filter(|v| !is_empty(v))
                .collect();
            Value::Array(cleaned)
        }
        other => other,
    }
}

/// Remove any `null` or empty list/object values from an object, recursively.
pub fn clean_map(map: Map<String, Value>) -> Map<String, Value> {
    match clean_value(Value::Object(map)) {
        Value::Object(cleaned) => cleaned,
        _ => Map::new(),
    }
}

/// Remove any `null` or empty list/object values from a list, recursively.
pub fn clean_list(items: Vec<Value>) -> Vec<Value> {
    match clean_value(Value::Array(items)) {
        Value::Array(cleaned) => cleaned,
        _ => Vec::new(),
    }
}

/// Encode a JSON value compactly with all non-ASCII characters escaped.
///
/// Gives a stable byte encoding for content hashing regardless of the
/// platform's treatment of non-ASCII text. Keys are already sorted because
/// `serde_json` objects are ordered maps.
pub fn dumps_ascii(value: &Value) -> String {
    let compact = value.to_string();
    let mut out = String::with_capacity(compact.len());
    for c in compact.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut buf = [0u16; 2];
            for unit in c.encode_utf16(&mut buf) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_map_strips_empty_values() {
        let map = match json!({
            "a": "x",
            "b": null,
            "c": [],
            "d": {},
            "e": {"f": null, "g": []},
            "h": [null, {}, "y"],
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let cleaned = Value::Object(clean_map(map));
        assert_eq!(cleaned, json!({"a": "x", "h": ["y"]}));
    }

    #[test]
    fn clean_map_strips_nested_emptiness() {
        // An object that becomes empty after cleaning is itself removed.
        let map = match json!({"a": {"b": {"c": null}}}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let cleaned = Value::Object(clean_map(map));
        assert_eq!(cleaned, json!({}));
    }

    #[test]
    fn clean_list_strips_empty_values() {
        let items = match json!([null, [], {}, "x", 1]) {
            Value::Array(items) => items,
            _ => unreachable!(),
        };
        assert_eq!(Value::Array(clean_list(items)), json!(["x", 1]));
    }

    #[test]
    fn dumps_ascii_escapes_non_ascii() {
        let value = json!({"title": "Rothera\u{2014}Adelaide"});
        let encoded = dumps_ascii(&value);
        assert!(encoded.is_ascii());
        assert!(encoded.contains("\\u2014"));
    }

    #[test]
    fn dumps_ascii_escapes_astral_chars_as_surrogates() {
        let value = json!("\u{1F5FA}");
        assert_eq!(dumps_ascii(&value), "\"\\ud83d\\uddfa\"");
    }

    #[test]
    fn dumps_ascii_is_stable() {
        let value = json!({"b": 1, "a": 2});
        assert_eq!(dumps_ascii(&value), dumps_ascii(&value));
        // serde_json object maps are ordered, so keys come out sorted.
        assert_eq!(dumps_ascii(&value), "{\"a\":2,\"b\":1}");
    }
}
