// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared helpers for the explicit structure/unstructure codecs.
//!
//! Each element provides `structure(&Value) -> Result<Self, RecordError>` and
//! `unstructure(&self) -> Value`. These helpers keep the per-element codecs
//! short and give consistent error context.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::RecordError;

pub(crate) type Object = Map<String, Value>;

pub(crate) fn as_object<'a>(value: &'a Value, ctx: &str) -> Result<&'a Object, RecordError> {
    value
        .as_object()
        .ok_or_else(|| RecordError::malformed(ctx, "expected an object"))
}

pub(crate) fn as_array<'a>(value: &'a Value, ctx: &str) -> Result<&'a Vec<Value>, RecordError> {
    value
        .as_array()
        .ok_or_else(|| RecordError::malformed(ctx, "expected a list"))
}

pub(crate) fn req_str(obj: &Object, key: &str, ctx: &str) -> Result<String, RecordError> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| RecordError::malformed(ctx, format!("missing or non-string '{key}'")))
}

pub(crate) fn opt_str(obj: &Object, key: &str, ctx: &str) -> Result<Option<String>, RecordError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(RecordError::malformed(ctx, format!("non-string '{key}'"))),
    }
}

pub(crate) fn req_f64(obj: &Object, key: &str, ctx: &str) -> Result<f64, RecordError> {
    obj.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| RecordError::malformed(ctx, format!("missing or non-numeric '{key}'")))
}

pub(crate) fn opt_u64(obj: &Object, key: &str, ctx: &str) -> Result<Option<u64>, RecordError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .map(Some)
            .ok_or_else(|| RecordError::malformed(ctx, format!("non-integer '{key}'"))),
    }
}

pub(crate) fn req_bool(obj: &Object, key: &str, ctx: &str) -> Result<bool, RecordError> {
    obj.get(key)
        .and_then(Value::as_bool)
        .ok_or_else(|| RecordError::malformed(ctx, format!("missing or non-boolean '{key}'")))
}

/// Decode a code list term via its serde representation.
pub(crate) fn req_code<T: DeserializeOwned>(
    obj: &Object,
    key: &str,
    ctx: &str,
) -> Result<T, RecordError> {
    let value = obj
        .get(key)
        .ok_or_else(|| RecordError::malformed(ctx, format!("missing '{key}'")))?;
    serde_json::from_value(value.clone())
        .map_err(|e| RecordError::malformed(ctx, format!("invalid '{key}': {e}")))
}

pub(crate) fn opt_code<T: DeserializeOwned>(
    obj: &Object,
    key: &str,
    ctx: &str,
) -> Result<Option<T>, RecordError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| RecordError::malformed(ctx, format!("invalid '{key}': {e}"))),
    }
}

/// Encode a code list term via its serde representation.
pub(crate) fn code_value<T: Serialize>(code: &T) -> Value {
    serde_json::to_value(code).unwrap_or(Value::Null)
}

/// Insert a value only when present.
pub(crate) fn insert_opt(obj: &mut Object, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        obj.insert(key.to_owned(), value);
    }
}

/// Insert a string only when present.
pub(crate) fn insert_opt_str(obj: &mut Object, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        obj.insert(key.to_owned(), Value::String(value.to_owned()));
    }
}
