// SPDX-License-Identifier: MIT OR Apache-2.0
//! Freeform key/value storage within a record's supplemental information.

use serde_json::{Map, Value};

use carta_record::Record;

use crate::AdminError;

/// Read the key/value object held in a record's supplemental information.
///
/// Returns an empty map where supplemental information is absent or not a
/// JSON object (freeform text is not an error, just not key/value data).
pub fn get_kv(record: &Record) -> Map<String, Value> {
    let Some(raw) = &record.identification.supplemental_information else {
        return Map::new();
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Merge key/values into a record's supplemental information.
///
/// Existing keys not present in `kv` are preserved; matching keys are
/// replaced. Fails if existing supplemental information is non-object JSON.
pub fn set_kv(record: &mut Record, kv: Map<String, Value>) -> Result<(), AdminError> {
    let mut merged = match &record.identification.supplemental_information {
        None => Map::new(),
        Some(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(AdminError::InvalidSupplementalInfo),
            Err(_) => return Err(AdminError::InvalidSupplementalInfo),
        },
    };
    for (key, value) in kv {
        merged.insert(key, value);
    }
    record.identification.supplemental_information =
        Some(serde_json::to_string(&Value::Object(merged))?);
    Ok(())
}
