// SPDX-License-Identifier: MIT OR Apache-2.0
//! Metadata-about-the-metadata block.

use chrono::{NaiveDate, Utc};
use serde_json::{Map, Value};

use crate::codec::{as_object, opt_str, req_str};
use crate::elements::common::Contacts;
use crate::error::RecordError;

/// Fixed metadata standard citation.
#[derive(Clone, Debug, PartialEq)]
pub struct MetadataStandard {
    pub name: String,
    pub version: String,
}

impl Default for MetadataStandard {
    fn default() -> Self {
        Self {
            name: "ISO 19115-2 Geographic Information - Metadata - Part 2: Extensions for \
                   Imagery and Gridded Data"
                .into(),
            version: "ISO 19115-2:2009(E)".into(),
        }
    }
}

impl MetadataStandard {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "metadata_standard";
        let obj = as_object(value, ctx)?;
        Ok(Self {
            name: req_str(obj, "name", ctx)?,
            version: req_str(obj, "version", ctx)?,
        })
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("name".into(), Value::String(self.name.clone()));
        obj.insert("version".into(), Value::String(self.version.clone()));
        Value::Object(obj)
    }
}

/// Metadata block.
///
/// `character_set`, `language` and `metadata_standard` carry fixed defaults
/// which are re-applied on every round-trip. At least one contact is required.
/// `date_stamp` defaults to today (UTC).
#[derive(Clone, Debug, PartialEq)]
pub struct Metadata {
    pub character_set: String,
    pub language: String,
    pub contacts: Contacts,
    pub date_stamp: NaiveDate,
    pub metadata_standard: MetadataStandard,
}

impl Metadata {
    pub const DEFAULT_CHARACTER_SET: &'static str = "utf8";
    pub const DEFAULT_LANGUAGE: &'static str = "eng";

    pub fn new(contacts: Contacts, date_stamp: Option<NaiveDate>) -> Result<Self, RecordError> {
        if contacts.is_empty() {
            return Err(RecordError::malformed(
                "metadata",
                "at least one contact is required",
            ));
        }
        Ok(Self {
            character_set: Self::DEFAULT_CHARACTER_SET.into(),
            language: Self::DEFAULT_LANGUAGE.into(),
            contacts,
            date_stamp: date_stamp.unwrap_or_else(|| Utc::now().date_naive()),
            metadata_standard: MetadataStandard::default(),
        })
    }

    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "metadata";
        let obj = as_object(value, ctx)?;
        let contacts = obj
            .get("contacts")
            .map(Contacts::structure)
            .transpose()?
            .unwrap_or_default();
        let date_stamp = opt_str(obj, "date_stamp", ctx)?
            .map(|raw| {
                NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                    .map_err(|e| RecordError::malformed(ctx, format!("invalid date_stamp: {e}")))
            })
            .transpose()?;
        Self::new(contacts, date_stamp)
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(
            "character_set".into(),
            Value::String(self.character_set.clone()),
        );
        obj.insert("language".into(), Value::String(self.language.clone()));
        obj.insert("contacts".into(), self.contacts.unstructure());
        obj.insert(
            "date_stamp".into(),
            Value::String(self.date_stamp.format("%Y-%m-%d").to_string()),
        );
        obj.insert(
            "metadata_standard".into(),
            self.metadata_standard.unstructure(),
        );
        Value::Object(obj)
    }
}
