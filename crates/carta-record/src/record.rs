// SPDX-License-Identifier: MIT OR Apache-2.0
//! The record type: an ISO 19115 description of one resource.
//!
//! Records load from and dump to a canonical JSON form. The canonical form is
//! a normative contract: deterministic key order, empty values stripped, data
//! quality folded into identification, internal keys removed. The SHA-1 of
//! its compact ASCII encoding is the record's content hash.

use std::sync::OnceLock;

use serde_json::{Map, Value};
use sha1::{Digest, Sha1};

use crate::clean::{clean_map, dumps_ascii};
use crate::codec::{as_object, req_code};
use crate::elements::common::Contacts;
use crate::elements::data_quality::DataQuality;
use crate::elements::distribution::Distribution;
use crate::elements::identification::Identification;
use crate::elements::metadata::Metadata;
use crate::elements::projection::ReferenceSystemInfo;
use crate::enums::HierarchyLevelCode;
use crate::error::RecordError;

/// URL of the supported record configuration schema.
pub const RECORD_SCHEMA_URL: &str = "https://metadata-resources.data.bas.ac.uk/bas-metadata-generator-configuration-schemas/v2/iso-19115-2-v4.json";

/// URL of the discovery profile schema.
pub const PROFILE_DISCOVERY_URL: &str =
    "https://metadata-standards.data.bas.ac.uk/profiles/magic-discovery-v1/";

/// Reserved key in supplemental information holding sealed admin metadata.
pub const ADMIN_METADATA_KEY: &str = "administrative_metadata";

// ---------------------------------------------------------------------------
// Validation schemas
// ---------------------------------------------------------------------------

/// Validation schemas supported for records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordSchema {
    Iso2V4,
    ProfileDiscoveryV1,
}

impl RecordSchema {
    /// Map a schema href to a [`RecordSchema`], if supported.
    pub fn map_href(href: &str) -> Option<RecordSchema> {
        match href {
            RECORD_SCHEMA_URL => Some(Self::Iso2V4),
            PROFILE_DISCOVERY_URL => Some(Self::ProfileDiscoveryV1),
            _ => None,
        }
    }

    /// Contents of the schema document.
    pub fn contents(&self) -> &'static Value {
        match self {
            Self::Iso2V4 => {
                static SCHEMA: OnceLock<Value> = OnceLock::new();
                SCHEMA.get_or_init(|| {
                    serde_json::from_str(include_str!("../schemas/iso_19115_2_v4.json"))
                        .unwrap_or(Value::Null)
                })
            }
            Self::ProfileDiscoveryV1 => {
                static SCHEMA: OnceLock<Value> = OnceLock::new();
                SCHEMA.get_or_init(|| {
                    serde_json::from_str(include_str!("../schemas/profile_discovery_v1.json"))
                        .unwrap_or(Value::Null)
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// An ISO 19115 description of one resource.
///
/// An incomplete but faithful mapping of the v4 configuration schema to typed
/// elements, with code lists as enums. Configurations load from plain JSON
/// via [`Record::loads`] and dump back via [`Record::dumps`].
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub file_identifier: Option<String>,
    pub hierarchy_level: HierarchyLevelCode,
    pub metadata: Metadata,
    pub reference_system_info: Option<ReferenceSystemInfo>,
    pub identification: Identification,
    pub data_quality: Option<DataQuality>,
    pub distribution: Vec<Distribution>,
}

impl Record {
    /// Create a record from a JSON configuration.
    ///
    /// Where the configuration contains a `$schema` key it must match
    /// [`RECORD_SCHEMA_URL`].
    pub fn loads(config: &Value) -> Result<Self, RecordError> {
        Self::structure(config)
    }

    /// Structure a record from plain JSON.
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "record";
        let obj = as_object(value, ctx)?;

        if let Some(schema) = obj.get("$schema")
            && schema.as_str() != Some(RECORD_SCHEMA_URL)
        {
            return Err(RecordError::UnsupportedSchema);
        }

        // Move any data quality elements out of identification; the v4 schema
        // nests them there as a workaround.
        let mut identification_value = obj
            .get("identification")
            .cloned()
            .ok_or_else(|| RecordError::malformed(ctx, "missing 'identification'"))?;
        let mut data_quality_value = obj.get("data_quality").cloned();
        if let Value::Object(identification_obj) = &mut identification_value {
            let mut dq = Map::new();
            if let Some(lineage) = identification_obj.remove("lineage") {
                dq.insert("lineage".into(), lineage);
            }
            if let Some(consistency) = identification_obj.remove("domain_consistency") {
                dq.insert("domain_consistency".into(), consistency);
            }
            if !dq.is_empty() {
                data_quality_value = Some(Value::Object(dq));
            }
        }

        let metadata = obj
            .get("metadata")
            .ok_or_else(|| RecordError::malformed(ctx, "missing 'metadata'"))?;
        let distribution = match obj.get("distribution") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(Distribution::structure)
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(RecordError::malformed(ctx, "non-list 'distribution'")),
        };

        Ok(Self {
            file_identifier: crate::codec::opt_str(obj, "file_identifier", ctx)?,
            hierarchy_level: req_code(obj, "hierarchy_level", ctx)?,
            metadata: Metadata::structure(metadata)?,
            reference_system_info: obj
                .get("reference_system_info")
                .map(ReferenceSystemInfo::structure)
                .transpose()?,
            identification: Identification::structure(&identification_value)?,
            data_quality: data_quality_value
                .map(|dq| DataQuality::structure(&dq))
                .transpose()?,
            distribution,
        })
    }

    /// Convert the record to plain JSON.
    ///
    /// Re-applies static defaults, strips empty values, folds data quality
    /// back into identification and removes internal keys.
    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        if let Some(file_identifier) = &self.file_identifier {
            obj.insert(
                "file_identifier".into(),
                Value::String(file_identifier.clone()),
            );
        }
        obj.insert(
            "hierarchy_level".into(),
            Value::String(self.hierarchy_level.as_str().to_owned()),
        );
        obj.insert("metadata".into(), self.metadata.unstructure());
        if let Some(projection) = &self.reference_system_info {
            obj.insert("reference_system_info".into(), projection.unstructure());
        }
        obj.insert("identification".into(), self.identification.unstructure());
        if let Some(data_quality) = &self.data_quality
            && !data_quality.is_empty()
        {
            obj.insert("data_quality".into(), data_quality.unstructure());
        }
        if !self.distribution.is_empty() {
            obj.insert(
                "distribution".into(),
                Value::Array(
                    self.distribution
                        .iter()
                        .map(Distribution::unstructure)
                        .collect(),
                ),
            );
        }

        let mut cleaned = clean_map(obj);

        // Fold data quality back into identification.
        if let Some(Value::Object(dq)) = cleaned.remove("data_quality")
            && let Some(Value::Object(identification)) = cleaned.get_mut("identification")
        {
            for (key, value) in dq {
                identification.insert(key, value);
            }
        }

        Value::Object(cleaned)
    }

    /// Export the record as its canonical JSON form.
    ///
    /// If `strip_admin` is true any sealed administrative metadata held in the
    /// record's supplemental information is removed first.
    pub fn dumps(&self, strip_admin: bool) -> Value {
        if strip_admin {
            let mut stripped = self.clone();
            stripped.strip_admin_metadata();
            stripped.unstructure()
        } else {
            self.unstructure()
        }
    }

    /// Export the record as a JSON Schema instance string (2-space indent).
    pub fn dumps_json(&self, strip_admin: bool) -> String {
        let mut obj = Map::new();
        obj.insert(
            "$schema".into(),
            Value::String(RECORD_SCHEMA_URL.to_owned()),
        );
        if let Value::Object(body) = self.dumps(strip_admin) {
            for (key, value) in body {
                obj.insert(key, value);
            }
        }
        serde_json::to_string_pretty(&Value::Object(obj)).unwrap_or_default()
    }

    /// Export the record as an ISO 19115 XML document via the given codec.
    pub fn dumps_xml(
        &self,
        codec: &dyn crate::xml::IsoXmlCodec,
        strip_admin: bool,
    ) -> Result<String, crate::xml::IsoXmlError> {
        codec.encode(&self.dumps(strip_admin))
    }

    /// SHA-1 content hash of the canonical form.
    pub fn sha1(&self) -> String {
        let encoded = dumps_ascii(&self.dumps(true));
        let mut hasher = Sha1::new();
        hasher.update(encoded.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Remove any sealed administrative metadata from the record.
    ///
    /// If it was the only supplemental key, supplemental information becomes
    /// `None` rather than an empty object.
    pub fn strip_admin_metadata(&mut self) {
        let Some(raw) = &self.identification.supplemental_information else {
            return;
        };
        let Ok(Value::Object(mut kv)) = serde_json::from_str::<Value>(raw) else {
            return;
        };
        kv.remove(ADMIN_METADATA_KEY);
        self.identification.supplemental_information = if kv.is_empty() {
            None
        } else {
            serde_json::to_string(&Value::Object(kv)).ok()
        };
    }

    /// Point-of-contact style shortcut used across exporters.
    pub fn contacts(&self) -> &Contacts {
        self.identification.contacts()
    }

    /// Validation schemas matched from domain consistency elements.
    fn profile_schemas(&self) -> Vec<RecordSchema> {
        let Some(data_quality) = &self.data_quality else {
            return Vec::new();
        };
        data_quality
            .domain_consistency
            .iter()
            .filter_map(|dc| {
                dc.specification
                    .href
                    .as_deref()
                    .and_then(RecordSchema::map_href)
            })
            .collect()
    }

    fn validation_schemas(
        &self,
        use_profiles: bool,
        force_schemas: Option<&[RecordSchema]>,
    ) -> Vec<RecordSchema> {
        if let Some(forced) = force_schemas {
            return forced.to_vec();
        }
        let mut selected = vec![RecordSchema::Iso2V4];
        if use_profiles {
            selected.extend(self.profile_schemas());
        }
        selected
    }

    /// Validate the record against JSON Schemas.
    ///
    /// By default records validate against the v4 schema plus schemas matched
    /// from any domain consistency elements. `force_schemas` overrides the
    /// selection entirely.
    pub fn validate(
        &self,
        use_profiles: bool,
        force_schemas: Option<&[RecordSchema]>,
    ) -> Result<(), RecordError> {
        let mut config = Map::new();
        config.insert(
            "$schema".into(),
            Value::String(RECORD_SCHEMA_URL.to_owned()),
        );
        if let Value::Object(body) = self.dumps(true) {
            for (key, value) in body {
                config.insert(key, value);
            }
        }
        let config = Value::Object(config);

        for schema in self.validation_schemas(use_profiles, force_schemas) {
            let validator = jsonschema::validator_for(schema.contents())
                .map_err(|e| RecordError::Invalid(e.to_string()))?;
            if let Err(error) = validator.validate(&config) {
                return Err(RecordError::Invalid(error.to_string()));
            }
        }
        Ok(())
    }
}

/// Normalise a raw configuration for supported-content comparison.
///
/// Adds the static defaults a round-trip would apply so a raw configuration
/// compares equal to its re-dumped form when fully supported.
pub fn normalise_config(config: &Value) -> Value {
    let mut normalised = config.clone();
    if let Value::Object(obj) = &mut normalised {
        if let Some(Value::Object(metadata)) = obj.get_mut("metadata") {
            metadata.insert("character_set".into(), Value::String("utf8".into()));
            metadata.insert("language".into(), Value::String("eng".into()));
            metadata.insert(
                "metadata_standard".into(),
                crate::elements::metadata::MetadataStandard::default().unstructure(),
            );
            metadata.remove("maintenance");
        }
        if let Some(Value::Object(identification)) = obj.get_mut("identification") {
            identification.insert("character_set".into(), Value::String("utf8".into()));
            identification.insert("language".into(), Value::String("eng".into()));
        }
        if obj.get("$schema").and_then(Value::as_str) == Some(RECORD_SCHEMA_URL) {
            obj.remove("$schema");
        }
    }
    match normalised {
        Value::Object(obj) => Value::Object(clean_map(obj)),
        other => other,
    }
}

/// Whether a raw configuration is fully supported by the typed model.
///
/// Unsupported content is content the model would silently drop on a
/// round-trip; callers typically log a warning when this returns false.
pub fn config_supported(config: &Value) -> Result<bool, RecordError> {
    let record = Record::loads(config)?;
    Ok(normalise_config(config) == record.dumps(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn minimal_config() -> Value {
        json!({
            "file_identifier": "5d5b4e21-fd32-409c-be83-ca1c339903e5",
            "hierarchy_level": "product",
            "metadata": {
                "character_set": "utf8",
                "language": "eng",
                "contacts": [{"organisation": {"name": "x"}, "role": ["pointOfContact"]}],
                "date_stamp": "2014-06-30",
                "metadata_standard": {
                    "name": "ISO 19115-2 Geographic Information - Metadata - Part 2: Extensions for Imagery and Gridded Data",
                    "version": "ISO 19115-2:2009(E)",
                },
            },
            "identification": {
                "title": {"value": "x"},
                "dates": {"creation": "2014-06-30"},
                "abstract": "x",
                "character_set": "utf8",
                "language": "eng",
            },
        })
    }

    #[test]
    fn roundtrip_reproduces_input() {
        let config = minimal_config();
        let record = Record::loads(&config).unwrap();
        assert_eq!(record.unstructure(), config);
    }

    #[test]
    fn sha1_is_stable() {
        let record = Record::loads(&minimal_config()).unwrap();
        let reloaded = Record::loads(&record.dumps(true)).unwrap();
        assert_eq!(record.sha1(), reloaded.sha1());
        assert_eq!(record.sha1().len(), 40);
    }

    #[test]
    fn unsupported_schema_rejected() {
        let mut config = minimal_config();
        config["$schema"] = json!("https://example.com/other-schema.json");
        assert!(matches!(
            Record::loads(&config),
            Err(RecordError::UnsupportedSchema)
        ));
    }

    #[test]
    fn matching_schema_accepted() {
        let mut config = minimal_config();
        config["$schema"] = json!(RECORD_SCHEMA_URL);
        assert!(Record::loads(&config).is_ok());
    }

    #[test]
    fn lineage_moves_to_data_quality_and_back() {
        let mut config = minimal_config();
        config["identification"]["lineage"] = json!({"statement": "Derived from survey data."});
        let record = Record::loads(&config).unwrap();
        assert!(record.data_quality.as_ref().unwrap().lineage.is_some());

        let dumped = record.dumps(true);
        assert_eq!(
            dumped["identification"]["lineage"]["statement"],
            json!("Derived from survey data.")
        );
        assert!(dumped.get("data_quality").is_none());
    }

    #[test]
    fn dumps_json_includes_schema_url() {
        let record = Record::loads(&minimal_config()).unwrap();
        let encoded = record.dumps_json(true);
        assert!(encoded.contains(RECORD_SCHEMA_URL));
        assert!(encoded.starts_with("{\n  \"$schema\""));
    }

    #[test]
    fn strip_admin_metadata_removes_reserved_key() {
        let mut config = minimal_config();
        config["identification"]["supplemental_information"] =
            json!("{\"administrative_metadata\": \"token\", \"physical_size_width_mm\": 210}");
        let mut record = Record::loads(&config).unwrap();
        record.strip_admin_metadata();
        let remaining = record.identification.supplemental_information.unwrap();
        assert!(remaining.contains("physical_size_width_mm"));
        assert!(!remaining.contains("administrative_metadata"));
    }

    #[test]
    fn strip_admin_metadata_clears_when_last_key() {
        let mut config = minimal_config();
        config["identification"]["supplemental_information"] =
            json!("{\"administrative_metadata\": \"token\"}");
        let mut record = Record::loads(&config).unwrap();
        record.strip_admin_metadata();
        assert!(record.identification.supplemental_information.is_none());
    }

    #[test]
    fn sha1_ignores_admin_metadata() {
        let base = Record::loads(&minimal_config()).unwrap();
        let mut config = minimal_config();
        config["identification"]["supplemental_information"] =
            json!("{\"administrative_metadata\": \"token\"}");
        let sealed = Record::loads(&config).unwrap();
        assert_eq!(base.sha1(), sealed.sha1());
    }

    #[test]
    fn validate_passes_for_minimal_record() {
        let record = Record::loads(&minimal_config()).unwrap();
        record.validate(true, None).unwrap();
    }

    #[test]
    fn validate_fails_for_missing_abstract() {
        // Build a config that decodes but violates the schema contract by
        // blanking a required value.
        let config = minimal_config();
        let mut record = Record::loads(&config).unwrap();
        record.identification.abstract_ = String::new();
        assert!(matches!(
            record.validate(true, None),
            Err(RecordError::Invalid(_))
        ));
    }

    #[test]
    fn config_supported_detects_dropped_content() {
        let config = minimal_config();
        assert!(config_supported(&config).unwrap());

        let mut extra = config.clone();
        extra["identification"]["unsupported_key"] = json!("x");
        assert!(!config_supported(&extra).unwrap());
    }
}
