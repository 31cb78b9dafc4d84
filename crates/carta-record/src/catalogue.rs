// SPDX-License-Identifier: MIT OR Apache-2.0
//! Catalogue-specific record requirements and revisions.
//!
//! Catalogue records are base records plus structural invariants: a UUID file
//! identifier, a catalogue namespace identifier, a point of contact, unique
//! extent identifiers and well-formed aliases. A [`RecordRevision`] further
//! carries the remote blob's last-commit id from the point of caching.

use serde_json::Value;
use uuid::Uuid;

use crate::codec::{as_object, req_str};
use crate::elements::common::Identifier;
use crate::enums::{ContactRoleCode, HierarchyLevelCode};
use crate::error::RecordError;
use crate::record::{Record, RecordSchema};

/// Namespace of the catalogue itself.
pub const CATALOGUE_NAMESPACE: &str = "data.bas.ac.uk";

/// Namespace for alias identifiers.
pub const ALIAS_NAMESPACE: &str = "alias.data.bas.ac.uk";

/// File identifier permitted to not parse as a UUID, for app tests.
const TEST_SENTINEL: &str = "x";

/// Alias path prefixes permitted per hierarchy level.
fn alias_prefixes(level: HierarchyLevelCode) -> &'static [&'static str] {
    match level {
        HierarchyLevelCode::Collection => &["collections"],
        HierarchyLevelCode::Dataset => &["datasets"],
        HierarchyLevelCode::Initiative => &["projects"],
        HierarchyLevelCode::Product | HierarchyLevelCode::PaperMapProduct => &["products", "maps"],
        _ => &[],
    }
}

/// Alias identifiers within a record.
pub fn record_aliases(record: &Record) -> Vec<Identifier> {
    record
        .identification
        .identifiers()
        .filter(ALIAS_NAMESPACE)
        .0
}

fn invalid(msg: String) -> RecordError {
    RecordError::Invalid(msg)
}

fn validate_file_identifier(record: &Record) -> Result<&str, RecordError> {
    let file_identifier = record
        .file_identifier
        .as_deref()
        .ok_or_else(|| invalid("Records require a file_identifier.".into()))?;
    if Uuid::parse_str(file_identifier).is_err() && file_identifier != TEST_SENTINEL {
        return Err(invalid(format!(
            "Invalid file identifier '{file_identifier}' must be a UUID."
        )));
    }
    Ok(file_identifier)
}

fn validate_identifiers(record: &Record, file_identifier: &str) -> Result<(), RecordError> {
    let matches = record
        .identification
        .identifiers()
        .filter(CATALOGUE_NAMESPACE);
    let identifier = matches
        .0
        .first()
        .ok_or_else(|| invalid("No resource identifier with catalogue namespace.".into()))?;
    if identifier.identifier != file_identifier {
        return Err(invalid(
            "Invalid identifier value in Catalogue resource identifier.".into(),
        ));
    }
    let expected = format!("https://{CATALOGUE_NAMESPACE}/items/{file_identifier}");
    if identifier.href.as_deref() != Some(expected.as_str()) {
        return Err(invalid(
            "Invalid href in Catalogue resource identifier.".into(),
        ));
    }
    Ok(())
}

fn validate_poc(record: &Record) -> Result<(), RecordError> {
    let pocs = record
        .identification
        .contacts()
        .filter(&[ContactRoleCode::PointOfContact]);
    if pocs.is_empty() {
        return Err(invalid(
            "No resource contact with Point of Contact role.".into(),
        ));
    }
    Ok(())
}

fn validate_extents(record: &Record) -> Result<(), RecordError> {
    let mut seen: Vec<&str> = Vec::new();
    for extent in record.identification.extents.iter() {
        if seen.contains(&extent.identifier.as_str()) {
            return Err(invalid(format!(
                "Duplicate extent identifier '{}', must be unique.",
                extent.identifier
            )));
        }
        seen.push(&extent.identifier);
    }
    Ok(())
}

fn validate_aliases(record: &Record) -> Result<(), RecordError> {
    for alias in record_aliases(record) {
        let expected = format!("https://{CATALOGUE_NAMESPACE}/{}", alias.identifier);
        if alias.href.as_deref() != Some(expected.as_str()) {
            return Err(invalid(format!(
                "Invalid alias href '{}' must be '{expected}'.",
                alias.href.as_deref().unwrap_or("")
            )));
        }

        let segments: Vec<&str> = alias.identifier.split('/').collect();
        if segments.len() > 2 {
            return Err(invalid(format!(
                "Invalid alias identifier '{}' must not contain additional '/' values.",
                alias.identifier
            )));
        }

        let prefix = segments.first().copied().unwrap_or("");
        if !alias_prefixes(record.hierarchy_level).contains(&prefix) {
            return Err(invalid(format!(
                "Invalid prefix in alias identifier '{}' for hierarchy level.",
                alias.identifier
            )));
        }

        let suffix = segments.last().copied().unwrap_or("");
        if Uuid::parse_str(suffix).is_ok() {
            return Err(invalid(format!(
                "Invalid alias identifier '{}' must not contain a UUID.",
                alias.identifier
            )));
        }
    }
    Ok(())
}

/// Validate a record against catalogue requirements.
///
/// Runs JSON Schema validation first, then checks that records:
/// - have a file identifier that is a UUID
/// - include an identifier with the catalogue namespace and matching value
/// - include a contact with the point of contact role
/// - use unique extent identifiers
/// - don't use UUIDs as aliases or include extra `/` values
pub fn validate_catalogue_record(
    record: &Record,
    use_profiles: bool,
    force_schemas: Option<&[RecordSchema]>,
) -> Result<(), RecordError> {
    record.validate(use_profiles, force_schemas)?;
    let file_identifier = validate_file_identifier(record)?;
    validate_identifiers(record, file_identifier)?;
    validate_poc(record)?;
    validate_extents(record)?;
    validate_aliases(record)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Revisions
// ---------------------------------------------------------------------------

/// A record plus the remote blob's last-commit id at the point of caching.
///
/// All store-retrieved records are revisions; user-supplied records for push
/// are plain [`Record`]s.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordRevision {
    pub record: Record,
    pub file_revision: String,
}

impl RecordRevision {
    pub fn new(record: Record, file_revision: impl Into<String>) -> Self {
        Self {
            record,
            file_revision: file_revision.into(),
        }
    }

    /// Create a revision from a configuration carrying a `file_revision` key.
    pub fn loads(config: &Value) -> Result<Self, RecordError> {
        let obj = as_object(config, "record revision")?;
        let file_revision = req_str(obj, "file_revision", "record revision")?;
        let mut body = obj.clone();
        body.remove("file_revision");
        Ok(Self {
            record: Record::loads(&Value::Object(body))?,
            file_revision,
        })
    }

    /// The revision's file identifier.
    ///
    /// Store-retrieved records always carry one; the empty string guards the
    /// degenerate case of a hand-built record without.
    pub fn file_identifier(&self) -> &str {
        self.record.file_identifier.as_deref().unwrap_or("")
    }

    /// Canonical configuration plus the `file_revision` key, as cached.
    pub fn dumps_with_revision(&self) -> Value {
        let mut config = self.record.dumps(false);
        if let Value::Object(obj) = &mut config {
            obj.insert(
                "file_revision".into(),
                Value::String(self.file_revision.clone()),
            );
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn valid_config() -> Value {
        json!({
            "file_identifier": "5d5b4e21-fd32-409c-be83-ca1c339903e5",
            "hierarchy_level": "product",
            "metadata": {
                "contacts": [{"organisation": {"name": "x"}, "role": ["pointOfContact"]}],
                "date_stamp": "2014-06-30",
            },
            "identification": {
                "title": {"value": "x"},
                "dates": {"creation": "2014-06-30"},
                "abstract": "x",
                "contacts": [{"organisation": {"name": "x"}, "role": ["pointOfContact"]}],
                "identifiers": [{
                    "identifier": "5d5b4e21-fd32-409c-be83-ca1c339903e5",
                    "href": "https://data.bas.ac.uk/items/5d5b4e21-fd32-409c-be83-ca1c339903e5",
                    "namespace": "data.bas.ac.uk",
                }],
            },
        })
    }

    fn with_alias(identifier: &str, href: &str) -> Value {
        let mut config = valid_config();
        config["identification"]["identifiers"]
            .as_array_mut()
            .unwrap()
            .push(json!({
                "identifier": identifier,
                "href": href,
                "namespace": "alias.data.bas.ac.uk",
            }));
        config
    }

    #[test]
    fn valid_record_passes() {
        let record = Record::loads(&valid_config()).unwrap();
        validate_catalogue_record(&record, true, None).unwrap();
    }

    #[test]
    fn non_uuid_file_identifier_rejected() {
        let mut config = valid_config();
        config["file_identifier"] = json!("not-a-uuid");
        config["identification"]["identifiers"][0]["identifier"] = json!("not-a-uuid");
        config["identification"]["identifiers"][0]["href"] =
            json!("https://data.bas.ac.uk/items/not-a-uuid");
        let record = Record::loads(&config).unwrap();
        let err = validate_catalogue_record(&record, true, None).unwrap_err();
        assert!(err.to_string().contains("must be a UUID"));
    }

    #[test]
    fn missing_catalogue_identifier_rejected() {
        let mut config = valid_config();
        config["identification"]["identifiers"] = json!([]);
        let record = Record::loads(&config).unwrap();
        let err = validate_catalogue_record(&record, true, None).unwrap_err();
        assert!(err.to_string().contains("catalogue namespace"));
    }

    #[test]
    fn wrong_catalogue_href_rejected() {
        let mut config = valid_config();
        config["identification"]["identifiers"][0]["href"] =
            json!("https://data.bas.ac.uk/items/other");
        let record = Record::loads(&config).unwrap();
        let err = validate_catalogue_record(&record, true, None).unwrap_err();
        assert!(err.to_string().contains("Invalid href"));
    }

    #[test]
    fn missing_poc_rejected() {
        let mut config = valid_config();
        config["identification"]["contacts"] =
            json!([{"organisation": {"name": "x"}, "role": ["author"]}]);
        let record = Record::loads(&config).unwrap();
        let err = validate_catalogue_record(&record, true, None).unwrap_err();
        assert!(err.to_string().contains("Point of Contact"));
    }

    #[test]
    fn duplicate_extent_identifiers_rejected() {
        let mut config = valid_config();
        let extent = json!({
            "identifier": "bounding",
            "geographic": {"bounding_box": {
                "west_longitude": 1.0, "east_longitude": 1.0,
                "south_latitude": 1.0, "north_latitude": 1.0,
            }},
        });
        config["identification"]["extents"] = json!([extent, extent]);
        let record = Record::loads(&config).unwrap();
        let err = validate_catalogue_record(&record, true, None).unwrap_err();
        assert!(err.to_string().contains("Duplicate extent identifier"));
    }

    #[test]
    fn alias_containing_uuid_rejected() {
        let config = with_alias(
            "products/123e4567-e89b-12d3-a456-426614174000",
            "https://data.bas.ac.uk/products/123e4567-e89b-12d3-a456-426614174000",
        );
        let record = Record::loads(&config).unwrap();
        let err = validate_catalogue_record(&record, true, None).unwrap_err();
        assert!(err.to_string().contains("must not contain a UUID"));
    }

    #[test]
    fn alias_with_wrong_href_rejected() {
        let config = with_alias("products/foo", "https://example.com/products/foo");
        let record = Record::loads(&config).unwrap();
        let err = validate_catalogue_record(&record, true, None).unwrap_err();
        assert!(err.to_string().contains("Invalid alias href"));
    }

    #[test]
    fn alias_with_extra_segments_rejected() {
        let config = with_alias(
            "products/foo/bar",
            "https://data.bas.ac.uk/products/foo/bar",
        );
        let record = Record::loads(&config).unwrap();
        let err = validate_catalogue_record(&record, true, None).unwrap_err();
        assert!(err.to_string().contains("additional '/'"));
    }

    #[test]
    fn alias_prefix_must_match_hierarchy_level() {
        let config = with_alias("datasets/foo", "https://data.bas.ac.uk/datasets/foo");
        let record = Record::loads(&config).unwrap();
        let err = validate_catalogue_record(&record, true, None).unwrap_err();
        assert!(err.to_string().contains("Invalid prefix"));
    }

    #[test]
    fn product_allows_maps_prefix() {
        let config = with_alias("maps/foo", "https://data.bas.ac.uk/maps/foo");
        let record = Record::loads(&config).unwrap();
        validate_catalogue_record(&record, true, None).unwrap();
    }

    #[test]
    fn revision_loads_and_dumps() {
        let mut config = valid_config();
        config["file_revision"] = json!("abc123");
        let revision = RecordRevision::loads(&config).unwrap();
        assert_eq!(revision.file_revision, "abc123");
        assert_eq!(
            revision.file_identifier(),
            "5d5b4e21-fd32-409c-be83-ca1c339903e5"
        );
        assert_eq!(revision.dumps_with_revision()["file_revision"], json!("abc123"));
    }
}
