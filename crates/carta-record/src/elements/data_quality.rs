// SPDX-License-Identifier: MIT OR Apache-2.0
//! Data quality elements: lineage and domain consistency.
//!
//! The v4 schema has no top-level data quality block; the record codec moves
//! these elements in and out of `identification` when (un)structuring.

use serde_json::{Map, Value};

use crate::codec::{as_array, as_object, req_bool, req_str};
use crate::elements::common::Citation;
use crate::error::RecordError;

/// Lineage (`gmd:LI_Lineage`).
#[derive(Clone, Debug, PartialEq)]
pub struct Lineage {
    pub statement: String,
}

impl Lineage {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let obj = as_object(value, "lineage")?;
        Ok(Self {
            statement: req_str(obj, "statement", "lineage")?,
        })
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("statement".into(), Value::String(self.statement.clone()));
        Value::Object(obj)
    }
}

/// Domain consistency measure (`gmd:DQ_DomainConsistency`).
#[derive(Clone, Debug, PartialEq)]
pub struct DomainConsistency {
    pub specification: Citation,
    pub explanation: String,
    pub result: bool,
}

impl DomainConsistency {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "domain_consistency";
        let obj = as_object(value, ctx)?;
        let mut specification = obj
            .get("specification")
            .cloned()
            .ok_or_else(|| RecordError::malformed(ctx, "missing 'specification'"))?;

        // The v4 schema only allows a single specification contact under the
        // legacy 'contact' key; normalise to the citation's 'contacts' list.
        if let Value::Object(spec) = &mut specification
            && let Some(contact) = spec.remove("contact")
        {
            spec.insert("contacts".into(), Value::Array(vec![contact]));
        }

        Ok(Self {
            specification: Citation::structure(&specification)?,
            explanation: req_str(obj, "explanation", ctx)?,
            result: req_bool(obj, "result", ctx)?,
        })
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("specification".into(), self.specification.unstructure());
        obj.insert("explanation".into(), Value::String(self.explanation.clone()));
        obj.insert("result".into(), Value::Bool(self.result));
        Value::Object(obj)
    }
}

/// Wrapper around a list of [`DomainConsistency`] items.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DomainConsistencies(pub Vec<DomainConsistency>);

impl DomainConsistencies {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let items = as_array(value, "domain_consistency")?;
        Ok(Self(
            items
                .iter()
                .map(DomainConsistency::structure)
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }

    pub fn unstructure(&self) -> Value {
        Value::Array(self.0.iter().map(DomainConsistency::unstructure).collect())
    }

    /// Filter domain consistency elements by specification href.
    pub fn filter(&self, href: &str) -> DomainConsistencies {
        DomainConsistencies(
            self.0
                .iter()
                .filter(|item| item.specification.href.as_deref() == Some(href))
                .cloned()
                .collect(),
        )
    }

    /// Add a domain consistency element without creating duplicates.
    pub fn ensure(&mut self, item: DomainConsistency) {
        if !self.0.contains(&item) {
            self.0.push(item);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DomainConsistency> {
        self.0.iter()
    }
}

/// Data quality block (`gmd:DQ_DataQuality`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataQuality {
    pub lineage: Option<Lineage>,
    pub domain_consistency: DomainConsistencies,
}

impl DataQuality {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let obj = as_object(value, "data_quality")?;
        Ok(Self {
            lineage: obj.get("lineage").map(Lineage::structure).transpose()?,
            domain_consistency: obj
                .get("domain_consistency")
                .map(DomainConsistencies::structure)
                .transpose()?
                .unwrap_or_default(),
        })
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        if let Some(lineage) = &self.lineage {
            obj.insert("lineage".into(), lineage.unstructure());
        }
        if !self.domain_consistency.is_empty() {
            obj.insert(
                "domain_consistency".into(),
                self.domain_consistency.unstructure(),
            );
        }
        Value::Object(obj)
    }

    pub fn is_empty(&self) -> bool {
        self.lineage.is_none() && self.domain_consistency.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn consistency_value() -> Value {
        json!({
            "specification": {
                "title": {"value": "x", "href": "https://example.com/profile"},
                "dates": {"publication": "2024-11-01"},
            },
            "explanation": "Resource within scope of profile.",
            "result": true,
        })
    }

    #[test]
    fn domain_consistency_roundtrip() {
        let value = consistency_value();
        let item = DomainConsistency::structure(&value).unwrap();
        assert_eq!(item.explanation, "Resource within scope of profile.");
        assert!(item.result);
        assert_eq!(item.unstructure(), value);
    }

    #[test]
    fn legacy_specification_contact_normalised() {
        let value = json!({
            "specification": {
                "title": {"value": "x"},
                "dates": {"publication": "2024-11-01"},
                "contact": {"organisation": {"name": "x"}, "role": ["publisher"]},
            },
            "explanation": "x",
            "result": true,
        });
        let item = DomainConsistency::structure(&value).unwrap();
        assert_eq!(item.specification.contacts.len(), 1);
    }

    #[test]
    fn filter_by_specification_href() {
        let items = DomainConsistencies(vec![
            DomainConsistency::structure(&consistency_value()).unwrap(),
        ]);
        assert_eq!(items.filter("https://example.com/profile").0.len(), 1);
        assert!(items.filter("https://example.com/other").is_empty());
    }

    #[test]
    fn ensure_skips_exact_duplicates() {
        let item = DomainConsistency::structure(&consistency_value()).unwrap();
        let mut items = DomainConsistencies::default();
        items.ensure(item.clone());
        items.ensure(item);
        assert_eq!(items.0.len(), 1);
    }
}
