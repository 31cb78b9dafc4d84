// SPDX-License-Identifier: MIT OR Apache-2.0
//! Identification elements: aggregations, constraints, extents, graphic
//! overviews, maintenance and the identification block itself.

use serde_json::{Map, Value};

use crate::codec::{
    as_array, as_object, code_value, insert_opt, insert_opt_str, opt_code, opt_str,
    opt_u64, req_code, req_f64, req_str,
};
use crate::elements::common::{Citation, Contacts, Date, Dates, Identifier, Identifiers, Series};
use crate::enums::{
    AggregationAssociationCode, AggregationInitiativeCode, ConstraintRestrictionCode,
    ConstraintTypeCode, MaintenanceFrequencyCode, ProgressCode,
};
use crate::error::RecordError;

// ---------------------------------------------------------------------------
// Aggregations
// ---------------------------------------------------------------------------

/// Cross-reference to another record (`gmd:MD_AggregateInformation`).
#[derive(Clone, Debug, PartialEq)]
pub struct Aggregation {
    pub identifier: Identifier,
    pub association_type: AggregationAssociationCode,
    pub initiative_type: Option<AggregationInitiativeCode>,
}

impl Aggregation {
    /// Whether this aggregation matches the given predicates.
    ///
    /// Predicates combine with AND; values within each predicate with OR.
    pub fn matches_filter(
        &self,
        namespace: Option<&str>,
        identifiers: Option<&[&str]>,
        associations: Option<&[AggregationAssociationCode]>,
        initiatives: Option<&[AggregationInitiativeCode]>,
    ) -> bool {
        if let Some(namespace) = namespace
            && self.identifier.namespace != namespace
        {
            return false;
        }
        if let Some(identifiers) = identifiers
            && !identifiers.contains(&self.identifier.identifier.as_str())
        {
            return false;
        }
        if let Some(associations) = associations
            && !associations.contains(&self.association_type)
        {
            return false;
        }
        if let Some(initiatives) = initiatives {
            match self.initiative_type {
                Some(initiative) if initiatives.contains(&initiative) => {}
                _ => return false,
            }
        }
        true
    }

    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "aggregation";
        let obj = as_object(value, ctx)?;
        let identifier = obj
            .get("identifier")
            .ok_or_else(|| RecordError::malformed(ctx, "missing 'identifier'"))?;
        Ok(Self {
            identifier: Identifier::structure(identifier)?,
            association_type: req_code(obj, "association_type", ctx)?,
            initiative_type: opt_code(obj, "initiative_type", ctx)?,
        })
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("identifier".into(), self.identifier.unstructure());
        obj.insert("association_type".into(), code_value(&self.association_type));
        insert_opt(
            &mut obj,
            "initiative_type",
            self.initiative_type.as_ref().map(code_value),
        );
        Value::Object(obj)
    }
}

/// Wrapper around a list of [`Aggregation`] items with filtering.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Aggregations(pub Vec<Aggregation>);

impl Aggregations {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let items = as_array(value, "aggregations")?;
        Ok(Self(
            items
                .iter()
                .map(Aggregation::structure)
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }

    pub fn unstructure(&self) -> Value {
        Value::Array(self.0.iter().map(Aggregation::unstructure).collect())
    }

    /// Referenced identifiers, optionally excluding some values.
    pub fn identifiers(&self, exclude: &[&str]) -> Vec<String> {
        self.0
            .iter()
            .map(|aggregation| aggregation.identifier.identifier.clone())
            .filter(|identifier| !exclude.contains(&identifier.as_str()))
            .collect()
    }

    /// Filter aggregations; predicates AND together, values within OR.
    pub fn filter(
        &self,
        namespace: Option<&str>,
        identifiers: Option<&[&str]>,
        associations: Option<&[AggregationAssociationCode]>,
        initiatives: Option<&[AggregationInitiativeCode]>,
    ) -> Aggregations {
        Aggregations(
            self.0
                .iter()
                .filter(|aggregation| {
                    aggregation.matches_filter(namespace, identifiers, associations, initiatives)
                })
                .cloned()
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Aggregation> {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

/// Legal constraint (`gmd:MD_LegalConstraints`).
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub type_: ConstraintTypeCode,
    pub restriction_code: Option<ConstraintRestrictionCode>,
    pub statement: Option<String>,
    pub href: Option<String>,
}

impl Constraint {
    /// Whether this constraint matches the given predicates (AND/OR as for
    /// [`Aggregation::matches_filter`]).
    pub fn matches_filter(
        &self,
        href: Option<&str>,
        types: Option<&[ConstraintTypeCode]>,
        restrictions: Option<&[ConstraintRestrictionCode]>,
    ) -> bool {
        if let Some(href) = href
            && self.href.as_deref() != Some(href)
        {
            return false;
        }
        if let Some(types) = types
            && !types.contains(&self.type_)
        {
            return false;
        }
        if let Some(restrictions) = restrictions {
            match self.restriction_code {
                Some(restriction) if restrictions.contains(&restriction) => {}
                _ => return false,
            }
        }
        true
    }

    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "constraint";
        let obj = as_object(value, ctx)?;
        Ok(Self {
            type_: req_code(obj, "type", ctx)?,
            restriction_code: opt_code(obj, "restriction_code", ctx)?,
            statement: opt_str(obj, "statement", ctx)?,
            href: opt_str(obj, "href", ctx)?,
        })
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".into(), code_value(&self.type_));
        insert_opt(
            &mut obj,
            "restriction_code",
            self.restriction_code.as_ref().map(code_value),
        );
        insert_opt_str(&mut obj, "statement", self.statement.as_deref());
        insert_opt_str(&mut obj, "href", self.href.as_deref());
        Value::Object(obj)
    }
}

/// Wrapper around a list of [`Constraint`] items with filtering.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Constraints(pub Vec<Constraint>);

impl Constraints {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let items = as_array(value, "constraints")?;
        Ok(Self(
            items
                .iter()
                .map(Constraint::structure)
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }

    pub fn unstructure(&self) -> Value {
        Value::Array(self.0.iter().map(Constraint::unstructure).collect())
    }

    pub fn filter(
        &self,
        href: Option<&str>,
        types: Option<&[ConstraintTypeCode]>,
        restrictions: Option<&[ConstraintRestrictionCode]>,
    ) -> Constraints {
        Constraints(
            self.0
                .iter()
                .filter(|constraint| constraint.matches_filter(href, types, restrictions))
                .cloned()
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Constraint> {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// Extents
// ---------------------------------------------------------------------------

/// Geographic bounding box (`gmd:EX_GeographicBoundingBox`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub west_longitude: f64,
    pub east_longitude: f64,
    pub south_latitude: f64,
    pub north_latitude: f64,
}

impl BoundingBox {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "bounding_box";
        let obj = as_object(value, ctx)?;
        Ok(Self {
            west_longitude: req_f64(obj, "west_longitude", ctx)?,
            east_longitude: req_f64(obj, "east_longitude", ctx)?,
            south_latitude: req_f64(obj, "south_latitude", ctx)?,
            north_latitude: req_f64(obj, "north_latitude", ctx)?,
        })
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("west_longitude".into(), json_number(self.west_longitude));
        obj.insert("east_longitude".into(), json_number(self.east_longitude));
        obj.insert("south_latitude".into(), json_number(self.south_latitude));
        obj.insert("north_latitude".into(), json_number(self.north_latitude));
        Value::Object(obj)
    }
}

fn json_number(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Geographic extent element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtentGeographic {
    pub bounding_box: BoundingBox,
}

impl ExtentGeographic {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "geographic extent";
        let obj = as_object(value, ctx)?;
        let bounding_box = obj
            .get("bounding_box")
            .ok_or_else(|| RecordError::malformed(ctx, "missing 'bounding_box'"))?;
        Ok(Self {
            bounding_box: BoundingBox::structure(bounding_box)?,
        })
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("bounding_box".into(), self.bounding_box.unstructure());
        Value::Object(obj)
    }
}

/// Temporal period (`gml:TimePeriod`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TemporalPeriod {
    pub start: Option<Date>,
    pub end: Option<Date>,
}

/// Temporal extent element.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ExtentTemporal {
    pub period: TemporalPeriod,
}

impl ExtentTemporal {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "temporal extent";
        let obj = as_object(value, ctx)?;
        let period = match obj.get("period") {
            None | Some(Value::Null) => TemporalPeriod::default(),
            Some(period) => {
                let period_obj = as_object(period, "temporal period")?;
                TemporalPeriod {
                    start: period_obj.get("start").map(Date::structure).transpose()?,
                    end: period_obj.get("end").map(Date::structure).transpose()?,
                }
            }
        };
        Ok(Self { period })
    }

    pub fn unstructure(&self) -> Value {
        let mut period = Map::new();
        insert_opt(
            &mut period,
            "start",
            self.period.start.as_ref().map(Date::unstructure),
        );
        insert_opt(
            &mut period,
            "end",
            self.period.end.as_ref().map(Date::unstructure),
        );
        let mut obj = Map::new();
        obj.insert("period".into(), Value::Object(period));
        Value::Object(obj)
    }
}

/// Extent (`gmd:EX_Extent`).
#[derive(Clone, Debug, PartialEq)]
pub struct Extent {
    pub identifier: String,
    pub geographic: ExtentGeographic,
    pub temporal: Option<ExtentTemporal>,
}

impl Extent {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "extent";
        let obj = as_object(value, ctx)?;
        let geographic = obj
            .get("geographic")
            .ok_or_else(|| RecordError::malformed(ctx, "missing 'geographic'"))?;
        Ok(Self {
            identifier: req_str(obj, "identifier", ctx)?,
            geographic: ExtentGeographic::structure(geographic)?,
            temporal: obj
                .get("temporal")
                .map(ExtentTemporal::structure)
                .transpose()?,
        })
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("identifier".into(), Value::String(self.identifier.clone()));
        obj.insert("geographic".into(), self.geographic.unstructure());
        insert_opt(
            &mut obj,
            "temporal",
            self.temporal.as_ref().map(ExtentTemporal::unstructure),
        );
        Value::Object(obj)
    }
}

/// Wrapper around a list of [`Extent`] items with filtering.
///
/// Extent identifiers are not guaranteed unique here; the catalogue record
/// validation enforces uniqueness.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Extents(pub Vec<Extent>);

impl Extents {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let items = as_array(value, "extents")?;
        Ok(Self(
            items
                .iter()
                .map(Extent::structure)
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }

    pub fn unstructure(&self) -> Value {
        Value::Array(self.0.iter().map(Extent::unstructure).collect())
    }

    pub fn filter(&self, identifier: &str) -> Extents {
        Extents(
            self.0
                .iter()
                .filter(|extent| extent.identifier == identifier)
                .cloned()
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Extent> {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// Graphic overviews and maintenance
// ---------------------------------------------------------------------------

/// Browse graphic (`gmd:MD_BrowseGraphic`).
#[derive(Clone, Debug, PartialEq)]
pub struct GraphicOverview {
    pub identifier: String,
    pub href: String,
    pub description: Option<String>,
    pub mime_type: String,
}

impl GraphicOverview {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "graphic_overview";
        let obj = as_object(value, ctx)?;
        Ok(Self {
            identifier: req_str(obj, "identifier", ctx)?,
            href: req_str(obj, "href", ctx)?,
            description: opt_str(obj, "description", ctx)?,
            mime_type: req_str(obj, "mime_type", ctx)?,
        })
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("identifier".into(), Value::String(self.identifier.clone()));
        obj.insert("href".into(), Value::String(self.href.clone()));
        insert_opt_str(&mut obj, "description", self.description.as_deref());
        obj.insert("mime_type".into(), Value::String(self.mime_type.clone()));
        Value::Object(obj)
    }
}

/// Wrapper around a list of [`GraphicOverview`] items with filtering.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphicOverviews(pub Vec<GraphicOverview>);

impl GraphicOverviews {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let items = as_array(value, "graphic_overviews")?;
        Ok(Self(
            items
                .iter()
                .map(GraphicOverview::structure)
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }

    pub fn unstructure(&self) -> Value {
        Value::Array(self.0.iter().map(GraphicOverview::unstructure).collect())
    }

    pub fn filter(&self, identifier: &str) -> GraphicOverviews {
        GraphicOverviews(
            self.0
                .iter()
                .filter(|overview| overview.identifier == identifier)
                .cloned()
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GraphicOverview> {
        self.0.iter()
    }
}

/// Maintenance information.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Maintenance {
    pub maintenance_frequency: Option<MaintenanceFrequencyCode>,
    pub progress: Option<ProgressCode>,
}

impl Maintenance {
    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "maintenance";
        let obj = as_object(value, ctx)?;
        Ok(Self {
            maintenance_frequency: opt_code(obj, "maintenance_frequency", ctx)?,
            progress: opt_code(obj, "progress", ctx)?,
        })
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = Map::new();
        insert_opt(
            &mut obj,
            "maintenance_frequency",
            self.maintenance_frequency.as_ref().map(code_value),
        );
        insert_opt(&mut obj, "progress", self.progress.as_ref().map(code_value));
        Value::Object(obj)
    }

    pub fn is_empty(&self) -> bool {
        self.maintenance_frequency.is_none() && self.progress.is_none()
    }
}

// ---------------------------------------------------------------------------
// Identification
// ---------------------------------------------------------------------------

/// Identification block: a [`Citation`] plus resource description elements.
#[derive(Clone, Debug, PartialEq)]
pub struct Identification {
    pub citation: Citation,
    pub abstract_: String,
    pub purpose: Option<String>,
    pub maintenance: Maintenance,
    pub graphic_overviews: GraphicOverviews,
    pub constraints: Constraints,
    pub aggregations: Aggregations,
    pub character_set: String,
    pub language: String,
    pub extents: Extents,
    pub spatial_resolution: Option<u64>,
    /// Freeform supplemental information; the catalogue stores a JSON object
    /// of key/values here, including sealed administrative metadata.
    pub supplemental_information: Option<String>,
}

impl Identification {
    pub const DEFAULT_CHARACTER_SET: &'static str = "utf8";
    pub const DEFAULT_LANGUAGE: &'static str = "eng";

    pub fn title(&self) -> &str {
        &self.citation.title
    }

    pub fn dates(&self) -> &Dates {
        &self.citation.dates
    }

    pub fn edition(&self) -> Option<&str> {
        self.citation.edition.as_deref()
    }

    pub fn identifiers(&self) -> &Identifiers {
        &self.citation.identifiers
    }

    pub fn contacts(&self) -> &Contacts {
        &self.citation.contacts
    }

    pub fn series(&self) -> &Series {
        &self.citation.series
    }

    pub fn structure(value: &Value) -> Result<Self, RecordError> {
        let ctx = "identification";
        let obj = as_object(value, ctx)?;
        let citation = Citation::structure(value)?;
        Ok(Self {
            citation,
            abstract_: req_str(obj, "abstract", ctx)?,
            purpose: opt_str(obj, "purpose", ctx)?,
            maintenance: obj
                .get("maintenance")
                .map(Maintenance::structure)
                .transpose()?
                .unwrap_or_default(),
            graphic_overviews: obj
                .get("graphic_overviews")
                .map(GraphicOverviews::structure)
                .transpose()?
                .unwrap_or_default(),
            constraints: obj
                .get("constraints")
                .map(Constraints::structure)
                .transpose()?
                .unwrap_or_default(),
            aggregations: obj
                .get("aggregations")
                .map(Aggregations::structure)
                .transpose()?
                .unwrap_or_default(),
            character_set: opt_str(obj, "character_set", ctx)?
                .unwrap_or_else(|| Self::DEFAULT_CHARACTER_SET.to_owned()),
            language: opt_str(obj, "language", ctx)?
                .unwrap_or_else(|| Self::DEFAULT_LANGUAGE.to_owned()),
            extents: obj
                .get("extents")
                .map(Extents::structure)
                .transpose()?
                .unwrap_or_default(),
            spatial_resolution: opt_u64(obj, "spatial_resolution", ctx)?,
            supplemental_information: opt_str(obj, "supplemental_information", ctx)?,
        })
    }

    pub fn unstructure(&self) -> Value {
        let mut obj = match self.citation.unstructure() {
            Value::Object(obj) => obj,
            _ => Map::new(),
        };
        obj.insert("abstract".into(), Value::String(self.abstract_.clone()));
        insert_opt_str(&mut obj, "purpose", self.purpose.as_deref());
        if !self.maintenance.is_empty() {
            obj.insert("maintenance".into(), self.maintenance.unstructure());
        }
        if !self.graphic_overviews.is_empty() {
            obj.insert(
                "graphic_overviews".into(),
                self.graphic_overviews.unstructure(),
            );
        }
        if !self.constraints.is_empty() {
            obj.insert("constraints".into(), self.constraints.unstructure());
        }
        if !self.aggregations.is_empty() {
            obj.insert("aggregations".into(), self.aggregations.unstructure());
        }
        obj.insert(
            "character_set".into(),
            Value::String(self.character_set.clone()),
        );
        obj.insert("language".into(), Value::String(self.language.clone()));
        if !self.extents.is_empty() {
            obj.insert("extents".into(), self.extents.unstructure());
        }
        insert_opt(
            &mut obj,
            "spatial_resolution",
            self.spatial_resolution.map(|v| Value::Number(v.into())),
        );
        insert_opt_str(
            &mut obj,
            "supplemental_information",
            self.supplemental_information.as_deref(),
        );
        Value::Object(obj)
    }
}
