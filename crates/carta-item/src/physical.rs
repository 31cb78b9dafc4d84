// SPDX-License-Identifier: MIT OR Apache-2.0
//! Physical (paper) map composition.
//!
//! A paper map product is composed of one record per physical side. The item
//! page renders a combined view: per-side extents and series sheets, selected
//! by a `matches` predicate rather than a subtype.

use std::collections::BTreeMap;

use serde::Serialize;

use carta_record::{Record, RecordRevision};
use carta_record::enums::{
    AggregationAssociationCode, AggregationInitiativeCode, HierarchyLevelCode,
};

/// One side of a physical map.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MapSide {
    pub file_identifier: String,
    pub title: String,
    /// Sheet series, where the side belongs to one.
    pub series_name: Option<String>,
    pub series_sheet: Option<String>,
    /// Bounding boxes as (west, south, east, north).
    pub extents: Vec<(f64, f64, f64, f64)>,
}

/// Combined display of a paper map's sides.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PhysicalMapView {
    pub sides: Vec<MapSide>,
}

/// Item type alias used by exporters selecting the physical map strategy.
pub struct PhysicalMapItem;

impl PhysicalMapItem {
    /// Whether a record renders as a physical map.
    ///
    /// True for paper map products whose aggregations include
    /// `isComposedOf` × `paperMap` members.
    pub fn matches(record: &Record) -> bool {
        if record.hierarchy_level != HierarchyLevelCode::PaperMapProduct {
            return false;
        }
        !record
            .identification
            .aggregations
            .filter(
                None,
                None,
                Some(&[AggregationAssociationCode::IsComposedOf]),
                Some(&[AggregationInitiativeCode::PaperMap]),
            )
            .is_empty()
    }
}

impl PhysicalMapView {
    /// Build the combined view, resolving side records from `related`.
    ///
    /// Returns `None` for records that are not physical maps. Sides missing
    /// from `related` are omitted rather than failing the page.
    pub fn build(
        revision: &RecordRevision,
        related: &BTreeMap<String, RecordRevision>,
    ) -> Option<Self> {
        if !PhysicalMapItem::matches(&revision.record) {
            return None;
        }
        let members = revision.record.identification.aggregations.filter(
            None,
            None,
            Some(&[AggregationAssociationCode::IsComposedOf]),
            Some(&[AggregationInitiativeCode::PaperMap]),
        );

        let sides: Vec<MapSide> = members
            .iter()
            .filter_map(|member| related.get(member.identifier.identifier.as_str()))
            .map(|side| {
                let identification = &side.record.identification;
                let series = identification.series();
                MapSide {
                    file_identifier: side.file_identifier().to_owned(),
                    title: identification.title().to_owned(),
                    series_name: series.name.clone(),
                    series_sheet: series.page.clone(),
                    extents: identification
                        .extents
                        .iter()
                        .map(|extent| {
                            let bbox = &extent.geographic.bounding_box;
                            (
                                bbox.west_longitude,
                                bbox.south_latitude,
                                bbox.east_longitude,
                                bbox.north_latitude,
                            )
                        })
                        .collect(),
                }
            })
            .collect();

        Some(Self { sides })
    }
}
