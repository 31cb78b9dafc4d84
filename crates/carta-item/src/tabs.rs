// SPDX-License-Identifier: MIT OR Apache-2.0
//! Item page tabs.
//!
//! Each tab is a typed, display-ready view consumed by the opaque item
//! template. Tabs carry only primitives so they serialise directly into the
//! render context; an `enabled` flag controls whether a tab renders.

use serde::Serialize;

use carta_admin::AccessLevel;
use carta_record::RecordRevision;
use carta_record::elements::common::Contact;
use carta_record::elements::identification::{Constraint, Extent};
use carta_record::enums::{
    AggregationAssociationCode, ConstraintRestrictionCode, ConstraintTypeCode, ContactRoleCode,
};

use crate::dates::FormattedDate;
use crate::distributions::CatalogueDistribution;
use crate::item::{ResourceTypeLabel, SiteMeta};

/// Link to another catalogue item.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ItemLink {
    pub file_identifier: String,
    pub href: String,
    pub title: Option<String>,
}

impl ItemLink {
    fn new(file_identifier: &str, title: Option<String>) -> Self {
        Self {
            file_identifier: file_identifier.to_owned(),
            href: format!("/items/{file_identifier}/"),
            title,
        }
    }
}

fn links_for(
    revision: &RecordRevision,
    associations: &[AggregationAssociationCode],
    related: &std::collections::BTreeMap<String, RecordRevision>,
) -> Vec<ItemLink> {
    revision
        .record
        .identification
        .aggregations
        .filter(None, None, Some(associations), None)
        .iter()
        .map(|aggregation| {
            let id = aggregation.identifier.identifier.as_str();
            let title = related
                .get(id)
                .map(|r| r.record.identification.title().to_owned());
            ItemLink::new(id, title)
        })
        .collect()
}

/// Items within a collection.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ItemsTab {
    pub enabled: bool,
    pub items: Vec<ItemLink>,
}

impl ItemsTab {
    pub fn new(
        revision: &RecordRevision,
        related: &std::collections::BTreeMap<String, RecordRevision>,
    ) -> Self {
        let items = links_for(
            revision,
            &[AggregationAssociationCode::IsComposedOf],
            related,
        );
        Self {
            enabled: !items.is_empty(),
            items,
        }
    }
}

/// Data access options.
#[derive(Clone, Debug, Serialize)]
pub struct DataTab {
    pub enabled: bool,
    pub access_label: String,
    pub restricted: bool,
    pub distributions: Vec<CatalogueDistribution>,
}

impl DataTab {
    pub fn new(access: AccessLevel, distributions: Vec<CatalogueDistribution>) -> Self {
        Self {
            enabled: !distributions.is_empty(),
            access_label: access.label().to_owned(),
            restricted: access != AccessLevel::Public,
            distributions,
        }
    }
}

/// Item authors.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AuthorsTab {
    pub enabled: bool,
    pub authors: Vec<AuthorView>,
}

/// A display-ready author.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AuthorView {
    pub name: String,
    pub href: Option<String>,
    pub individual: bool,
}

impl AuthorsTab {
    pub fn new(contacts: &[Contact]) -> Self {
        let authors: Vec<AuthorView> = contacts
            .iter()
            .filter(|contact| contact.role.contains(&ContactRoleCode::Author))
            .filter_map(|contact| {
                let identity = contact
                    .individual
                    .as_ref()
                    .or(contact.organisation.as_ref())?;
                Some(AuthorView {
                    name: identity.name.clone(),
                    href: identity.href.clone(),
                    individual: contact.individual.is_some(),
                })
            })
            .collect();
        Self {
            enabled: !authors.is_empty(),
            authors,
        }
    }
}

/// Usage licence.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LicenceTab {
    pub enabled: bool,
    pub href: Option<String>,
    pub statement: Option<String>,
}

impl LicenceTab {
    pub fn new(constraints: &[Constraint]) -> Self {
        let licence = constraints.iter().find(|constraint| {
            constraint.matches_filter(
                None,
                Some(&[ConstraintTypeCode::Usage]),
                Some(&[ConstraintRestrictionCode::License]),
            )
        });
        Self {
            enabled: licence.is_some(),
            href: licence.and_then(|l| l.href.clone()),
            statement: licence.and_then(|l| l.statement.clone()),
        }
    }
}

/// Geographic and temporal extent.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ExtentTab {
    pub enabled: bool,
    pub west: Option<f64>,
    pub east: Option<f64>,
    pub south: Option<f64>,
    pub north: Option<f64>,
    pub start: Option<FormattedDate>,
    pub end: Option<FormattedDate>,
    /// Embedded map iframe source for the bounding extent.
    pub map_src: Option<String>,
}

impl ExtentTab {
    /// Build from the record's `bounding` extent, if present.
    pub fn new(extent: Option<&Extent>, site: &SiteMeta) -> Self {
        let Some(extent) = extent else {
            return Self::default();
        };
        let bbox = &extent.geographic.bounding_box;
        let map_src = format!(
            "{}/?bbox=[{},{},{},{}]&globe-overview",
            site.embedded_maps_endpoint,
            bbox.west_longitude,
            bbox.south_latitude,
            bbox.east_longitude,
            bbox.north_latitude,
        );
        let period = extent.temporal.map(|temporal| temporal.period);
        Self {
            enabled: true,
            west: Some(bbox.west_longitude),
            east: Some(bbox.east_longitude),
            south: Some(bbox.south_latitude),
            north: Some(bbox.north_latitude),
            start: period
                .and_then(|p| p.start)
                .map(|date| FormattedDate::from_date(&date)),
            end: period
                .and_then(|p| p.end)
                .map(|date| FormattedDate::from_date(&date)),
            map_src: Some(map_src),
        }
    }
}

/// Lineage statement.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LineageTab {
    pub enabled: bool,
    pub statement: Option<String>,
}

impl LineageTab {
    pub fn new(statement: Option<&str>) -> Self {
        Self {
            enabled: statement.is_some(),
            statement: statement.map(str::to_owned),
        }
    }
}

/// Related items grouped by relationship.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RelatedTab {
    pub enabled: bool,
    pub parent_collections: Vec<ItemLink>,
    pub cross_references: Vec<ItemLink>,
    pub supersedes: Vec<ItemLink>,
}

impl RelatedTab {
    pub fn new(
        revision: &RecordRevision,
        related: &std::collections::BTreeMap<String, RecordRevision>,
    ) -> Self {
        let parent_collections = links_for(
            revision,
            &[AggregationAssociationCode::LargerWorkCitation],
            related,
        );
        let cross_references = links_for(
            revision,
            &[AggregationAssociationCode::CrossReference],
            related,
        );
        let supersedes = links_for(revision, &[AggregationAssociationCode::RevisionOf], related);
        Self {
            enabled: !parent_collections.is_empty()
                || !cross_references.is_empty()
                || !supersedes.is_empty(),
            parent_collections,
            cross_references,
            supersedes,
        }
    }
}

/// Identifiers, dates and other record-keeping details.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AdditionalInfoTab {
    pub enabled: bool,
    pub item_id: String,
    pub item_type: String,
    pub dates: Vec<(String, FormattedDate)>,
    pub datestamp: String,
    pub projection: Option<String>,
    pub scale: Option<u64>,
}

impl AdditionalInfoTab {
    pub fn new(revision: &RecordRevision) -> Self {
        let record = &revision.record;
        let dates = record
            .identification
            .dates()
            .entries()
            .into_iter()
            .map(|(code, date)| {
                let label = serde_json::to_value(code)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_owned))
                    .unwrap_or_default();
                (label, FormattedDate::from_date(date))
            })
            .collect();
        Self {
            enabled: true,
            item_id: revision.file_identifier().to_owned(),
            item_type: ResourceTypeLabel::for_level(record.hierarchy_level).to_owned(),
            dates,
            datestamp: record.metadata.date_stamp.format("%Y-%m-%d").to_string(),
            projection: record
                .reference_system_info
                .as_ref()
                .map(|projection| projection.code.value.clone()),
            scale: record.identification.spatial_resolution,
        }
    }
}

/// Point of contact details and enquiry form settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ContactTab {
    pub enabled: bool,
    pub team: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub form_endpoint: String,
    pub turnstile_key: String,
}

impl ContactTab {
    pub fn new(contacts: &[Contact], site: &SiteMeta) -> Self {
        let poc = contacts
            .iter()
            .find(|contact| contact.role.contains(&ContactRoleCode::PointOfContact));
        Self {
            enabled: poc.is_some(),
            team: poc
                .and_then(|c| c.organisation.as_ref())
                .map(|identity| identity.name.clone()),
            email: poc.and_then(|c| c.email.clone()),
            phone: poc.and_then(|c| c.phone.clone()),
            form_endpoint: site.item_contact_endpoint.clone(),
            turnstile_key: site.turnstile_site_key.clone(),
        }
    }
}

/// Administrative details, shown to signed-in staff only.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AdminTab {
    pub enabled: bool,
    pub gitlab_issues: Vec<String>,
}

impl AdminTab {
    pub fn new(gitlab_issues: Vec<String>) -> Self {
        Self {
            enabled: !gitlab_issues.is_empty(),
            gitlab_issues,
        }
    }
}

/// All tabs for an item page in display order.
#[derive(Clone, Debug, Serialize)]
pub struct Tabs {
    pub items: ItemsTab,
    pub data: DataTab,
    pub authors: AuthorsTab,
    pub licence: LicenceTab,
    pub extent: ExtentTab,
    pub lineage: LineageTab,
    pub related: RelatedTab,
    pub additional: AdditionalInfoTab,
    pub contact: ContactTab,
    pub admin: AdminTab,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn revision(extra_identification: serde_json::Value) -> RecordRevision {
        let mut config = json!({
            "file_identifier": "5d5b4e21-fd32-409c-be83-ca1c339903e5",
            "file_revision": "commit-a",
            "hierarchy_level": "product",
            "metadata": {
                "contacts": [{"organisation": {"name": "x"}, "role": ["pointOfContact"]}],
                "date_stamp": "2014-06-30",
            },
            "identification": {
                "title": {"value": "x"},
                "dates": {"creation": "2014-06-30"},
                "abstract": "x",
            },
        });
        if let (Some(base), Some(extra)) = (
            config["identification"].as_object_mut(),
            extra_identification.as_object(),
        ) {
            for (key, value) in extra {
                base.insert(key.clone(), value.clone());
            }
        }
        RecordRevision::loads(&config).unwrap()
    }

    fn site() -> SiteMeta {
        SiteMeta {
            base_url: "https://data.bas.ac.uk".into(),
            html_title: String::new(),
            build_time: "2025-07-01T00:00:00+00:00".into(),
            plausible_domain: "data.bas.ac.uk".into(),
            embedded_maps_endpoint: "https://embedded-maps.data.bas.ac.uk/v1".into(),
            item_contact_endpoint: "https://forms.example.com/contact".into(),
            item_versions_endpoint: String::new(),
            turnstile_site_key: "key".into(),
        }
    }

    #[test]
    fn authors_tab_selects_author_roles() {
        let revision = revision(json!({
            "contacts": [
                {"organisation": {"name": "poc"}, "role": ["pointOfContact"]},
                {"individual": {"name": "A. Author"}, "organisation": {"name": "org"}, "role": ["author"]},
            ],
        }));
        let tab = AuthorsTab::new(&revision.record.identification.contacts().0);
        assert!(tab.enabled);
        assert_eq!(tab.authors.len(), 1);
        assert_eq!(tab.authors[0].name, "A. Author");
        assert!(tab.authors[0].individual);
    }

    #[test]
    fn licence_tab_requires_usage_licence_constraint() {
        let revision = revision(json!({
            "constraints": [
                {"type": "access", "restriction_code": "unrestricted"},
                {
                    "type": "usage",
                    "restriction_code": "license",
                    "href": "https://creativecommons.org/licenses/by/4.0/",
                },
            ],
        }));
        let tab = LicenceTab::new(&revision.record.identification.constraints.0);
        assert!(tab.enabled);
        assert_eq!(
            tab.href.as_deref(),
            Some("https://creativecommons.org/licenses/by/4.0/")
        );
    }

    #[test]
    fn extent_tab_builds_map_src() {
        let revision = revision(json!({
            "extents": [{
                "identifier": "bounding",
                "geographic": {"bounding_box": {
                    "west_longitude": -68.5, "east_longitude": -67.5,
                    "south_latitude": -68.0, "north_latitude": -67.0,
                }},
            }],
        }));
        let extents = &revision.record.identification.extents;
        let bounding = extents.filter("bounding");
        let tab = ExtentTab::new(bounding.0.first(), &site());
        assert!(tab.enabled);
        assert_eq!(tab.west, Some(-68.5));
        assert!(tab.map_src.unwrap().contains("bbox=[-68.5,-68,-67.5,-67]"));
    }

    #[test]
    fn extent_tab_disabled_without_extent() {
        let tab = ExtentTab::new(None, &site());
        assert!(!tab.enabled);
    }

    #[test]
    fn related_tab_groups_by_association() {
        let revision = revision(json!({
            "aggregations": [
                {
                    "identifier": {"identifier": "123e4567-e89b-12d3-a456-426614174000", "namespace": "data.bas.ac.uk"},
                    "association_type": "largerWorkCitation",
                    "initiative_type": "collection",
                },
                {
                    "identifier": {"identifier": "9f735d33-50a9-4fe3-a3d7-17c519d6a861", "namespace": "data.bas.ac.uk"},
                    "association_type": "revisionOf",
                },
            ],
        }));
        let tab = RelatedTab::new(&revision, &Default::default());
        assert!(tab.enabled);
        assert_eq!(tab.parent_collections.len(), 1);
        assert_eq!(tab.supersedes.len(), 1);
        assert!(tab.cross_references.is_empty());
        assert_eq!(
            tab.parent_collections[0].href,
            "/items/123e4567-e89b-12d3-a456-426614174000/"
        );
    }

    #[test]
    fn additional_info_tab_formats_dates() {
        let revision = revision(json!({}));
        let tab = AdditionalInfoTab::new(&revision);
        assert!(tab.enabled);
        assert_eq!(tab.datestamp, "2014-06-30");
        assert_eq!(tab.dates.len(), 1);
        assert_eq!(tab.dates[0].0, "creation");
        assert_eq!(tab.dates[0].1.value, "30 June 2014");
    }

    #[test]
    fn contact_tab_uses_point_of_contact() {
        let revision = revision(json!({
            "contacts": [{
                "organisation": {"name": "Mapping and Geographic Information Centre"},
                "email": "magic@bas.ac.uk",
                "role": ["pointOfContact"],
            }],
        }));
        let tab = ContactTab::new(&revision.record.identification.contacts().0, &site());
        assert!(tab.enabled);
        assert_eq!(tab.email.as_deref(), Some("magic@bas.ac.uk"));
        assert_eq!(tab.form_endpoint, "https://forms.example.com/contact");
    }
}
