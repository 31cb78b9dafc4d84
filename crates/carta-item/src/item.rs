// SPDX-License-Identifier: MIT OR Apache-2.0
//! The catalogue item view-model.
//!
//! Projects a [`RecordRevision`] into the presentation concerns of its item
//! page: header, summary, tabs and page metadata fragments. All fields are
//! display-ready so the whole item serialises into the template context.

use std::collections::BTreeMap;

use serde::Serialize;

use carta_admin::{AccessLevel, Administration};
use carta_record::RecordRevision;
use carta_record::enums::HierarchyLevelCode;

use crate::dates::FormattedDate;
use crate::distributions::classify_distributions;
use crate::page::{OpenGraphMeta, SchemaOrgAuthor, SchemaOrgMeta};
use crate::physical::PhysicalMapView;
use crate::tabs::{
    AdditionalInfoTab, AdminTab, AuthorsTab, ContactTab, DataTab, ExtentTab, ItemsTab, LicenceTab,
    LineageTab, RelatedTab, Tabs,
};

/// Display labels for hierarchy levels.
pub struct ResourceTypeLabel;

impl ResourceTypeLabel {
    pub fn for_level(level: HierarchyLevelCode) -> &'static str {
        match level {
            HierarchyLevelCode::Collection => "Collection",
            HierarchyLevelCode::Dataset => "Dataset",
            HierarchyLevelCode::Product => "Product",
            HierarchyLevelCode::PaperMapProduct => "Paper Map",
            HierarchyLevelCode::WebMapProduct => "Web Map",
            HierarchyLevelCode::MapProduct => "Map",
            HierarchyLevelCode::Initiative => "Project",
            _ => "Resource",
        }
    }
}

/// Common metadata needed to build catalogue pages.
#[derive(Clone, Debug, Serialize)]
pub struct SiteMeta {
    /// Endpoint for constructing absolute URLs.
    pub base_url: String,
    /// HTML head title value, combined with the site name by templates.
    pub html_title: String,
    /// Build timestamp, also used for cache busting.
    pub build_time: String,
    pub plausible_domain: String,
    pub embedded_maps_endpoint: String,
    pub item_contact_endpoint: String,
    pub item_versions_endpoint: String,
    pub turnstile_site_key: String,
}

/// Item page header: title and resource type.
#[derive(Clone, Debug, Serialize)]
pub struct PageHeader {
    pub title: String,
    pub subtitle: String,
}

/// Item page summary strip.
#[derive(Clone, Debug, Serialize)]
pub struct PageSummary {
    pub edition: Option<String>,
    pub published: Option<FormattedDate>,
    pub revised: Option<FormattedDate>,
    pub citation: Option<String>,
    pub access_label: String,
}

/// A record projected into its catalogue item page.
#[derive(Clone, Debug, Serialize)]
pub struct ItemCatalogue {
    pub resource_id: String,
    pub resource_type: String,
    pub href: String,
    pub html_title: String,
    pub header: PageHeader,
    pub summary: PageSummary,
    pub abstract_text: String,
    pub graphic_overview_href: Option<String>,
    pub tabs: Tabs,
    pub open_graph: Vec<(String, String)>,
    pub schema_org: String,
    /// Physical map composition; present for paper map products only.
    pub physical_map: Option<PhysicalMapView>,
}

impl ItemCatalogue {
    /// Build the item view for a record.
    ///
    /// `admin` is the unsealed administrative metadata where keys allow;
    /// `related` holds pre-fetched records referenced by aggregations, used
    /// for link titles and physical map sides.
    pub fn new(
        site: &SiteMeta,
        revision: &RecordRevision,
        admin: Option<&Administration>,
        related: &BTreeMap<String, RecordRevision>,
    ) -> Self {
        let record = &revision.record;
        let identification = &record.identification;
        let resource_id = revision.file_identifier().to_owned();
        let href = format!("{}/items/{resource_id}/", site.base_url);
        let title = identification.title().to_owned();
        let type_label = ResourceTypeLabel::for_level(record.hierarchy_level);

        let access = admin
            .map(Administration::access_level)
            .unwrap_or(AccessLevel::NoAccess);
        let dates = identification.dates();
        let published = dates
            .publication
            .as_ref()
            .map(FormattedDate::from_date);
        let revised = dates.revision.as_ref().map(FormattedDate::from_date);

        let graphic_overview_href = identification
            .graphic_overviews
            .0
            .first()
            .map(|overview| overview.href.clone());

        let bounding = identification.extents.filter("bounding");
        let tabs = Tabs {
            items: ItemsTab::new(revision, related),
            data: DataTab::new(access, classify_distributions(&record.distribution)),
            authors: AuthorsTab::new(&identification.contacts().0),
            licence: LicenceTab::new(&identification.constraints.0),
            extent: ExtentTab::new(bounding.0.first(), site),
            lineage: LineageTab::new(
                record
                    .data_quality
                    .as_ref()
                    .and_then(|dq| dq.lineage.as_ref())
                    .map(|lineage| lineage.statement.as_str()),
            ),
            related: RelatedTab::new(revision, related),
            additional: AdditionalInfoTab::new(revision),
            contact: ContactTab::new(&identification.contacts().0, site),
            admin: AdminTab::new(
                admin
                    .map(|admin| admin.gitlab_issues.clone())
                    .unwrap_or_default(),
            ),
        };

        let mut open_graph = OpenGraphMeta::new(&title, &href);
        open_graph.description = Some(identification.abstract_.clone());
        open_graph.image = graphic_overview_href.clone();
        open_graph.published_at = published.as_ref().map(|date| date.datetime.clone());

        let mut schema_org = SchemaOrgMeta::new(&title, &href);
        schema_org.description = Some(identification.abstract_.clone());
        schema_org.image = graphic_overview_href.clone();
        schema_org.creators = tabs
            .authors
            .authors
            .iter()
            .map(|author| SchemaOrgAuthor {
                type_: if author.individual {
                    "Person".into()
                } else {
                    "Organization".into()
                },
                name: author.name.clone(),
                url: author.href.clone(),
            })
            .collect();

        let physical_map = PhysicalMapView::build(revision, related);

        Self {
            resource_id,
            resource_type: type_label.to_owned(),
            href,
            html_title: title.clone(),
            header: PageHeader {
                title,
                subtitle: type_label.to_owned(),
            },
            summary: PageSummary {
                edition: identification.edition().map(str::to_owned),
                published,
                revised,
                citation: identification.citation.other_citation_details.clone(),
                access_label: access.label().to_owned(),
            },
            abstract_text: identification.abstract_.clone(),
            graphic_overview_href,
            tabs,
            open_graph: open_graph.dumps(),
            schema_org: schema_org.dumps(),
            physical_map,
        }
    }
}
