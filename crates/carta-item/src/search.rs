// SPDX-License-Identifier: MIT OR Apache-2.0
//! Public-website search projection of a catalogue item.

use serde::Serialize;
use serde_json::{Map, Value};

use carta_admin::AccessLevel;
use carta_record::RecordRevision;
use carta_record::enums::ProgressCode;

use crate::item::ResourceTypeLabel;

/// A catalogue item projected into the public-website search sync API shape.
///
/// Carries a limited subset of record properties, as determined by the needs
/// of the website search system.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WebsiteSearchItem {
    pub file_identifier: String,
    pub file_revision: String,
    pub title: String,
    pub content: String,
    pub href: String,
    pub hierarchy_level: String,
    pub publication_date: String,
    pub source: String,
    pub edition: Option<String>,
    pub href_thumbnail: Option<String>,
    #[serde(skip)]
    access: AccessLevel,
    #[serde(skip)]
    withdrawn: bool,
}

impl WebsiteSearchItem {
    /// Build the projection for a record.
    ///
    /// `source` identifies the originating catalogue; `base_url` makes item
    /// links absolute for the website environment in use.
    pub fn new(
        revision: &RecordRevision,
        access: AccessLevel,
        source: &str,
        base_url: &str,
    ) -> Self {
        let record = &revision.record;
        let identification = &record.identification;
        let dates = identification.dates();

        // Prefer the most recently meaningful date.
        let date = dates
            .revision
            .as_ref()
            .or(dates.publication.as_ref())
            .or(dates.creation.as_ref())
            .map(|date| date.isoformat())
            .unwrap_or_default();

        let description = identification
            .purpose
            .clone()
            .unwrap_or_else(|| identification.abstract_.clone());

        let progress = record.identification.maintenance.progress;
        let withdrawn = matches!(
            progress,
            Some(ProgressCode::Obsolete) | Some(ProgressCode::HistoricalArchive)
        );

        Self {
            file_identifier: revision.file_identifier().to_owned(),
            file_revision: revision.file_revision.clone(),
            title: identification.title().to_owned(),
            content: description,
            href: format!("{base_url}/items/{}/", revision.file_identifier()),
            hierarchy_level: ResourceTypeLabel::for_level(record.hierarchy_level).to_owned(),
            publication_date: date,
            source: source.to_owned(),
            edition: identification.edition().map(str::to_owned),
            href_thumbnail: identification
                .graphic_overviews
                .0
                .first()
                .map(|overview| overview.href.clone()),
            access,
            withdrawn,
        }
    }

    /// Whether the item is openly accessible.
    pub fn open_access(&self) -> bool {
        self.access == AccessLevel::Public
    }

    /// Whether the item should be withdrawn from the website.
    pub fn withdrawn(&self) -> bool {
        self.withdrawn
    }

    /// Sync API entity for creating or updating the item.
    pub fn dumps(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("title".into(), Value::String(self.title.clone()));
        obj.insert("content".into(), Value::String(self.content.clone()));
        obj.insert(
            "file_identifier".into(),
            Value::String(self.file_identifier.clone()),
        );
        obj.insert(
            "file_revision".into(),
            Value::String(self.file_revision.clone()),
        );
        obj.insert("href".into(), Value::String(self.href.clone()));
        obj.insert(
            "hierarchy_level".into(),
            Value::String(self.hierarchy_level.clone()),
        );
        obj.insert(
            "publication_date".into(),
            Value::String(self.publication_date.clone()),
        );
        obj.insert("source".into(), Value::String(self.source.clone()));
        if let Some(edition) = &self.edition {
            obj.insert("edition".into(), Value::String(edition.clone()));
        }
        if let Some(thumbnail) = &self.href_thumbnail {
            obj.insert("href_thumbnail".into(), Value::String(thumbnail.clone()));
        }
        obj.insert("status".into(), Value::String("publish".into()));
        Value::Object(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn revision(extra_identification: serde_json::Value) -> RecordRevision {
        let mut config = json!({
            "file_identifier": "5d5b4e21-fd32-409c-be83-ca1c339903e5",
            "file_revision": "commit-a",
            "hierarchy_level": "dataset",
            "metadata": {
                "contacts": [{"organisation": {"name": "x"}, "role": ["pointOfContact"]}],
                "date_stamp": "2014-06-30",
            },
            "identification": {
                "title": {"value": "Example dataset"},
                "dates": {"creation": "2013", "publication": "2014-06-30"},
                "abstract": "An example dataset.",
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

    #[test]
    fn projection_prefers_revision_then_publication_date() {
        let item = WebsiteSearchItem::new(
            &revision(json!({})),
            AccessLevel::Public,
            "carta",
            "https://data.bas.ac.uk",
        );
        assert_eq!(item.publication_date, "2014-06-30");

        let item = WebsiteSearchItem::new(
            &revision(json!({"dates": {"creation": "2013", "revision": "2015-02"}})),
            AccessLevel::Public,
            "carta",
            "https://data.bas.ac.uk",
        );
        assert_eq!(item.publication_date, "2015-02");
    }

    #[test]
    fn projection_builds_absolute_href() {
        let item = WebsiteSearchItem::new(
            &revision(json!({})),
            AccessLevel::Public,
            "carta",
            "https://data-testing.bas.ac.uk",
        );
        assert_eq!(
            item.href,
            "https://data-testing.bas.ac.uk/items/5d5b4e21-fd32-409c-be83-ca1c339903e5/"
        );
    }

    #[test]
    fn open_access_requires_public_level() {
        let public = WebsiteSearchItem::new(
            &revision(json!({})),
            AccessLevel::Public,
            "carta",
            "https://data.bas.ac.uk",
        );
        assert!(public.open_access());

        let restricted = WebsiteSearchItem::new(
            &revision(json!({})),
            AccessLevel::BasStaff,
            "carta",
            "https://data.bas.ac.uk",
        );
        assert!(!restricted.open_access());
    }

    #[test]
    fn withdrawn_from_maintenance_progress() {
        let item = WebsiteSearchItem::new(
            &revision(json!({"maintenance": {"progress": "obsolete"}})),
            AccessLevel::Public,
            "carta",
            "https://data.bas.ac.uk",
        );
        assert!(item.withdrawn());
    }

    #[test]
    fn dumps_matches_sync_api_shape() {
        let item = WebsiteSearchItem::new(
            &revision(json!({"edition": "2"})),
            AccessLevel::Public,
            "carta",
            "https://data.bas.ac.uk",
        );
        let entity = item.dumps();
        assert_eq!(entity["file_identifier"], json!("5d5b4e21-fd32-409c-be83-ca1c339903e5"));
        assert_eq!(entity["file_revision"], json!("commit-a"));
        assert_eq!(entity["hierarchy_level"], json!("Dataset"));
        assert_eq!(entity["status"], json!("publish"));
        assert_eq!(entity["edition"], json!("2"));
        assert!(entity.get("href_thumbnail").is_none());
    }
}
