// SPDX-License-Identifier: MIT OR Apache-2.0
//! Page-level metadata fragments: Open Graph and Schema.org.

use serde_json::{Map, Value};

/// Open Graph metadata for link previews and unfurling.
///
/// See <https://ogp.me/> for tag semantics.
#[derive(Clone, Debug, PartialEq)]
pub struct OpenGraphMeta {
    pub locale: String,
    pub site_name: String,
    pub type_: String,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub published_at: Option<String>,
}

impl OpenGraphMeta {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            locale: "en_GB".into(),
            site_name: "BAS Data Catalogue".into(),
            type_: "article".into(),
            title: title.into(),
            url: url.into(),
            description: None,
            image: None,
            published_at: None,
        }
    }

    /// Compiled property/content pairs for meta tags.
    pub fn dumps(&self) -> Vec<(String, String)> {
        let mut tags = vec![
            ("og:locale".to_owned(), self.locale.clone()),
            ("og:site_name".to_owned(), self.site_name.clone()),
            ("og:type".to_owned(), self.type_.clone()),
            ("og:title".to_owned(), self.title.clone()),
            ("og:url".to_owned(), self.url.clone()),
        ];
        if let Some(description) = &self.description {
            tags.push(("og:description".to_owned(), description.clone()));
        }
        if let Some(image) = &self.image {
            tags.push(("og:image".to_owned(), image.clone()));
        }
        if let Some(published_at) = &self.published_at {
            tags.push((
                "og:article:published_time".to_owned(),
                published_at.clone(),
            ));
        }
        tags
    }
}

/// Schema.org author, a person or organisation.
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaOrgAuthor {
    pub type_: String,
    pub name: String,
    pub url: Option<String>,
}

impl SchemaOrgAuthor {
    fn dumps(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("@type".into(), Value::String(self.type_.clone()));
        obj.insert("name".into(), Value::String(self.name.clone()));
        if let Some(url) = &self.url {
            obj.insert("url".into(), Value::String(url.clone()));
        }
        Value::Object(obj)
    }
}

/// Schema.org metadata for item link unfurling.
///
/// Support is limited to article-shaped link previews.
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaOrgMeta {
    pub name: String,
    pub headline: String,
    pub url: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub creators: Vec<SchemaOrgAuthor>,
}

impl SchemaOrgMeta {
    pub fn new(headline: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: "BAS Data Catalogue".into(),
            headline: headline.into(),
            url: url.into(),
            description: None,
            image: None,
            creators: Vec::new(),
        }
    }

    /// JSON-LD document for a `<script type="application/ld+json">` tag.
    pub fn dumps(&self) -> String {
        let mut obj = Map::new();
        obj.insert("@context".into(), Value::String("https://schema.org/".into()));
        obj.insert("@type".into(), Value::String("Article".into()));
        obj.insert("name".into(), Value::String(self.name.clone()));
        obj.insert("headline".into(), Value::String(self.headline.clone()));
        obj.insert("url".into(), Value::String(self.url.clone()));
        if let Some(description) = &self.description {
            obj.insert("description".into(), Value::String(description.clone()));
        }
        if let Some(image) = &self.image {
            obj.insert("image".into(), Value::String(image.clone()));
        }
        if !self.creators.is_empty() {
            obj.insert(
                "creator".into(),
                Value::Array(self.creators.iter().map(SchemaOrgAuthor::dumps).collect()),
            );
        }
        serde_json::to_string_pretty(&Value::Object(obj)).unwrap_or_default()
    }
}

/// Metadata for a static site page.
#[derive(Clone, Debug, PartialEq)]
pub struct SitePageMeta {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
}

impl SitePageMeta {
    pub fn open_graph(&self) -> OpenGraphMeta {
        let mut meta = OpenGraphMeta::new(&self.title, &self.url);
        meta.description = self.description.clone();
        meta
    }

    pub fn schema_org(&self) -> SchemaOrgMeta {
        let mut meta = SchemaOrgMeta::new(&self.title, &self.url);
        meta.description = self.description.clone();
        meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_graph_skips_missing_optionals() {
        let meta = OpenGraphMeta::new("x", "https://example.com/items/x/");
        let tags = meta.dumps();
        assert!(tags.iter().any(|(k, _)| k == "og:title"));
        assert!(!tags.iter().any(|(k, _)| k == "og:description"));
    }

    #[test]
    fn schema_org_includes_creators() {
        let mut meta = SchemaOrgMeta::new("x", "https://example.com/items/x/");
        meta.creators.push(SchemaOrgAuthor {
            type_: "Organization".into(),
            name: "Mapping and Geographic Information Centre".into(),
            url: Some("https://www.bas.ac.uk/teams/magic".into()),
        });
        let doc = meta.dumps();
        assert!(doc.contains("\"@type\": \"Article\""));
        assert!(doc.contains("Mapping and Geographic Information Centre"));
    }
}
