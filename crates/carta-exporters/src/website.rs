// SPDX-License-Identifier: MIT OR Apache-2.0
//! Public-website search synchronisation.
//!
//! In-scope catalogue items (public and not superseded) are mirrored as
//! posts in the public website via its REST API: changed items are upserted
//! (change detected by file revision) and orphaned posts deleted. This
//! exporter has no local output; it only supports publishing.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use carta_admin::{AccessLevel, get_admin};
use carta_item::WebsiteSearchItem;
use carta_record::RecordRevision;
use carta_record::enums::AggregationAssociationCode;

use crate::{Exporter, ExporterContext, ExporterError};

const API_TIMEOUT: Duration = Duration::from_secs(10);
const PER_PAGE: usize = 100;

/// Identifier for items originating from this catalogue.
const SOURCE: &str = "carta";

/// An existing post on the website.
#[derive(Clone, Debug)]
struct RemotePost {
    post_id: u64,
    file_identifier: String,
    file_revision: String,
}

/// Client for the website's posts API.
///
/// Limited to the operations the search exporter needs.
pub struct WebsiteClient {
    http: reqwest::Client,
    endpoint: String,
    username: String,
    password: String,
}

impl WebsiteClient {
    pub fn new(endpoint: &str, username: &str, password: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            username: username.to_owned(),
            password: password.to_owned(),
        }
    }

    async fn fetch_posts(&self) -> Result<Vec<RemotePost>, ExporterError> {
        let mut posts = Vec::new();
        let mut page = 1usize;
        info!(target: "carta.website", "fetching existing posts");
        loop {
            let response = self
                .http
                .get(&self.endpoint)
                .basic_auth(&self.username, Some(&self.password))
                .query(&[
                    ("page", page.to_string()),
                    ("per_page", PER_PAGE.to_string()),
                    ("orderby", "id".to_owned()),
                    ("order", "asc".to_owned()),
                ])
                .timeout(API_TIMEOUT)
                .send()
                .await
                .map_err(|e| ExporterError::WebsiteSync(e.to_string()))?;
            if !response.status().is_success() {
                return Err(ExporterError::WebsiteSync(format!(
                    "post listing failed with status {}",
                    response.status()
                )));
            }
            let batch: Vec<Value> = response
                .json()
                .await
                .map_err(|e| ExporterError::WebsiteSync(e.to_string()))?;
            let len = batch.len();
            for post in batch {
                let Some(post_id) = post.get("id").and_then(Value::as_u64) else {
                    continue;
                };
                let meta = post.get("meta").cloned().unwrap_or(Value::Null);
                posts.push(RemotePost {
                    post_id,
                    file_identifier: meta
                        .get("file_identifier")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_owned(),
                    file_revision: meta
                        .get("file_revision")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_owned(),
                });
            }
            if len < PER_PAGE {
                return Ok(posts);
            }
            page += 1;
        }
    }

    async fn upsert(&self, post_id: Option<u64>, entity: &Value) -> Result<(), ExporterError> {
        let url = match post_id {
            Some(post_id) => format!("{}/{post_id}?context=edit", self.endpoint),
            None => self.endpoint.clone(),
        };
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .json(entity)
            .timeout(API_TIMEOUT)
            .send()
            .await
            .map_err(|e| ExporterError::WebsiteSync(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ExporterError::WebsiteSync(format!(
                "post upsert failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn delete(&self, post_id: u64) -> Result<(), ExporterError> {
        let url = format!("{}/{post_id}", self.endpoint);
        let response = self
            .http
            .delete(&url)
            .basic_auth(&self.username, Some(&self.password))
            .timeout(API_TIMEOUT)
            .send()
            .await
            .map_err(|e| ExporterError::WebsiteSync(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ExporterError::WebsiteSync(format!(
                "post delete failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Website search sync exporter.
pub struct WebsiteSearchExporter {
    ctx: Arc<ExporterContext>,
    client: WebsiteClient,
}

impl WebsiteSearchExporter {
    pub fn new(ctx: Arc<ExporterContext>, client: WebsiteClient) -> Self {
        Self { ctx, client }
    }

    fn access_for(&self, record: &RecordRevision) -> AccessLevel {
        let Some(keys) = &self.ctx.admin_keys else {
            return AccessLevel::NoAccess;
        };
        match get_admin(keys, &record.record) {
            Ok(Some(admin)) => admin.access_level(),
            Ok(None) => AccessLevel::NoAccess,
            Err(error) => {
                warn!(target: "carta.website", %error, "unreadable admin metadata");
                AccessLevel::NoAccess
            }
        }
    }

    /// In-scope items: public, not superseded and not withdrawn.
    ///
    /// Superseded records are those referenced by any other record's
    /// `revisionOf` aggregation.
    pub async fn in_scope_items(&self) -> Result<Vec<WebsiteSearchItem>, ExporterError> {
        let records = self.ctx.store.select(None).await?;

        let superseded: Vec<String> = records
            .iter()
            .flat_map(|record| {
                record
                    .record
                    .identification
                    .aggregations
                    .filter(
                        None,
                        None,
                        Some(&[AggregationAssociationCode::RevisionOf]),
                        None,
                    )
                    .iter()
                    .map(|aggregation| aggregation.identifier.identifier.clone())
                    .collect::<Vec<_>>()
            })
            .collect();

        let items: Vec<WebsiteSearchItem> = records
            .iter()
            .map(|record| {
                WebsiteSearchItem::new(
                    record,
                    self.access_for(record),
                    SOURCE,
                    &self.ctx.meta.site.base_url,
                )
            })
            .filter(|item| item.open_access())
            .filter(|item| !item.withdrawn())
            .filter(|item| !superseded.contains(&item.file_identifier))
            .collect();
        Ok(items)
    }

    async fn sync(&self) -> Result<(), ExporterError> {
        let items = self.in_scope_items().await?;
        let posts = self.client.fetch_posts().await?;
        let posts_by_identifier: BTreeMap<&str, &RemotePost> = posts
            .iter()
            .map(|post| (post.file_identifier.as_str(), post))
            .collect();

        let mut upserted = 0usize;
        for item in &items {
            match posts_by_identifier.get(item.file_identifier.as_str()) {
                Some(post) if post.file_revision == item.file_revision => {
                    debug!(
                        target: "carta.website",
                        file_identifier = %item.file_identifier,
                        "post current, skipping"
                    );
                }
                Some(post) => {
                    self.client.upsert(Some(post.post_id), &item.dumps()).await?;
                    upserted += 1;
                }
                None => {
                    self.client.upsert(None, &item.dumps()).await?;
                    upserted += 1;
                }
            }
        }

        let mut deleted = 0usize;
        let item_identifiers: Vec<&str> = items
            .iter()
            .map(|item| item.file_identifier.as_str())
            .collect();
        for post in &posts {
            if !item_identifiers.contains(&post.file_identifier.as_str()) {
                self.client.delete(post.post_id).await?;
                deleted += 1;
            }
        }

        info!(
            target: "carta.website",
            items = items.len(),
            upserted,
            deleted,
            "website search sync complete"
        );
        Ok(())
    }
}

#[async_trait]
impl Exporter for WebsiteSearchExporter {
    fn name(&self) -> &'static str {
        "Website Search"
    }

    /// Not supported: the sync has no local output.
    async fn export(&self) -> Result<(), ExporterError> {
        Err(ExporterError::WebsiteSync(
            "website search sync does not support export".into(),
        ))
    }

    async fn publish(&self) -> Result<(), ExporterError> {
        self.sync().await
    }
}
