// SPDX-License-Identifier: MIT OR Apache-2.0
//! Construction of the pipeline's shared components from configuration.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use chrono::{SecondsFormat, Utc};

use carta_admin::AdministrationKeys;
use carta_cache::LocalCache;
use carta_config::Config;
use carta_exporters::templates::TemplateEngine;
use carta_exporters::{ExportMeta, ExporterContext};
use carta_gitlab::{GitLabClient, GitLabSource};
use carta_item::SiteMeta;
use carta_pool::WorkerPool;
use carta_s3::S3Utils;
use carta_store::GitLabStore;

use crate::codec::EnvelopeIsoXmlCodec;

pub fn gitlab_source(config: &Config, ref_name: Option<&str>) -> GitLabSource {
    GitLabSource {
        endpoint: config.store_gitlab_endpoint.clone(),
        project: config.store_gitlab_project_id.clone(),
        ref_name: ref_name
            .unwrap_or(&config.store_gitlab_branch)
            .to_owned(),
    }
}

/// Build a store against the configured remote and cache directory.
pub fn build_store(config: &Config, ref_name: Option<&str>, frozen: bool) -> GitLabStore {
    let source = gitlab_source(config, ref_name);
    let client = GitLabClient::new(
        &config.store_gitlab_endpoint,
        &config.store_gitlab_token,
        &config.store_gitlab_project_id,
    );
    let cache = LocalCache::new(
        WorkerPool::new(config.parallel_jobs),
        &config.store_gitlab_cache_path,
        client.clone(),
        source.clone(),
        frozen,
    );
    GitLabStore::new(client, source, cache, frozen)
}

fn admin_keys(config: &Config) -> Result<Option<AdministrationKeys>> {
    if config.admin_metadata_encryption_key_private.is_empty()
        || config.admin_metadata_signing_key_public.is_empty()
    {
        return Ok(None);
    }
    let keys = AdministrationKeys::from_json(
        &config.admin_metadata_encryption_key_private,
        Some(&config.admin_metadata_signing_key_public),
        None,
    )
    .context("parsing administrative metadata keys")?;
    Ok(Some(keys))
}

pub fn site_meta(config: &Config) -> SiteMeta {
    SiteMeta {
        base_url: config.base_url.trim_end_matches('/').to_owned(),
        html_title: String::new(),
        build_time: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false),
        plausible_domain: config.templates_plausible_domain.clone(),
        embedded_maps_endpoint: config.templates_item_maps_endpoint.clone(),
        item_contact_endpoint: config.templates_item_contact_endpoint.clone(),
        item_versions_endpoint: config.templates_item_versions_endpoint.clone(),
        turnstile_site_key: config.templates_item_contact_turnstile_key.clone(),
    }
}

/// Build the shared exporter context over a frozen store snapshot.
pub async fn build_exporter_context(
    config: &Config,
    ref_name: Option<&str>,
) -> Result<Arc<ExporterContext>> {
    // Warm the cache before freezing the snapshot exporters will share.
    let warm = build_store(config, ref_name, false);
    warm.select(None).await.context("warming record cache")?;

    let store = build_store(config, ref_name, true);
    let s3_client = carta_s3::init_s3_client(&config.aws_access_id, &config.aws_access_secret).await;
    let s3 = S3Utils::new(s3_client, &config.aws_s3_bucket, &config.export_path);

    Ok(Arc::new(ExporterContext {
        meta: ExportMeta {
            export_path: config.export_path.clone(),
            s3_bucket: config.aws_s3_bucket.clone(),
            parallel_jobs: config.parallel_jobs,
            site: site_meta(config),
            trusted: false,
            trusted_host: None,
            trusted_path: None,
        },
        s3,
        store: Arc::new(store),
        codec: Arc::new(EnvelopeIsoXmlCodec),
        templates: TemplateEngine::new(),
        admin_keys: admin_keys(config)?,
    }))
}
