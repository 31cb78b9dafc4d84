// SPDX-License-Identifier: MIT OR Apache-2.0
//! Website search sync tests: in-scope selection and upsert/delete flow
//! against fake catalogue and website APIs.

use std::path::Path;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use josekit::jwk::Jwk;
use josekit::jwk::alg::ec::EcCurve;
use serde_json::json;
use wiremock::matchers::{method, path as url_path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use carta_admin::{Administration, AdministrationKeys, open_access, set_admin};
use carta_cache::LocalCache;
use carta_exporters::templates::TemplateEngine;
use carta_exporters::website::{WebsiteClient, WebsiteSearchExporter};
use carta_exporters::{Exporter, ExportMeta, ExporterContext};
use carta_gitlab::{GitLabClient, GitLabSource};
use carta_item::SiteMeta;
use carta_pool::WorkerPool;
use carta_record::{IsoXmlCodec, IsoXmlError, Record};
use carta_s3::S3Utils;
use carta_store::GitLabStore;

const PUBLIC_ID: &str = "5d5b4e21-fd32-409c-be83-ca1c339903e5";
const PRIVATE_ID: &str = "123e4567-e89b-12d3-a456-426614174000";

struct NullCodec;

impl IsoXmlCodec for NullCodec {
    fn encode(&self, _config: &serde_json::Value) -> Result<String, IsoXmlError> {
        Ok("<gmi:MI_Metadata/>".into())
    }
}

fn keys() -> AdministrationKeys {
    let signing = Jwk::generate_ec_key(EcCurve::P256).unwrap();
    let encryption = Jwk::generate_ec_key(EcCurve::P256).unwrap();
    AdministrationKeys::new(encryption, None, Some(signing)).unwrap()
}

fn record_config(id: &str, title: &str) -> serde_json::Value {
    json!({
        "file_identifier": id,
        "hierarchy_level": "dataset",
        "metadata": {
            "contacts": [{"organisation": {"name": "x"}, "role": ["pointOfContact"]}],
            "date_stamp": "2014-06-30",
        },
        "identification": {
            "title": {"value": title},
            "dates": {"creation": "2014-06-30", "publication": "2015-01-15"},
            "abstract": "An example dataset.",
            "contacts": [{"organisation": {"name": "x"}, "role": ["pointOfContact"]}],
            "identifiers": [{
                "identifier": id,
                "href": format!("https://data.bas.ac.uk/items/{id}"),
                "namespace": "data.bas.ac.uk",
            }],
        },
    })
}

/// A record sealed with public access permissions.
fn public_record_config(keys: &AdministrationKeys) -> serde_json::Value {
    let mut record = Record::loads(&record_config(PUBLIC_ID, "Public dataset")).unwrap();
    let mut admin = Administration::new(PUBLIC_ID);
    admin.access_permissions = vec![open_access()];
    set_admin(keys, &mut record, &admin).unwrap();
    let mut config = record.dumps(false);
    config["$schema"] = json!(carta_record::RECORD_SCHEMA_URL);
    config
}

async fn seeded_gitlab(keys: &AdministrationKeys) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(url_path("/api/v4/projects/123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 123})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(url_path("/api/v4/projects/123/repository/commits"))
        .and(query_param("ref_name", "main"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": "commit-a", "title": "x"}])),
        )
        .mount(&server)
        .await;

    let records = [
        (PUBLIC_ID, public_record_config(keys)),
        (PRIVATE_ID, record_config(PRIVATE_ID, "Private dataset")),
    ];
    let items: Vec<serde_json::Value> = records
        .iter()
        .map(|(id, _)| {
            json!({
                "id": id,
                "name": format!("{id}.json"),
                "path": format!("records/{}/{}/{id}.json", &id[0..2], &id[2..4]),
                "type": "blob",
            })
        })
        .collect();
    Mock::given(method("GET"))
        .and(url_path("/api/v4/projects/123/repository/tree"))
        .respond_with(ResponseTemplate::new(200).set_body_json(items))
        .mount(&server)
        .await;

    for (id, config) in records {
        let encoded = format!("records/{}/{}/{id}.json", &id[0..2], &id[2..4])
            .replace('/', "%2F")
            .replace('.', "%2E");
        Mock::given(method("GET"))
            .and(url_path(
                format!("/api/v4/projects/123/repository/files/{encoded}").as_str(),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": BASE64.encode(config.to_string()),
                "last_commit_id": "commit-a",
            })))
            .mount(&server)
            .await;
    }
    server
}

async fn context(
    gitlab: &MockServer,
    work_dir: &Path,
    keys: AdministrationKeys,
) -> Arc<ExporterContext> {
    let source = GitLabSource {
        endpoint: gitlab.uri(),
        project: "123".into(),
        ref_name: "main".into(),
    };
    let client = GitLabClient::new(&gitlab.uri(), "glpat-secret", "123");
    let cache_dir = work_dir.join("cache");

    let warm = LocalCache::new(
        WorkerPool::new(1),
        &cache_dir,
        client.clone(),
        source.clone(),
        false,
    );
    warm.get(None).await.unwrap();

    let cache = LocalCache::new(WorkerPool::new(1), &cache_dir, client.clone(), source.clone(), true);
    let store = GitLabStore::new(client, source, cache, true);

    Arc::new(ExporterContext {
        meta: ExportMeta {
            export_path: work_dir.join("site"),
            s3_bucket: "carta-site".into(),
            parallel_jobs: 1,
            site: SiteMeta {
                base_url: "https://data.bas.ac.uk".into(),
                html_title: String::new(),
                build_time: "2025-07-01T00:00:00+00:00".into(),
                plausible_domain: "data.bas.ac.uk".into(),
                embedded_maps_endpoint: "https://embedded-maps.data.bas.ac.uk/v1".into(),
                item_contact_endpoint: "https://forms.example.com/contact".into(),
                item_versions_endpoint: String::new(),
                turnstile_site_key: "key".into(),
            },
            trusted: false,
            trusted_host: None,
            trusted_path: None,
        },
        s3: S3Utils::new(
            carta_s3::client_from_static("id", "secret"),
            "carta-site",
            work_dir.join("site"),
        ),
        store: Arc::new(store),
        codec: Arc::new(NullCodec),
        templates: TemplateEngine::new(),
        admin_keys: Some(keys),
    })
}

#[tokio::test]
async fn in_scope_items_require_public_access() {
    let keys = keys();
    let gitlab = seeded_gitlab(&keys).await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&gitlab, dir.path(), keys).await;

    let website = MockServer::start().await;
    let exporter = WebsiteSearchExporter::new(
        ctx,
        WebsiteClient::new(&format!("{}/wp-json/carta/v1/items", website.uri()), "sync", "secret"),
    );

    let items = exporter.in_scope_items().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].file_identifier, PUBLIC_ID);
    assert!(items[0].open_access());
}

#[tokio::test]
async fn sync_upserts_new_items_and_deletes_orphans() {
    let keys = keys();
    let gitlab = seeded_gitlab(&keys).await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&gitlab, dir.path(), keys).await;

    let website = MockServer::start().await;
    // One orphaned post and no post for the public record.
    Mock::given(method("GET"))
        .and(url_path("/wp-json/carta/v1/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 11,
            "meta": {"file_identifier": "00000000-0000-0000-0000-000000000000", "file_revision": "old"},
        }])))
        .mount(&website)
        .await;
    Mock::given(method("POST"))
        .and(url_path("/wp-json/carta/v1/items"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 12})))
        .expect(1)
        .mount(&website)
        .await;
    Mock::given(method("DELETE"))
        .and(url_path("/wp-json/carta/v1/items/11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deleted": true})))
        .expect(1)
        .mount(&website)
        .await;

    let exporter = WebsiteSearchExporter::new(
        ctx,
        WebsiteClient::new(&format!("{}/wp-json/carta/v1/items", website.uri()), "sync", "secret"),
    );
    exporter.publish().await.unwrap();
}

#[tokio::test]
async fn sync_skips_current_posts() {
    let keys = keys();
    let gitlab = seeded_gitlab(&keys).await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&gitlab, dir.path(), keys).await;

    let website = MockServer::start().await;
    // Post already at the current file revision: nothing to do.
    Mock::given(method("GET"))
        .and(url_path("/wp-json/carta/v1/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 12,
            "meta": {"file_identifier": PUBLIC_ID, "file_revision": "commit-a"},
        }])))
        .mount(&website)
        .await;

    let exporter = WebsiteSearchExporter::new(
        ctx,
        WebsiteClient::new(&format!("{}/wp-json/carta/v1/items", website.uri()), "sync", "secret"),
    );
    exporter.publish().await.unwrap();
}

#[tokio::test]
async fn export_unsupported_for_website_sync() {
    let keys = keys();
    let gitlab = seeded_gitlab(&keys).await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&gitlab, dir.path(), keys).await;

    let website = MockServer::start().await;
    let exporter = WebsiteSearchExporter::new(
        ctx,
        WebsiteClient::new(&format!("{}/wp-json/carta/v1/items", website.uri()), "sync", "secret"),
    );
    assert!(exporter.export().await.is_err());
}
