// SPDX-License-Identifier: MIT OR Apache-2.0
use std::collections::BTreeSet;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use carta_cache::LocalCache;
use carta_gitlab::{GitLabClient, GitLabSource};
use carta_pool::WorkerPool;
use carta_record::Record;

use super::*;

const ID_A: &str = "5d5b4e21-fd32-409c-be83-ca1c339903e5";
const ID_B: &str = "123e4567-e89b-12d3-a456-426614174000";
const ID_C: &str = "9f735d33-50a9-4fe3-a3d7-17c519d6a861";

fn record_config(id: &str, title: &str) -> serde_json::Value {
    json!({
        "file_identifier": id,
        "hierarchy_level": "product",
        "metadata": {
            "contacts": [{"organisation": {"name": "x"}, "role": ["pointOfContact"]}],
            "date_stamp": "2014-06-30",
        },
        "identification": {
            "title": {"value": title},
            "dates": {"creation": "2014-06-30"},
            "abstract": "x",
            "contacts": [{"organisation": {"name": "x"}, "role": ["pointOfContact"]}],
            "identifiers": [{
                "identifier": id,
                "href": format!("https://data.bas.ac.uk/items/{id}"),
                "namespace": "data.bas.ac.uk",
            }],
        },
    })
}

fn tree_path(id: &str) -> String {
    format!("records/{}/{}/{id}.json", &id[0..2], &id[2..4])
}

async fn mount_read_state(server: &MockServer, ids: &[(&str, &str)]) {
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 123})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/123/repository/commits"))
        .and(query_param("ref_name", "publishing"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": "commit-a", "title": "x"}])),
        )
        .mount(server)
        .await;

    let items: Vec<serde_json::Value> = ids
        .iter()
        .map(|(id, _)| {
            json!({"id": id, "name": format!("{id}.json"), "path": tree_path(id), "type": "blob"})
        })
        .collect();
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/123/repository/tree"))
        .respond_with(ResponseTemplate::new(200).set_body_json(items))
        .mount(server)
        .await;

    for (id, title) in ids {
        let encoded = tree_path(id).replace('/', "%2F").replace('.', "%2E");
        Mock::given(method("GET"))
            .and(path(format!("/api/v4/projects/123/repository/files/{encoded}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": BASE64.encode(record_config(id, title).to_string()),
                "last_commit_id": "commit-a",
            })))
            .mount(server)
            .await;
    }
}

fn store_for(server: &MockServer, dir: &std::path::Path, frozen: bool) -> GitLabStore {
    let source = GitLabSource {
        endpoint: server.uri(),
        project: "123".into(),
        ref_name: "publishing".into(),
    };
    let client = GitLabClient::new(&server.uri(), "glpat-secret", "123");
    let cache = LocalCache::new(
        WorkerPool::new(2),
        dir,
        client.clone(),
        source.clone(),
        frozen,
    );
    GitLabStore::new(client, source, cache, frozen)
}

async fn mount_branch_exists(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/123/repository/branches/publishing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "publishing"})))
        .mount(server)
        .await;
}

#[test]
fn record_path_shards_by_identifier() {
    assert_eq!(
        record_path(ID_A),
        "records/5d/5b/5d5b4e21-fd32-409c-be83-ca1c339903e5.json"
    );
}

#[tokio::test]
async fn select_is_all_or_nothing() {
    let server = MockServer::start().await;
    mount_read_state(&server, &[(ID_A, "a"), (ID_B, "b")]).await;
    let dir = tempfile::tempdir().unwrap();
    let store = store_for(&server, &dir.path().join("cache"), false);

    let all = store.select(None).await.unwrap();
    assert_eq!(all.len(), 2);

    let requested: BTreeSet<String> = [ID_A.to_owned(), ID_C.to_owned()].into();
    let err = store.select(Some(&requested)).await.unwrap_err();
    match err {
        StoreError::RecordsNotFound(missing) => {
            assert_eq!(missing, [ID_C.to_owned()].into());
        }
        other => panic!("expected RecordsNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn select_one_maps_missing_to_record_not_found() {
    let server = MockServer::start().await;
    mount_read_state(&server, &[(ID_A, "a")]).await;
    let dir = tempfile::tempdir().unwrap();
    let store = store_for(&server, &dir.path().join("cache"), false);

    let record = store.select_one(ID_A).await.unwrap();
    assert_eq!(record.file_identifier(), ID_A);

    let err = store.select_one(ID_C).await.unwrap_err();
    assert!(matches!(err, StoreError::RecordNotFound(id) if id == ID_C));
}

#[tokio::test]
async fn push_with_all_unchanged_returns_no_commit() {
    let server = MockServer::start().await;
    mount_read_state(&server, &[(ID_A, "a")]).await;
    mount_branch_exists(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let store = store_for(&server, &dir.path().join("cache"), false);

    let unchanged = Record::loads(&record_config(ID_A, "a")).unwrap();
    let results = store
        .push(
            vec![unchanged],
            "publish",
            "no changes expected",
            ("Carta", "carta@example.com"),
        )
        .await
        .unwrap();

    assert_eq!(results, CommitResults::default());
}

#[tokio::test]
async fn push_partitions_new_and_updated() {
    let server = MockServer::start().await;
    mount_read_state(&server, &[(ID_A, "a"), (ID_B, "b")]).await;
    mount_branch_exists(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v4/projects/123/repository/commits"))
        .and(body_partial_json(json!({"branch": "publishing"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": "commit-b", "title": "publish"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = store_for(&server, &dir.path().join("cache"), false);
    // Warm the cache so hashes resolve before the push classification.
    store.select(None).await.unwrap();

    let unchanged = Record::loads(&record_config(ID_A, "a")).unwrap();
    let changed = Record::loads(&record_config(ID_B, "b revised")).unwrap();
    let added = Record::loads(&record_config(ID_C, "c")).unwrap();

    let results = store
        .push(
            vec![unchanged, added, changed],
            "publish",
            "mixed batch",
            ("Carta", "carta@example.com"),
        )
        .await
        .unwrap();

    assert_eq!(results.commit.as_deref(), Some("commit-b"));
    assert_eq!(results.new_identifiers, vec![ID_C.to_owned()]);
    assert_eq!(results.updated_identifiers, vec![ID_B.to_owned()]);
}

#[tokio::test]
async fn push_creates_missing_branch_once() {
    let server = MockServer::start().await;
    mount_read_state(&server, &[(ID_A, "a")]).await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/123/repository/branches/publishing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v4/projects/123/repository/branches"))
        .and(body_partial_json(json!({"branch": "publishing", "ref": "main"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"name": "publishing"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v4/projects/123/repository/commits"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": "commit-b", "title": "publish"})),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = store_for(&server, &dir.path().join("cache"), false);
    let added = Record::loads(&record_config(ID_C, "c")).unwrap();
    let results = store
        .push(
            vec![added],
            "publish",
            "new record",
            ("Carta", "carta@example.com"),
        )
        .await
        .unwrap();
    assert_eq!(results.new_identifiers, vec![ID_C.to_owned()]);
}

#[tokio::test]
async fn push_rejects_invalid_record() {
    let server = MockServer::start().await;
    mount_read_state(&server, &[(ID_A, "a")]).await;
    let dir = tempfile::tempdir().unwrap();
    let store = store_for(&server, &dir.path().join("cache"), false);

    // Missing catalogue identifier: invalid for the catalogue profile.
    let mut config = record_config(ID_C, "c");
    config["identification"]["identifiers"] = json!([]);
    let invalid = Record::loads(&config).unwrap();

    let err = store
        .push(
            vec![invalid],
            "publish",
            "bad record",
            ("Carta", "carta@example.com"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::RecordInvalid(_)));
}

#[tokio::test]
async fn frozen_store_rejects_mutations_but_selects() {
    let server = MockServer::start().await;
    mount_read_state(&server, &[(ID_A, "a")]).await;
    let dir = tempfile::tempdir().unwrap();

    // Populate via a writable store, then reopen frozen.
    store_for(&server, &dir.path().join("cache"), false)
        .select(None)
        .await
        .unwrap();
    let frozen = store_for(&server, &dir.path().join("cache"), true);

    let records = frozen.select(None).await.unwrap();
    assert_eq!(records.len(), 1);

    let record = Record::loads(&record_config(ID_C, "c")).unwrap();
    let push_err = frozen
        .push(vec![record], "t", "m", ("Carta", "carta@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(push_err, StoreError::Frozen(_)));

    let purge_err = frozen.purge().await.unwrap_err();
    assert!(matches!(purge_err, StoreError::Frozen(_)));
}

#[tokio::test]
async fn open_changeset_prefixes_title() {
    let server = MockServer::start().await;
    mount_read_state(&server, &[(ID_A, "a")]).await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/123/merge_requests"))
        .and(query_param("source_branch", "publishing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v4/projects/123/merge_requests"))
        .and(body_partial_json(json!({
            "source_branch": "publishing",
            "target_branch": "main",
            "title": "Automated publishing changeset: nightly",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "iid": 7,
            "title": "Automated publishing changeset: nightly",
            "web_url": "https://gitlab.example.com/x/y/-/merge_requests/7",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = store_for(&server, &dir.path().join("cache"), false);
    let mr = store.open_changeset("nightly").await.unwrap();
    assert_eq!(mr.iid, 7);
}

#[tokio::test]
async fn open_changeset_reuses_existing() {
    let server = MockServer::start().await;
    mount_read_state(&server, &[(ID_A, "a")]).await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/123/merge_requests"))
        .and(query_param("source_branch", "publishing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "iid": 3,
            "title": "Automated publishing changeset: earlier",
            "web_url": "https://gitlab.example.com/x/y/-/merge_requests/3",
        }])))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = store_for(&server, &dir.path().join("cache"), false);
    let mr = store.open_changeset("nightly").await.unwrap();
    assert_eq!(mr.iid, 3);
}
