// SPDX-License-Identifier: MIT OR Apache-2.0
//! SQLite schema and queries for the record cache.
//!
//! `file_identifier` and `file_revision` are generated columns over the JSONB
//! form of the cached configuration. The PRIMARY KEY on `sha1` and UNIQUE
//! constraint on `file_identifier` are load-bearing: upserts key on the
//! identifier while hash collisions dedupe identical content.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use crate::CacheError;

pub(crate) async fn connect(path: &Path) -> Result<SqlitePool, CacheError> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display()))
        .map_err(CacheError::Db)?
        .create_if_missing(true);
    Ok(SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?)
}

pub(crate) async fn init_schema(pool: &SqlitePool) -> Result<(), CacheError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS record
        (
            record_pickled  BLOB NOT NULL,
            record_jsonb    BLOB NOT NULL,
            sha1            TEXT PRIMARY KEY,
            file_identifier TEXT GENERATED ALWAYS AS (jsonb_extract(record_jsonb, '$.file_identifier')) STORED UNIQUE,
            file_revision   TEXT GENERATED ALWAYS AS (jsonb_extract(record_jsonb, '$.file_revision')) STORED
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meta
        (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn has_record_table(pool: &SqlitePool) -> Result<bool, CacheError> {
    let row = sqlx::query(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'record'",
    )
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}

pub(crate) async fn upsert_record(
    tx: &mut Transaction<'_, Sqlite>,
    packed: &[u8],
    jsonb_text: &str,
    sha1: &str,
) -> Result<(), CacheError> {
    sqlx::query(
        r#"
        INSERT INTO record (record_pickled, record_jsonb, sha1)
        VALUES (?, jsonb(?), ?)
        ON CONFLICT(file_identifier)
        DO UPDATE
        SET
            record_pickled = excluded.record_pickled,
            record_jsonb   = excluded.record_jsonb,
            sha1           = excluded.sha1
        "#,
    )
    .bind(packed)
    .bind(jsonb_text)
    .bind(sha1)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub(crate) async fn upsert_meta(
    tx: &mut Transaction<'_, Sqlite>,
    key: &str,
    value: &str,
) -> Result<(), CacheError> {
    sqlx::query(
        "INSERT INTO meta (key, value) VALUES (?, ?) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub(crate) async fn get_meta(pool: &SqlitePool, key: &str) -> Result<Option<String>, CacheError> {
    let row = sqlx::query("SELECT value FROM meta WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|row| row.get::<String, _>("value")))
}

pub(crate) async fn select_packed(
    pool: &SqlitePool,
    file_identifiers: Option<&BTreeSet<String>>,
) -> Result<Vec<Vec<u8>>, CacheError> {
    let mut builder = sqlx::QueryBuilder::<Sqlite>::new("SELECT record_pickled FROM record");
    if let Some(ids) = file_identifiers
        && !ids.is_empty()
    {
        builder.push(" WHERE file_identifier IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");
    }
    let rows = builder.build().fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(|row| row.get::<Vec<u8>, _>("record_pickled"))
        .collect())
}

pub(crate) async fn select_hashes(
    pool: &SqlitePool,
    file_identifiers: &BTreeSet<String>,
) -> Result<BTreeMap<String, String>, CacheError> {
    if file_identifiers.is_empty() {
        return Ok(BTreeMap::new());
    }
    let mut builder =
        sqlx::QueryBuilder::<Sqlite>::new("SELECT file_identifier, sha1 FROM record WHERE file_identifier IN (");
    let mut separated = builder.separated(", ");
    for id in file_identifiers {
        separated.push_bind(id);
    }
    separated.push_unseparated(")");
    let rows = builder.build().fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            (
                row.get::<String, _>("file_identifier"),
                row.get::<String, _>("sha1"),
            )
        })
        .collect())
}

pub(crate) async fn record_count(pool: &SqlitePool) -> Result<i64, CacheError> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM record")
        .fetch_one(pool)
        .await?;
    Ok(row.get("count"))
}
