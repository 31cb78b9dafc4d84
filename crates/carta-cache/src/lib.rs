// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! Durable local cache of catalogue records mirrored from GitLab.
//!
//! Records are cached in a SQLite database owned exclusively by this crate,
//! with an in-memory 'flash' layer of deserialised [`RecordRevision`]s per
//! cache instance. The cache refreshes incrementally against the remote when
//! stale, recreates itself when the commit gap is too large or integrity
//! cannot be guaranteed, supports a read-only frozen mode for exporter
//! snapshots, and degrades to possibly-stale reads when offline.

mod db;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use carta_gitlab::{GitLabClient, GitLabError, GitLabSource};
use carta_pool::WorkerPool;
use carta_record::{RecordRevision, validate_catalogue_record};

/// Refresh is abandoned for a full recreate past this many commits.
const REFRESH_COMMIT_LIMIT: usize = 50;

/// Repository path prefix holding record files.
const RECORDS_PREFIX: &str = "records/";

/// Errors raised by the local cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The cache has not been initialised yet.
    #[error("cache not initialised: {0}")]
    NotInitialised(String),

    /// Cache integrity cannot be guaranteed by a partial update.
    #[error("cache integrity cannot be guaranteed: {0}")]
    Integrity(String),

    /// The cache is too far behind the remote to refresh sensibly.
    #[error("cache too outdated to refresh")]
    TooOutdated,

    /// An operation requiring remote state was attempted on a frozen cache.
    #[error("cache frozen: {0}")]
    Frozen(String),

    /// The remote is unreachable and no usable local cache exists.
    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// Remote API failure.
    #[error(transparent)]
    GitLab(#[from] GitLabError),

    /// Backing database failure.
    #[error(transparent)]
    Db(#[from] sqlx::Error),

    /// Cached record payload could not be decoded.
    #[error("cached record decode failed: {0}")]
    Decode(String),

    /// Filesystem failure managing the cache directory.
    #[error("cache io failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw record data fetched from the remote.
#[derive(Clone, Debug)]
pub struct RawRecord {
    pub config_str: String,
    pub commit_id: String,
}

/// A record processed for caching: revision, hash and serialised forms.
struct ProcessedRecord {
    revision: RecordRevision,
    sha1: String,
    packed: Vec<u8>,
    jsonb_text: String,
}

fn process_raw(raw: &RawRecord) -> Result<ProcessedRecord, CacheError> {
    let config: serde_json::Value = serde_json::from_str(&raw.config_str)
        .map_err(|e| CacheError::Decode(format!("record config: {e}")))?;
    let mut with_revision = config;
    if let serde_json::Value::Object(obj) = &mut with_revision {
        obj.insert(
            "file_revision".into(),
            serde_json::Value::String(raw.commit_id.clone()),
        );
    }
    let revision = RecordRevision::loads(&with_revision)
        .map_err(|e| CacheError::Decode(format!("record config: {e}")))?;
    validate_catalogue_record(&revision.record, true, None)
        .map_err(|e| CacheError::Decode(format!("record invalid: {e}")))?;

    let sha1 = revision.record.sha1();
    let cached_config = revision.dumps_with_revision();
    let packed = rmp_serde::to_vec(&cached_config)
        .map_err(|e| CacheError::Decode(format!("record packing: {e}")))?;
    let jsonb_text = cached_config.to_string();
    Ok(ProcessedRecord {
        revision,
        sha1,
        packed,
        jsonb_text,
    })
}

fn unpack(packed: &[u8]) -> Result<RecordRevision, CacheError> {
    let config: serde_json::Value = rmp_serde::from_slice(packed)
        .map_err(|e| CacheError::Decode(format!("record unpacking: {e}")))?;
    RecordRevision::loads(&config).map_err(|e| CacheError::Decode(format!("cached record: {e}")))
}

/// Cache of records from a GitLab project repository.
///
/// Backed by a SQLite database holding serialised [`RecordRevision`]s, their
/// content hashes and the source location plus head commit of the last
/// refresh. The cache populates and refreshes itself on access via
/// [`LocalCache::get`], and can be invalidated with [`LocalCache::purge`].
///
/// The cache directory MUST be assumed to be exclusively managed by this
/// type.
pub struct LocalCache {
    pool: WorkerPool,
    path: PathBuf,
    db_path: PathBuf,
    client: GitLabClient,
    source: GitLabSource,
    frozen: bool,
    db: Mutex<Option<SqlitePool>>,
    flash: Mutex<HashMap<String, RecordRevision>>,
}

impl LocalCache {
    pub fn new(
        pool: WorkerPool,
        path: impl Into<PathBuf>,
        client: GitLabClient,
        source: GitLabSource,
        frozen: bool,
    ) -> Self {
        let path = path.into();
        let db_path = path.join("cache.db");
        Self {
            pool,
            path,
            db_path,
            client,
            source,
            frozen,
            db: Mutex::new(None),
            flash: Mutex::new(HashMap::new()),
        }
    }

    /// Whether the cache is frozen (never contacts the remote).
    pub fn frozen(&self) -> bool {
        self.frozen
    }

    /// Cache directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // -- database handle ----------------------------------------------------

    async fn db(&self) -> Result<SqlitePool, CacheError> {
        let mut guard = self.db.lock().await;
        if let Some(pool) = guard.as_ref() {
            return Ok(pool.clone());
        }
        debug!(target: "carta.cache", path = %self.db_path.display(), "connecting to cache db");
        let pool = db::connect(&self.db_path).await?;
        *guard = Some(pool.clone());
        Ok(pool)
    }

    async fn close_db(&self) {
        let mut guard = self.db.lock().await;
        if let Some(pool) = guard.take() {
            pool.close().await;
        }
    }

    // -- state probes -------------------------------------------------------

    /// Whether the cache exists (database present with expected structure).
    pub async fn exists(&self) -> Result<bool, CacheError> {
        if !self.db_path.exists() {
            return Ok(false);
        }
        let pool = self.db().await?;
        db::has_record_table(&pool).await
    }

    /// Head commit id recorded at the last cache refresh.
    pub async fn cached_head_commit(&self) -> Result<String, CacheError> {
        if !self.exists().await? {
            return Err(CacheError::NotInitialised(
                "head commit unavailable".into(),
            ));
        }
        let pool = self.db().await?;
        db::get_meta(&pool, "head_commit")
            .await?
            .ok_or_else(|| CacheError::NotInitialised("head commit unavailable".into()))
    }

    /// Source location recorded at the last cache refresh.
    pub async fn cached_source(&self) -> Result<GitLabSource, CacheError> {
        if !self.exists().await? {
            return Err(CacheError::NotInitialised("source unavailable".into()));
        }
        let pool = self.db().await?;
        let endpoint = db::get_meta(&pool, "source_endpoint").await?;
        let project = db::get_meta(&pool, "source_project").await?;
        let ref_name = db::get_meta(&pool, "source_ref").await?;
        match (endpoint, project, ref_name) {
            (Some(endpoint), Some(project), Some(ref_name)) => Ok(GitLabSource {
                endpoint,
                project,
                ref_name,
            }),
            _ => Err(CacheError::NotInitialised("source incomplete".into())),
        }
    }

    /// Whether the cache matches the configured source location.
    async fn applicable(&self) -> Result<bool, CacheError> {
        match self.cached_source().await {
            Ok(cached) => {
                debug!(target: "carta.cache", %cached, current = %self.source, "source check");
                Ok(cached == self.source)
            }
            Err(CacheError::NotInitialised(_)) => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// Head commit of the remote ref. Fails when frozen.
    async fn remote_head(&self) -> Result<String, CacheError> {
        if self.frozen {
            return Err(CacheError::Frozen(
                "cannot get remote head commit of a frozen cache".into(),
            ));
        }
        Ok(self.client.head_commit(&self.source.ref_name).await?)
    }

    /// Whether the cache is current against the remote.
    ///
    /// A frozen cache is always considered current.
    async fn current(&self) -> Result<bool, CacheError> {
        let cached = match self.cached_head_commit().await {
            Ok(cached) => cached,
            Err(CacheError::NotInitialised(_)) => return Ok(false),
            Err(error) => return Err(error),
        };
        let head = match self.remote_head().await {
            Ok(head) => head,
            Err(CacheError::Frozen(_)) => {
                debug!(target: "carta.cache", "frozen cache, ignoring current state");
                return Ok(true);
            }
            Err(error) => return Err(error),
        };
        debug!(target: "carta.cache", %cached, %head, "staleness check");
        Ok(cached == head)
    }

    // -- population ---------------------------------------------------------

    async fn fetch_files(&self, paths: Vec<String>) -> Result<Vec<RawRecord>, CacheError> {
        info!(target: "carta.cache", count = paths.len(), "fetching records");
        let client = self.client.clone();
        let ref_name = self.source.ref_name.clone();
        self.pool
            .try_run(paths, |path| {
                let client = client.clone();
                let ref_name = ref_name.clone();
                async move {
                    let file = client.get_file(&path, &ref_name).await?;
                    Ok::<_, CacheError>(RawRecord {
                        config_str: file.content,
                        commit_id: file.last_commit_id,
                    })
                }
            })
            .await
    }

    async fn fetch_all_records(&self) -> Result<Vec<RawRecord>, CacheError> {
        let paths: Vec<String> = self
            .client
            .list_tree_paths("records", &self.source.ref_name)
            .await?
            .into_iter()
            .filter(|path| path.ends_with(".json"))
            .collect();
        self.fetch_files(paths).await
    }

    /// Record paths changed between the cached and remote head commits.
    ///
    /// Renamed or deleted record files abort the refresh: a partial update
    /// cannot guarantee cache integrity across either.
    async fn fetch_changed_records(&self) -> Result<Vec<RawRecord>, CacheError> {
        let cached_head = self.cached_head_commit().await?;
        let remote_head = self.remote_head().await?;
        let commits = self
            .client
            .commits_in_range(&cached_head, &remote_head)
            .await?;
        if commits.len() > REFRESH_COMMIT_LIMIT {
            return Err(CacheError::TooOutdated);
        }

        info!(
            target: "carta.cache",
            range = format!("{cached_head}..{remote_head}"),
            commits = commits.len(),
            "fetching commits in range"
        );
        let mut paths: BTreeSet<String> = BTreeSet::new();
        for commit in &commits {
            for diff in self.client.commit_diff(&commit.id).await? {
                if !diff.new_path.starts_with(RECORDS_PREFIX)
                    || !diff.new_path.ends_with(".json")
                {
                    continue;
                }
                if diff.renamed_file {
                    return Err(CacheError::Integrity(
                        "renamed file in remote store".into(),
                    ));
                }
                if diff.deleted_file {
                    return Err(CacheError::Integrity(
                        "deleted file in remote store".into(),
                    ));
                }
                paths.insert(diff.new_path);
            }
        }
        self.fetch_files(paths.into_iter().collect()).await
    }

    /// Persist a set of records plus source metadata in a single transaction.
    async fn build(&self, records: Vec<RawRecord>, head_commit: &str) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.path)?;
        let pool = self.db().await?;
        db::init_schema(&pool).await?;

        info!(target: "carta.cache", count = records.len(), "processing records");
        let processed = self
            .pool
            .run(records, |raw| async move { process_raw(&raw) })
            .await;
        let mut keep: Vec<ProcessedRecord> = Vec::with_capacity(processed.len());
        for result in processed {
            match result {
                Ok(record) => keep.push(record),
                // One malformed record must not abort a site build.
                Err(error) => warn!(target: "carta.cache", %error, "skipping record"),
            }
        }

        let mut tx = pool.begin().await?;
        for record in &keep {
            db::upsert_record(&mut tx, &record.packed, &record.jsonb_text, &record.sha1).await?;
        }
        db::upsert_meta(&mut tx, "source_endpoint", &self.source.endpoint).await?;
        db::upsert_meta(&mut tx, "source_project", &self.source.project).await?;
        db::upsert_meta(&mut tx, "source_ref", &self.source.ref_name).await?;
        db::upsert_meta(&mut tx, "head_commit", head_commit).await?;
        tx.commit().await?;
        info!(target: "carta.cache", count = keep.len(), "stored records");

        self.flash.lock().await.clear();
        Ok(())
    }

    /// Recreate the cache from scratch.
    async fn create(&self) -> Result<(), CacheError> {
        self.purge_inner().await?;
        info!(target: "carta.cache", "fetching all records (this will take some time)");
        let records = self.fetch_all_records().await?;
        let head = self.remote_head().await?;
        self.build(records, &head).await
    }

    /// Update the cache with records changed in subsequent commits.
    async fn refresh(&self) -> Result<(), CacheError> {
        info!(target: "carta.cache", "fetching changed records");
        let records = match self.fetch_changed_records().await {
            Ok(records) => records,
            Err(CacheError::Integrity(reason)) => {
                warn!(
                    target: "carta.cache",
                    %reason,
                    "cannot refresh cache, recreating entire cache instead"
                );
                return self.create().await;
            }
            Err(CacheError::TooOutdated) => {
                warn!(
                    target: "carta.cache",
                    "refreshing the cache would take too long, recreating entire cache instead"
                );
                return self.create().await;
            }
            Err(error) => return Err(error),
        };
        info!(target: "carta.cache", count = records.len(), "records updated in remote");
        let head = self.remote_head().await?;
        self.build(records, &head).await
    }

    /// Ensure the cache exists, is applicable and is up to date.
    pub async fn ensure_exists(&self) -> Result<(), CacheError> {
        let online = self.client.is_online().await;
        let exists = self.exists().await?;

        if !online && !exists {
            return Err(CacheError::RemoteUnavailable(
                "local cache and GitLab unavailable, cannot load records".into(),
            ));
        }

        if online && !exists {
            if self.frozen {
                return Err(CacheError::Frozen(
                    "local cache unavailable and is frozen, cannot load records".into(),
                ));
            }
            info!(target: "carta.cache", "local cache not ready, creating from GitLab");
            return self.create().await;
        }

        if !online {
            if !self.applicable().await? {
                return Err(CacheError::RemoteUnavailable(
                    "local cache source does not match remote and cannot access GitLab to recreate"
                        .into(),
                ));
            }
            warn!(
                target: "carta.cache",
                "cannot check if records cache is current, loading possibly stale records"
            );
            return Ok(());
        }

        if !self.applicable().await? {
            if self.frozen {
                return Err(CacheError::Frozen(
                    "cached source does not match current instance and branch but is frozen"
                        .into(),
                ));
            }
            warn!(
                target: "carta.cache",
                current = %self.source,
                "cached source does not match current instance and branch, recreating cache"
            );
            return self.create().await;
        }

        if self.frozen {
            debug!(target: "carta.cache", "cache exists and is frozen");
            return Ok(());
        }

        if !self.current().await? {
            warn!(target: "carta.cache", "cached records are not up to date, updating from GitLab");
            return self.refresh().await;
        }

        info!(target: "carta.cache", "records cache exists and is current, no changes needed");
        Ok(())
    }

    // -- access -------------------------------------------------------------

    /// Load all or selected cached records.
    ///
    /// Unknown identifiers are silently omitted; the store layer provides
    /// all-or-nothing semantics.
    pub async fn get(
        &self,
        file_identifiers: Option<&BTreeSet<String>>,
    ) -> Result<Vec<RecordRevision>, CacheError> {
        self.ensure_exists().await?;

        if let Some(ids) = file_identifiers
            && !ids.is_empty()
        {
            let flash = self.flash.lock().await;
            if ids.iter().all(|id| flash.contains_key(id)) {
                info!(target: "carta.cache", count = ids.len(), "loading records from flash");
                return Ok(ids.iter().filter_map(|id| flash.get(id).cloned()).collect());
            }
        }

        let pool = self.db().await?;
        let packed = db::select_packed(&pool, file_identifiers).await?;
        info!(target: "carta.cache", count = packed.len(), "loading packed records from cache");
        let records = packed
            .iter()
            .map(|bytes| unpack(bytes))
            .collect::<Result<Vec<_>, _>>()?;

        let mut flash = self.flash.lock().await;
        for record in &records {
            flash.insert(record.file_identifier().to_owned(), record.clone());
        }
        Ok(records)
    }

    /// Content hashes for selected records.
    ///
    /// Maps every requested identifier, with `None` for unknown records; used
    /// to classify push batches into additions and updates.
    pub async fn get_hashes(
        &self,
        file_identifiers: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, Option<String>>, CacheError> {
        self.ensure_exists().await?;
        let pool = self.db().await?;
        let known = db::select_hashes(&pool, file_identifiers).await?;
        Ok(file_identifiers
            .iter()
            .map(|id| (id.clone(), known.get(id).cloned()))
            .collect())
    }

    /// Number of records held in the cache.
    pub async fn record_count(&self) -> Result<i64, CacheError> {
        let pool = self.db().await?;
        db::record_count(&pool).await
    }

    async fn purge_inner(&self) -> Result<(), CacheError> {
        self.close_db().await;
        if self.path.exists() {
            info!(target: "carta.cache", path = %self.path.display(), "purging cache");
            std::fs::remove_dir_all(&self.path)?;
        }
        self.flash.lock().await.clear();
        Ok(())
    }

    /// Clear cache contents, removing the cache directory.
    pub async fn purge(&self) -> Result<(), CacheError> {
        self.purge_inner().await
    }
}
