// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! Record store: GitLab remote accessed through the local cache.
//!
//! The store is the only component that reads and writes records. Reads are
//! all-or-nothing selections against the cache; writes classify supplied
//! records into additions, updates and no-ops by content hash and land as a
//! single atomic remote commit, after which the cache is refreshed.

use std::collections::BTreeSet;

use tracing::{debug, info};

use carta_cache::{CacheError, LocalCache};
use carta_gitlab::{
    CommitAction, CommitActionType, GitLabClient, GitLabError, GitLabSource, MergeRequest,
};
use carta_record::{Record, RecordError, RecordRevision, validate_catalogue_record};

/// Branch new publishing refs are created from.
const DEFAULT_BRANCH: &str = "main";

/// Title prefix for automated publishing merge requests.
pub const CHANGESET_TITLE_PREFIX: &str = "Automated publishing changeset: ";

/// Errors raised by the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A requested record is not present in the store.
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// Requested records are not present in the store.
    #[error("records not found: {}", .0.iter().cloned().collect::<Vec<_>>().join(", "))]
    RecordsNotFound(BTreeSet<String>),

    /// A mutation was attempted on a frozen store.
    #[error("store frozen: {0}")]
    Frozen(String),

    /// A supplied record failed validation; fatal for the whole push.
    #[error(transparent)]
    RecordInvalid(#[from] RecordError),

    /// Cache failure.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Remote failure.
    #[error(transparent)]
    GitLab(#[from] GitLabError),
}

/// Outcome of a push: resulting commit and the identifier partitioning.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitResults {
    /// Created commit id; `None` when nothing needed committing.
    pub commit: Option<String>,
    pub new_identifiers: Vec<String>,
    pub updated_identifiers: Vec<String>,
}

/// Repository path for a record file, sharded by identifier prefix.
pub fn record_path(file_identifier: &str) -> String {
    let prefix = file_identifier.get(0..2).unwrap_or("00");
    let shard = file_identifier.get(2..4).unwrap_or("00");
    format!("records/{prefix}/{shard}/{file_identifier}.json")
}

/// GitLab-backed record store accessed through a local cache.
///
/// Supports freezing: a frozen store never contacts the remote and refuses
/// mutations, giving parallel exporter workers a stable snapshot.
pub struct GitLabStore {
    client: GitLabClient,
    source: GitLabSource,
    cache: LocalCache,
    frozen: bool,
}

impl GitLabStore {
    pub fn new(
        client: GitLabClient,
        source: GitLabSource,
        cache: LocalCache,
        frozen: bool,
    ) -> Self {
        Self {
            client,
            source,
            cache,
            frozen,
        }
    }

    /// Whether the store can be modified.
    pub fn frozen(&self) -> bool {
        self.frozen
    }

    /// Cached head commit, if the cache is initialised.
    pub async fn head_commit(&self) -> Option<String> {
        self.cache.cached_head_commit().await.ok()
    }

    /// Get some or all records filtered by file identifier.
    ///
    /// All-or-nothing: unknown identifiers in the requested set raise
    /// [`StoreError::RecordsNotFound`].
    pub async fn select(
        &self,
        file_identifiers: Option<&BTreeSet<String>>,
    ) -> Result<Vec<RecordRevision>, StoreError> {
        let results = self.cache.get(file_identifiers).await?;
        let Some(requested) = file_identifiers else {
            return Ok(results);
        };
        if results.len() == requested.len() {
            return Ok(results);
        }
        let found: BTreeSet<String> = results
            .iter()
            .map(|record| record.file_identifier().to_owned())
            .collect();
        let missing: BTreeSet<String> = requested.difference(&found).cloned().collect();
        Err(StoreError::RecordsNotFound(missing))
    }

    /// Get a specific record by file identifier.
    pub async fn select_one(&self, file_identifier: &str) -> Result<RecordRevision, StoreError> {
        let requested: BTreeSet<String> = [file_identifier.to_owned()].into();
        match self.select(Some(&requested)).await {
            Ok(mut records) => records
                .pop()
                .ok_or_else(|| StoreError::RecordNotFound(file_identifier.to_owned())),
            Err(StoreError::RecordsNotFound(_)) => {
                Err(StoreError::RecordNotFound(file_identifier.to_owned()))
            }
            Err(error) => Err(error),
        }
    }

    /// Ensure the configured ref exists, creating it from `main` if missing.
    async fn ensure_branch(&self) -> Result<(), StoreError> {
        if self.client.branch_exists(&self.source.ref_name).await? {
            return Ok(());
        }
        if self.frozen {
            return Err(StoreError::Frozen(format!(
                "branch '{}' does not exist and store is frozen, cannot create",
                self.source.ref_name
            )));
        }
        debug!(
            target: "carta.store",
            branch = %self.source.ref_name,
            from = DEFAULT_BRANCH,
            "creating missing branch"
        );
        self.client
            .create_branch(&self.source.ref_name, DEFAULT_BRANCH)
            .await?;
        Ok(())
    }

    /// Add or update records in the remote repository.
    ///
    /// Records are classified against cached content hashes: unchanged
    /// records are skipped, changed records become updates and unknown
    /// records become additions. The commit is atomic on the remote side;
    /// on success the cache is refreshed.
    pub async fn push(
        &self,
        records: Vec<Record>,
        title: &str,
        message: &str,
        author: (&str, &str),
    ) -> Result<CommitResults, StoreError> {
        if self.frozen {
            return Err(StoreError::Frozen(
                "store is frozen, cannot push records".into(),
            ));
        }

        for record in &records {
            validate_catalogue_record(record, true, None)?;
        }

        self.ensure_branch().await?;

        let identifiers: BTreeSet<String> = records
            .iter()
            .filter_map(|record| record.file_identifier.clone())
            .collect();
        let hashes = self.cache.get_hashes(&identifiers).await?;

        let mut actions: Vec<CommitAction> = Vec::new();
        let mut results = CommitResults::default();
        for record in &records {
            let Some(file_identifier) = record.file_identifier.as_deref() else {
                continue;
            };
            let action = match hashes.get(file_identifier).and_then(Clone::clone) {
                Some(cached) if cached == record.sha1() => {
                    debug!(target: "carta.store", %file_identifier, "record unchanged, skipping");
                    continue;
                }
                Some(_) => {
                    results
                        .updated_identifiers
                        .push(file_identifier.to_owned());
                    CommitActionType::Update
                }
                None => {
                    results.new_identifiers.push(file_identifier.to_owned());
                    CommitActionType::Create
                }
            };
            actions.push(CommitAction {
                action,
                file_path: record_path(file_identifier),
                content: record.dumps_json(false),
            });
        }

        if actions.is_empty() {
            info!(target: "carta.store", "no new or updated records, nothing to push");
            return Ok(results);
        }

        let commit_message = format!("{title}\n\n{message}");
        let commit = self
            .client
            .commit(&self.source.ref_name, &commit_message, author, &actions)
            .await?;
        info!(
            target: "carta.store",
            commit = %commit.id,
            new = results.new_identifiers.len(),
            updated = results.updated_identifiers.len(),
            "pushed records"
        );
        results.commit = Some(commit.id);

        // New head commit upstream; bring the cache back in line.
        self.cache.ensure_exists().await?;
        Ok(results)
    }

    /// Open a merge request tying publishing commits together.
    ///
    /// An existing open changeset for the configured ref is reused.
    pub async fn open_changeset(&self, title: &str) -> Result<MergeRequest, StoreError> {
        if self.frozen {
            return Err(StoreError::Frozen(
                "store is frozen, cannot open changeset".into(),
            ));
        }
        if let Some(existing) = self
            .client
            .list_merge_requests(&self.source.ref_name)
            .await?
            .into_iter()
            .next()
        {
            info!(target: "carta.store", iid = existing.iid, "changeset already open");
            return Ok(existing);
        }
        let title = format!("{CHANGESET_TITLE_PREFIX}{title}");
        Ok(self
            .client
            .open_merge_request(&self.source.ref_name, DEFAULT_BRANCH, &title)
            .await?)
    }

    /// Clear the underlying cache.
    pub async fn purge(&self) -> Result<(), StoreError> {
        if self.frozen {
            return Err(StoreError::Frozen(
                "store is frozen, cannot purge cache".into(),
            ));
        }
        Ok(self.cache.purge().await?)
    }
}

#[cfg(test)]
mod tests;
