// SPDX-License-Identifier: MIT OR Apache-2.0
//! Non-interactive publishing workflow.
//!
//! Imports record files from a directory, commits genuine changes to the
//! store on a changeset branch, publishes affected site resources and
//! optionally notifies a webhook. Exits 0 on success and 1 when a supplied
//! record fails validation.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use serde_json::json;
use tracing::{info, warn};

use carta_config::Config;
use carta_exporters::Exporter;
use carta_exporters::records::RecordsExporter;
use carta_record::{Record, config_supported, validate_catalogue_record};
use carta_store::{CommitResults, GitLabStore, StoreError};

/// Workflow inputs.
#[derive(Clone, Debug)]
pub struct WorkflowArgs {
    pub path: PathBuf,
    pub changeset_base: String,
    pub changeset_title: String,
    pub changeset_message: String,
    pub commit_title: String,
    pub commit_message: String,
    pub author_name: String,
    pub author_email: String,
    pub webhook: Option<String>,
}

/// Raised when a supplied record fails validation; maps to exit code 1.
#[derive(Debug, thiserror::Error)]
#[error("record validation failed: {0}")]
pub struct RecordValidationFailed(pub String);

fn validate_changeset_base(changeset_base: &str) -> Result<()> {
    let valid = !changeset_base.starts_with('-')
        && !changeset_base.is_empty()
        && changeset_base
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !valid {
        bail!("changeset base must be alphanumeric with hyphens and not start with a hyphen");
    }
    Ok(())
}

/// Load, parse and validate record files from the import directory.
fn parse_records(search_path: &Path) -> Result<Vec<(PathBuf, Record)>> {
    let mut records = Vec::new();
    let entries = std::fs::read_dir(search_path)
        .with_context(|| format!("reading import directory {}", search_path.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let raw = std::fs::read_to_string(&path)?;
        let config: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", path.display()))?;

        let record = match Record::loads(&config) {
            Ok(record) => record,
            Err(error) => return Err(RecordValidationFailed(error.to_string()).into()),
        };
        if let Err(error) = validate_catalogue_record(&record, true, None) {
            return Err(RecordValidationFailed(error.to_string()).into());
        }
        if let Ok(false) = config_supported(&config) {
            warn!(
                target: "carta.workflow",
                path = %path.display(),
                "record contains unsupported content the catalogue will ignore"
            );
        }
        records.push((path, record));
    }
    info!(target: "carta.workflow", count = records.len(), "discovered valid records");
    Ok(records)
}

/// Drop records identical to their stored versions.
async fn filter_records(
    store: &GitLabStore,
    records: Vec<(PathBuf, Record)>,
) -> Result<Vec<(PathBuf, Record)>> {
    let mut changed = Vec::new();
    for (path, record) in records {
        let Some(file_identifier) = record.file_identifier.clone() else {
            continue;
        };
        match store.select_one(&file_identifier).await {
            Ok(existing) if existing.record.dumps(false) == record.dumps(false) => {
                info!(
                    target: "carta.workflow",
                    %file_identifier,
                    "record is the same as stored version, skipping"
                );
            }
            Ok(_) | Err(StoreError::RecordNotFound(_)) => changed.push((path, record)),
            Err(error) => return Err(error.into()),
        }
    }
    Ok(changed)
}

/// Remove imported record files included in a commit.
fn clean_input_records(records: &[(PathBuf, Record)], results: &CommitResults) {
    let committed: Vec<&str> = results
        .new_identifiers
        .iter()
        .chain(results.updated_identifiers.iter())
        .map(String::as_str)
        .collect();
    for (path, record) in records {
        let Some(file_identifier) = record.file_identifier.as_deref() else {
            continue;
        };
        if committed.contains(&file_identifier) {
            info!(target: "carta.workflow", path = %path.display(), "cleaning imported record");
            let _ = std::fs::remove_file(path);
        }
    }
}

async fn notify_webhook(
    config: &Config,
    results: &CommitResults,
    changeset_url: &str,
    webhook_url: &str,
) -> Result<()> {
    info!(target: "carta.workflow", url = webhook_url, "sending webhook");
    let payload = json!({
        "commit": {
            "commit": results.commit,
            "new_identifiers": results.new_identifiers,
            "updated_identifiers": results.updated_identifiers,
            "url": format!(
                "{}/-/commit/{}",
                config.templates_item_versions_endpoint,
                results.commit.as_deref().unwrap_or_default()
            ),
        },
        "merge_request": {"url": changeset_url},
    });
    let response = reqwest::Client::new()
        .post(webhook_url)
        .json(&payload)
        .timeout(std::time::Duration::from_secs(30))
        .send()
        .await
        .context("sending webhook")?;
    response.error_for_status().context("webhook response")?;
    Ok(())
}

/// Run the workflow end to end.
pub async fn run(config: &Config, args: &WorkflowArgs) -> Result<()> {
    validate_changeset_base(&args.changeset_base)?;
    if !args.path.is_dir() {
        bail!("import path must be a directory");
    }

    let store = crate::context::build_store(config, Some(&args.changeset_base), false);

    info!(target: "carta.workflow", path = %args.path.display(), "importing records");
    let records = parse_records(&args.path)?;
    let records = filter_records(&store, records).await?;
    if records.is_empty() {
        info!(target: "carta.workflow", "no new or updated records to commit, exiting");
        return Ok(());
    }

    let results = store
        .push(
            records.iter().map(|(_, record)| record.clone()).collect(),
            &args.commit_title,
            &args.commit_message,
            (&args.author_name, &args.author_email),
        )
        .await?;
    clean_input_records(&records, &results);

    let affected: BTreeSet<String> = results
        .new_identifiers
        .iter()
        .chain(results.updated_identifiers.iter())
        .cloned()
        .collect();
    if affected.is_empty() {
        info!(target: "carta.workflow", "no records committed, exiting");
        return Ok(());
    }
    info!(target: "carta.workflow", count = affected.len(), "records imported");

    let changeset = store.open_changeset(&args.changeset_title).await?;
    let changeset_url = changeset.web_url.unwrap_or_default();
    info!(target: "carta.workflow", url = %changeset_url, "changeset open");

    // Publish affected records against a frozen snapshot of the new state.
    let ctx = crate::context::build_exporter_context(config, Some(&args.changeset_base)).await?;
    RecordsExporter::new(ctx, Some(affected.clone()))
        .publish()
        .await?;
    info!(target: "carta.workflow", "records published:");
    for identifier in &affected {
        info!(target: "carta.workflow", "* https://{}/items/{identifier}", config.aws_s3_bucket);
    }

    if let Some(webhook_url) = &args.webhook {
        notify_webhook(config, &results, &changeset_url, webhook_url).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changeset_base_validation() {
        assert!(validate_changeset_base("import-2025-07").is_ok());
        assert!(validate_changeset_base("-leading-hyphen").is_err());
        assert!(validate_changeset_base("no/slashes").is_err());
        assert!(validate_changeset_base("").is_err());
    }

    #[test]
    fn parse_records_rejects_invalid_record() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("bad.json"),
            serde_json::json!({
                "file_identifier": "not-a-uuid",
                "hierarchy_level": "product",
                "metadata": {
                    "contacts": [{"organisation": {"name": "x"}, "role": ["pointOfContact"]}],
                    "date_stamp": "2014-06-30",
                },
                "identification": {
                    "title": {"value": "x"},
                    "dates": {"creation": "2014-06-30"},
                    "abstract": "x",
                },
            })
            .to_string(),
        )
        .unwrap();

        let error = parse_records(dir.path()).unwrap_err();
        assert!(error.downcast_ref::<RecordValidationFailed>().is_some());
    }

    #[test]
    fn parse_records_ignores_non_json_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a record").unwrap();
        let records = parse_records(dir.path()).unwrap();
        assert!(records.is_empty());
    }
}
