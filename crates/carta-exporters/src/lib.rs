// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! Static site exporters.
//!
//! Every exporter exposes a name plus `export` (write into the local site
//! tree) and `publish` (upload to the object store). Resource exporters act
//! per record; site exporters cover shared assets, pages, the index and the
//! public-website search sync. The coordinator fans resource jobs out over a
//! worker pool against a frozen store snapshot.

pub mod records;
pub mod site;
pub mod templates;
pub mod website;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use carta_admin::AdminError;
use carta_item::SiteMeta;
use carta_record::{IsoXmlError, RecordError, RecordRevision};
use carta_s3::{PublishError, S3Utils};
use carta_store::StoreError;

/// Errors raised by exporters.
#[derive(Debug, thiserror::Error)]
pub enum ExporterError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error(transparent)]
    Xml(#[from] IsoXmlError),

    #[error("template rendering failed: {0}")]
    Template(#[from] minijinja::Error),

    #[error("export io failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("website sync failed: {0}")]
    WebsiteSync(String),
}

/// Export-side metadata: where output lands locally and remotely.
#[derive(Clone, Debug)]
pub struct ExportMeta {
    /// Root of the local site output tree.
    pub export_path: PathBuf,
    /// Bucket the site publishes to.
    pub s3_bucket: String,
    /// Worker pool width for exporter fan-out.
    pub parallel_jobs: usize,
    /// Template-facing site metadata.
    pub site: SiteMeta,
    /// Whether item pages publish to secure hosting instead of S3.
    pub trusted: bool,
    pub trusted_host: Option<String>,
    pub trusted_path: Option<PathBuf>,
}

/// Contract for all exporters.
#[async_trait]
pub trait Exporter: Send + Sync {
    /// Exporter name, for logging.
    fn name(&self) -> &'static str;

    /// Write output into the local site tree.
    async fn export(&self) -> Result<(), ExporterError>;

    /// Upload output to the object store.
    async fn publish(&self) -> Result<(), ExporterError>;
}

/// Shared state for exporter workers.
///
/// The store is frozen for the duration of a run so every worker observes
/// the same snapshot; the S3 client and template engine are shared because
/// they are cheap to share and expensive to rebuild.
pub struct ExporterContext {
    pub meta: ExportMeta,
    pub s3: S3Utils,
    pub store: Arc<carta_store::GitLabStore>,
    pub codec: Arc<dyn carta_record::IsoXmlCodec>,
    pub templates: templates::TemplateEngine,
    /// Keys for unsealing administrative metadata, where configured.
    pub admin_keys: Option<carta_admin::AdministrationKeys>,
}

impl ExporterContext {
    /// Upload a resource file with record identity metadata.
    pub(crate) async fn upload_resource(
        &self,
        path: &Path,
        content_type: &str,
        body: Vec<u8>,
        record: &RecordRevision,
        redirect: Option<&str>,
    ) -> Result<(), ExporterError> {
        let key = self.s3.calc_key(path)?;
        let meta = HashMap::from([
            (
                "file_identifier".to_owned(),
                record.file_identifier().to_owned(),
            ),
            ("file_revision".to_owned(), record.file_revision.clone()),
        ]);
        self.s3
            .upload_content(&key, content_type, body, Some(&meta), redirect)
            .await?;
        Ok(())
    }
}

/// Write a file, creating parent directories as needed.
pub(crate) fn write_file(path: &Path, contents: &str) -> Result<(), ExporterError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    tracing::debug!(target: "carta.exporters", path = %path.display(), "writing file");
    std::fs::write(path, contents)?;
    Ok(())
}

/// Body of an alias redirect page.
///
/// A meta refresh with an S3 object redirect set on publish; the page body is
/// a fallback for local serving.
pub fn dumps_redirect(target: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en-GB\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta http-equiv=\"refresh\" content=\"0;url={target}\">\n\
         <title>Redirecting</title>\n</head>\n<body>\n\
         <p>Redirecting to <a href=\"{target}\">{target}</a>.</p>\n</body>\n</html>\n"
    )
}
