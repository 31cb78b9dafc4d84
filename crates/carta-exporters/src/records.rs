// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-record resource exporters and their coordinator.
//!
//! Each record yields five outputs: the item HTML page, alias redirects, the
//! canonical JSON form, ISO XML and the stylesheeted XML flavour. The
//! coordinator fans records × exporters out over the worker pool.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use carta_admin::get_admin;
use carta_item::ItemCatalogue;
use carta_pool::WorkerPool;
use carta_record::{CATALOGUE_NAMESPACE, RecordRevision, record_aliases};
use carta_store::StoreError;

use crate::templates::ITEM_TEMPLATE;
use crate::{Exporter, ExporterContext, ExporterError, dumps_redirect, write_file};

/// Stylesheet processing instruction prepended to HTML-flavoured XML.
const XSL_STYLESHEET_PI: &str =
    "<?xml-stylesheet type=\"text/xsl\" href=\"/static/xsl/iso-html/xml-to-html-ISO.xsl\"?>";

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Canonical JSON export of a record.
pub struct JsonExporter {
    ctx: Arc<ExporterContext>,
    record: RecordRevision,
}

impl JsonExporter {
    pub fn new(ctx: Arc<ExporterContext>, record: RecordRevision) -> Self {
        Self { ctx, record }
    }

    fn path(&self) -> PathBuf {
        self.ctx
            .meta
            .export_path
            .join("records")
            .join(format!("{}.json", self.record.file_identifier()))
    }

    /// Canonical JSON with administrative metadata stripped.
    pub fn dumps(&self) -> String {
        self.record.record.dumps_json(true)
    }
}

#[async_trait]
impl Exporter for JsonExporter {
    fn name(&self) -> &'static str {
        "Record JSON"
    }

    async fn export(&self) -> Result<(), ExporterError> {
        write_file(&self.path(), &self.dumps())
    }

    async fn publish(&self) -> Result<(), ExporterError> {
        self.ctx
            .upload_resource(
                &self.path(),
                "application/json",
                self.dumps().into_bytes(),
                &self.record,
                None,
            )
            .await
    }
}

// ---------------------------------------------------------------------------
// ISO XML
// ---------------------------------------------------------------------------

/// ISO 19115 XML export, delegated to the external codec.
pub struct IsoXmlExporter {
    ctx: Arc<ExporterContext>,
    record: RecordRevision,
}

impl IsoXmlExporter {
    pub fn new(ctx: Arc<ExporterContext>, record: RecordRevision) -> Self {
        Self { ctx, record }
    }

    fn path(&self) -> PathBuf {
        self.ctx
            .meta
            .export_path
            .join("records")
            .join(format!("{}.xml", self.record.file_identifier()))
    }

    pub fn dumps(&self) -> Result<String, ExporterError> {
        Ok(self.record.record.dumps_xml(self.ctx.codec.as_ref(), true)?)
    }
}

#[async_trait]
impl Exporter for IsoXmlExporter {
    fn name(&self) -> &'static str {
        "Record ISO XML"
    }

    async fn export(&self) -> Result<(), ExporterError> {
        write_file(&self.path(), &self.dumps()?)
    }

    async fn publish(&self) -> Result<(), ExporterError> {
        self.ctx
            .upload_resource(
                &self.path(),
                "text/xml",
                self.dumps()?.into_bytes(),
                &self.record,
                None,
            )
            .await
    }
}

// ---------------------------------------------------------------------------
// ISO XML (HTML flavour)
// ---------------------------------------------------------------------------

/// Stylesheeted ISO XML, served as the record's HTML flavour.
pub struct IsoXmlHtmlExporter {
    ctx: Arc<ExporterContext>,
    record: RecordRevision,
}

impl IsoXmlHtmlExporter {
    pub fn new(ctx: Arc<ExporterContext>, record: RecordRevision) -> Self {
        Self { ctx, record }
    }

    fn path(&self) -> PathBuf {
        self.ctx
            .meta
            .export_path
            .join("records")
            .join(format!("{}.html", self.record.file_identifier()))
    }

    /// The record's ISO XML with a stylesheet processing instruction after
    /// the XML declaration.
    pub fn dumps(&self) -> Result<String, ExporterError> {
        let xml = self.record.record.dumps_xml(self.ctx.codec.as_ref(), true)?;
        if let Some(declaration_end) = xml.find("?>") {
            let (declaration, body) = xml.split_at(declaration_end + 2);
            Ok(format!("{declaration}\n{XSL_STYLESHEET_PI}{body}"))
        } else {
            Ok(format!("{XSL_STYLESHEET_PI}\n{xml}"))
        }
    }
}

#[async_trait]
impl Exporter for IsoXmlHtmlExporter {
    fn name(&self) -> &'static str {
        "Record ISO XML HTML"
    }

    async fn export(&self) -> Result<(), ExporterError> {
        write_file(&self.path(), &self.dumps()?)
    }

    async fn publish(&self) -> Result<(), ExporterError> {
        self.ctx
            .upload_resource(
                &self.path(),
                "text/html",
                self.dumps()?.into_bytes(),
                &self.record,
                None,
            )
            .await
    }
}

// ---------------------------------------------------------------------------
// Item HTML
// ---------------------------------------------------------------------------

/// Item page export: the primary human-readable view of a record.
///
/// Supports trusted publishing to secure hosting via rsync.
pub struct HtmlExporter {
    ctx: Arc<ExporterContext>,
    record: RecordRevision,
}

impl HtmlExporter {
    pub fn new(ctx: Arc<ExporterContext>, record: RecordRevision) -> Self {
        Self { ctx, record }
    }

    fn path(&self) -> PathBuf {
        self.ctx
            .meta
            .export_path
            .join("items")
            .join(self.record.file_identifier())
            .join("index.html")
    }

    /// Fetch records referenced by aggregations from the store snapshot.
    ///
    /// Missing relations are omitted; a dangling cross-reference must not
    /// fail the page.
    async fn related(&self) -> Result<BTreeMap<String, RecordRevision>, ExporterError> {
        let mut related = BTreeMap::new();
        let exclude = [self.record.file_identifier()];
        for identifier in self
            .record
            .record
            .identification
            .aggregations
            .identifiers(&exclude)
        {
            match self.ctx.store.select_one(&identifier).await {
                Ok(record) => {
                    related.insert(identifier, record);
                }
                Err(StoreError::RecordNotFound(_)) => {
                    warn!(target: "carta.exporters", %identifier, "related record not found");
                }
                Err(error) => return Err(error.into()),
            }
        }
        Ok(related)
    }

    pub async fn dumps(&self) -> Result<String, ExporterError> {
        let admin = match &self.ctx.admin_keys {
            Some(keys) => match get_admin(keys, &self.record.record) {
                Ok(admin) => admin,
                // Broken admin metadata must not fail the record's page.
                Err(error) => {
                    warn!(target: "carta.exporters", %error, "unreadable admin metadata");
                    None
                }
            },
            None => None,
        };

        let related = self.related().await?;
        let mut site = self.ctx.meta.site.clone();
        site.html_title = self.record.record.identification.title().to_owned();
        let item = ItemCatalogue::new(&site, &self.record, admin.as_ref(), &related);

        self.ctx.templates.render(
            ITEM_TEMPLATE,
            minijinja::context! { item => item, meta => site },
        )
    }

    /// Publish to secure hosting via rsync.
    ///
    /// Files get group-writable permissions (0660/0770) so the hosting team
    /// can manage uploads.
    async fn publish_trusted(&self) -> Result<(), ExporterError> {
        use std::os::unix::fs::PermissionsExt;

        let staging = tempfile::tempdir()?;
        let item_path = staging
            .path()
            .join("items")
            .join(self.record.file_identifier())
            .join("index.html");
        write_file(&item_path, &self.dumps().await?)?;
        if let Some(parent) = item_path.parent() {
            std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o770))?;
        }
        std::fs::set_permissions(&item_path, std::fs::Permissions::from_mode(0o660))?;

        let environment = if self.ctx.meta.s3_bucket.contains("testing") {
            "testing"
        } else {
            "live"
        };
        let target = self
            .ctx
            .meta
            .trusted_path
            .clone()
            .unwrap_or_default()
            .join(environment)
            .join("items");
        carta_s3::RsyncUtils
            .put(
                &staging.path().join("items"),
                &target,
                self.ctx.meta.trusted_host.as_deref(),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Exporter for HtmlExporter {
    fn name(&self) -> &'static str {
        "Item HTML"
    }

    async fn export(&self) -> Result<(), ExporterError> {
        write_file(&self.path(), &self.dumps().await?)
    }

    async fn publish(&self) -> Result<(), ExporterError> {
        if self.ctx.meta.trusted {
            return self.publish_trusted().await;
        }
        let body = self.dumps().await?;
        self.ctx
            .upload_resource(&self.path(), "text/html", body.into_bytes(), &self.record, None)
            .await
    }
}

// ---------------------------------------------------------------------------
// Aliases
// ---------------------------------------------------------------------------

/// Alias redirect export: one page per alias identifier.
pub struct HtmlAliasesExporter {
    ctx: Arc<ExporterContext>,
    record: RecordRevision,
}

impl HtmlAliasesExporter {
    pub fn new(ctx: Arc<ExporterContext>, record: RecordRevision) -> Self {
        Self { ctx, record }
    }

    /// Alias paths relative to the site root.
    fn aliases(&self) -> Vec<String> {
        record_aliases(&self.record.record)
            .iter()
            .filter_map(|identifier| identifier.href.as_deref())
            .map(|href| {
                href.replace(&format!("https://{CATALOGUE_NAMESPACE}/"), "")
                    .trim_matches('/')
                    .to_owned()
            })
            .collect()
    }

    /// Redirect location: the item's canonical page.
    pub fn target(&self) -> String {
        format!("/items/{}/", self.record.file_identifier())
    }

    pub fn dumps(&self) -> String {
        dumps_redirect(&self.target())
    }
}

#[async_trait]
impl Exporter for HtmlAliasesExporter {
    fn name(&self) -> &'static str {
        "Item Aliases"
    }

    async fn export(&self) -> Result<(), ExporterError> {
        for alias in self.aliases() {
            let path = self
                .ctx
                .meta
                .export_path
                .join(&alias)
                .join("index.html");
            write_file(&path, &self.dumps())?;
        }
        Ok(())
    }

    async fn publish(&self) -> Result<(), ExporterError> {
        let location = format!("{}index.html", self.target());
        for alias in self.aliases() {
            let path = self
                .ctx
                .meta
                .export_path
                .join(&alias)
                .join("index.html");
            self.ctx
                .upload_resource(
                    &path,
                    "text/html",
                    self.dumps().into_bytes(),
                    &self.record,
                    Some(&location),
                )
                .await?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Exporter action selected by the coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobMethod {
    Export,
    Publish,
}

/// Resource exporter formats in dispatch order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ResourceFormat {
    ItemHtml,
    Aliases,
    Json,
    IsoXml,
    IsoXmlHtml,
}

const RESOURCE_FORMATS: &[ResourceFormat] = &[
    ResourceFormat::ItemHtml,
    ResourceFormat::Aliases,
    ResourceFormat::Json,
    ResourceFormat::IsoXml,
    ResourceFormat::IsoXmlHtml,
];

async fn run_job(
    ctx: Arc<ExporterContext>,
    record: RecordRevision,
    format: ResourceFormat,
    method: JobMethod,
) -> Result<(), ExporterError> {
    let exporter: Box<dyn Exporter> = match format {
        ResourceFormat::ItemHtml => Box::new(HtmlExporter::new(Arc::clone(&ctx), record)),
        ResourceFormat::Aliases => Box::new(HtmlAliasesExporter::new(Arc::clone(&ctx), record)),
        ResourceFormat::Json => Box::new(JsonExporter::new(Arc::clone(&ctx), record)),
        ResourceFormat::IsoXml => Box::new(IsoXmlExporter::new(Arc::clone(&ctx), record)),
        ResourceFormat::IsoXmlHtml => Box::new(IsoXmlHtmlExporter::new(Arc::clone(&ctx), record)),
    };
    match method {
        JobMethod::Export => exporter.export().await,
        JobMethod::Publish => exporter.publish().await,
    }
}

/// Coordinates exporting/publishing selected records across all resource
/// exporters using a worker pool.
pub struct RecordsExporter {
    ctx: Arc<ExporterContext>,
    selected: Option<BTreeSet<String>>,
}

impl RecordsExporter {
    pub fn new(ctx: Arc<ExporterContext>, selected: Option<BTreeSet<String>>) -> Self {
        Self { ctx, selected }
    }

    async fn run(&self, method: JobMethod) -> Result<(), ExporterError> {
        let records = self.ctx.store.select(self.selected.as_ref()).await?;
        let jobs: Vec<(RecordRevision, ResourceFormat)> = records
            .into_iter()
            .flat_map(|record| {
                RESOURCE_FORMATS
                    .iter()
                    .map(move |format| (record.clone(), *format))
            })
            .collect();
        info!(
            target: "carta.exporters",
            jobs = jobs.len(),
            ?method,
            "dispatching record exporter jobs"
        );

        let pool = WorkerPool::new(self.ctx.meta.parallel_jobs);
        let ctx = Arc::clone(&self.ctx);
        pool.try_run(jobs, |(record, format)| {
            let ctx = Arc::clone(&ctx);
            async move { run_job(ctx, record, format, method).await }
        })
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Exporter for RecordsExporter {
    fn name(&self) -> &'static str {
        "Records"
    }

    async fn export(&self) -> Result<(), ExporterError> {
        self.run(JobMethod::Export).await
    }

    async fn publish(&self) -> Result<(), ExporterError> {
        self.run(JobMethod::Publish).await
    }
}
