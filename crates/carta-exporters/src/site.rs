// SPDX-License-Identifier: MIT OR Apache-2.0
//! Site-level exporters: static resources, pages, the index and the combined
//! site exporter.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use carta_record::{CATALOGUE_NAMESPACE, RecordRevision, record_aliases};

use crate::records::RecordsExporter;
use crate::templates::{FORMATTING_TEMPLATE, LEGAL_TEMPLATES, NOT_FOUND_TEMPLATE};
use crate::{Exporter, ExporterContext, ExporterError, write_file};

/// Embedded static resource files, keyed by site-relative path.
const STATIC_RESOURCES: &[(&str, &[u8])] = &[
    ("static/css/main.css", include_bytes!("../resources/css/main.css")),
    (
        "static/fonts/fonts.css",
        include_bytes!("../resources/fonts/fonts.css"),
    ),
    (
        "static/txt/heartbeat.txt",
        include_bytes!("../resources/txt/heartbeat.txt"),
    ),
    (
        "static/txt/robots.txt",
        include_bytes!("../resources/txt/robots.txt"),
    ),
    (
        "static/xsl/iso-html/xml-to-html-ISO.xsl",
        include_bytes!("../resources/xsl/iso-html/xml-to-html-ISO.xsl"),
    ),
];

/// Favicon served from the site root.
const FAVICON: &[u8] = include_bytes!("../resources/img/favicon.ico");

// ---------------------------------------------------------------------------
// Static resources
// ---------------------------------------------------------------------------

/// Static site resources: CSS, fonts, favicon, text files, XSL stylesheets.
///
/// Copy-if-absent semantics: assets never change within a deployment, so
/// existing files and object keys are left alone.
pub struct SiteResourcesExporter {
    ctx: Arc<ExporterContext>,
}

impl SiteResourcesExporter {
    pub fn new(ctx: Arc<ExporterContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Exporter for SiteResourcesExporter {
    fn name(&self) -> &'static str {
        "Site Resources"
    }

    async fn export(&self) -> Result<(), ExporterError> {
        for (relative, contents) in STATIC_RESOURCES {
            let path = self.ctx.meta.export_path.join(relative);
            if path.exists() {
                continue;
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, contents)?;
        }
        let favicon = self.ctx.meta.export_path.join("favicon.ico");
        if !favicon.exists() {
            if let Some(parent) = favicon.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&favicon, FAVICON)?;
        }
        Ok(())
    }

    async fn publish(&self) -> Result<(), ExporterError> {
        for (relative, contents) in STATIC_RESOURCES {
            if self.ctx.s3.object_exists(relative).await? {
                continue;
            }
            let content_type = carta_s3::guess_content_type(relative);
            self.ctx
                .s3
                .upload_content(relative, &content_type, contents.to_vec(), None, None)
                .await?;
        }
        self.ctx
            .s3
            .upload_content("favicon.ico", "image/x-icon", FAVICON.to_vec(), None, None)
            .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Site pages
// ---------------------------------------------------------------------------

/// Legal pages and the 404 handler, rendered from fixture templates.
pub struct SitePagesExporter {
    ctx: Arc<ExporterContext>,
}

impl SitePagesExporter {
    pub fn new(ctx: Arc<ExporterContext>) -> Self {
        Self { ctx }
    }

    fn page_title(template: &str) -> &'static str {
        match template {
            "404.html.j2" => "Not Found",
            "formatting.html.j2" => "Formatting Reference",
            "legal/accessibility.html.j2" => "Accessibility Statement",
            "legal/cookies.html.j2" => "Cookies Policy",
            "legal/copyright.html.j2" => "Copyright Policy",
            "legal/privacy.html.j2" => "Privacy Policy",
            _ => "BAS Data Catalogue",
        }
    }

    fn page_path(&self, template: &str) -> PathBuf {
        if template == NOT_FOUND_TEMPLATE {
            return self.ctx.meta.export_path.join("404.html");
        }
        if template == FORMATTING_TEMPLATE {
            return self
                .ctx
                .meta
                .export_path
                .join("-")
                .join("formatting")
                .join("index.html");
        }
        let stem = template.trim_end_matches(".html.j2");
        self.ctx.meta.export_path.join(stem).join("index.html")
    }

    fn dumps(&self, template: &str) -> Result<String, ExporterError> {
        let mut site = self.ctx.meta.site.clone();
        site.html_title = Self::page_title(template).to_owned();
        self.ctx
            .templates
            .render(template, minijinja::context! { meta => site })
    }

    fn templates(&self) -> Vec<&'static str> {
        let mut templates = vec![NOT_FOUND_TEMPLATE, FORMATTING_TEMPLATE];
        templates.extend(LEGAL_TEMPLATES);
        templates
    }
}

#[async_trait]
impl Exporter for SitePagesExporter {
    fn name(&self) -> &'static str {
        "Site Pages"
    }

    async fn export(&self) -> Result<(), ExporterError> {
        for template in self.templates() {
            write_file(&self.page_path(template), &self.dumps(template)?)?;
        }
        Ok(())
    }

    async fn publish(&self) -> Result<(), ExporterError> {
        for template in self.templates() {
            let key = self.ctx.s3.calc_key(&self.page_path(template))?;
            self.ctx
                .s3
                .upload_content(
                    &key,
                    "text/html",
                    self.dumps(template)?.into_bytes(),
                    None,
                    None,
                )
                .await?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Site index
// ---------------------------------------------------------------------------

/// Basic listing of records and aliases.
///
/// Intended for internal use only and unstyled.
pub struct SiteIndexExporter {
    ctx: Arc<ExporterContext>,
}

impl SiteIndexExporter {
    pub fn new(ctx: Arc<ExporterContext>) -> Self {
        Self { ctx }
    }

    fn path(&self) -> PathBuf {
        self.ctx
            .meta
            .export_path
            .join("-")
            .join("index")
            .join("index.html")
    }

    fn record_rows(records: &[RecordRevision]) -> String {
        records
            .iter()
            .map(|record| {
                format!(
                    "<tr><td>Item</td><td>{}</td><td><a href=\"/items/{id}/index.html\">{id}</a></td><td>{}</td><td>{}</td><td>-</td></tr>",
                    record.record.hierarchy_level.as_str(),
                    record.record.identification.title(),
                    record.record.identification.edition().unwrap_or("-"),
                    id = record.file_identifier(),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn alias_rows(records: &[RecordRevision]) -> String {
        records
            .iter()
            .flat_map(|record| {
                record_aliases(&record.record)
                    .into_iter()
                    .map(move |alias| {
                        let alias_path = alias
                            .href
                            .as_deref()
                            .unwrap_or("")
                            .replace(&format!("https://{CATALOGUE_NAMESPACE}/"), "");
                        format!(
                            "<tr><td>Alias</td><td>-</td><td><a href=\"/items/{id}\">{id}</a></td><td>{}</td><td>-</td><td><a href=\"/{alias_path}\">{alias_path}</a></td></tr>",
                            record.record.identification.title(),
                            id = record.file_identifier(),
                        )
                    })
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn dumps(&self) -> Result<String, ExporterError> {
        let records = self.ctx.store.select(None).await?;
        Ok(format!(
            "<html>\n<head><meta charset=\"utf-8\"><title>Items Index</title></head>\n<body>\n\
             <h1>Items Index</h1>\n\
             <table border=\"1\" cellpadding=\"5\" cellspacing=\"0\">\n\
             <thead><tr><th>Kind</th><th>Type</th><th>File Identifier</th><th>Title</th><th>Edition</th><th>Alias</th></tr></thead>\n\
             <tbody>\n{}\n{}\n</tbody>\n</table>\n</body>\n</html>\n",
            Self::record_rows(&records),
            Self::alias_rows(&records),
        ))
    }
}

#[async_trait]
impl Exporter for SiteIndexExporter {
    fn name(&self) -> &'static str {
        "Site Index"
    }

    async fn export(&self) -> Result<(), ExporterError> {
        write_file(&self.path(), &self.dumps().await?)
    }

    async fn publish(&self) -> Result<(), ExporterError> {
        let key = self.ctx.s3.calc_key(&self.path())?;
        self.ctx
            .s3
            .upload_content(&key, "text/html", self.dumps().await?.into_bytes(), None, None)
            .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Combined site
// ---------------------------------------------------------------------------

/// The whole static site: resources, pages, records and the index.
pub struct SiteExporter {
    ctx: Arc<ExporterContext>,
    resources: SiteResourcesExporter,
    pages: SitePagesExporter,
    index: SiteIndexExporter,
    records: RecordsExporter,
}

impl SiteExporter {
    pub fn new(ctx: Arc<ExporterContext>, selected: Option<std::collections::BTreeSet<String>>) -> Self {
        Self {
            resources: SiteResourcesExporter::new(Arc::clone(&ctx)),
            pages: SitePagesExporter::new(Arc::clone(&ctx)),
            index: SiteIndexExporter::new(Arc::clone(&ctx)),
            records: RecordsExporter::new(Arc::clone(&ctx), selected),
            ctx,
        }
    }

    /// Empty the export directory and the publishing bucket.
    pub async fn purge(&self) -> Result<(), ExporterError> {
        if self.ctx.meta.export_path.exists() {
            info!(target: "carta.exporters", "purging export directory");
            std::fs::remove_dir_all(&self.ctx.meta.export_path)?;
        }
        info!(target: "carta.exporters", "purging publishing bucket");
        self.ctx.s3.empty_bucket().await?;
        Ok(())
    }
}

#[async_trait]
impl Exporter for SiteExporter {
    fn name(&self) -> &'static str {
        "Site"
    }

    async fn export(&self) -> Result<(), ExporterError> {
        self.resources.export().await?;
        self.pages.export().await?;
        self.records.export().await?;
        self.index.export().await?;
        Ok(())
    }

    async fn publish(&self) -> Result<(), ExporterError> {
        self.resources.publish().await?;
        self.pages.publish().await?;
        self.records.publish().await?;
        self.index.publish().await?;
        Ok(())
    }
}
