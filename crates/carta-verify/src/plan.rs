// SPDX-License-Identifier: MIT OR Apache-2.0
//! Verification plan generation.
//!
//! One job per site page, plus per-record jobs for each format, the item
//! page, alias and DOI redirects, and every distribution option. Jobs that
//! cannot run in the current environment (redirects on localhost, DOIs off
//! production) are pre-marked as skipped.

use tracing::warn;

use carta_item::distributions as media;
use carta_record::elements::distribution::Distribution;
use carta_record::{ALIAS_NAMESPACE, CATALOGUE_NAMESPACE, RecordRevision, record_aliases};

use crate::{
    CheckFunction, JobContext, ProbeMethod, VerificationJob, VerificationResult,
    VerificationType,
};

/// Site pages probed on every run.
pub const SITE_PAGES: &[&str] = &[
    "/legal/accessibility",
    "/legal/cookies",
    "/legal/copyright",
    "/legal/privacy",
    "/-/index",
    "/-/formatting",
];

/// File-download media types verified with a plain URL check.
const FILE_MEDIA_TYPES: &[&str] = &[
    media::MEDIA_TYPE_GEOJSON,
    media::MEDIA_TYPE_GEOPACKAGE,
    media::MEDIA_TYPE_GEOPACKAGE_ZIP,
    media::MEDIA_TYPE_JPEG,
    media::MEDIA_TYPE_PDF,
    media::MEDIA_TYPE_PDF_GEO,
    media::MEDIA_TYPE_PNG,
    media::MEDIA_TYPE_SHAPEFILE_ZIP,
];

const ARCGIS_LAYER_MEDIA_TYPES: &[&str] = &[
    media::MEDIA_TYPE_ARCGIS_FEATURE_LAYER,
    media::MEDIA_TYPE_ARCGIS_OGC_LAYER,
    media::MEDIA_TYPE_ARCGIS_RASTER_TILE_LAYER,
    media::MEDIA_TYPE_ARCGIS_VECTOR_TILE_LAYER,
];

const ARCGIS_SERVICE_MEDIA_TYPES: &[&str] = &[
    media::MEDIA_TYPE_ARCGIS_FEATURE_SERVICE,
    media::MEDIA_TYPE_OGC_API_FEATURES_SERVICE,
    media::MEDIA_TYPE_ARCGIS_RASTER_TILE_SERVICE,
    media::MEDIA_TYPE_ARCGIS_VECTOR_TILE_SERVICE,
];

const NORA_PREFIX: &str = "https://nora.nerc.ac.uk/";

/// How a distribution option is verified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DistributionProbe {
    File,
    Nora,
    SharePoint,
    San,
    ArcGisLayer,
    ArcGisService,
    PublishedMap,
    Unsupported,
}

fn classify(distribution: &Distribution) -> DistributionProbe {
    let href = distribution.transfer_option.online_resource.href.as_str();
    if href.contains("sharepoint.com") {
        return DistributionProbe::SharePoint;
    }
    if href.starts_with(NORA_PREFIX) {
        return DistributionProbe::Nora;
    }
    if href == media::PUBLISHED_MAP_URL {
        return DistributionProbe::PublishedMap;
    }
    if href.starts_with(media::SAN_PREFIX) {
        return DistributionProbe::San;
    }
    let format_href = distribution
        .format
        .as_ref()
        .and_then(|format| format.href.as_deref())
        .unwrap_or_default();
    if FILE_MEDIA_TYPES.contains(&format_href) {
        return DistributionProbe::File;
    }
    if ARCGIS_LAYER_MEDIA_TYPES.contains(&format_href) {
        return DistributionProbe::ArcGisLayer;
    }
    if ARCGIS_SERVICE_MEDIA_TYPES.contains(&format_href) {
        return DistributionProbe::ArcGisService;
    }
    DistributionProbe::Unsupported
}

fn size_bytes(distribution: &Distribution) -> Option<u64> {
    let size = distribution.transfer_option.size.as_ref()?;
    (size.unit == "bytes").then_some(size.magnitude as u64)
}

/// Percent-decode the subset of escapes appearing in SharePoint URLs.
fn percent_decode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' {
            let high = chars.next();
            let low = chars.next();
            if let (Some(high), Some(low)) = (high, low)
                && let (Some(h), Some(l)) = (high.to_digit(16), low.to_digit(16))
            {
                out.push(char::from_u32(h * 16 + l).unwrap_or('\u{fffd}'));
                continue;
            }
            out.push(c);
        } else {
            out.push(c);
        }
    }
    out
}

/// Path payload for the SharePoint access proxy.
///
/// For `https://example.com/:i:/r/personal/user/Documents/foo%20bar.jpg?x=y`
/// the payload is `/foo bar.jpg`.
fn sharepoint_path(href: &str) -> String {
    let decoded = percent_decode(href);
    let without_query = decoded.split('?').next().unwrap_or(&decoded);
    let path = without_query
        .splitn(4, '/')
        .nth(3)
        .map(|path| format!("/{path}"))
        .unwrap_or_default();
    path.split("/Documents").last().unwrap_or("").to_owned()
}

/// Item URL for an ArcGIS layer, via its `id` query parameter.
fn arcgis_layer_url(href: &str) -> String {
    let item_id = href.split("id=").last().unwrap_or_default();
    format!("https://www.arcgis.com/sharing/rest/content/items/{item_id}?f=json")
}

/// Verification plan builder.
pub struct VerificationPlan {
    context: JobContext,
}

impl VerificationPlan {
    pub fn new(context: JobContext) -> Self {
        Self { context }
    }

    fn localhost(&self) -> bool {
        self.context.base_url.contains("localhost")
    }

    fn production(&self) -> bool {
        self.context.base_url == format!("https://{CATALOGUE_NAMESPACE}")
    }

    /// Jobs for static site pages, including the 404 handler.
    pub fn site_jobs(&self) -> Vec<VerificationJob> {
        let mut jobs = Vec::new();

        // The 404 handler must itself return 404; local dev servers don't
        // support custom handlers so the probe is skipped there.
        let mut not_found_context = self.context.clone();
        not_found_context.expected_status = Some(404);
        let mut not_found = VerificationJob::new(
            VerificationType::SitePages,
            format!("{}/-/404", self.context.base_url),
            not_found_context,
        )
        .with_exporter("SitePagesExporter");
        not_found.data.path = Some("404".into());
        if self.localhost() {
            not_found.result = VerificationResult::Skip;
        }
        jobs.push(not_found);

        for page in SITE_PAGES {
            let mut job = VerificationJob::new(
                VerificationType::SitePages,
                format!("{}{page}/", self.context.base_url),
                self.context.clone(),
            )
            .with_exporter("SitePagesExporter");
            job.data.path = Some((*page).to_owned());
            jobs.push(job);
        }
        jobs
    }

    fn record_format_jobs(&self, record: &RecordRevision) -> Vec<VerificationJob> {
        let formats: [(&str, &str, VerificationType); 3] = [
            ("json", "JsonExporter", VerificationType::RecordPagesJson),
            ("xml", "IsoXmlExporter", VerificationType::RecordPagesXml),
            ("html", "IsoXmlHtmlExporter", VerificationType::RecordPagesHtml),
        ];
        formats
            .into_iter()
            .map(|(extension, exporter, job_type)| {
                let mut job = VerificationJob::new(
                    job_type,
                    format!(
                        "{}/records/{}.{extension}",
                        self.context.base_url,
                        record.file_identifier()
                    ),
                    self.context.clone(),
                )
                .with_exporter(exporter);
                job.data.file_identifier = Some(record.file_identifier().to_owned());
                job
            })
            .collect()
    }

    fn item_job(&self, record: &RecordRevision) -> VerificationJob {
        let mut job = VerificationJob::new(
            VerificationType::ItemPages,
            format!(
                "{}/items/{}/index.html",
                self.context.base_url,
                record.file_identifier()
            ),
            self.context.clone(),
        )
        .with_exporter("HtmlExporter");
        job.data.file_identifier = Some(record.file_identifier().to_owned());
        job
    }

    fn redirect_jobs(&self, record: &RecordRevision) -> Vec<VerificationJob> {
        let mut jobs = Vec::new();

        for alias in record_aliases(&record.record) {
            let mut context = self.context.clone();
            context.check = CheckFunction::CheckUrlRedirect;
            context.target = Some(format!("/items/{}/index.html", record.file_identifier()));
            let mut job = VerificationJob::new(
                VerificationType::AliasRedirects,
                format!("{}/{}/", self.context.base_url, alias.identifier),
                context,
            )
            .with_exporter("HtmlAliasesExporter");
            job.data.file_identifier = Some(record.file_identifier().to_owned());
            job.data.slug = Some(alias.identifier.clone());
            // Local dev servers do not issue redirects.
            if self.localhost() {
                job.result = VerificationResult::Skip;
            }
            jobs.push(job);
        }

        for doi in record.record.identification.identifiers().filter("doi").iter() {
            let mut context = self.context.clone();
            context.check = CheckFunction::CheckUrlRedirect;
            context.target = Some(format!(
                "https://{CATALOGUE_NAMESPACE}/items/{}",
                record.file_identifier()
            ));
            let mut job = VerificationJob::new(
                VerificationType::DoiRedirects,
                format!("https://doi.org/{}", doi.identifier),
                context,
            );
            job.data.file_identifier = Some(record.file_identifier().to_owned());
            job.data.slug = Some(doi.identifier.clone());
            // DOIs only resolve correctly from the production domain.
            if !self.production() {
                job.result = VerificationResult::Skip;
            }
            jobs.push(job);
        }

        jobs
    }

    fn distribution_jobs(&self, record: &RecordRevision) -> Vec<VerificationJob> {
        let mut jobs = Vec::new();
        for distribution in &record.record.distribution {
            let href = distribution
                .transfer_option
                .online_resource
                .href
                .clone();
            let probe = classify(distribution);

            // Every distribution must be reachable from its item page.
            let mut membership_context = self.context.clone();
            membership_context.check = CheckFunction::CheckItemDownload;
            membership_context.url = Some(format!(
                "{}/items/{}/index.html",
                self.context.base_url,
                record.file_identifier()
            ));
            let mut membership = VerificationJob::new(
                VerificationType::ItemDownloads,
                href.clone(),
                membership_context,
            );
            membership.data.file_identifier = Some(record.file_identifier().to_owned());
            membership.data.distribution_type = Some(format!("{probe:?}"));
            jobs.push(membership);

            let mut job = match probe {
                DistributionProbe::File => {
                    let mut context = self.context.clone();
                    context.expected_length = size_bytes(distribution);
                    VerificationJob::new(VerificationType::DownloadsOpen, href.clone(), context)
                }
                DistributionProbe::Nora => {
                    let mut context = self.context.clone();
                    // NORA reacts differently to HEAD vs GET requests.
                    context.method = ProbeMethod::Get;
                    context.headers = vec![("Range".into(), "bytes=0-253".into())];
                    context.expected_status = Some(206);
                    context.expected_length = size_bytes(distribution);
                    VerificationJob::new(VerificationType::DownloadsNora, href.clone(), context)
                }
                DistributionProbe::SharePoint => {
                    let mut context = self.context.clone();
                    context.method = ProbeMethod::Post;
                    context.url = Some(context.sharepoint_proxy_endpoint.clone());
                    context.json = Some(serde_json::json!({"path": sharepoint_path(&href)}));
                    VerificationJob::new(
                        VerificationType::DownloadsSharepoint,
                        href.clone(),
                        context,
                    )
                }
                DistributionProbe::San => {
                    let mut context = self.context.clone();
                    context.method = ProbeMethod::Post;
                    context.url = Some(context.san_proxy_endpoint.clone());
                    context.json = Some(serde_json::json!({"path": href.clone()}));
                    VerificationJob::new(VerificationType::DownloadsSan, href.clone(), context)
                }
                DistributionProbe::ArcGisLayer => {
                    let mut context = self.context.clone();
                    context.check = CheckFunction::CheckUrlArcgis;
                    VerificationJob::new(
                        VerificationType::DownloadsArcgisLayers,
                        arcgis_layer_url(&href),
                        context,
                    )
                }
                DistributionProbe::ArcGisService => {
                    let mut context = self.context.clone();
                    context.check = CheckFunction::CheckUrlArcgis;
                    VerificationJob::new(
                        VerificationType::DownloadsArcgisServices,
                        format!("{href}?f=json"),
                        context,
                    )
                }
                DistributionProbe::PublishedMap => continue,
                DistributionProbe::Unsupported => {
                    warn!(
                        target: "carta.verify",
                        %href,
                        "unsupported distribution, membership check only"
                    );
                    continue;
                }
            };
            job.data.file_identifier = Some(record.file_identifier().to_owned());
            job.data.distribution_type = Some(format!("{probe:?}"));
            jobs.push(job);
        }
        jobs
    }

    /// Jobs for one record: formats, item page, redirects and distributions.
    pub fn record_jobs(&self, record: &RecordRevision) -> Vec<VerificationJob> {
        let mut jobs = Vec::new();
        jobs.extend(self.record_format_jobs(record));
        jobs.push(self.item_job(record));
        jobs.extend(self.redirect_jobs(record));
        jobs.extend(self.distribution_jobs(record));
        jobs
    }

    /// The full plan for a set of records.
    pub fn jobs(&self, records: &[RecordRevision]) -> Vec<VerificationJob> {
        let mut jobs = self.site_jobs();
        for record in records {
            jobs.extend(self.record_jobs(record));
        }
        jobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ID: &str = "5d5b4e21-fd32-409c-be83-ca1c339903e5";

    fn revision() -> RecordRevision {
        RecordRevision::loads(&json!({
            "file_identifier": ID,
            "file_revision": "commit-a",
            "hierarchy_level": "dataset",
            "metadata": {
                "contacts": [{"organisation": {"name": "x"}, "role": ["pointOfContact"]}],
                "date_stamp": "2014-06-30",
            },
            "identification": {
                "title": {"value": "x"},
                "dates": {"creation": "2014-06-30"},
                "abstract": "x",
                "identifiers": [
                    {
                        "identifier": "datasets/foo",
                        "href": "https://data.bas.ac.uk/datasets/foo",
                        "namespace": ALIAS_NAMESPACE,
                    },
                    {"identifier": "10.5285/abc", "namespace": "doi"},
                ],
            },
            "distribution": [{
                "format": {
                    "format": "GeoPackage",
                    "href": media::MEDIA_TYPE_GEOPACKAGE,
                },
                "distributor": {"organisation": {"name": "x"}, "role": ["distributor"]},
                "transfer_option": {
                    "online_resource": {"href": "https://example.com/foo.gpkg", "function": "download"},
                    "size": {"unit": "bytes", "magnitude": 1024.0},
                },
            }],
        }))
        .unwrap()
    }

    fn plan(base_url: &str) -> VerificationPlan {
        VerificationPlan::new(JobContext::new(
            base_url,
            "https://proxy.example.com/sharepoint",
            "https://proxy.example.com/san",
        ))
    }

    #[test]
    fn site_jobs_cover_pages_and_404() {
        let jobs = plan("https://data.bas.ac.uk").site_jobs();
        assert_eq!(jobs.len(), SITE_PAGES.len() + 1);
        assert_eq!(jobs[0].context.expected_status, Some(404));
        assert!(jobs.iter().all(|job| job.result == VerificationResult::Pending));
    }

    #[test]
    fn not_found_job_skipped_on_localhost() {
        let jobs = plan("http://localhost:8000").site_jobs();
        assert_eq!(jobs[0].result, VerificationResult::Skip);
    }

    #[test]
    fn record_jobs_for_known_shape() {
        // One alias, one DOI, one sized file distribution: 3 format jobs,
        // the item page, the alias redirect, the DOI redirect, the
        // membership check and the file download.
        let plan = plan("https://data.bas.ac.uk");
        let jobs = plan.record_jobs(&revision());
        assert_eq!(jobs.len(), 8);

        let alias = jobs
            .iter()
            .find(|job| job.job_type == VerificationType::AliasRedirects)
            .unwrap();
        assert_eq!(alias.url, "https://data.bas.ac.uk/datasets/foo/");
        assert_eq!(
            alias.context.target.as_deref(),
            Some(format!("/items/{ID}/index.html").as_str())
        );

        let doi = jobs
            .iter()
            .find(|job| job.job_type == VerificationType::DoiRedirects)
            .unwrap();
        assert_eq!(doi.url, "https://doi.org/10.5285/abc");
        assert_eq!(
            doi.context.target.as_deref(),
            Some(format!("https://data.bas.ac.uk/items/{ID}").as_str())
        );
        assert_eq!(doi.result, VerificationResult::Pending);

        let download = jobs
            .iter()
            .find(|job| job.job_type == VerificationType::DownloadsOpen)
            .unwrap();
        assert_eq!(download.context.expected_length, Some(1024));

        let membership = jobs
            .iter()
            .find(|job| job.job_type == VerificationType::ItemDownloads)
            .unwrap();
        assert_eq!(membership.url, "https://example.com/foo.gpkg");
        assert_eq!(
            membership.context.url.as_deref(),
            Some(format!("https://data.bas.ac.uk/items/{ID}/index.html").as_str())
        );
    }

    #[test]
    fn doi_jobs_skipped_off_production() {
        let jobs = plan("https://data-testing.bas.ac.uk").record_jobs(&revision());
        let doi = jobs
            .iter()
            .find(|job| job.job_type == VerificationType::DoiRedirects)
            .unwrap();
        assert_eq!(doi.result, VerificationResult::Skip);
    }

    #[test]
    fn alias_jobs_skipped_on_localhost() {
        let jobs = plan("http://localhost:8000").record_jobs(&revision());
        let alias = jobs
            .iter()
            .find(|job| job.job_type == VerificationType::AliasRedirects)
            .unwrap();
        assert_eq!(alias.result, VerificationResult::Skip);
    }

    #[test]
    fn sharepoint_path_extraction() {
        let href = "https://example.sharepoint.com/:i:/r/personal/conwat_example_com/Documents/foo%20bar.jpg?x=y";
        assert_eq!(sharepoint_path(href), "/foo bar.jpg");
    }

    #[test]
    fn arcgis_layer_url_rewrite() {
        assert_eq!(
            arcgis_layer_url("https://bas.maps.arcgis.com/home/item.html?id=abc123"),
            "https://www.arcgis.com/sharing/rest/content/items/abc123?f=json"
        );
    }

    #[test]
    fn nora_distribution_uses_range_request() {
        let mut config = json!({
            "distributor": {"organisation": {"name": "x"}, "role": ["distributor"]},
            "transfer_option": {
                "online_resource": {"href": "https://nora.nerc.ac.uk/id/eprint/1/map.pdf", "function": "download"},
            },
        });
        config["format"] = json!({"format": "PDF", "href": media::MEDIA_TYPE_PDF});
        let distribution = Distribution::structure(&config).unwrap();
        let mut revision = revision();
        revision.record.distribution = vec![distribution];

        let jobs = plan("https://data.bas.ac.uk").distribution_jobs(&revision);
        let nora = jobs
            .iter()
            .find(|job| job.job_type == VerificationType::DownloadsNora)
            .unwrap();
        assert_eq!(nora.context.expected_status, Some(206));
        assert_eq!(nora.context.method, ProbeMethod::Get);
        assert_eq!(
            nora.context.headers,
            vec![("Range".to_owned(), "bytes=0-253".to_owned())]
        );
    }

    #[test]
    fn arcgis_pair_probes_layer_and_service() {
        let layer = Distribution::structure(&json!({
            "format": {"format": "x", "href": media::MEDIA_TYPE_ARCGIS_FEATURE_LAYER},
            "distributor": {"organisation": {"name": "x"}, "role": ["distributor"]},
            "transfer_option": {
                "online_resource": {"href": "https://bas.maps.arcgis.com/home/item.html?id=abc", "function": "download"},
            },
        }))
        .unwrap();
        let service = Distribution::structure(&json!({
            "format": {"format": "x", "href": media::MEDIA_TYPE_ARCGIS_FEATURE_SERVICE},
            "distributor": {"organisation": {"name": "x"}, "role": ["distributor"]},
            "transfer_option": {
                "online_resource": {"href": "https://services.example.com/FeatureServer", "function": "download"},
            },
        }))
        .unwrap();
        let mut revision = revision();
        revision.record.distribution = vec![layer, service];

        let jobs = plan("https://data.bas.ac.uk").distribution_jobs(&revision);
        let layer_job = jobs
            .iter()
            .find(|job| job.job_type == VerificationType::DownloadsArcgisLayers)
            .unwrap();
        assert!(layer_job.url.ends_with("items/abc?f=json"));
        let service_job = jobs
            .iter()
            .find(|job| job.job_type == VerificationType::DownloadsArcgisServices)
            .unwrap();
        assert_eq!(service_job.url, "https://services.example.com/FeatureServer?f=json");
        assert_eq!(service_job.context.check, CheckFunction::CheckUrlArcgis);
    }
}
