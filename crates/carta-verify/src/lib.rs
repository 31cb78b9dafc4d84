// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! Verification engine for the published site.
//!
//! Verification builds a plan of declarative HTTP probes (site pages, record
//! formats, item pages, alias and DOI redirects, distribution downloads),
//! executes them in parallel with per-job expected-outcome contracts, and
//! compiles the results into JSON and HTML reports.

pub mod checks;
pub mod plan;
pub mod report;
pub mod runner;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome slot of a verification job.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationResult {
    #[default]
    Pending,
    Pass,
    Fail,
    Skip,
}

/// What a verification job probes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationType {
    SitePages,
    RecordPagesJson,
    RecordPagesXml,
    RecordPagesHtml,
    ItemPages,
    AliasRedirects,
    DoiRedirects,
    ItemDownloads,
    DownloadsOpen,
    DownloadsNora,
    DownloadsSharepoint,
    DownloadsSan,
    DownloadsArcgisLayers,
    DownloadsArcgisServices,
}

/// Check function selected per job.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckFunction {
    /// Status (and optionally content length) check.
    #[default]
    CheckUrl,
    /// 301 redirect to an exact target, which must itself resolve.
    CheckUrlRedirect,
    /// ArcGIS JSON introspection: response must carry no `error` key.
    CheckUrlArcgis,
    /// Membership check: the probed URL must appear in an item page body.
    CheckItemDownload,
}

/// HTTP method used by a probe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMethod {
    #[default]
    Head,
    Get,
    Post,
}

/// Per-job probe configuration.
///
/// Base values (`base_url`, proxy endpoints) are shared across a plan; the
/// remaining fields are per-job overrides of the request and its contract.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JobContext {
    pub base_url: String,
    pub sharepoint_proxy_endpoint: String,
    pub san_proxy_endpoint: String,

    #[serde(default)]
    pub method: ProbeMethod,
    /// Request URL override; the job URL is probed when unset.
    pub url: Option<String>,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// JSON request body (POST probes only).
    pub json: Option<Value>,
    /// Expected response status; 200 when unset.
    pub expected_status: Option<u16>,
    /// Expected content length; unchecked when unset or on 206 responses.
    pub expected_length: Option<u64>,
    #[serde(default)]
    pub check: CheckFunction,
    /// Redirect target for redirect checks.
    pub target: Option<String>,
}

impl JobContext {
    pub fn new(base_url: &str, sharepoint_proxy: &str, san_proxy: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            sharepoint_proxy_endpoint: sharepoint_proxy.to_owned(),
            san_proxy_endpoint: san_proxy.to_owned(),
            ..Default::default()
        }
    }

    pub fn expected_status(&self) -> u16 {
        self.expected_status.unwrap_or(200)
    }
}

/// Result metadata recorded by the runner.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JobData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Wall-clock duration in microseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_microseconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

/// A single declarative HTTP probe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationJob {
    #[serde(rename = "type")]
    pub job_type: VerificationType,
    /// Exporter responsible for the probed resource, for reporting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exporter: Option<String>,
    pub url: String,
    #[serde(skip)]
    pub context: JobContext,
    pub data: JobData,
    pub result: VerificationResult,
}

impl VerificationJob {
    pub fn new(job_type: VerificationType, url: impl Into<String>, context: JobContext) -> Self {
        Self {
            job_type,
            exporter: None,
            url: url.into(),
            context,
            data: JobData::default(),
            result: VerificationResult::Pending,
        }
    }

    pub fn with_exporter(mut self, exporter: &str) -> Self {
        self.exporter = Some(exporter.to_owned());
        self
    }
}
