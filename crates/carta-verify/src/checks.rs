// SPDX-License-Identifier: MIT OR Apache-2.0
//! Check functions executed per verification job.
//!
//! Checks never raise; a failed probe records `fail` in the job's result
//! slot. Probes do not follow redirects except where a check explicitly
//! resolves a redirect target.

use std::time::Duration;

use chrono::Utc;
use reqwest::redirect::Policy;
use tracing::debug;

use crate::{CheckFunction, JobContext, ProbeMethod, VerificationJob, VerificationResult};

/// Timeout for file probes.
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes verification probes.
///
/// Holds one client that never follows redirects (the default for probes)
/// and one that does (for resolving redirect targets).
#[derive(Clone, Debug)]
pub struct Checker {
    plain: reqwest::Client,
    following: reqwest::Client,
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

impl Checker {
    pub fn new() -> Self {
        Self {
            plain: reqwest::Client::builder()
                .redirect(Policy::none())
                .build()
                .unwrap_or_default(),
            following: reqwest::Client::builder()
                .redirect(Policy::limited(10))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Issue the job's request and validate status plus content length.
    ///
    /// Marks the job failed (and returns `None` for the response on
    /// transport errors); callers continue their own validation only when a
    /// response comes back and the job is still unresolved.
    async fn request(
        &self,
        job: &mut VerificationJob,
        context: &JobContext,
        follow_redirects: bool,
    ) -> Option<reqwest::Response> {
        let url = context.url.clone().unwrap_or_else(|| job.url.clone());
        let client = if follow_redirects {
            &self.following
        } else {
            &self.plain
        };
        let mut request = match context.method {
            ProbeMethod::Head => client.head(&url),
            ProbeMethod::Get => client.get(&url),
            ProbeMethod::Post => match &context.json {
                Some(body) => client.post(&url).json(body),
                None => client.post(&url),
            },
        };
        for (name, value) in &context.headers {
            request = request.header(name, value);
        }

        let response = match request.timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => response,
            Err(error) => {
                debug!(target: "carta.verify", %url, %error, "probe transport failure");
                job.result = VerificationResult::Fail;
                return None;
            }
        };

        let status = response.status().as_u16();
        job.data.status_code = Some(status);
        if status != context.expected_status() {
            job.result = VerificationResult::Fail;
            return Some(response);
        }

        if let Some(expected_length) = context.expected_length
            && status != 206
        {
            let content_length = response
                .headers()
                .get("content-length")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<u64>().ok())
                .unwrap_or(0);
            if content_length != expected_length {
                job.result = VerificationResult::Fail;
                return Some(response);
            }
        }

        Some(response)
    }

    /// Default URL check: expected status and optional content length.
    async fn check_url(&self, job: &mut VerificationJob) {
        let context = job.context.clone();
        if self.request(job, &context, false).await.is_none() {
            return;
        }
        if job.result == VerificationResult::Pending {
            job.result = VerificationResult::Pass;
        }
    }

    /// Redirect check: 301 to an exact location, which must itself resolve.
    async fn check_url_redirect(&self, job: &mut VerificationJob) {
        let mut context = job.context.clone();
        context.expected_status = Some(301);
        let Some(response) = self.request(job, &context, false).await else {
            return;
        };
        if job.result == VerificationResult::Fail {
            return;
        }

        let target = context.target.clone().unwrap_or_default();
        let location = response
            .headers()
            .get("location")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if location != target {
            job.result = VerificationResult::Fail;
            return;
        }

        // The target must exist and be followable.
        let mut target_context = job.context.clone();
        target_context.expected_status = Some(200);
        target_context.method = ProbeMethod::Get;
        target_context.url = Some(resolve_target(&job.context.base_url, &target));
        if self.request(job, &target_context, true).await.is_none() {
            return;
        }
        if job.result == VerificationResult::Pending {
            job.result = VerificationResult::Pass;
        }
    }

    /// ArcGIS check: JSON response without a top-level `error` key.
    async fn check_url_arcgis(&self, job: &mut VerificationJob) {
        let mut context = job.context.clone();
        context.method = ProbeMethod::Get;
        let Some(response) = self.request(job, &context, false).await else {
            return;
        };
        if job.result == VerificationResult::Fail {
            return;
        }
        match response.json::<serde_json::Value>().await {
            Ok(body) => {
                if let Some(error) = body.get("error") {
                    job.data.error = Some(error.clone());
                    job.result = VerificationResult::Fail;
                } else {
                    job.result = VerificationResult::Pass;
                }
            }
            Err(_) => job.result = VerificationResult::Fail,
        }
    }

    /// Membership check: the job URL appears in an item page body.
    ///
    /// Ensures users can reach every distribution listed in a record from
    /// its item page. Ampersands are escaped as in rendered HTML.
    async fn check_item_download(&self, job: &mut VerificationJob) {
        let mut context = job.context.clone();
        context.method = ProbeMethod::Get;
        let Some(response) = self.request(job, &context, false).await else {
            return;
        };
        if job.result == VerificationResult::Fail {
            return;
        }
        let needle = job.url.replace('&', "&amp;");
        match response.text().await {
            Ok(body) => {
                // Download hrefs are typically in an <a> tag but service
                // endpoints may appear in a <code> tag instead.
                if body.contains(&needle) || body.contains(&job.url) {
                    job.result = VerificationResult::Pass;
                } else {
                    job.result = VerificationResult::Fail;
                }
            }
            Err(_) => job.result = VerificationResult::Fail,
        }
    }

    /// Execute a job, dispatching to its check function.
    ///
    /// Jobs whose result is not pending are returned untouched. Start and
    /// end times are recorded into the job's duration.
    pub async fn run_job(&self, mut job: VerificationJob) -> VerificationJob {
        if job.result != VerificationResult::Pending {
            return job;
        }

        let start = Utc::now();
        match job.context.check {
            CheckFunction::CheckUrl => self.check_url(&mut job).await,
            CheckFunction::CheckUrlRedirect => self.check_url_redirect(&mut job).await,
            CheckFunction::CheckUrlArcgis => self.check_url_arcgis(&mut job).await,
            CheckFunction::CheckItemDownload => self.check_item_download(&mut job).await,
        }
        let elapsed = Utc::now() - start;
        job.data.duration_microseconds = Some(elapsed.num_microseconds().unwrap_or(i64::MAX));
        job
    }
}

/// Make a redirect target absolute against the site base URL.
fn resolve_target(base_url: &str, target: &str) -> String {
    if target.starts_with("http://") || target.starts_with("https://") {
        target.to_owned()
    } else {
        format!("{base_url}{target}")
    }
}
