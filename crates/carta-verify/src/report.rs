// SPDX-License-Identifier: MIT OR Apache-2.0
//! Verification report: aggregation and JSON/HTML output.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use minijinja::Environment;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::{VerificationJob, VerificationResult, VerificationType};

/// Site-relative directory the report lands in.
const REPORT_DIR: &str = "-/verification";

/// Aggregated verification outcome.
///
/// Overall result is pass only when every job passed.
#[derive(Debug, Serialize)]
pub struct VerificationReport {
    pub pass_fail: bool,
    pub base_url: String,
    pub commit: Option<String>,
    pub time: String,
    pub stats: BTreeMap<String, usize>,
    pub total_duration_microseconds: i64,
    pub site_checks: Vec<VerificationJob>,
    pub resource_checks: BTreeMap<String, Vec<VerificationJob>>,
}

impl VerificationReport {
    /// Compile a report from executed jobs.
    pub fn new(
        base_url: &str,
        commit: Option<String>,
        created: DateTime<Utc>,
        jobs: Vec<VerificationJob>,
    ) -> Self {
        let mut stats: BTreeMap<String, usize> = BTreeMap::from([
            ("pass".to_owned(), 0),
            ("fail".to_owned(), 0),
            ("skip".to_owned(), 0),
        ]);
        let mut total_duration = 0i64;
        let mut site_checks = Vec::new();
        let mut resource_checks: BTreeMap<String, Vec<VerificationJob>> = BTreeMap::new();
        let total = jobs.len();

        let mut passes = 0usize;
        for job in jobs {
            let label = match job.result {
                VerificationResult::Pass => {
                    passes += 1;
                    "pass"
                }
                VerificationResult::Fail => "fail",
                VerificationResult::Skip => "skip",
                VerificationResult::Pending => "fail",
            };
            *stats.entry(label.to_owned()).or_default() += 1;
            total_duration += job.data.duration_microseconds.unwrap_or(0);

            if job.job_type == VerificationType::SitePages {
                site_checks.push(job);
                continue;
            }
            let file_identifier = job.data.file_identifier.clone().unwrap_or_default();
            resource_checks.entry(file_identifier).or_default().push(job);
        }

        Self {
            pass_fail: passes == total,
            base_url: base_url.to_owned(),
            commit,
            time: created.to_rfc3339_opts(chrono::SecondsFormat::Secs, false),
            stats,
            total_duration_microseconds: total_duration,
            site_checks,
            resource_checks,
        }
    }

    /// Number of jobs in the report.
    pub fn len(&self) -> usize {
        self.site_checks.len()
            + self
                .resource_checks
                .values()
                .map(Vec::len)
                .sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Report data as JSON.
    pub fn data(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Render the report as an HTML page.
    pub fn dumps_html(&self) -> String {
        let mut env = Environment::new();
        let _ = env.add_template(
            "verification.html.j2",
            include_str!("../templates/verification.html.j2"),
        );
        env.get_template("verification.html.j2")
            .and_then(|template| template.render(minijinja::context! { report => self }))
            .unwrap_or_default()
    }

    fn report_path(export_path: &Path) -> PathBuf {
        export_path.join(REPORT_DIR)
    }

    /// Write `data.json` and `index.html` into the site tree.
    pub fn export(&self, export_path: &Path) -> std::io::Result<()> {
        let base = Self::report_path(export_path);
        std::fs::create_dir_all(&base)?;
        std::fs::write(
            base.join("data.json"),
            serde_json::to_string_pretty(&self.data()).unwrap_or_default(),
        )?;
        std::fs::write(base.join("index.html"), self.dumps_html())?;
        info!(target: "carta.verify", path = %base.display(), "verification report written");
        Ok(())
    }

    /// Upload `data.json` and `index.html` to the object store.
    pub async fn publish(
        &self,
        s3: &carta_s3::S3Utils,
        export_path: &Path,
    ) -> Result<(), carta_s3::PublishError> {
        let base = Self::report_path(export_path);
        let data_key = s3.calc_key(&base.join("data.json"))?;
        s3.upload_content(
            &data_key,
            "application/json",
            self.data().to_string().into_bytes(),
            None,
            None,
        )
        .await?;
        let html_key = s3.calc_key(&base.join("index.html"))?;
        s3.upload_content(
            &html_key,
            "text/html",
            self.dumps_html().into_bytes(),
            None,
            None,
        )
        .await?;
        Ok(())
    }
}
