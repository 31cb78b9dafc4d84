// SPDX-License-Identifier: MIT OR Apache-2.0
//! Subcommand implementations for export, verification and config dumping.

use std::collections::BTreeSet;

use anyhow::{Context as _, Result};
use chrono::Utc;
use tracing::info;

use carta_config::Config;
use carta_exporters::Exporter;
use carta_exporters::site::SiteExporter;
use carta_verify::plan::VerificationPlan;
use carta_verify::report::VerificationReport;
use carta_verify::runner::{CancelSignal, VerificationRunner};
use carta_verify::JobContext;

fn selection(ids: &[String]) -> Option<BTreeSet<String>> {
    if ids.is_empty() {
        None
    } else {
        Some(ids.iter().cloned().collect())
    }
}

/// Export the whole site to the local output directory.
pub async fn export(config: &Config, ids: &[String]) -> Result<()> {
    let ctx = crate::context::build_exporter_context(config, None).await?;
    let site = SiteExporter::new(ctx, selection(ids));
    site.export().await.context("exporting site")?;
    info!(
        target: "carta.cli",
        path = %config.export_path.display(),
        "site exported"
    );
    Ok(())
}

/// Publish the whole site to the object store.
pub async fn publish_site(config: &Config, ids: &[String]) -> Result<()> {
    let ctx = crate::context::build_exporter_context(config, None).await?;
    let site = SiteExporter::new(ctx, selection(ids));
    site.publish().await.context("publishing site")?;
    info!(target: "carta.cli", bucket = %config.aws_s3_bucket, "site published");
    Ok(())
}

/// Verify the deployed site and write the report.
///
/// The overall outcome lands in the report; a failed verification is not a
/// process failure.
pub async fn verify(config: &Config, ids: &[String]) -> Result<()> {
    let ctx = crate::context::build_exporter_context(config, None).await?;
    let records = ctx.store.select(selection(ids).as_ref()).await?;

    let job_context = JobContext::new(
        &config.base_url,
        &config.verify_sharepoint_proxy_endpoint,
        &config.verify_san_proxy_endpoint,
    );
    let plan = VerificationPlan::new(job_context);
    let jobs = plan.jobs(&records);

    let runner = VerificationRunner::new(config.parallel_jobs, CancelSignal::new());
    let jobs = runner.run(jobs).await;

    let commit = ctx.store.head_commit().await;
    let report = VerificationReport::new(&config.base_url, commit, Utc::now(), jobs);
    report
        .export(&config.export_path)
        .context("writing verification report")?;
    report
        .publish(&ctx.s3, &config.export_path)
        .await
        .context("publishing verification report")?;

    if report.pass_fail {
        info!(target: "carta.cli", checks = report.len(), "verification passed");
    } else {
        tracing::warn!(
            target: "carta.cli",
            fails = report.stats.get("fail").copied().unwrap_or_default(),
            "verification failed, see report"
        );
    }
    Ok(())
}

/// Print configuration with secrets redacted.
pub fn dump_config(config: &Config) -> Result<()> {
    let dumped = config.dumps_safe();
    println!("{}", serde_json::to_string_pretty(&dumped)?);
    Ok(())
}
