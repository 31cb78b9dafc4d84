// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! Command-line interface for the Carta publishing pipeline.

mod codec;
mod commands;
mod context;
mod workflow;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;

use carta_config::Config;
use workflow::{RecordValidationFailed, WorkflowArgs};

/// Exit code for record validation failures during publishing.
const EXIT_VALIDATION_ERROR: u8 = 1;

#[derive(Parser, Debug)]
#[command(name = "carta", version, about = "Carta catalogue publishing pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import record files and publish affected site resources.
    Publish {
        /// Directory containing record configuration files.
        #[arg(long)]
        path: PathBuf,

        /// Changeset branch name.
        #[arg(long)]
        changeset_base: String,

        /// Changeset title.
        #[arg(long)]
        changeset_title: String,

        /// Changeset message.
        #[arg(long)]
        changeset_message: String,

        /// Commit title.
        #[arg(long)]
        commit_title: String,

        /// Commit message.
        #[arg(long)]
        commit_message: String,

        /// Commit author name.
        #[arg(long)]
        author_name: String,

        /// Commit author email.
        #[arg(long)]
        author_email: String,

        /// Optional webhook notified with commit details.
        #[arg(long)]
        webhook: Option<String>,
    },

    /// Export the site to the local output directory.
    Export {
        /// Restrict to specific file identifiers. Can be repeated.
        #[arg(long = "id")]
        ids: Vec<String>,
    },

    /// Publish the site to the object store.
    PublishSite {
        /// Restrict to specific file identifiers. Can be repeated.
        #[arg(long = "id")]
        ids: Vec<String>,
    },

    /// Probe the deployed site and write a verification report.
    Verify {
        /// Restrict to specific file identifiers. Can be repeated.
        #[arg(long = "id")]
        ids: Vec<String>,
    },

    /// Print configuration with secrets redacted.
    Config,
}

async fn dispatch(config: &Config, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Publish {
            path,
            changeset_base,
            changeset_title,
            changeset_message,
            commit_title,
            commit_message,
            author_name,
            author_email,
            webhook,
        } => {
            let args = WorkflowArgs {
                path,
                changeset_base,
                changeset_title,
                changeset_message,
                commit_title,
                commit_message,
                author_name,
                author_email,
                webhook,
            };
            workflow::run(config, &args).await
        }
        Commands::Export { ids } => commands::export(config, &ids).await,
        Commands::PublishSite { ids } => commands::publish_site(config, &ids).await,
        Commands::Verify { ids } => commands::verify(config, &ids).await,
        Commands::Config => commands::dump_config(config),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("configuration error: {error}");
            return ExitCode::from(EXIT_VALIDATION_ERROR);
        }
    };

    carta_telemetry::init_logging(&config.log_level);
    let _sentry = carta_telemetry::init_sentry(
        config.enable_feature_sentry,
        &config.sentry_dsn,
        &config.sentry_environment,
    );

    match dispatch(&config, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if error.downcast_ref::<RecordValidationFailed>().is_some() {
                error!(target: "carta.cli", %error, "record validation failed");
            } else {
                error!(target: "carta.cli", %error, "command failed");
            }
            // Failures always exit 1; details surface via logging and Sentry.
            ExitCode::from(EXIT_VALIDATION_ERROR)
        }
    }
}
