//! This module implements the CLI interface for data-release: command parsing,
//! argument defaults, and the user-visible report printed on stdout.
//!
//! All business logic (scanning, HTTP clients, the publish pipeline) lives in
//! the [`data-release-core`] crate. This module is strictly CLI glue.
//!
//! ## How To Use
//! - For command-line users: run the `data-release` binary with `--help`.
//! - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
//!
//! [`data-release-core`]: ../../data-release-core/

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use data_release_core::contract::ReleaseRef;
use data_release_core::docgen::{self, DocumentUpdate};
use data_release_core::github::GitHubClient;
use data_release_core::metadata::DEFAULT_METADATA_FILE;
use data_release_core::publish::{publish_release, PublishReport, PublishRequest, DEFAULT_STAGING_DIR};
use data_release_core::release_info::DEFAULT_RELEASE_INFO_FILE;
use data_release_core::zenodo::{ZenodoClient, ZenodoEndpoint};

use crate::load_config::load_publish_env;

const RULE: &str = "======================================================================";

/// CLI for data-release: document and publish research data releases.
#[derive(Parser)]
#[clap(
    name = "data-release",
    version,
    about = "Generate data & code availability sections and publish GitHub releases to Zenodo"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan for processed tables and figure PDFs and fill the README placeholders
    Docs(DocsArgs),
    /// Upload a GitHub release to Zenodo and publish it with a DOI
    Publish(PublishArgs),
}

#[derive(Debug, Args)]
pub struct DocsArgs {
    /// Directory to scan
    #[clap(long, default_value = ".")]
    pub root: PathBuf,
    /// Document holding the placeholder markers [default: <root>/README.md]
    #[clap(long)]
    pub readme: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PublishArgs {
    /// GitHub repository owner
    #[clap(long)]
    pub repo_owner: String,
    /// GitHub repository name
    #[clap(long)]
    pub repo_name: String,
    /// Git tag/release to upload
    #[clap(long, default_value = "main")]
    pub tag: String,
    /// Use the Zenodo sandbox (testing) instead of production
    #[clap(long)]
    pub sandbox: bool,
    /// Path to the deposition metadata file
    #[clap(long, default_value = DEFAULT_METADATA_FILE)]
    pub metadata: PathBuf,
    /// Skip the GitHub download and upload files already staged
    #[clap(long)]
    pub skip_download: bool,
    /// Where release assets are downloaded to
    #[clap(long, default_value = DEFAULT_STAGING_DIR)]
    pub staging_dir: PathBuf,
    /// Where the release summary is written
    #[clap(long, default_value = DEFAULT_RELEASE_INFO_FILE)]
    pub output: PathBuf,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Docs(args) => {
            tracing::info!(command = "docs", root = %args.root.display(), "Starting documentation generation");
            run_docs(args)
        }
        Commands::Publish(args) => {
            tracing::info!(
                command = "publish",
                owner = %args.repo_owner,
                repo = %args.repo_name,
                tag = %args.tag,
                sandbox = args.sandbox,
                "Starting release publication"
            );
            run_publish(args).await
        }
    }
}

fn run_docs(args: DocsArgs) -> Result<()> {
    let readme = args.readme.unwrap_or_else(|| args.root.join("README.md"));

    println!("Repository root: {}", args.root.display());
    println!("Scanning for data files and figures...\n");
    let sections = docgen::generate_sections(&args.root)
        .with_context(|| format!("Failed to scan {}", args.root.display()))?;

    println!("{RULE}\nPROCESSED DATA FILES\n{RULE}");
    println!("{}\n", sections.tables);
    println!("{RULE}\nFIGURE PDFs\n{RULE}");
    println!("{}\n", sections.figures);

    println!("{RULE}\nUPDATING {}\n{RULE}", readme.display());
    let status = docgen::update_document(&readme, &sections.tables, &sections.figures)
        .with_context(|| format!("Failed to update {}", readme.display()))?;
    match status {
        DocumentUpdate::Updated => {
            println!("✓ Updated processed data tables section");
            println!("✓ Updated figures section");
            println!("✓ {} updated successfully", readme.display());
        }
        DocumentUpdate::MarkersMissing { tables, figures } => {
            let missing: Vec<&str> = [
                (!tables).then_some(docgen::TABLES_MARKER),
                (!figures).then_some(docgen::FIGS_MARKER),
            ]
            .into_iter()
            .flatten()
            .collect();
            println!(
                "{} left unchanged: missing {}",
                readme.display(),
                missing.join(" and ")
            );
        }
        DocumentUpdate::NotFound => {
            eprintln!("Warning: {} not found", readme.display());
        }
    }
    Ok(())
}

async fn run_publish(args: PublishArgs) -> Result<()> {
    let env = load_publish_env()?;

    let endpoint = ZenodoEndpoint::from_sandbox_flag(args.sandbox);
    let archive = match &env.zenodo_api_url {
        Some(url) => ZenodoClient::with_base_url(url, env.zenodo_token.clone())?,
        None => ZenodoClient::new(env.zenodo_token.clone(), endpoint)?,
    };
    let source = match &env.github_api_url {
        Some(url) => GitHubClient::with_base_url(url, env.github_token.clone())?,
        None => GitHubClient::new(env.github_token.clone())?,
    };
    println!("✓ Zenodo uploader initialized ({})", endpoint.label());

    let request = PublishRequest {
        release: ReleaseRef::new(args.repo_owner, args.repo_name, args.tag),
        metadata_path: args.metadata,
        staging_dir: args.staging_dir,
        skip_download: args.skip_download,
        release_info_path: args.output,
    };

    match publish_release(&request, &source, &archive).await {
        Ok(report) => {
            print_report(&report, &request);
            tracing::info!(command = "publish", record_id = report.record.record_id, "Publication complete");
            Ok(())
        }
        Err(e) => {
            tracing::error!(command = "publish", error = %e, "Publication failed");
            Err(anyhow::Error::new(e).context("Publishing release failed"))
        }
    }
}

fn print_report(report: &PublishReport, request: &PublishRequest) {
    println!("\n{RULE}");
    println!("SUCCESS! Zenodo record created and published");
    println!("{RULE}");
    println!("Record ID: {}", report.record.record_id);
    println!("DOI: {}", report.record.doi.as_deref().unwrap_or("pending"));
    println!("URL: {}", report.record.record_url);
    println!("Files: {}", report.uploaded.len());
    println!("{RULE}\n");
    println!(
        "✓ Release info saved to {}",
        request.release_info_path.display()
    );
}
