//! CLI entry point for the DeviantArt gallery exporter.

use anyhow::{Context, Result};
use clap::Parser;
use da_export_core::api::GalleryClient;
use da_export_core::app::{ExportRequest, export_all, export_selected};
use da_export_core::auth::{CredentialProvider, OAuthProvider};
use tracing::{debug, info};

mod cli;
mod prompt;

use cli::Args;
use prompt::StdinDecider;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!("CLI arguments parsed");
    info!("da-export starting");

    let provider = OAuthProvider::new(args.auth_config())?;
    let token = provider.authorize().await.context("authorization failed")?;
    info!("access token acquired");

    let file_stem = prompt::prompt_line("Enter the output file name (exclude extension):")?;
    let username = prompt::prompt_line("Enter the DeviantArt username:")?;
    let request = ExportRequest::new(file_stem, username)?;

    let client = GalleryClient::new(token)?;
    let batch_size = usize::from(args.batch_size);

    let summary = if prompt::confirm("Do you want to include all folders?")? {
        info!("including all folders");
        export_all(&client, &request, batch_size).await?
    } else {
        let mut decider = StdinDecider;
        export_selected(&client, &request, &mut decider, batch_size).await?
    };

    info!(
        total = summary.total,
        written = summary.written,
        path = %summary.output_path.display(),
        "wrote deviation data"
    );

    Ok(())
}
