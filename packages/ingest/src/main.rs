#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the crime log ingestion tool.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use crime_log_cli_utils::{IndicatifProgress, init_logger};
use crime_log_ingest::{
    DEFAULT_DATASET, DEFAULT_PDF_DIR, convert, download, listing_url, load_parser, parse_pdf,
    sync,
};
use crime_log_pdf::PdfExtractPages;
use crime_log_submissions::SyncPaths;

#[derive(Parser)]
#[command(name = "crime_log_ingest", about = "Police-log incident ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Download police-log PDFs from the department's listing page
    Download {
        /// Directory to save PDFs into
        #[arg(long, default_value = DEFAULT_PDF_DIR)]
        output_dir: PathBuf,
        /// Listing page URL (overrides `CRIME_LOG_LISTING_URL`)
        #[arg(long)]
        url: Option<String>,
        /// Only download the newest listed PDF
        #[arg(long)]
        newest: bool,
    },
    /// Convert downloaded PDFs into the incident dataset
    Convert {
        /// Directory containing police-log PDFs
        #[arg(long, default_value = DEFAULT_PDF_DIR)]
        pdf_dir: PathBuf,
        /// Dataset JSON file to update
        #[arg(long, default_value = DEFAULT_DATASET)]
        output: PathBuf,
        /// Report template TOML (defaults to the built-in UCSD layout)
        #[arg(long)]
        template: Option<PathBuf>,
    },
    /// Merge approved user-submitted reports into the published dataset
    Sync {
        /// Published dataset JSON file
        #[arg(long, default_value = "app/public/police_reports.json")]
        reports: PathBuf,
        /// Sync watermark JSON file
        #[arg(long, default_value = "app/public/sync_state.json")]
        state: PathBuf,
    },
    /// Download new PDFs, then convert them
    Run {
        /// Directory for downloaded PDFs
        #[arg(long, default_value = DEFAULT_PDF_DIR)]
        pdf_dir: PathBuf,
        /// Dataset JSON file to update
        #[arg(long, default_value = DEFAULT_DATASET)]
        output: PathBuf,
        /// Listing page URL (overrides `CRIME_LOG_LISTING_URL`)
        #[arg(long)]
        url: Option<String>,
    },
    /// Parse a single PDF and print its report as JSON
    Parse {
        /// PDF file to parse
        file: PathBuf,
        /// Report template TOML (defaults to the built-in UCSD layout)
        #[arg(long)]
        template: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return crime_log_ingest::interactive::run(&multi).await;
    };

    let start = Instant::now();

    match command {
        Commands::Download {
            output_dir,
            url,
            newest,
        } => {
            download(&output_dir, &listing_url(url), newest).await?;
        }
        Commands::Convert {
            pdf_dir,
            output,
            template,
        } => {
            let progress = IndicatifProgress::files_bar(&multi, "Converting PDFs");
            convert(&pdf_dir, &output, template.as_deref(), &progress)?;
        }
        Commands::Sync { reports, state } => {
            if sync(&SyncPaths { reports, state }).await.is_err() {
                std::process::exit(1);
            }
        }
        Commands::Run {
            pdf_dir,
            output,
            url,
        } => {
            log::info!("Downloading new PDFs...");
            download(&pdf_dir, &listing_url(url), false).await?;

            log::info!("Converting PDFs...");
            let progress = IndicatifProgress::files_bar(&multi, "Converting PDFs");
            convert(&pdf_dir, &output, None, &progress)?;
        }
        Commands::Parse { file, template } => {
            let parser = load_parser(template.as_deref())?;
            let report = parse_pdf(&file, &parser, &PdfExtractPages)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }
    }

    log::info!("Finished in {:.1}s", start.elapsed().as_secs_f64());

    Ok(())
}
