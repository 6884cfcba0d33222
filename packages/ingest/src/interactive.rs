#![allow(clippy::module_name_repetitions)]

//! Interactive TUI for the crime log ingestion tool.
//!
//! Provides a menu-driven interface using `dialoguer` for running ingest
//! commands without memorizing CLI flags.

use std::path::PathBuf;
use std::time::Instant;

use crime_log_cli_utils::{IndicatifProgress, MultiProgress};
use crime_log_pdf::PdfExtractPages;
use crime_log_submissions::SyncPaths;
use dialoguer::{Confirm, Input, Select};

use crate::{DEFAULT_DATASET, DEFAULT_PDF_DIR};

/// Top-level actions available in the ingest interactive menu.
enum IngestAction {
    Download,
    Convert,
    RunPipeline,
    Sync,
    ParsePdf,
}

impl IngestAction {
    const ALL: &[Self] = &[
        Self::Download,
        Self::Convert,
        Self::RunPipeline,
        Self::Sync,
        Self::ParsePdf,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Download => "Download police-log PDFs",
            Self::Convert => "Convert PDFs into the dataset",
            Self::RunPipeline => "Download and convert",
            Self::Sync => "Sync approved user reports",
            Self::ParsePdf => "Parse a single PDF",
        }
    }
}

/// Runs the interactive menu, prompting the user to select and configure
/// an ingest operation.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected operation fails.
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<&str> = IngestAction::ALL.iter().map(IngestAction::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    let start = Instant::now();

    match IngestAction::ALL[idx] {
        IngestAction::Download => {
            let output_dir = prompt_path("PDF directory", DEFAULT_PDF_DIR)?;
            let newest = Confirm::new()
                .with_prompt("Only download the newest PDF?")
                .default(false)
                .interact()?;
            crate::download(&output_dir, &crate::listing_url(None), newest).await?;
        }
        IngestAction::Convert => {
            let pdf_dir = prompt_path("PDF directory", DEFAULT_PDF_DIR)?;
            let output = prompt_path("Dataset file", DEFAULT_DATASET)?;
            let template = prompt_optional_path("Template TOML (empty for built-in)")?;
            let progress = IndicatifProgress::files_bar(multi, "Converting PDFs");
            crate::convert(&pdf_dir, &output, template.as_deref(), &progress)?;
        }
        IngestAction::RunPipeline => {
            let pdf_dir = prompt_path("PDF directory", DEFAULT_PDF_DIR)?;
            let output = prompt_path("Dataset file", DEFAULT_DATASET)?;
            crate::download(&pdf_dir, &crate::listing_url(None), false).await?;
            let progress = IndicatifProgress::files_bar(multi, "Converting PDFs");
            crate::convert(&pdf_dir, &output, None, &progress)?;
        }
        IngestAction::Sync => {
            let defaults = SyncPaths::default();
            let paths = SyncPaths {
                reports: prompt_path("Dataset file", &defaults.reports.to_string_lossy())?,
                state: prompt_path("Sync state file", &defaults.state.to_string_lossy())?,
            };
            crate::sync(&paths).await?;
        }
        IngestAction::ParsePdf => {
            let file: String = Input::new().with_prompt("PDF file").interact_text()?;
            let parser = crate::load_parser(None)?;
            let report = crate::parse_pdf(&PathBuf::from(file), &parser, &PdfExtractPages)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }
    }

    log::info!("Finished in {:.1}s", start.elapsed().as_secs_f64());

    Ok(())
}

/// Prompts for a path, offering `default`.
fn prompt_path(prompt: &str, default: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .default(default.to_string())
        .interact_text()?;
    Ok(PathBuf::from(input.trim()))
}

/// Prompts for an optional path. Returns `None` if the input is empty.
fn prompt_optional_path(prompt: &str) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;

    let input = input.trim();
    Ok((!input.is_empty()).then(|| PathBuf::from(input)))
}
