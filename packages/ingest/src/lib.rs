#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Library for turning police-log PDFs into the published incident dataset.
//!
//! [`convert_pdfs`] is the batch driver: it walks a directory of PDFs,
//! skips files the dataset has already recorded, parses the rest, and
//! writes the dataset back once at the end. A PDF that fails to parse is
//! logged and counted, and the run carries on.

pub mod interactive;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crime_log_cli_utils::ProgressCallback;
use crime_log_dataset::DatasetError;
use crime_log_dataset::merge::add_document;
use crime_log_dataset::store::{load_dataset_or_default, save_dataset};
use crime_log_pdf::{IncidentParser, PageExtractor, PdfError, PdfExtractPages, ReportTemplate};
use crime_log_report_models::Report;
use crime_log_scraper::{DEFAULT_LISTING_URL, DownloadSummary, PdfDownloader, ScrapeError};
use crime_log_submissions::sync::run_from_env;
use crime_log_submissions::{SubmissionError, SyncPaths, SyncSummary};

/// Default directory holding downloaded police-log PDFs.
pub const DEFAULT_PDF_DIR: &str = "ucsd_police_reports";

/// Default dataset file written by conversion.
pub const DEFAULT_DATASET: &str = "police_reports.json";

/// Environment variable overriding the listing page URL.
pub const LISTING_URL_ENV: &str = "CRIME_LOG_LISTING_URL";

/// Errors that abort a conversion run.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The PDF directory could not be listed.
    #[error("Failed to read PDF directory {path}: {source}")]
    PdfDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The dataset could not be loaded or saved.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// The report template could not be loaded.
    #[error(transparent)]
    Pdf(#[from] PdfError),
}

/// Outcome of a conversion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    /// PDFs converted by this run.
    pub new: usize,
    /// PDFs already present in the dataset.
    pub skipped: usize,
    /// PDFs that failed to parse.
    pub failed: usize,
    /// Reports in the dataset after the run.
    pub total_reports: usize,
}

/// Resolves the listing page URL: the explicit argument, then
/// `CRIME_LOG_LISTING_URL`, then the UCSD default.
#[must_use]
pub fn listing_url(arg: Option<String>) -> String {
    arg.or_else(|| std::env::var(LISTING_URL_ENV).ok())
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LISTING_URL.to_string())
}

/// Downloads police-log PDFs from `url` into `output_dir`. With `newest`,
/// only the first listed PDF is fetched.
///
/// # Errors
///
/// Returns [`ScrapeError`] if the listing page cannot be fetched, or if
/// `newest` is set and its download fails.
pub async fn download(
    output_dir: &Path,
    url: &str,
    newest: bool,
) -> Result<DownloadSummary, ScrapeError> {
    let downloader = PdfDownloader::new(url, output_dir)?;
    log::info!("Saving PDFs to {}", downloader.output_dir().display());
    if newest {
        downloader.download_newest().await
    } else {
        downloader.download_all().await
    }
}

/// Converts `pdf_dir` into the dataset at `output` using the real PDF
/// extractor and an optional template file.
///
/// # Errors
///
/// See [`convert_pdfs`] and [`load_parser`].
pub fn convert(
    pdf_dir: &Path,
    output: &Path,
    template: Option<&Path>,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<ConvertSummary, IngestError> {
    let parser = load_parser(template)?;
    convert_pdfs(pdf_dir, output, &parser, &PdfExtractPages, progress)
}

/// Runs the crowd-submission sync, logging a failure banner on error.
///
/// # Errors
///
/// Returns the [`SubmissionError`] that stopped the sync.
pub async fn sync(paths: &SyncPaths) -> Result<SyncSummary, SubmissionError> {
    let result = run_from_env(paths).await;
    if let Err(e) = &result {
        log::error!("{}", "=".repeat(60));
        log::error!("Sync failed: {e}");
        log::error!("{}", "=".repeat(60));
    }
    result
}

/// Builds the parser for an optional template file, falling back to the
/// built-in UCSD layout.
///
/// # Errors
///
/// Returns [`PdfError`] if the template file cannot be read or compiled.
pub fn load_parser(template: Option<&Path>) -> Result<IncidentParser, PdfError> {
    let template = match template {
        Some(path) => {
            log::info!("Using report template {}", path.display());
            ReportTemplate::load(path)?
        }
        None => ReportTemplate::default(),
    };
    IncidentParser::new(&template)
}

/// Parses a single PDF into a report dated by its filename stem.
///
/// # Errors
///
/// Returns [`PdfError`] if the text of the PDF cannot be extracted.
pub fn parse_pdf(
    path: &Path,
    parser: &IncidentParser,
    extractor: &impl PageExtractor,
) -> Result<Report, PdfError> {
    let pages = extractor.extract_pages(path)?;
    let incidents = parser.parse(&pages.text());

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let date = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let page_count = u32::try_from(pages.page_count()).unwrap_or(u32::MAX);

    Ok(Report::new(filename, date, page_count, incidents))
}

/// Lists the `*.pdf` files in `dir`, sorted by filename.
///
/// # Errors
///
/// Returns [`IngestError::PdfDir`] if the directory cannot be read.
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let io_err = |source| IngestError::PdfDir {
        path: dir.display().to_string(),
        source,
    };

    let mut pdfs = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }
    pdfs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(pdfs)
}

/// Converts every unprocessed PDF in `pdf_dir` and merges the results into
/// the dataset at `output`.
///
/// # Errors
///
/// Returns [`IngestError`] if the directory cannot be listed or the dataset
/// cannot be loaded or written. Per-file parse failures are counted in the
/// summary instead.
pub fn convert_pdfs(
    pdf_dir: &Path,
    output: &Path,
    parser: &IncidentParser,
    extractor: &impl PageExtractor,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<ConvertSummary, IngestError> {
    let mut dataset = load_dataset_or_default(output)?;
    let pdfs = list_pdfs(pdf_dir)?;
    let total = pdfs.len();

    log::info!("Found {total} PDF(s) in {}", pdf_dir.display());
    progress.set_total(total as u64);

    let mut summary = ConvertSummary::default();

    for (i, path) in pdfs.iter().enumerate() {
        let position = i + 1;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        progress.set_message(filename.clone());

        if dataset.is_processed(&filename) {
            summary.skipped += 1;
            log::info!("[{position}/{total}] SKIP {filename}");
            progress.inc(1);
            continue;
        }

        match parse_pdf(path, parser, extractor) {
            Ok(report) => {
                log::info!(
                    "[{position}/{total}] READ {filename} ({} page(s), {} incident(s))",
                    report.page_count,
                    report.incident_count()
                );
                add_document(&mut dataset, report);
                summary.new += 1;
            }
            Err(e) => {
                summary.failed += 1;
                log::warn!("[{position}/{total}] FAIL {filename}: {e}");
            }
        }
        progress.inc(1);
    }

    save_dataset(output, &dataset)?;
    summary.total_reports = dataset.reports.len();

    log::info!(
        "Completed: {} new, {} skipped, {} failed",
        summary.new,
        summary.skipped,
        summary.failed
    );
    log::info!(
        "Dataset: {} report(s), {} incident(s) -> {}",
        summary.total_reports,
        dataset.incident_total(),
        output.display()
    );
    progress.finish(format!("Converted {} PDF(s)", summary.new));

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crime_log_cli_utils::null_progress;
    use crime_log_dataset::store::load_dataset;
    use crime_log_pdf::PdfPages;

    use super::*;

    /// Serves page text by filename instead of reading real PDFs.
    #[derive(Default)]
    struct FakeExtractor {
        pages: BTreeMap<String, Vec<String>>,
    }

    impl FakeExtractor {
        fn with(mut self, filename: &str, pages: &[&str]) -> Self {
            self.pages.insert(
                filename.to_string(),
                pages.iter().map(ToString::to_string).collect(),
            );
            self
        }
    }

    impl PageExtractor for FakeExtractor {
        fn extract_pages(&self, path: &Path) -> Result<PdfPages, PdfError> {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            self.pages
                .get(&name)
                .map(|pages| PdfPages {
                    pages: pages.clone(),
                })
                .ok_or_else(|| PdfError::Extraction(format!("unreadable: {name}")))
        }
    }

    const PAGE: &str = "\
Theft
Price Center
Date Reported 1/5/2024
Incident/Case# 2401050012
Date Occurred 1/4/2024
Time Occurred 3:15 PM
Summary: Backpack taken
Disposition: Report taken";

    fn setup(name: &str, files: &[&str]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("crime_log_ingest_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("pdfs")).unwrap();
        for file in files {
            std::fs::write(dir.join("pdfs").join(file), b"%PDF").unwrap();
        }
        dir
    }

    #[test]
    fn lists_only_pdfs_in_name_order() {
        let dir = setup("list", &["b.pdf", "a.PDF", "notes.txt"]);

        let pdfs = list_pdfs(&dir.join("pdfs")).unwrap();
        let names: Vec<_> = pdfs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn converts_new_files_and_skips_processed() {
        let dir = setup("convert", &["1-5-2024.pdf", "1-6-2024.pdf"]);
        let output = dir.join("out").join("police_reports.json");
        let extractor = FakeExtractor::default()
            .with("1-5-2024.pdf", &[PAGE, "Page 2"])
            .with("1-6-2024.pdf", &[PAGE]);
        let parser = IncidentParser::default();

        let first = convert_pdfs(
            &dir.join("pdfs"),
            &output,
            &parser,
            &extractor,
            &null_progress(),
        )
        .unwrap();
        assert_eq!(first.new, 2);
        assert_eq!(first.skipped, 0);
        assert_eq!(first.total_reports, 2);

        let dataset = load_dataset(&output).unwrap();
        let report = dataset
            .reports
            .iter()
            .find(|r| r.filename == "1-5-2024.pdf")
            .unwrap();
        assert_eq!(report.date, "1-5-2024");
        assert_eq!(report.page_count, 2);
        assert_eq!(report.incident_count(), 1);
        assert_eq!(report.incidents()[0].incident_case, "2401050012");
        assert_eq!(dataset.processed_files.len(), 2);

        let second = convert_pdfs(
            &dir.join("pdfs"),
            &output,
            &parser,
            &extractor,
            &null_progress(),
        )
        .unwrap();
        assert_eq!(second.new, 0);
        assert_eq!(second.skipped, 2);
        assert_eq!(second.total_reports, 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn failed_file_is_counted_and_not_recorded() {
        let dir = setup("failure", &["good.pdf", "bad.pdf"]);
        let output = dir.join("police_reports.json");
        let extractor = FakeExtractor::default().with("good.pdf", &[PAGE]);

        let summary = convert_pdfs(
            &dir.join("pdfs"),
            &output,
            &IncidentParser::default(),
            &extractor,
            &null_progress(),
        )
        .unwrap();

        assert_eq!(summary.new, 1);
        assert_eq!(summary.failed, 1);

        let dataset = load_dataset(&output).unwrap();
        assert!(dataset.is_processed("good.pdf"));
        assert!(!dataset.is_processed("bad.pdf"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_pdf_dir_is_an_error() {
        let dir = setup("missing_dir", &[]);
        let result = convert_pdfs(
            &dir.join("nope"),
            &dir.join("police_reports.json"),
            &IncidentParser::default(),
            &FakeExtractor::default(),
            &null_progress(),
        );
        assert!(matches!(result, Err(IngestError::PdfDir { .. })));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn explicit_listing_url_wins() {
        assert_eq!(
            listing_url(Some("https://example.edu/logs".to_string())),
            "https://example.edu/logs"
        );
    }

    #[test]
    fn unknown_template_file_is_an_error() {
        assert!(load_parser(Some(Path::new("/nonexistent/template.toml"))).is_err());
        assert!(load_parser(None).is_ok());
    }
}
