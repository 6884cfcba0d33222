#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Discovery and download of police-log PDFs.
//!
//! [`PdfDownloader`] fetches the department's listing page, extracts the
//! PDF links ([`listing`]), and saves each one into a local directory.
//! Files already present locally are skipped, so repeated runs only
//! download new logs. A failed download is logged and counted without
//! stopping the rest of the run.

pub mod listing;

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;

pub use listing::{PdfLink, parse_listing};

/// Listing page for the UCSD Police "Calls and Arrests" logs.
pub const DEFAULT_LISTING_URL: &str =
    "https://www.police.ucsd.edu/docs/reports/callsandarrests/Calls_and_Arrests.asp";

/// Per-request timeout for the listing page and each PDF.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur during scraping operations.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// An HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Parsing the listing page or a URL failed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of a download run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// Downloads police-log PDFs listed on a web page into a directory.
#[derive(Debug)]
pub struct PdfDownloader {
    client: reqwest::Client,
    listing_url: Url,
    output_dir: PathBuf,
}

impl PdfDownloader {
    /// Creates a downloader for `listing_url` writing into `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Parse`] if `listing_url` is not a valid URL,
    /// or [`ScrapeError::Http`] if the HTTP client cannot be built.
    pub fn new(listing_url: &str, output_dir: &Path) -> Result<Self, ScrapeError> {
        let listing_url = Url::parse(listing_url)
            .map_err(|e| ScrapeError::Parse(format!("invalid listing URL '{listing_url}': {e}")))?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("crime_log/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            listing_url,
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Directory PDFs are saved into.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Fetches the listing page and returns every PDF link on it.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if the page cannot be fetched or parsed.
    pub async fn discover(&self) -> Result<Vec<PdfLink>, ScrapeError> {
        log::info!("Fetching listing page {}", self.listing_url);
        let body = self
            .client
            .get(self.listing_url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_listing(&body, &self.listing_url)
    }

    /// Downloads every listed PDF that is not already present locally.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if the output directory cannot be created or
    /// the listing page cannot be fetched. Individual download failures are
    /// counted in the summary instead.
    pub async fn download_all(&self) -> Result<DownloadSummary, ScrapeError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let links = self.discover().await?;
        let total = links.len();
        let mut summary = DownloadSummary::default();

        for (i, link) in links.iter().enumerate() {
            let position = i + 1;
            if self.is_downloaded(link) {
                summary.skipped += 1;
                log::info!("[{position}/{total}] SKIP {}", link.filename);
                continue;
            }

            match self.download(link).await {
                Ok(bytes) => {
                    summary.downloaded += 1;
                    log::info!("[{position}/{total}] SAVE {} ({bytes} bytes)", link.filename);
                }
                Err(e) => {
                    summary.failed += 1;
                    log::warn!("[{position}/{total}] FAIL {}: {e}", link.filename);
                }
            }
        }

        log::info!(
            "Completed: {} downloaded, {} skipped, {} failed",
            summary.downloaded,
            summary.skipped,
            summary.failed
        );
        log::info!("Output: {}", self.output_dir.display());

        Ok(summary)
    }

    /// Downloads only the first (newest) listed PDF, unless it is already
    /// present locally.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if the listing page cannot be fetched or the
    /// download fails.
    pub async fn download_newest(&self) -> Result<DownloadSummary, ScrapeError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let links = self.discover().await?;

        let Some(link) = links.first() else {
            log::warn!("No PDFs listed on {}", self.listing_url);
            return Ok(DownloadSummary::default());
        };

        if self.is_downloaded(link) {
            log::info!("Latest PDF already exists: {}", link.filename);
            return Ok(DownloadSummary {
                skipped: 1,
                ..DownloadSummary::default()
            });
        }

        let bytes = self.download(link).await?;
        log::info!("Downloaded newest PDF: {} ({bytes} bytes)", link.filename);

        Ok(DownloadSummary {
            downloaded: 1,
            ..DownloadSummary::default()
        })
    }

    fn is_downloaded(&self, link: &PdfLink) -> bool {
        self.output_dir.join(&link.filename).exists()
    }

    /// Downloads one PDF, writing through a temporary file so a partial
    /// download never looks complete.
    async fn download(&self, link: &PdfLink) -> Result<usize, ScrapeError> {
        let bytes = self
            .client
            .get(link.url.clone())
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let path = self.output_dir.join(&link.filename);
        let tmp = self.output_dir.join(format!("{}.part", link.filename));
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        Ok(bytes.len())
    }
}
