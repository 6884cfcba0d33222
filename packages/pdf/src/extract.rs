//! Page text extraction.
//!
//! [`PageExtractor`] is the seam between the parser and the PDF library so
//! the ingestion driver can be exercised without real PDF files.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use crate::PdfError;

/// Text of one PDF, one string per page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfPages {
    pub pages: Vec<String>,
}

impl PdfPages {
    /// Number of pages.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Concatenates all pages, each followed by a newline.
    #[must_use]
    pub fn text(&self) -> String {
        let mut text = String::with_capacity(self.pages.iter().map(|p| p.len() + 1).sum());
        for page in &self.pages {
            text.push_str(page);
            text.push('\n');
        }
        text
    }
}

/// Produces per-page text for a PDF file.
pub trait PageExtractor {
    /// Extracts the text of every page of the PDF at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] if the file cannot be read or is not a usable
    /// PDF.
    fn extract_pages(&self, path: &Path) -> Result<PdfPages, PdfError>;
}

/// [`PageExtractor`] backed by the pure-Rust [`pdf_extract`] crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractPages;

impl PageExtractor for PdfExtractPages {
    fn extract_pages(&self, path: &Path) -> Result<PdfPages, PdfError> {
        let bytes = std::fs::read(path)?;

        log::debug!("Read {} bytes from {}", bytes.len(), path.display());

        // pdf_extract panics on some malformed documents instead of
        // returning an error.
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(&bytes)
        }));

        let pages = match result {
            Ok(Ok(pages)) => pages,
            Ok(Err(e)) => {
                return Err(PdfError::Extraction(format!(
                    "failed to extract text from {}: {e}",
                    path.display()
                )));
            }
            Err(_) => {
                return Err(PdfError::Extraction(format!(
                    "PDF extraction panicked on {} (malformed document)",
                    path.display()
                )));
            }
        };

        log::debug!("Extracted {} page(s) from {}", pages.len(), path.display());

        Ok(PdfPages { pages })
    }
}
