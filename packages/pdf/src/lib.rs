#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident record extraction from police-log PDFs.
//!
//! The UCSD Police Department publishes its daily crime and fire log only
//! as PDFs. Extracted page text is an unstructured stream of lines, so
//! records are recovered in two steps:
//!
//! 1. [`boundary`] finds every line containing the anchor phrase
//!    (`"Date Reported"`) and splits the document into record spans.
//! 2. [`fields`] recovers the eight incident fields from each span using
//!    caption lookback and the label table in a [`ReportTemplate`].
//!
//! The primary entry point is [`IncidentParser`]. Page text comes from a
//! [`PageExtractor`], by default [`PdfExtractPages`].

pub mod boundary;
pub mod extract;
pub mod fields;
pub mod template;

use crime_log_report_models::{IncidentField, IncidentRecord};

pub use extract::{PageExtractor, PdfExtractPages, PdfPages};
pub use template::{CompiledTemplate, FieldRule, ReportTemplate};

/// Errors specific to PDF extraction.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// PDF text extraction failed.
    #[error("PDF extraction error: {0}")]
    Extraction(String),

    /// The report template is invalid.
    #[error("Invalid report template: {0}")]
    Template(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parses police-log text into incident records.
#[derive(Debug, Clone, Default)]
pub struct IncidentParser {
    template: CompiledTemplate,
}

impl IncidentParser {
    /// Creates a parser for `template`.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::Template`] if the template does not compile.
    pub fn new(template: &ReportTemplate) -> Result<Self, PdfError> {
        Ok(Self {
            template: template.compile()?,
        })
    }

    /// Parses every record in `text`.
    ///
    /// Text without any anchor phrase yields an empty list. The result
    /// depends only on `text`.
    #[must_use]
    pub fn parse(&self, text: &str) -> Vec<IncidentRecord> {
        let lines = boundary::split_lines(text);
        let spans = boundary::record_spans(&lines, self.template.anchor());

        log::debug!("Found {} record anchor(s) in {} lines", spans.len(), lines.len());

        spans
            .into_iter()
            .map(|span| {
                let start = span.start;
                let record = fields::extract_record(&lines, span, &self.template);
                log_missing_fields(&record, start);
                record
            })
            .collect()
    }
}

/// Fields `record` left empty, in serialization order.
fn missing_fields(record: &IncidentRecord) -> Vec<IncidentField> {
    IncidentField::all()
        .iter()
        .copied()
        .filter(|field| record.get(*field).is_empty())
        .collect()
}

/// Logs which fields a record left empty, so template drift shows up in
/// debug output.
fn log_missing_fields(record: &IncidentRecord, line: usize) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    let missing = missing_fields(record);
    if !missing.is_empty() {
        let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
        log::debug!("Record at line {line} has no {}", names.join(", "));
    }
}
