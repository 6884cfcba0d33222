#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The published crime-log dataset.
//!
//! - [`store`] loads and atomically saves `police_reports.json` and
//!   `sync_state.json`.
//! - [`merge`] folds new incidents into the report list and keeps it
//!   sorted newest first.
//! - [`format`] converts crowd-submitted dates and times into the display
//!   formats the dataset uses.

pub mod format;
pub mod merge;
pub mod store;

/// Errors that can occur while reading or writing dataset files.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// The file does not exist.
    #[error("File not found: {path}")]
    NotFound {
        /// Path that was requested.
        path: String,
    },

    /// Reading or writing the file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid JSON of the expected shape.
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        /// Path that caused the error.
        path: String,
        /// Underlying serde error.
        source: serde_json::Error,
    },
}
