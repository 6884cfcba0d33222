#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crowd-submitted incident reports.
//!
//! Users submit incidents through the web app; moderators approve them in
//! a Supabase table. [`sync`] pulls approved rows newer than the local
//! watermark, converts them into incident records ([`adapter`]), merges
//! them into the published dataset, and only then marks the rows processed
//! upstream. The remote table sits behind the [`SubmissionStore`] trait.

pub mod adapter;
pub mod store;
pub mod sync;

use serde::{Deserialize, Deserializer};

pub use store::{SubmissionStore, SupabaseConfig, SupabaseStore};
pub use sync::{SyncPaths, SyncSummary};

/// Errors that can occur while syncing crowd-submitted reports.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    /// A required environment variable is missing or empty.
    #[error("Missing environment variable: {name}")]
    MissingEnv {
        /// Name of the missing environment variable.
        name: String,
    },

    /// An HTTP request to the remote store failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote store answered with a non-success status.
    #[error("Remote store returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: reqwest::StatusCode,
        /// Response body, for diagnostics.
        body: String,
    },

    /// A remote row could not be decoded.
    #[error("Invalid remote response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Reading or writing a local dataset file failed.
    #[error(transparent)]
    Dataset(#[from] crime_log_dataset::DatasetError),
}

/// One approved row from the `user_reports` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmittedReport {
    pub id: i64,
    #[serde(deserialize_with = "null_as_empty")]
    pub incident_case: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub category: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub location: String,
    /// `YYYY-MM-DD`
    #[serde(deserialize_with = "null_as_empty")]
    pub date_occurred: String,
    /// `HH:MM[:SS]`
    #[serde(default)]
    pub time_occurred: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(deserialize_with = "null_as_empty")]
    pub date_reported: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub summary: String,
    #[serde(default)]
    pub disposition: Option<String>,
}

/// Required text columns must be present, but a SQL `NULL` reads as empty.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
