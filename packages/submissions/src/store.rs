//! Remote store for crowd-submitted reports.
//!
//! # Environment Variables
//!
//! | Variable | Required | Description |
//! |---|---|---|
//! | `SUPABASE_URL` | Yes | Project URL (e.g. `https://abc.supabase.co`) |
//! | `SUPABASE_KEY` | Yes | API key sent as `apikey` and bearer token |
//! | `CRIME_LOG_REPORTS_TABLE` | No | Table name (default `user_reports`) |

use std::future::Future;
use std::time::Duration;

use crate::{SubmissionError, SubmittedReport};

/// Default table holding user submissions.
pub const DEFAULT_TABLE: &str = "user_reports";

/// Access to approved, not-yet-processed submissions.
pub trait SubmissionStore: Send + Sync {
    /// Returns rows with `status = approved`, `processed = false`, and
    /// `id > after_id`, ordered by ascending id.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError`] if the store cannot be queried.
    fn fetch_approved(
        &self,
        after_id: i64,
    ) -> impl Future<Output = Result<Vec<SubmittedReport>, SubmissionError>> + Send;

    /// Sets `processed = true` on every row in `ids`.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError`] if the update fails.
    fn mark_processed(
        &self,
        ids: &[i64],
    ) -> impl Future<Output = Result<(), SubmissionError>> + Send;
}

/// Connection settings for the Supabase REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    pub key: String,
    pub table: String,
}

impl SupabaseConfig {
    /// Reads the configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::MissingEnv`] if `SUPABASE_URL` or
    /// `SUPABASE_KEY` is unset or empty.
    pub fn from_env() -> Result<Self, SubmissionError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::MissingEnv`] if `SUPABASE_URL` or
    /// `SUPABASE_KEY` is missing or blank.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SubmissionError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &str| {
            var(name).ok_or_else(|| SubmissionError::MissingEnv {
                name: name.to_string(),
            })
        };

        Ok(Self {
            url: required("SUPABASE_URL")?,
            key: required("SUPABASE_KEY")?,
            table: var("CRIME_LOG_REPORTS_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
        })
    }

    /// PostgREST endpoint for the configured table.
    #[must_use]
    pub fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url.trim_end_matches('/'), self.table)
    }
}

/// [`SubmissionStore`] backed by Supabase's PostgREST API.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: reqwest::Client,
    config: SupabaseConfig,
}

impl SupabaseStore {
    /// Builds an HTTP client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::Http`] if the client cannot be built.
    pub fn connect(config: SupabaseConfig) -> Result<Self, SubmissionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        log::info!("Connected to Supabase at {}", config.url);
        Ok(Self { client, config })
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.config.table_url())
            .header("apikey", &self.config.key)
            .bearer_auth(&self.config.key)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, SubmissionError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SubmissionError::Status { status, body })
    }
}

impl SubmissionStore for SupabaseStore {
    async fn fetch_approved(&self, after_id: i64) -> Result<Vec<SubmittedReport>, SubmissionError> {
        let after = format!("gt.{after_id}");
        let response = self
            .request(reqwest::Method::GET)
            .query(&[
                ("select", "*"),
                ("status", "eq.approved"),
                ("processed", "eq.false"),
                ("id", after.as_str()),
                ("order", "id.asc"),
            ])
            .send()
            .await?;
        let body = Self::check(response).await?.text().await?;
        let reports: Vec<SubmittedReport> = serde_json::from_str(&body)?;

        log::info!("Fetched {} approved report(s) from Supabase", reports.len());
        Ok(reports)
    }

    async fn mark_processed(&self, ids: &[i64]) -> Result<(), SubmissionError> {
        if ids.is_empty() {
            return Ok(());
        }

        let id_list = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let filter = format!("in.({id_list})");

        let response = self
            .request(reqwest::Method::PATCH)
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({ "processed": true }))
            .send()
            .await?;
        Self::check(response).await?;

        log::info!("Marked {} report(s) as processed in Supabase", ids.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_url_tolerates_trailing_slash() {
        let config = SupabaseConfig {
            url: "https://abc.supabase.co/".to_string(),
            key: "k".to_string(),
            table: DEFAULT_TABLE.to_string(),
        };
        assert_eq!(
            config.table_url(),
            "https://abc.supabase.co/rest/v1/user_reports"
        );
    }

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn missing_credentials_are_reported_by_name() {
        let result =
            SupabaseConfig::from_lookup(lookup(&[("SUPABASE_URL", "https://abc.supabase.co")]));
        assert!(matches!(
            result,
            Err(SubmissionError::MissingEnv { ref name }) if name == "SUPABASE_KEY"
        ));

        let result =
            SupabaseConfig::from_lookup(lookup(&[("SUPABASE_URL", "  "), ("SUPABASE_KEY", "k")]));
        assert!(matches!(
            result,
            Err(SubmissionError::MissingEnv { ref name }) if name == "SUPABASE_URL"
        ));
    }

    #[test]
    fn table_defaults_when_unset() {
        let config = SupabaseConfig::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://abc.supabase.co"),
            ("SUPABASE_KEY", "k"),
        ]))
        .unwrap();
        assert_eq!(config.table, DEFAULT_TABLE);

        let config = SupabaseConfig::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://abc.supabase.co"),
            ("SUPABASE_KEY", "k"),
            ("CRIME_LOG_REPORTS_TABLE", "reports_v2"),
        ]))
        .unwrap();
        assert_eq!(config.table, "reports_v2");
    }
}
