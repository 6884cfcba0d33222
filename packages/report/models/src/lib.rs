#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident, report, and dataset types for the crime log.
//!
//! Every source (parsed police-log PDFs, crowd-submitted reports) produces
//! [`IncidentRecord`] values. Records are grouped into [`Report`]s, one per
//! source document or per day, and the published [`Dataset`] holds all
//! reports plus the ledger of PDF filenames that have already been
//! converted. [`SyncState`] is the watermark for the crowd-submission sync.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The eight named fields of an [`IncidentRecord`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IncidentField {
    /// Short incident-type label (e.g. "ROBBERY")
    Category,
    /// Free-text location (e.g. "Library Walk")
    Location,
    /// Date the incident was reported, `MM/DD/YYYY`
    DateReported,
    /// Case identifier (e.g. "24-0001")
    IncidentCase,
    /// Date the incident occurred, `MM/DD/YYYY`
    DateOccurred,
    /// Time-of-day descriptor
    TimeOccurred,
    /// Free-text narrative
    Summary,
    /// Outcome or status label
    Disposition,
}

impl IncidentField {
    /// Returns every field in serialization order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Category,
            Self::Location,
            Self::DateReported,
            Self::IncidentCase,
            Self::DateOccurred,
            Self::TimeOccurred,
            Self::Summary,
            Self::Disposition,
        ]
    }
}

/// One crime incident, either parsed from a police log or submitted by a
/// user.
///
/// Every field is always present. An empty string means the value was
/// absent or could not be recovered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentRecord {
    pub category: String,
    pub location: String,
    pub date_reported: String,
    pub incident_case: String,
    pub date_occurred: String,
    pub time_occurred: String,
    pub summary: String,
    pub disposition: String,
}

impl IncidentRecord {
    /// Returns the value of `field`.
    #[must_use]
    pub fn get(&self, field: IncidentField) -> &str {
        match field {
            IncidentField::Category => &self.category,
            IncidentField::Location => &self.location,
            IncidentField::DateReported => &self.date_reported,
            IncidentField::IncidentCase => &self.incident_case,
            IncidentField::DateOccurred => &self.date_occurred,
            IncidentField::TimeOccurred => &self.time_occurred,
            IncidentField::Summary => &self.summary,
            IncidentField::Disposition => &self.disposition,
        }
    }

    /// Overwrites the value of `field`.
    pub fn set(&mut self, field: IncidentField, value: impl Into<String>) {
        let slot = match field {
            IncidentField::Category => &mut self.category,
            IncidentField::Location => &mut self.location,
            IncidentField::DateReported => &mut self.date_reported,
            IncidentField::IncidentCase => &mut self.incident_case,
            IncidentField::DateOccurred => &mut self.date_occurred,
            IncidentField::TimeOccurred => &mut self.time_occurred,
            IncidentField::Summary => &mut self.summary,
            IncidentField::Disposition => &mut self.disposition,
        };
        *slot = value.into();
    }
}

/// One source document's (or one day's) worth of incidents.
///
/// `incident_count` is derived from `incidents` and kept in sync by every
/// mutating method. Deserialization recomputes it, so a stale count in a
/// hand-edited file never survives a load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ReportFile")]
pub struct Report {
    /// Source filename (`2024-01-05.pdf`, `user-submitted-2024-01-05.pdf`).
    pub filename: String,
    /// Display date. `"Month DD, YYYY"` for merged reports, the filename
    /// stem for PDF-derived ones.
    pub date: String,
    /// Number of pages in the source document.
    pub page_count: u32,
    incident_count: usize,
    incidents: Vec<IncidentRecord>,
}

impl Report {
    /// Creates a report wrapping `incidents`.
    #[must_use]
    pub fn new(
        filename: impl Into<String>,
        date: impl Into<String>,
        page_count: u32,
        incidents: Vec<IncidentRecord>,
    ) -> Self {
        Self {
            filename: filename.into(),
            date: date.into(),
            page_count,
            incident_count: incidents.len(),
            incidents,
        }
    }

    /// Number of incidents in this report.
    #[must_use]
    pub const fn incident_count(&self) -> usize {
        self.incident_count
    }

    /// The incidents in source order.
    #[must_use]
    pub fn incidents(&self) -> &[IncidentRecord] {
        &self.incidents
    }

    /// Appends `incidents` and recomputes the count.
    pub fn extend_incidents(&mut self, incidents: impl IntoIterator<Item = IncidentRecord>) {
        self.incidents.extend(incidents);
        self.incident_count = self.incidents.len();
    }
}

/// On-disk shape of a [`Report`], used only to recompute the count.
#[derive(Deserialize)]
struct ReportFile {
    #[serde(default)]
    filename: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    page_count: u32,
    #[serde(default)]
    incidents: Vec<IncidentRecord>,
}

impl From<ReportFile> for Report {
    fn from(value: ReportFile) -> Self {
        Self::new(value.filename, value.date, value.page_count, value.incidents)
    }
}

/// The published collection of reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    /// Reports, kept sorted by date descending after a merge.
    #[serde(default)]
    pub reports: Vec<Report>,
    /// Filenames already converted into reports.
    #[serde(default)]
    pub processed_files: Vec<String>,
}

impl Dataset {
    /// Returns `true` if `filename` has already been converted.
    #[must_use]
    pub fn is_processed(&self, filename: &str) -> bool {
        self.processed_files.iter().any(|f| f == filename)
    }

    /// Appends a converted report and records its filename in the ledger.
    pub fn add_converted(&mut self, report: Report) {
        if !self.is_processed(&report.filename) {
            self.processed_files.push(report.filename.clone());
        }
        self.reports.push(report);
    }

    /// Total number of incidents across all reports.
    #[must_use]
    pub fn incident_total(&self) -> usize {
        self.reports.iter().map(Report::incident_count).sum()
    }
}

/// Watermark for the crowd-submission sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// Highest remote row id merged so far.
    #[serde(default)]
    pub last_processed_index: i64,
    /// When the last successful sync finished.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_sync_timestamp: Option<DateTime<Utc>>,
    /// Running count of rows merged across all syncs.
    #[serde(default)]
    pub total_synced: u64,
}

impl SyncState {
    /// Advances the watermark after `count` rows up to `max_id` were merged.
    pub fn record_sync(&mut self, max_id: i64, count: u64, now: DateTime<Utc>) {
        self.last_processed_index = self.last_processed_index.max(max_id);
        self.last_sync_timestamp = Some(now);
        self.total_synced += count;
    }
}

/// Reads an ISO-8601 timestamp. A blank value is `None`, and a value
/// without an offset is taken as UTC.
fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Some(naive.and_utc()))
        .ok_or_else(|| {
            serde::de::Error::custom(format!("invalid last_sync_timestamp '{raw}'"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incident(case: &str) -> IncidentRecord {
        IncidentRecord {
            incident_case: case.to_string(),
            ..IncidentRecord::default()
        }
    }

    #[test]
    fn incident_serializes_all_eight_keys() {
        let value = serde_json::to_value(IncidentRecord::default()).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 8);
        for field in IncidentField::all() {
            assert_eq!(obj[field.as_ref()], "");
        }
    }

    #[test]
    fn incident_missing_keys_default_to_empty() {
        let record: IncidentRecord =
            serde_json::from_str(r#"{"category": "THEFT", "summary": "Bike taken"}"#).unwrap();
        assert_eq!(record.category, "THEFT");
        assert_eq!(record.summary, "Bike taken");
        assert_eq!(record.disposition, "");
    }

    #[test]
    fn get_and_set_address_the_same_slot() {
        let mut record = IncidentRecord::default();
        for field in IncidentField::all() {
            record.set(*field, field.to_string());
        }
        for field in IncidentField::all() {
            assert_eq!(record.get(*field), field.as_ref());
        }
    }

    #[test]
    fn extend_incidents_recomputes_count() {
        let mut report = Report::new("a.pdf", "a", 1, vec![incident("1")]);
        report.extend_incidents(vec![incident("2"), incident("3")]);
        assert_eq!(report.incident_count(), 3);
        assert_eq!(report.incidents().len(), 3);
    }

    #[test]
    fn stale_incident_count_is_recomputed_on_load() {
        let json = r#"{
            "filename": "x.pdf",
            "date": "x",
            "page_count": 2,
            "incident_count": 99,
            "incidents": [{"incident_case": "1"}]
        }"#;
        let report: Report = serde_json::from_str(json).unwrap();
        assert_eq!(report.incident_count(), 1);
        assert_eq!(report.page_count, 2);
    }

    #[test]
    fn add_converted_records_filename_once() {
        let mut dataset = Dataset::default();
        dataset.add_converted(Report::new("a.pdf", "a", 1, vec![incident("1")]));
        assert!(dataset.is_processed("a.pdf"));
        assert!(!dataset.is_processed("b.pdf"));
        assert_eq!(dataset.processed_files, vec!["a.pdf".to_string()]);
        assert_eq!(dataset.incident_total(), 1);
    }

    #[test]
    fn record_sync_advances_watermark() {
        let mut state = SyncState {
            last_processed_index: 10,
            last_sync_timestamp: None,
            total_synced: 4,
        };
        let now = Utc::now();
        state.record_sync(15, 3, now);
        assert_eq!(state.last_processed_index, 15);
        assert_eq!(state.total_synced, 7);
        assert_eq!(state.last_sync_timestamp, Some(now));
    }

    #[test]
    fn sync_state_accepts_offset_timestamps() {
        let state: SyncState = serde_json::from_str(
            r#"{"last_processed_index": 3,
                "last_sync_timestamp": "2025-01-02T03:04:05.123456+00:00",
                "total_synced": 3}"#,
        )
        .unwrap();
        assert_eq!(state.last_processed_index, 3);
        assert!(state.last_sync_timestamp.is_some());
    }

    #[test]
    fn sync_state_tolerates_blank_and_naive_timestamps() {
        let blank: SyncState =
            serde_json::from_str(r#"{"last_processed_index": 1, "last_sync_timestamp": ""}"#)
                .unwrap();
        assert_eq!(blank.last_sync_timestamp, None);

        let null: SyncState =
            serde_json::from_str(r#"{"last_processed_index": 1, "last_sync_timestamp": null}"#)
                .unwrap();
        assert_eq!(null.last_sync_timestamp, None);

        let naive: SyncState = serde_json::from_str(
            r#"{"last_processed_index": 1, "last_sync_timestamp": "2025-01-02T03:04:05"}"#,
        )
        .unwrap();
        assert_eq!(
            naive.last_sync_timestamp.map(|ts| ts.to_rfc3339()),
            Some("2025-01-02T03:04:05+00:00".to_string())
        );

        let garbage: Result<SyncState, _> =
            serde_json::from_str(r#"{"last_sync_timestamp": "yesterday"}"#);
        assert!(garbage.is_err());
    }
}
