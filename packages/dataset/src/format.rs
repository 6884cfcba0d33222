//! Date and time display formatting.
//!
//! Crowd-submitted rows carry ISO dates (`YYYY-MM-DD`) and 24-hour times
//! (`HH:MM[:SS]`); the published dataset uses `MM/DD/YYYY`, `H:MM AM/PM`,
//! and `Month DD, YYYY` report titles. Every formatter falls back to its
//! raw input on failure and logs a warning instead of failing the run.

use chrono::{NaiveDate, NaiveTime};

const ISO_DATE: &str = "%Y-%m-%d";
const REPORT_DATE: &str = "%B %d, %Y";

/// `2024-01-05` → `01/05/2024`.
#[must_use]
pub fn format_incident_date(raw: &str) -> String {
    match NaiveDate::parse_from_str(raw.trim(), ISO_DATE) {
        Ok(date) => date.format("%m/%d/%Y").to_string(),
        Err(e) => {
            log::warn!("Invalid date format: {raw} - {e}");
            raw.to_owned()
        }
    }
}

/// `2024-01-05` → `January 05, 2024`.
#[must_use]
pub fn format_report_date(raw: &str) -> String {
    match NaiveDate::parse_from_str(raw.trim(), ISO_DATE) {
        Ok(date) => date.format(REPORT_DATE).to_string(),
        Err(e) => {
            log::warn!("Invalid date format: {raw} - {e}");
            raw.to_owned()
        }
    }
}

/// `14:30[:00]` → `2:30 PM`. Absent or empty input yields an empty string.
#[must_use]
pub fn format_time(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return String::new();
    };

    let parsed = NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"));

    match parsed {
        Ok(time) => time.format("%-I:%M %p").to_string(),
        Err(e) => {
            log::warn!("Invalid time format: {raw} - {e}");
            raw.to_owned()
        }
    }
}

/// Parses a report's display date for sorting.
///
/// Only the first three whitespace-separated tokens are considered, so
/// titles like `"January 05, 2024 (revised)"` still sort by their date.
/// Returns `None` for anything else.
#[must_use]
pub fn parse_report_date(date: &str) -> Option<NaiveDate> {
    let head = date.split_whitespace().take(3).collect::<Vec<_>>().join(" ");
    match NaiveDate::parse_from_str(&head, REPORT_DATE) {
        Ok(date) => Some(date),
        Err(e) => {
            log::warn!("Could not parse report date '{date}': {e}");
            None
        }
    }
}
