//! Converts remote rows into dataset incidents.

use crime_log_dataset::format::{format_incident_date, format_time};
use crime_log_dataset::merge::{DateGroup, group_by_date};
use crime_log_report_models::IncidentRecord;

use crate::SubmittedReport;

/// Disposition given to submissions that do not carry one.
pub const DEFAULT_DISPOSITION: &str = "Under Review";

/// Builds the incident record for one submitted row.
#[must_use]
pub fn to_incident(report: &SubmittedReport) -> IncidentRecord {
    let disposition = report
        .disposition
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_DISPOSITION);

    IncidentRecord {
        category: report.category.clone(),
        location: report.location.clone(),
        date_reported: format_incident_date(&report.date_reported),
        incident_case: report.incident_case.clone(),
        date_occurred: format_incident_date(&report.date_occurred),
        time_occurred: format_time(report.time_occurred.as_deref()),
        summary: report.summary.clone(),
        disposition: disposition.to_owned(),
    }
}

/// Converts rows and groups them by their raw `date_occurred`.
#[must_use]
pub fn group_submissions(reports: &[SubmittedReport]) -> Vec<DateGroup> {
    group_by_date(
        reports
            .iter()
            .map(|r| (r.date_occurred.clone(), to_incident(r))),
    )
}
