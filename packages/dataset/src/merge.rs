//! Report merge engine.
//!
//! Both sources feed the dataset through this module: converted PDFs are
//! added whole with [`add_document`], crowd-submitted incidents are folded
//! into per-day reports with [`merge_by_date`]. Either way the report list
//! is re-sorted newest first afterwards, with undated reports last.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use crime_log_report_models::{Dataset, IncidentRecord, Report};

use crate::format::{format_report_date, parse_report_date};

/// Incidents sharing one raw occurrence date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateGroup {
    /// Occurrence date in its source representation (`YYYY-MM-DD`).
    pub date: String,
    pub incidents: Vec<IncidentRecord>,
}

/// Groups `(raw date, incident)` pairs by date, keeping the order in which
/// each date was first seen.
#[must_use]
pub fn group_by_date(items: impl IntoIterator<Item = (String, IncidentRecord)>) -> Vec<DateGroup> {
    let mut groups: Vec<DateGroup> = Vec::new();
    let mut index: BTreeMap<String, usize> = BTreeMap::new();

    for (date, incident) in items {
        if let Some(&i) = index.get(&date) {
            groups[i].incidents.push(incident);
        } else {
            index.insert(date.clone(), groups.len());
            groups.push(DateGroup {
                date,
                incidents: vec![incident],
            });
        }
    }

    log::info!("Grouped reports into {} date(s)", groups.len());
    groups
}

/// Filename given to a report synthesized for crowd-submitted incidents.
#[must_use]
pub fn submitted_report_filename(raw_date: &str) -> String {
    format!("user-submitted-{raw_date}.pdf")
}

/// Folds each group into the report whose display date matches, or into a
/// new single-page report, then re-sorts. Returns the number of incidents
/// added.
pub fn merge_by_date(dataset: &mut Dataset, groups: Vec<DateGroup>) -> usize {
    let mut added = 0;

    for group in groups {
        let display_date = format_report_date(&group.date);
        let count = group.incidents.len();

        if let Some(existing) = dataset.reports.iter_mut().find(|r| r.date == display_date) {
            log::info!(
                "  Adding {count} incident(s) to existing report for {}",
                group.date
            );
            existing.extend_incidents(group.incidents);
        } else {
            log::info!(
                "  Creating new report for {} with {count} incident(s)",
                group.date
            );
            dataset.reports.push(Report::new(
                submitted_report_filename(&group.date),
                display_date,
                1,
                group.incidents,
            ));
        }

        added += count;
    }

    sort_reports(&mut dataset.reports);

    log::info!("Added {added} total incident(s) to dataset");
    added
}

/// Adds a converted document, records its filename in the ledger, and
/// re-sorts.
pub fn add_document(dataset: &mut Dataset, report: Report) {
    dataset.add_converted(report);
    sort_reports(&mut dataset.reports);
}

/// Sorts reports by display date, newest first. Reports whose date cannot
/// be parsed keep their relative order and go last.
pub fn sort_reports(reports: &mut [Report]) {
    reports.sort_by_cached_key(|r| Reverse(parse_report_date(&r.date)));
}
