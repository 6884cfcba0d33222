//! The crowd-submission sync run.
//!
//! Rows are marked processed upstream only after the merged dataset has
//! been written, and the local watermark moves only after that. A run that
//! fails part-way therefore leaves the remote rows eligible for the next
//! run.

use std::path::PathBuf;

use chrono::Utc;
use crime_log_dataset::merge::merge_by_date;
use crime_log_dataset::store::{load_dataset, load_sync_state, save_dataset, save_sync_state};
use crime_log_report_models::SyncState;

use crate::adapter::group_submissions;
use crate::{SubmissionError, SubmissionStore, SupabaseConfig, SupabaseStore};

const TOTAL_STEPS: u8 = 8;

/// Local files touched by a sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPaths {
    /// Published dataset (`police_reports.json`).
    pub reports: PathBuf,
    /// Sync watermark (`sync_state.json`).
    pub state: PathBuf,
}

impl Default for SyncPaths {
    fn default() -> Self {
        Self {
            reports: PathBuf::from("app/public/police_reports.json"),
            state: PathBuf::from("app/public/sync_state.json"),
        }
    }
}

/// Outcome of a sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Remote rows merged by this run.
    pub reports_synced: usize,
    /// Incidents added to the dataset by this run.
    pub incidents_added: usize,
    /// Watermark after the run.
    pub last_processed_id: i64,
    /// Rows merged across all runs.
    pub total_synced: u64,
}

impl SyncSummary {
    fn unchanged(state: &SyncState) -> Self {
        Self {
            last_processed_id: state.last_processed_index,
            total_synced: state.total_synced,
            ..Self::default()
        }
    }
}

fn step(n: u8, msg: &str) {
    log::info!("[Step {n}/{TOTAL_STEPS}] {msg}");
}

/// Runs a full sync against the Supabase store configured in the
/// environment.
///
/// # Errors
///
/// Returns [`SubmissionError`] if configuration is missing, the state or
/// dataset file cannot be read or written, or the remote store fails.
pub async fn run_from_env(paths: &SyncPaths) -> Result<SyncSummary, SubmissionError> {
    log::info!("{}", "=".repeat(60));
    log::info!("Starting sync of approved user reports");
    log::info!("{}", "=".repeat(60));

    step(1, "Validating configuration...");
    let config = SupabaseConfig::from_env()?;
    log::info!("Using table '{}'", config.table);

    step(2, "Loading sync state...");
    let state = load_sync_state(&paths.state)?;
    log::info!(
        "Last processed id: {} (total synced: {})",
        state.last_processed_index,
        state.total_synced
    );

    step(3, "Connecting to Supabase...");
    let store = SupabaseStore::connect(config)?;

    sync_with_store(&store, paths, state).await
}

/// Runs steps 4 through 8 of a sync against `store`, starting from `state`.
///
/// # Errors
///
/// Returns [`SubmissionError`] if the store fails or a local file cannot
/// be read or written. Nothing is marked processed unless the dataset was
/// written.
pub async fn sync_with_store<S: SubmissionStore>(
    store: &S,
    paths: &SyncPaths,
    mut state: SyncState,
) -> Result<SyncSummary, SubmissionError> {
    step(4, "Fetching approved reports...");
    let rows = store.fetch_approved(state.last_processed_index).await?;
    if rows.is_empty() {
        log::info!("No new approved reports to sync");
        return Ok(SyncSummary::unchanged(&state));
    }
    log::info!("Found {} new approved report(s)", rows.len());

    step(5, "Converting reports...");
    let groups = group_submissions(&rows);

    step(6, "Merging into dataset...");
    let mut dataset = load_dataset(&paths.reports)?;
    let incidents_added = merge_by_date(&mut dataset, groups);
    save_dataset(&paths.reports, &dataset)?;
    log::info!(
        "Saved {} report(s) to {}",
        dataset.reports.len(),
        paths.reports.display()
    );

    step(7, "Marking reports as processed...");
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    store.mark_processed(&ids).await?;

    step(8, "Updating sync state...");
    let max_id = ids.iter().copied().max().unwrap_or(state.last_processed_index);
    state.record_sync(max_id, rows.len() as u64, Utc::now());
    save_sync_state(&paths.state, &state)?;

    let summary = SyncSummary {
        reports_synced: rows.len(),
        incidents_added,
        last_processed_id: state.last_processed_index,
        total_synced: state.total_synced,
    };

    log::info!("{}", "=".repeat(60));
    log::info!("Sync completed successfully");
    log::info!("  Reports synced:    {}", summary.reports_synced);
    log::info!("  Incidents added:   {}", summary.incidents_added);
    log::info!("  Last processed id: {}", summary.last_processed_id);
    log::info!("  Total synced:      {}", summary.total_synced);
    log::info!("{}", "=".repeat(60));

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Mutex;

    use crime_log_dataset::store::load_json;
    use crime_log_report_models::{Dataset, IncidentRecord, Report};

    use super::*;
    use crate::SubmittedReport;

    /// In-memory stand-in for the remote table.
    #[derive(Default)]
    struct FakeStore {
        rows: Mutex<Vec<(SubmittedReport, bool)>>,
        marked: Mutex<Vec<i64>>,
    }

    impl FakeStore {
        fn with_rows(rows: Vec<SubmittedReport>) -> Self {
            Self {
                rows: Mutex::new(rows.into_iter().map(|r| (r, false)).collect()),
                marked: Mutex::default(),
            }
        }

        fn marked(&self) -> Vec<i64> {
            self.marked.lock().unwrap().clone()
        }
    }

    impl SubmissionStore for FakeStore {
        async fn fetch_approved(
            &self,
            after_id: i64,
        ) -> Result<Vec<SubmittedReport>, SubmissionError> {
            let rows = self.rows.lock().unwrap();
            let mut found: Vec<SubmittedReport> = rows
                .iter()
                .filter(|(r, processed)| !processed && r.id > after_id)
                .map(|(r, _)| r.clone())
                .collect();
            found.sort_by_key(|r| r.id);
            Ok(found)
        }

        async fn mark_processed(&self, ids: &[i64]) -> Result<(), SubmissionError> {
            let mut rows = self.rows.lock().unwrap();
            for (row, processed) in rows.iter_mut() {
                if ids.contains(&row.id) {
                    *processed = true;
                }
            }
            self.marked.lock().unwrap().extend_from_slice(ids);
            Ok(())
        }
    }

    fn row(id: i64, date_occurred: &str) -> SubmittedReport {
        SubmittedReport {
            id,
            incident_case: format!("U-{id}"),
            category: "Theft".to_string(),
            location: "Geisel Library".to_string(),
            date_occurred: date_occurred.to_string(),
            time_occurred: Some("14:30".to_string()),
            date_reported: date_occurred.to_string(),
            summary: "Laptop taken".to_string(),
            disposition: None,
        }
    }

    fn setup(name: &str) -> SyncPaths {
        let dir = std::env::temp_dir().join(format!("crime_log_sync_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        SyncPaths {
            reports: dir.join("police_reports.json"),
            state: dir.join("sync_state.json"),
        }
    }

    fn write_dataset(path: &Path) {
        let existing = Report::new(
            "January 5, 2024.pdf",
            "January 05, 2024",
            3,
            vec![IncidentRecord {
                incident_case: "2401050001".to_string(),
                ..IncidentRecord::default()
            }],
        );
        let mut dataset = Dataset::default();
        dataset.add_converted(existing);
        save_dataset(path, &dataset).unwrap();
    }

    fn cleanup(paths: &SyncPaths) {
        if let Some(dir) = paths.reports.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[tokio::test]
    async fn merges_marks_and_advances_watermark() {
        let paths = setup("merges");
        write_dataset(&paths.reports);
        let store = FakeStore::with_rows(vec![row(11, "2024-01-05"), row(12, "2024-01-07")]);

        let summary = sync_with_store(&store, &paths, SyncState::default())
            .await
            .unwrap();

        assert_eq!(summary.reports_synced, 2);
        assert_eq!(summary.incidents_added, 2);
        assert_eq!(summary.last_processed_id, 12);
        assert_eq!(store.marked(), vec![11, 12]);

        let dataset: Dataset = load_json(&paths.reports).unwrap();
        assert_eq!(dataset.reports.len(), 2);
        assert_eq!(dataset.reports[0].date, "January 07, 2024");
        assert_eq!(dataset.reports[0].filename, "user-submitted-2024-01-07.pdf");
        assert_eq!(dataset.reports[1].incident_count(), 2);
        assert_eq!(dataset.reports[1].incidents()[1].disposition, "Under Review");

        let state = load_sync_state(&paths.state).unwrap();
        assert_eq!(state.last_processed_index, 12);
        assert_eq!(state.total_synced, 2);
        assert!(state.last_sync_timestamp.is_some());

        cleanup(&paths);
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let paths = setup("second_run");
        write_dataset(&paths.reports);
        let store = FakeStore::with_rows(vec![row(3, "2024-01-05")]);

        sync_with_store(&store, &paths, SyncState::default())
            .await
            .unwrap();
        let before = std::fs::read_to_string(&paths.reports).unwrap();

        let state = load_sync_state(&paths.state).unwrap();
        let summary = sync_with_store(&store, &paths, state).await.unwrap();

        assert_eq!(summary.reports_synced, 0);
        assert_eq!(summary.last_processed_id, 3);
        assert_eq!(summary.total_synced, 1);
        assert_eq!(std::fs::read_to_string(&paths.reports).unwrap(), before);
        assert_eq!(store.marked(), vec![3]);

        cleanup(&paths);
    }

    #[tokio::test]
    async fn rows_at_or_below_watermark_are_ignored() {
        let paths = setup("watermark");
        write_dataset(&paths.reports);
        let store = FakeStore::with_rows(vec![row(4, "2024-01-05"), row(9, "2024-01-05")]);
        let state = SyncState {
            last_processed_index: 5,
            ..SyncState::default()
        };

        let summary = sync_with_store(&store, &paths, state).await.unwrap();

        assert_eq!(summary.reports_synced, 1);
        assert_eq!(store.marked(), vec![9]);

        cleanup(&paths);
    }

    #[tokio::test]
    async fn missing_dataset_leaves_rows_unmarked() {
        let paths = setup("missing_dataset");
        let store = FakeStore::with_rows(vec![row(1, "2024-01-05")]);

        let result = sync_with_store(&store, &paths, SyncState::default()).await;

        assert!(matches!(result, Err(SubmissionError::Dataset(_))));
        assert!(store.marked().is_empty());
        assert!(!paths.state.exists());

        cleanup(&paths);
    }
}
