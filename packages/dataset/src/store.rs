//! JSON persistence for the dataset and the sync state.
//!
//! Both files are read whole at the start of a run and rewritten whole at
//! the end. Writes go to a sibling `.tmp` file that is then renamed over
//! the target, so an interrupted run leaves the previous file intact.

use std::path::Path;

use crime_log_report_models::{Dataset, SyncState};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::DatasetError;

/// Reads and deserializes a JSON file.
///
/// # Errors
///
/// Returns [`DatasetError::NotFound`] if the file does not exist,
/// [`DatasetError::Io`] if it cannot be read, or [`DatasetError::Json`] if
/// it is not valid JSON of the expected shape.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, DatasetError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DatasetError::NotFound {
                path: path.display().to_string(),
            }
        } else {
            DatasetError::Io {
                path: path.display().to_string(),
                source: e,
            }
        }
    })?;

    let value = serde_json::from_str(&text).map_err(|e| DatasetError::Json {
        path: path.display().to_string(),
        source: e,
    })?;

    log::info!("Loaded {}", path.display());
    Ok(value)
}

/// Serializes `value` as pretty-printed JSON and atomically replaces
/// `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`DatasetError::Io`] if the file cannot be written or renamed,
/// or [`DatasetError::Json`] if serialization fails.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), DatasetError> {
    let io_err = |source| DatasetError::Io {
        path: path.display().to_string(),
        source,
    };

    let json = serde_json::to_string_pretty(value).map_err(|e| DatasetError::Json {
        path: path.display().to_string(),
        source: e,
    })?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    std::fs::write(&tmp, json).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)?;

    log::info!("Saved {}", path.display());
    Ok(())
}

/// Loads the dataset at `path`.
///
/// # Errors
///
/// See [`load_json`]. A missing file is an error.
pub fn load_dataset(path: &Path) -> Result<Dataset, DatasetError> {
    load_json(path)
}

/// Loads the dataset at `path`, starting from an empty dataset if the file
/// does not exist yet.
///
/// # Errors
///
/// Returns [`DatasetError::Io`] or [`DatasetError::Json`] if an existing
/// file cannot be read or parsed.
pub fn load_dataset_or_default(path: &Path) -> Result<Dataset, DatasetError> {
    match load_json(path) {
        Err(DatasetError::NotFound { .. }) => {
            log::info!("No dataset at {}; starting a new one", path.display());
            Ok(Dataset::default())
        }
        other => other,
    }
}

/// Atomically writes the dataset to `path`.
///
/// # Errors
///
/// See [`save_json`].
pub fn save_dataset(path: &Path, dataset: &Dataset) -> Result<(), DatasetError> {
    save_json(path, dataset)
}

/// Loads the sync state at `path`. A missing file is an error.
///
/// # Errors
///
/// See [`load_json`].
pub fn load_sync_state(path: &Path) -> Result<SyncState, DatasetError> {
    load_json(path)
}

/// Atomically writes the sync state to `path`.
///
/// # Errors
///
/// See [`save_json`].
pub fn save_sync_state(path: &Path, state: &SyncState) -> Result<(), DatasetError> {
    save_json(path, state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crime_log_report_models::{IncidentRecord, Report};

    fn test_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("crime_log_dataset_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn dataset_round_trips_through_disk() {
        let dir = test_dir("round_trip");
        let path = dir.join("nested").join("police_reports.json");

        let mut dataset = Dataset::default();
        dataset.add_converted(Report::new(
            "January 05, 2024.pdf",
            "January 05, 2024",
            2,
            vec![IncidentRecord {
                location: "Café Ventanas".to_string(),
                ..IncidentRecord::default()
            }],
        ));

        save_dataset(&path, &dataset).unwrap();
        assert!(!dir.join("nested").join("police_reports.json.tmp").exists());

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Café Ventanas"));
        assert!(text.contains("\n  \"reports\""));

        assert_eq!(load_dataset(&path).unwrap(), dataset);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_dataset_is_not_found() {
        let dir = test_dir("missing");
        let path = dir.join("police_reports.json");
        assert!(matches!(
            load_dataset(&path),
            Err(DatasetError::NotFound { .. })
        ));
        assert_eq!(load_dataset_or_default(&path).unwrap(), Dataset::default());
    }

    #[test]
    fn corrupt_sync_state_is_a_json_error() {
        let dir = test_dir("corrupt");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sync_state.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            load_sync_state(&path),
            Err(DatasetError::Json { .. })
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn sync_state_round_trips() {
        let dir = test_dir("sync_state");
        let path = dir.join("sync_state.json");
        let mut state = SyncState::default();
        state.record_sync(42, 3, chrono::Utc::now());

        save_sync_state(&path, &state).unwrap();
        assert_eq!(load_sync_state(&path).unwrap(), state);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
