//! Snapshot persistence for the queue
//!
//! The queue lives in memory; a snapshot captures every entry together
//! with the catalog and counter settings so a restart can pick up where
//! the previous process stopped.

use crate::error::{QueueError, Result};
use crate::types::{QueueEntry, Timestamp};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Serializable image of the whole queue state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// Entries in insertion order
    pub entries: Vec<QueueEntry>,
    pub baselines: BTreeMap<String, f64>,
    pub counters: u32,
    pub total_created: u64,
    pub saved_at: Timestamp,
}

/// Write a snapshot, replacing any previous file atomically
pub fn save_snapshot(path: &Path, snapshot: &QueueSnapshot) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create snapshot directory {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(snapshot).map_err(|e| QueueError::InternalError {
        message: format!("Failed to serialize queue snapshot: {}", e),
    })?;

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, json)
        .with_context(|| format!("Failed to write snapshot to {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to move snapshot into {}", path.display()))?;

    info!(
        "Saved queue snapshot with {} entries to {}",
        snapshot.entries.len(),
        path.display()
    );
    Ok(())
}

/// Read a snapshot if one exists at `path`
pub fn load_snapshot(path: &Path) -> Result<Option<QueueSnapshot>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let snapshot: QueueSnapshot = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;

    info!(
        "Loaded queue snapshot with {} entries from {}",
        snapshot.entries.len(),
        path.display()
    );
    Ok(Some(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::store::test_support::entry_at;
    use crate::types::QueueStatus;
    use chrono::{Duration, Local, TimeZone};

    #[test]
    fn test_missing_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_snapshot(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_snapshot_preserves_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("queue.json");
        let now = Local.with_ymd_and_hms(2024, 3, 4, 9, 15, 0).unwrap();

        let mut served = entry_at("served", now);
        served.phone = Some("555-0100".to_string());
        served.email = Some("served@example.com".to_string());
        served.notes = Some("needs ramp".to_string());
        served.status = QueueStatus::Completed;
        served.actual_wait_time = Some(4);
        served.actual_service_time = Some(11);
        served.service_start_time = Some(now + Duration::minutes(4));
        served.service_end_time = Some(now + Duration::minutes(15));

        let snapshot = QueueSnapshot {
            entries: vec![served, entry_at("waiting", now + Duration::minutes(1))],
            baselines: [("general".to_string(), 17.5)].into_iter().collect(),
            counters: 2,
            total_created: 5,
            saved_at: now + Duration::minutes(20),
        };

        save_snapshot(&path, &snapshot).unwrap();
        let loaded = load_snapshot(&path).unwrap().unwrap();
        assert_eq!(loaded, snapshot);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");
        fs::write(&path, "{not json").unwrap();
        assert!(load_snapshot(&path).is_err());
    }
}
