//! Status tool
//!
//! Runtime information about the caltrack service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Usage guide returned by the `usage_instructions` tool
pub const USAGE_INSTRUCTIONS: &str = r#"
# caltrack Usage

caltrack keeps one running calorie balance for the current day:

    total = calories from meals - calories burned by workouts
    remaining = daily limit - total

## Logging

- `add_meal` with a name and calories (whole number, >= 0).
- `add_workout` with a name, calories burned and an optional intensity
  (`low`, `moderate`, `high`).
- Every call returns the entry (with its `id`) and the refreshed summary.

## Corrections

- `remove_meal` / `remove_workout` take the entry `id` from `list_entries`.
  Removing an id that is not logged does nothing and is not an error.

## Limit and new day

- `set_limit` changes the daily budget (default 3000). A limit of 0 makes
  `progress_percent` null.
- `reset_day` clears all entries and the total but keeps the limit.

## Checks

- `get_summary` returns limit, total, consumed, burned, remaining, progress.
- `audit_ledger` compares the stored total with the entries; pass
  `repair: true` to rewrite the total when they disagree.
"#;

/// Runtime status of the caltrack service
#[derive(Debug, Clone, Serialize)]
pub struct CaltrackStatus {
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    pub started_at: String,
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

pub struct StatusTracker {
    start_time: Instant,
    started_at: chrono::DateTime<chrono::Utc>,
    database_path: PathBuf,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            started_at: chrono::Utc::now(),
            database_path,
        }
    }

    pub fn get_status(&self) -> CaltrackStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));
        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        CaltrackStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            started_at: self.started_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
