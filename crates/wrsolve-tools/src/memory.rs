//! Resident-memory snapshots taken around solve stages.

use std::time::Instant;
use sysinfo::System;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Resident memory of this process at one stage of a cycle.
#[derive(Debug, Clone)]
pub struct MemorySnapshot {
    /// Resident set size in bytes
    pub rss_bytes: u64,
    pub timestamp: Instant,
    /// Stage label (e.g. "build", "cascade", "analysis")
    pub stage: String,
}

/// Errors produced by memory instrumentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    ProcessNotFound { pid: u32 },
}

impl MemoryError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            MemoryError::ProcessNotFound { .. } => "MEMORY_PROCESS_NOT_FOUND",
        }
    }
}

impl std::fmt::Display for MemoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryError::ProcessNotFound { pid } => {
                write!(f, "[{}] failed to locate process {}", self.code(), pid)
            }
        }
    }
}

impl std::error::Error for MemoryError {}

impl MemorySnapshot {
    /// Capture the current resident memory for `stage`.
    ///
    /// # Errors
    ///
    /// Returns an error if the current process cannot be located.
    pub fn capture(stage: &str) -> Result<Self, MemoryError> {
        let pid = sysinfo::Pid::from(std::process::id() as usize);

        let mut sys = System::new();
        sys.refresh_processes_specifics(
            sysinfo::ProcessesToUpdate::Some(&[pid]),
            true,
            sysinfo::ProcessRefreshKind::nothing().with_memory(),
        );

        let process = sys.process(pid).ok_or(MemoryError::ProcessNotFound {
            pid: std::process::id(),
        })?;

        Ok(MemorySnapshot {
            rss_bytes: process.memory(),
            timestamp: Instant::now(),
            stage: stage.to_string(),
        })
    }

    pub fn rss_mib(&self) -> f64 {
        self.rss_bytes as f64 / BYTES_PER_MIB
    }

    /// RSS growth from `other` to `self` in bytes.
    pub fn diff(&self, other: &Self) -> i64 {
        self.rss_bytes as i64 - other.rss_bytes as i64
    }
}

/// Snapshots for the stages of one cycle.
#[derive(Debug, Default)]
pub struct MemoryProbe {
    snapshots: Vec<MemorySnapshot>,
}

impl MemoryProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a snapshot for `stage` and return it.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot could not be captured.
    pub fn record(&mut self, stage: &str) -> Result<&MemorySnapshot, MemoryError> {
        let snapshot = MemorySnapshot::capture(stage)?;
        self.push(snapshot);
        Ok(&self.snapshots[self.snapshots.len() - 1])
    }

    pub fn push(&mut self, snapshot: MemorySnapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn snapshots(&self) -> &[MemorySnapshot] {
        &self.snapshots
    }

    /// Growth between the last two snapshots.
    pub fn last_diff(&self) -> Option<i64> {
        match self.snapshots.as_slice() {
            [.., prev, last] => Some(last.diff(prev)),
            _ => None,
        }
    }

    /// Largest RSS seen so far.
    pub fn peak_bytes(&self) -> Option<u64> {
        self.snapshots.iter().map(|snapshot| snapshot.rss_bytes).max()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

#[cfg(test)]
mod tests {
    use crate::memory::{MemoryError, MemoryProbe, MemorySnapshot};
    use std::time::Instant;

    fn snapshot(stage: &str, rss_bytes: u64) -> MemorySnapshot {
        MemorySnapshot {
            rss_bytes,
            timestamp: Instant::now(),
            stage: stage.to_string(),
        }
    }

    #[test]
    fn test_capture_current_process() {
        let snapshot = MemorySnapshot::capture("build").unwrap_or_else(|err| panic!("{}", err));
        assert_eq!(snapshot.stage, "build");
        assert!(snapshot.rss_bytes > 0);
        assert!(snapshot.rss_mib() > 0.0);
    }

    #[test]
    fn test_diff_and_peak() {
        let mut probe = MemoryProbe::new();
        assert_eq!(probe.last_diff(), None);
        probe.push(snapshot("build", 1000));
        probe.push(snapshot("cascade", 4000));
        probe.push(snapshot("analysis", 1500));

        assert_eq!(probe.last_diff(), Some(-2500));
        assert_eq!(probe.peak_bytes(), Some(4000));

        probe.clear();
        assert!(probe.snapshots().is_empty());
    }

    #[test]
    fn test_record_appends() {
        let mut probe = MemoryProbe::new();
        probe
            .record("cycle_start")
            .unwrap_or_else(|err| panic!("{}", err));
        probe
            .record("cascade")
            .unwrap_or_else(|err| panic!("{}", err));
        assert_eq!(probe.snapshots().len(), 2);
        assert_eq!(probe.snapshots()[1].stage, "cascade");
        assert!(probe.last_diff().is_some());
    }

    #[test]
    fn test_error_display_has_code() {
        let err = MemoryError::ProcessNotFound { pid: 42 };
        assert!(err.to_string().starts_with("[MEMORY_PROCESS_NOT_FOUND]"));
    }
}
