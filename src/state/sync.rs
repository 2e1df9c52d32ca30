use std::time::SystemTime;

use crate::services::curator_sync::{SyncError, SyncProgress, SyncReport};

/// Observable state of the curator synchronizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStatus {
    /// Whether a pass currently holds the sync slot.
    pub running: bool,
    /// Whether the current or last pass refetches every listed game.
    pub force_update: bool,
    /// Games whose details have been handled so far.
    pub processed: usize,
    /// Games scheduled for the detail stage.
    pub total: usize,
    /// Completion percentage of the running or last pass.
    pub progress: u8,
    /// Start of the current or last pass.
    pub started_at: Option<SystemTime>,
    /// End of the last pass, `None` while one is running.
    pub finished_at: Option<SystemTime>,
    /// Counters of the last pass that reached the detail stage.
    pub last_report: Option<SyncReport>,
    /// Reason the last pass was aborted, if it was.
    pub last_error: Option<String>,
}

impl SyncStatus {
    /// Reset the status for a new pass, keeping the previous report around.
    pub fn start(&mut self, force_update: bool) {
        self.running = true;
        self.force_update = force_update;
        self.processed = 0;
        self.total = 0;
        self.progress = 0;
        self.started_at = Some(SystemTime::now());
        self.finished_at = None;
        self.last_error = None;
    }

    /// Record detail-stage progress.
    pub fn advance(&mut self, progress: SyncProgress) {
        self.processed = progress.processed;
        self.total = progress.total;
        self.progress = progress.percent();
    }

    /// Close the pass with its report.
    pub fn finish(&mut self, report: SyncReport) {
        self.running = false;
        self.progress = 100;
        self.finished_at = Some(SystemTime::now());
        self.last_report = Some(report);
    }

    /// Close the pass with the error that aborted it.
    pub fn fail(&mut self, err: &SyncError) {
        self.running = false;
        self.finished_at = Some(SystemTime::now());
        self.last_error = Some(err.to_string());
    }
}
