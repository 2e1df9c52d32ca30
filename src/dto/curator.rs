//! DTOs of the curator sync admin endpoints.

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::format_system_time,
    services::curator_sync::SyncReport,
    state::SyncStatus,
};

/// Acknowledgement returned once a sync pass has been accepted.
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncAcceptedResponse {
    pub message: String,
    /// Games found on the listing; their details are fetched in the background.
    pub listed: usize,
    pub force_update: bool,
}

/// Counters of a finished pass.
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncReportDto {
    pub listed: usize,
    pub decurated: usize,
    pub new_games: usize,
    pub tier_changes: usize,
    pub refreshed: usize,
    pub unchanged: usize,
    pub failures: usize,
}

impl From<SyncReport> for SyncReportDto {
    fn from(report: SyncReport) -> Self {
        Self {
            listed: report.listed,
            decurated: report.decurated,
            new_games: report.new_games,
            tier_changes: report.tier_changes,
            refreshed: report.refreshed,
            unchanged: report.unchanged,
            failures: report.failures,
        }
    }
}

/// Current state of the synchronizer.
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncStatusResponse {
    pub running: bool,
    pub force_update: bool,
    pub processed: usize,
    pub total: usize,
    /// Percentage, the listing stage accounts for the first 20.
    pub progress: u8,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub last_report: Option<SyncReportDto>,
    pub last_error: Option<String>,
}

impl From<SyncStatus> for SyncStatusResponse {
    fn from(status: SyncStatus) -> Self {
        Self {
            running: status.running,
            force_update: status.force_update,
            processed: status.processed,
            total: status.total,
            progress: status.progress,
            started_at: status.started_at.map(format_system_time),
            finished_at: status.finished_at.map(format_system_time),
            last_report: status.last_report.map(SyncReportDto::from),
            last_error: status.last_error,
        }
    }
}
