use serde::Serialize;
use utoipa::ToSchema;

/// Payload of the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` when storage is usable, `degraded` otherwise.
    pub status: &'static str,
    /// Whether a curator sync pass currently holds the sync slot.
    pub sync_running: bool,
}

impl HealthResponse {
    /// Build the payload from the degraded flag and the sync slot state.
    pub fn new(degraded: bool, sync_running: bool) -> Self {
        Self {
            status: if degraded { "degraded" } else { "ok" },
            sync_running,
        }
    }
}
