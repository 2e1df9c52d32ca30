//! Orchestration of curator sync passes: single-flight triggering, status and schedule.
//!
//! The listing stage runs inline so the caller learns about fetch and parse
//! failures; the detail stage runs on a spawned task holding the sync slot.

use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

use crate::{
    dto::curator::{SyncAcceptedResponse, SyncStatusResponse},
    error::ServiceError,
    services::curator_sync,
    state::SharedState,
};

/// Start a sync pass and return once the listing has been parsed.
pub async fn start_sync(
    state: &SharedState,
    force_update: bool,
) -> Result<SyncAcceptedResponse, ServiceError> {
    let store = state.require_curator_store().await?;
    let guard = state
        .try_begin_sync()
        .ok_or(ServiceError::SyncInProgress)?;

    state.update_sync_status(|status| status.start(force_update));
    info!(force_update, "curator sync started");

    let source = state.source();
    let plan = match curator_sync::prepare(store.as_ref(), source.as_ref()).await {
        Ok(plan) => plan,
        Err(err) => {
            warn!(error = %err, "curator sync aborted");
            state.update_sync_status(|status| status.fail(&err));
            return Err(err.into());
        }
    };
    let listed = plan.listed();

    let task_state = state.clone();
    tokio::spawn(async move {
        let _slot = guard;
        let config = task_state.config().curator.clone();
        let report = curator_sync::apply(plan, store, source, &config, force_update, |progress| {
            task_state.update_sync_status(|status| status.advance(progress))
        })
        .await;
        task_state.update_sync_status(|status| status.finish(report));
    });

    Ok(SyncAcceptedResponse {
        message: "curator sync started".into(),
        listed,
        force_update,
    })
}

/// Snapshot of the synchronizer status.
pub fn sync_status(state: &SharedState) -> SyncStatusResponse {
    state.sync_status().into()
}

/// Trigger a non-forced pass every `period`, skipping ticks while a pass runs or storage is down.
pub async fn run_schedule(state: SharedState, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; the first pass waits a full period.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match start_sync(&state, false).await {
            Ok(accepted) => info!(listed = accepted.listed, "scheduled curator sync started"),
            Err(ServiceError::SyncInProgress) => {
                info!("scheduled curator sync skipped; a pass is already running")
            }
            Err(ServiceError::Degraded) => {
                warn!("scheduled curator sync skipped; storage unavailable")
            }
            Err(err) => warn!(error = %err, "scheduled curator sync failed"),
        }
    }
}
