use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report storage and sync state while logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.curator_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        None => warn!("storage unavailable (degraded mode)"),
    }

    HealthResponse::new(state.is_degraded().await, state.sync_status().running)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig, dao::curator_store::memory::MemoryCuratorStore,
        services::curator_sync::tests::FakeSource, state::AppState,
    };

    #[tokio::test]
    async fn reports_degraded_until_store_is_installed() {
        let state = AppState::new(AppConfig::default(), Arc::new(FakeSource::default()), None);
        assert_eq!(health_status(&state).await.status, "degraded");

        state
            .set_curator_store(Arc::new(MemoryCuratorStore::new()))
            .await;
        let health = health_status(&state).await;
        assert_eq!(health.status, "ok");
        assert!(!health.sync_running);
    }
}
