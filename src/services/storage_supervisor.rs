use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{curator_store::CuratorStore, storage::StorageError},
    state::SharedState,
};

/// Delays driving the supervision loop.
#[derive(Debug, Clone, Copy)]
pub struct SupervisorTiming {
    /// First delay between connection attempts.
    pub initial_delay: Duration,
    /// Ceiling of the doubling backoff.
    pub max_delay: Duration,
    /// Pause between two health checks of a connected store.
    pub health_poll_interval: Duration,
    /// Reconnect attempts before the connection is dropped and rebuilt.
    pub max_reconnect_attempts: u32,
}

impl Default for SupervisorTiming {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_secs(10),
            health_poll_interval: Duration::from_secs(5),
            max_reconnect_attempts: 3,
        }
    }
}

/// Exponential backoff doubling up to a ceiling.
#[derive(Debug, Clone)]
struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    fn new(timing: &SupervisorTiming) -> Self {
        Self {
            initial: timing.initial_delay,
            max: timing.max_delay,
            current: timing.initial_delay,
        }
    }

    /// Delay to wait now; the following one is doubled.
    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Reconnect to the storage backend and keep the shared state in degraded mode when it is unavailable.
pub async fn run<F, Fut>(state: SharedState, connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn CuratorStore>, StorageError>> + Send,
{
    run_with_timing(state, connect, SupervisorTiming::default()).await
}

/// [`run`] with explicit delays.
pub async fn run_with_timing<F, Fut>(state: SharedState, mut connect: F, timing: SupervisorTiming)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn CuratorStore>, StorageError>> + Send,
{
    let mut backoff = Backoff::new(&timing);

    loop {
        match connect().await {
            Ok(store) => {
                state.set_curator_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                backoff.reset();

                watch_store(&state, store.as_ref(), &timing).await;
                warn!("exhausted storage reconnect attempts; staying in degraded mode");
            }
            Err(err) => warn!(error = %err, "storage connection attempt failed"),
        }
        sleep(backoff.next_delay()).await;
    }
}

/// Poll the store health until it is lost for good.
async fn watch_store(state: &SharedState, store: &dyn CuratorStore, timing: &SupervisorTiming) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded().await {
                    info!("storage healthy again; leaving degraded mode");
                    state.update_degraded(false).await;
                }
            }
            Err(err) => {
                warn!(error = %err, "storage health check failed");
                if !reconnect(state, store, timing).await {
                    return;
                }
            }
        }
        sleep(timing.health_poll_interval).await;
    }
}

/// Retry the existing connection a bounded number of times.
async fn reconnect(state: &SharedState, store: &dyn CuratorStore, timing: &SupervisorTiming) -> bool {
    let mut backoff = Backoff::new(timing);

    for attempt in 0..timing.max_reconnect_attempts {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "storage reconnection succeeded after health check failure");
                state.update_degraded(false).await;
                return true;
            }
            Err(err) if attempt == 0 => {
                warn!(
                    attempt, error = %err,
                    "storage reconnect first attempt failed; entering degraded mode"
                );
                state.update_degraded(true).await;
            }
            Err(err) => warn!(attempt, error = %err, "storage reconnect attempt failed"),
        }
        sleep(backoff.next_delay()).await;
    }
    false
}

#[cfg(test)]
mod tests {
    use tokio::time::timeout;

    use super::*;
    use crate::{
        config::AppConfig, dao::curator_store::memory::MemoryCuratorStore,
        services::curator_sync::tests::FakeSource, state::AppState,
    };

    fn fast_timing() -> SupervisorTiming {
        SupervisorTiming {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            health_poll_interval: Duration::from_millis(2),
            max_reconnect_attempts: 2,
        }
    }

    async fn wait_for_degraded(state: &SharedState, expected: bool) {
        let mut watcher = state.degraded_watcher();
        timeout(Duration::from_secs(5), watcher.wait_for(|value| *value == expected))
            .await
            .expect("degraded flag toggled")
            .expect("state alive");
    }

    #[test]
    fn backoff_doubles_up_to_ceiling() {
        let timing = SupervisorTiming {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(300),
            ..SupervisorTiming::default()
        };
        let mut backoff = Backoff::new(&timing);
        let delays: Vec<u128> = (0..4).map(|_| backoff.next_delay().as_millis()).collect();
        assert_eq!(delays, vec![100, 200, 300, 300]);

        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
    }

    #[tokio::test]
    async fn toggles_degraded_mode_with_store_health() {
        let state = AppState::new(AppConfig::default(), Arc::new(FakeSource::default()), None);
        let store = MemoryCuratorStore::new();

        let connected = store.clone();
        let supervisor = tokio::spawn(run_with_timing(
            state.clone(),
            move || {
                let store = connected.clone();
                async move { Ok::<_, StorageError>(Arc::new(store) as Arc<dyn CuratorStore>) }
            },
            fast_timing(),
        ));

        wait_for_degraded(&state, false).await;
        assert!(state.require_curator_store().await.is_ok());

        store.set_offline(true);
        wait_for_degraded(&state, true).await;

        store.set_offline(false);
        wait_for_degraded(&state, false).await;

        supervisor.abort();
    }
}
