//! Curator Back binary entrypoint wiring REST routes, the curator synchronizer and storage.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use curator_back::{
    config::AppConfig,
    dao::curator_store::memory::MemoryCuratorStore,
    remote::SteamSource,
    routes,
    services::curator_service,
    state::{AppState, SharedState},
};

/// Storage backend selected through `STORAGE_BACKEND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StorageBackend {
    Mongo,
    Memory,
}

impl StorageBackend {
    fn from_env() -> Self {
        match env::var("STORAGE_BACKEND").ok().as_deref().map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("memory") => StorageBackend::Memory,
            Some(value) if !value.is_empty() && !value.eq_ignore_ascii_case("mongo") => {
                warn!(backend = value, "unknown storage backend; using mongo");
                StorageBackend::Mongo
            }
            _ => StorageBackend::Mongo,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let source = SteamSource::new(&config.curator).context("building curator HTTP client")?;
    let admin_token = env::var("ADMIN_TOKEN").ok();
    if admin_token.as_deref().is_none_or(str::is_empty) {
        warn!("ADMIN_TOKEN is not set; admin routes will reject every request");
    }
    let sync_interval = config.curator.sync_interval;

    let app_state = AppState::new(config, Arc::new(source), admin_token);

    install_storage(&app_state, StorageBackend::from_env()).await;

    if let Some(period) = sync_interval {
        info!(period_secs = period.as_secs(), "scheduling periodic curator sync");
        tokio::spawn(curator_service::run_schedule(app_state.clone(), period));
    }

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the selected backend, supervising MongoDB in the background.
async fn install_storage(state: &SharedState, backend: StorageBackend) {
    match backend {
        StorageBackend::Memory => {
            info!("using in-memory storage; data is lost on restart");
            state
                .set_curator_store(Arc::new(MemoryCuratorStore::new()))
                .await;
        }
        StorageBackend::Mongo => spawn_mongo_supervisor(state).await,
    }
}

#[cfg(feature = "mongo-store")]
async fn spawn_mongo_supervisor(state: &SharedState) {
    use curator_back::dao::{
        curator_store::{
            CuratorStore,
            mongodb::{MongoConfig, MongoCuratorStore},
        },
        storage::StorageError,
    };
    use curator_back::services::storage_supervisor;

    tokio::spawn(storage_supervisor::run(state.clone(), || async {
        let config = MongoConfig::from_env().await.map_err(StorageError::from)?;
        let store = MongoCuratorStore::connect(config)
            .await
            .map_err(StorageError::from)?;
        Ok::<_, StorageError>(Arc::new(store) as Arc<dyn CuratorStore>)
    }));
}

#[cfg(not(feature = "mongo-store"))]
async fn spawn_mongo_supervisor(state: &SharedState) {
    warn!("built without the mongo-store feature; falling back to in-memory storage");
    state
        .set_curator_store(Arc::new(MemoryCuratorStore::new()))
        .await;
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
