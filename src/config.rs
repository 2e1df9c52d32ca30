//! Application-level configuration loading: remote endpoints, sync pacing and ranking policy.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::services::season_ranking::{MedalScope, RankingPolicy, UnresolvedParticipants};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CURATOR_BACK_CONFIG_PATH";

const DEFAULT_LISTING_URL: &str = "https://store.steampowered.com/curator/7119343-0.1%25/ajaxgetfilteredrecommendations/render?query=&start=0&count=1000&tagids=&sort=recent&types=0";
const DEFAULT_DETAILS_URL: &str = "https://store.steampowered.com/api/appdetails";
const DEFAULT_REQUEST_DELAY_MS: u64 = 1_500;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;

/// Settings of the curated-game synchronizer.
#[derive(Debug, Clone)]
pub struct CuratorConfig {
    /// Endpoint returning the curated listing markup.
    pub listing_url: String,
    /// Details endpoint, queried with `?appids=<id>`.
    pub details_url: String,
    /// Pause between two detail fetches.
    pub request_delay: Duration,
    /// Detail fetches allowed in flight at once; 1 keeps the pass strictly sequential.
    pub max_in_flight: usize,
    /// Period of the background sync, disabled when `None`.
    pub sync_interval: Option<Duration>,
    /// Timeout applied to every remote request.
    pub request_timeout: Duration,
}

impl Default for CuratorConfig {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.into(),
            details_url: DEFAULT_DETAILS_URL.into(),
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            max_in_flight: 1,
            sync_interval: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, Default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Remote endpoints and sync pacing.
    pub curator: CuratorConfig,
    /// Season ranking tunables.
    pub ranking: RankingPolicy,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        max_in_flight = app_config.curator.max_in_flight,
                        delay_ms = app_config.curator.request_delay.as_millis(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    curator: RawCuratorConfig,
    ranking: RawRankingConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCuratorConfig {
    listing_url: Option<String>,
    details_url: Option<String>,
    request_delay_ms: Option<u64>,
    max_in_flight: Option<usize>,
    sync_interval_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRankingConfig {
    drop_worst: Option<usize>,
    include_unresolved: Option<bool>,
    medals_participations_only: Option<bool>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            curator: value.curator.into(),
            ranking: value.ranking.into(),
        }
    }
}

impl From<RawCuratorConfig> for CuratorConfig {
    fn from(value: RawCuratorConfig) -> Self {
        let defaults = CuratorConfig::default();
        Self {
            listing_url: value.listing_url.unwrap_or(defaults.listing_url),
            details_url: value.details_url.unwrap_or(defaults.details_url),
            request_delay: value
                .request_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_delay),
            max_in_flight: value.max_in_flight.unwrap_or(defaults.max_in_flight).max(1),
            sync_interval: value
                .sync_interval_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            request_timeout: value
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        }
    }
}

impl From<RawRankingConfig> for RankingPolicy {
    fn from(value: RawRankingConfig) -> Self {
        let defaults = RankingPolicy::default();
        Self {
            drop_worst: value.drop_worst.unwrap_or(defaults.drop_worst),
            unresolved: match value.include_unresolved {
                Some(true) => UnresolvedParticipants::Include,
                Some(false) => UnresolvedParticipants::Exclude,
                None => defaults.unresolved,
            },
            medals: match value.medals_participations_only {
                Some(true) => MedalScope::ParticipationsOnly,
                Some(false) => MedalScope::AllEntries,
                None => defaults.medals,
            },
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
