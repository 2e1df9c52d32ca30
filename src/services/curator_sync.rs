//! Synchronization of the stored catalog with the remote curator listing.
//!
//! A pass runs in two stages. [`prepare`] fetches and parses the listing and loads
//! the stored catalog; any failure there aborts the pass before anything is written.
//! [`apply`] then decurates vanished games and refreshes listed ones from the
//! details endpoint, logging and counting per-game failures without stopping.

use std::{collections::HashMap, pin::pin, sync::Arc, time::SystemTime};

use futures::{FutureExt, StreamExt, stream};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    config::CuratorConfig,
    dao::{
        curator_store::CuratorStore,
        models::{
            AchievementsEntity, AppId, CuratorEventEntity, CuratorEventKind, GameEntity,
            SaleEntity,
        },
        storage::StorageError,
    },
    remote::{CuratorSource, GameDetails, SourceError},
    services::listing::{ListedGame, parse_listing},
};

/// Title recorded when the details endpoint has none.
pub const UNKNOWN_TITLE: &str = "unknown";

/// Share of the progress bar covered by the listing fetch and the diff.
const LISTING_PROGRESS: u8 = 20;

/// Failures that abort a sync pass.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The listing could not be fetched or decoded.
    #[error("failed to fetch curator listing")]
    Fetch(#[source] SourceError),
    /// The listing was fetched but contained no recommendation.
    #[error("curator listing contains no recommendations")]
    Parse,
    /// The stored catalog could not be loaded.
    #[error("failed to load stored catalog")]
    Persistence(#[source] StorageError),
}

/// Counters describing the outcome of a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Games found on the listing.
    pub listed: usize,
    /// Games marked as no longer curated.
    pub decurated: usize,
    /// Games seen for the first time.
    pub new_games: usize,
    /// Games whose tier changed.
    pub tier_changes: usize,
    /// Games written back with fresh details.
    pub refreshed: usize,
    /// Listed games left untouched because nothing changed.
    pub unchanged: usize,
    /// Detail fetches, event appends or writes that failed.
    pub failures: usize,
}

/// Position of a running pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncProgress {
    /// Detail fetches handled so far.
    pub processed: usize,
    /// Detail fetches planned for the pass.
    pub total: usize,
}

impl SyncProgress {
    /// Completion percentage: the listing and diff account for the first 20%.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let processed = self.processed.min(self.total);
        let details = (100 - LISTING_PROGRESS) as usize * processed / self.total;
        LISTING_PROGRESS + details as u8
    }
}

/// Listing and stored catalog captured by [`prepare`].
#[derive(Debug, Clone)]
pub struct SyncPlan {
    listed: Vec<ListedGame>,
    stored: HashMap<AppId, GameEntity>,
}

impl SyncPlan {
    /// Number of games found on the listing.
    pub fn listed(&self) -> usize {
        self.listed.len()
    }
}

/// Fetch the listing, parse it and load the stored catalog.
pub async fn prepare(
    store: &dyn CuratorStore,
    source: &dyn CuratorSource,
) -> Result<SyncPlan, SyncError> {
    let markup = source.fetch_listing().await.map_err(SyncError::Fetch)?;
    let tiers = store.list_tiers().await.map_err(SyncError::Persistence)?;

    let listed = parse_listing(&markup, &tiers);
    if listed.is_empty() {
        return Err(SyncError::Parse);
    }

    let stored = store
        .list_games()
        .await
        .map_err(SyncError::Persistence)?
        .into_iter()
        .map(|game| (game.id, game))
        .collect();

    debug!(listed = listed.len(), tiers = tiers.len(), "curator listing parsed");
    Ok(SyncPlan { listed, stored })
}

/// Apply a prepared plan: decurate vanished games, then refresh listed ones.
///
/// Without `force_update` only new, re-curated or re-tiered games are fetched again.
/// `on_progress` is invoked after the diff and after every handled detail fetch.
pub async fn apply<P>(
    plan: SyncPlan,
    store: Arc<dyn CuratorStore>,
    source: Arc<dyn CuratorSource>,
    config: &CuratorConfig,
    force_update: bool,
    on_progress: P,
) -> SyncReport
where
    P: Fn(SyncProgress) + Send + Sync,
{
    let SyncPlan { listed, stored } = plan;
    let mut report = SyncReport {
        listed: listed.len(),
        ..SyncReport::default()
    };

    decurate_missing(store.as_ref(), &listed, &stored, &mut report).await;

    let mut pending = Vec::new();
    for game in listed {
        match stored.get(&game.app_id) {
            Some(existing) if !force_update && existing.curated && existing.tier == game.tier => {
                if existing.description != game.description {
                    let mut updated = existing.clone();
                    updated.description = game.description;
                    updated.updated_at = SystemTime::now();
                    if let Err(err) = store.upsert_game(updated).await {
                        warn!(app_id = game.app_id, error = %err, "failed to update game description");
                        report.failures += 1;
                    }
                }
                report.unchanged += 1;
            }
            _ => pending.push(game),
        }
    }

    let total = pending.len();
    let mut progress = SyncProgress {
        processed: 0,
        total,
    };
    on_progress(progress);

    let delay = config.request_delay;
    let fetches = stream::iter(pending.into_iter().enumerate())
        .then(move |(index, game)| async move {
            if index > 0 && !delay.is_zero() {
                sleep(delay).await;
            }
            game
        })
        .map(|game| {
            source
                .fetch_details(game.app_id)
                .map(move |details| (game, details))
        })
        .buffered(config.max_in_flight.max(1));
    let mut fetches = pin!(fetches);

    while let Some((game, details)) = fetches.next().await {
        match details {
            Ok(details) => {
                let existing = stored.get(&game.app_id);
                let url = source.details_url(game.app_id);
                refresh_game(store.as_ref(), game, existing, details, url, &mut report).await;
            }
            Err(err) => {
                warn!(app_id = game.app_id, error = %err, "skipping game after details fetch failure");
                report.failures += 1;
            }
        }
        progress.processed += 1;
        on_progress(progress);
    }

    info!(
        listed = report.listed,
        decurated = report.decurated,
        new_games = report.new_games,
        tier_changes = report.tier_changes,
        refreshed = report.refreshed,
        failures = report.failures,
        "curator sync pass finished"
    );
    report
}

/// Run a complete pass.
pub async fn sync(
    store: Arc<dyn CuratorStore>,
    source: Arc<dyn CuratorSource>,
    config: &CuratorConfig,
    force_update: bool,
) -> Result<SyncReport, SyncError> {
    let plan = prepare(store.as_ref(), source.as_ref()).await?;
    Ok(apply(plan, store, source, config, force_update, |_| {}).await)
}

async fn decurate_missing(
    store: &dyn CuratorStore,
    listed: &[ListedGame],
    stored: &HashMap<AppId, GameEntity>,
    report: &mut SyncReport,
) {
    let mut vanished: Vec<&GameEntity> = stored
        .values()
        .filter(|game| game.curated && !game.protected)
        .filter(|game| !listed.iter().any(|entry| entry.app_id == game.id))
        .collect();
    vanished.sort_by_key(|game| game.id);

    for game in vanished {
        let mut updated = game.clone();
        updated.curated = false;
        updated.updated_at = SystemTime::now();
        if let Err(err) = store.upsert_game(updated).await {
            warn!(app_id = game.id, error = %err, "failed to decurate game");
            report.failures += 1;
            continue;
        }
        report.decurated += 1;
        info!(app_id = game.id, "game removed from curator listing");
        record_event(store, game.id, CuratorEventKind::GameRemoved, report).await;
    }
}

async fn refresh_game(
    store: &dyn CuratorStore,
    game: ListedGame,
    existing: Option<&GameEntity>,
    details: GameDetails,
    url: String,
    report: &mut SyncReport,
) {
    let event = match existing {
        None => Some(CuratorEventKind::NewGame),
        Some(previous) if previous.tier != game.tier => Some(CuratorEventKind::TierChange {
            old_tier: previous.tier,
            new_tier: game.tier,
        }),
        Some(_) => None,
    };

    let entity = GameEntity {
        id: game.app_id,
        description: game.description,
        tier: game.tier,
        title: Some(details.title.unwrap_or_else(|| UNKNOWN_TITLE.into())),
        image: details.image,
        url: Some(url),
        achievements: AchievementsEntity {
            total: details.achievements_total,
        },
        sale: SaleEntity {
            on_sale: details.discount_percent > 0,
            discount: details.discount_percent,
        },
        curated: true,
        protected: existing.is_some_and(|previous| previous.protected),
        updated_at: SystemTime::now(),
    };

    if let Err(err) = store.upsert_game(entity).await {
        warn!(app_id = game.app_id, error = %err, "failed to store game details");
        report.failures += 1;
        return;
    }
    report.refreshed += 1;

    let Some(kind) = event else {
        return;
    };
    match &kind {
        CuratorEventKind::NewGame => {
            info!(app_id = game.app_id, tier = game.tier, "new curated game");
            report.new_games += 1;
        }
        CuratorEventKind::TierChange { old_tier, new_tier } => {
            info!(app_id = game.app_id, old_tier, new_tier, "curated game changed tier");
            report.tier_changes += 1;
        }
        CuratorEventKind::GameRemoved => {}
    }
    record_event(store, game.app_id, kind, report).await;
}

async fn record_event(
    store: &dyn CuratorStore,
    app_id: AppId,
    kind: CuratorEventKind,
    report: &mut SyncReport,
) {
    if let Err(err) = store
        .append_event(CuratorEventEntity::now(app_id, kind))
        .await
    {
        warn!(app_id, error = %err, "failed to append curator event");
        report.failures += 1;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        dao::{
            curator_store::memory::MemoryCuratorStore,
            models::{TierEntity, TierId},
        },
        remote::SourceResult,
    };

    /// Scripted [`CuratorSource`] serving canned listing markup and details.
    #[derive(Default)]
    pub(crate) struct FakeSource {
        pub listing: Mutex<Option<String>>,
        pub details: Mutex<HashMap<AppId, GameDetails>>,
        pub requested: Mutex<Vec<AppId>>,
    }

    impl FakeSource {
        pub fn new(games: &[(AppId, &str)]) -> Self {
            let source = Self::default();
            source.set_listing(games);
            let details = games
                .iter()
                .map(|(id, _)| {
                    (
                        *id,
                        GameDetails {
                            title: Some(format!("Game {id}")),
                            image: Some(format!("https://img/{id}.jpg")),
                            achievements_total: 12,
                            discount_percent: 0,
                        },
                    )
                })
                .collect();
            *source.details.lock().unwrap() = details;
            source
        }

        pub fn set_listing(&self, games: &[(AppId, &str)]) {
            let markup: String = games
                .iter()
                .map(|(id, description)| {
                    format!(
                        "<div class=\"recommendation\" ><a data-ds-appid=\"{id}\"></a>\
                         <div class=\"recommendation_desc\">{description}</div></div>"
                    )
                })
                .collect();
            *self.listing.lock().unwrap() = Some(markup);
        }

        pub fn requested(&self) -> Vec<AppId> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl CuratorSource for FakeSource {
        fn fetch_listing(&self) -> BoxFuture<'static, SourceResult<String>> {
            let listing = self.listing.lock().unwrap().clone();
            Box::pin(async move {
                listing.ok_or(SourceError::MissingListing {
                    url: "fake://listing".into(),
                })
            })
        }

        fn fetch_details(&self, app_id: AppId) -> BoxFuture<'static, SourceResult<GameDetails>> {
            self.requested.lock().unwrap().push(app_id);
            let details = self.details.lock().unwrap().get(&app_id).cloned();
            Box::pin(async move { details.ok_or(SourceError::MissingDetails { app_id }) })
        }

        fn details_url(&self, app_id: AppId) -> String {
            format!("fake://details?appids={app_id}")
        }
    }

    pub(crate) fn tiers() -> Vec<TierEntity> {
        [(1, "🌑"), (2, "🌒"), (3, "🌓"), (4, "🌔"), (5, "🌕")]
            .into_iter()
            .map(|(id, symbol)| TierEntity {
                id,
                symbol: symbol.into(),
                icon: format!("moon-{id}"),
                score: u32::from(id),
                description: format!("tier {id}"),
            })
            .collect()
    }

    pub(crate) fn quick_config() -> CuratorConfig {
        CuratorConfig {
            request_delay: Duration::ZERO,
            ..CuratorConfig::default()
        }
    }

    fn stored_game(id: AppId, tier: TierId, curated: bool) -> GameEntity {
        GameEntity {
            id,
            description: format!("stored {id}"),
            tier,
            title: Some(format!("Stored {id}")),
            image: None,
            url: None,
            achievements: AchievementsEntity::default(),
            sale: SaleEntity::default(),
            curated,
            protected: false,
            updated_at: SystemTime::UNIX_EPOCH,
        }
    }

    async fn seeded_store(games: Vec<GameEntity>) -> MemoryCuratorStore {
        let store = MemoryCuratorStore::new();
        store.replace_tiers(tiers()).await.unwrap();
        for game in games {
            store.upsert_game(game).await.unwrap();
        }
        store
    }

    async fn run(
        store: &MemoryCuratorStore,
        source: &Arc<FakeSource>,
        force_update: bool,
    ) -> Result<SyncReport, SyncError> {
        sync(
            Arc::new(store.clone()),
            source.clone(),
            &quick_config(),
            force_update,
        )
        .await
    }

    async fn game(store: &MemoryCuratorStore, id: AppId) -> GameEntity {
        store
            .list_games()
            .await
            .unwrap()
            .into_iter()
            .find(|game| game.id == id)
            .expect("game stored")
    }

    async fn event_kinds(store: &MemoryCuratorStore) -> Vec<(AppId, CuratorEventKind)> {
        let mut events: Vec<_> = store
            .list_events(100)
            .await
            .unwrap()
            .into_iter()
            .map(|event| (event.game, event.kind))
            .collect();
        events.reverse();
        events
    }

    #[tokio::test]
    async fn first_pass_creates_games_and_new_game_events() {
        let store = seeded_store(vec![]).await;
        let source = Arc::new(FakeSource::new(&[(10, "🌕 Hard one"), (20, "easy")]));

        let report = run(&store, &source, false).await.unwrap();
        assert_eq!(report.listed, 2);
        assert_eq!(report.new_games, 2);
        assert_eq!(report.refreshed, 2);
        assert_eq!(report.failures, 0);

        let hard = game(&store, 10).await;
        assert_eq!(hard.tier, 5);
        assert!(hard.curated);
        assert_eq!(hard.title.as_deref(), Some("Game 10"));
        assert_eq!(hard.url.as_deref(), Some("fake://details?appids=10"));
        assert_eq!(hard.achievements.total, 12);
        assert_eq!(game(&store, 20).await.tier, 1);

        assert_eq!(
            event_kinds(&store).await,
            vec![(10, CuratorEventKind::NewGame), (20, CuratorEventKind::NewGame)]
        );
    }

    #[tokio::test]
    async fn vanished_games_are_decurated_once() {
        let store = seeded_store(vec![
            stored_game(1, 2, true),
            stored_game(2, 2, true),
            stored_game(3, 2, false),
        ])
        .await;
        let source = Arc::new(FakeSource::new(&[(1, "🌒 still here")]));

        let report = run(&store, &source, false).await.unwrap();
        assert_eq!(report.decurated, 1);
        assert!(!game(&store, 2).await.curated);
        assert!(!game(&store, 3).await.curated);
        assert_eq!(event_kinds(&store).await, vec![(2, CuratorEventKind::GameRemoved)]);

        // A second pass over the same listing finds nothing left to remove.
        let report = run(&store, &source, false).await.unwrap();
        assert_eq!(report.decurated, 0);
        assert_eq!(event_kinds(&store).await.len(), 1);
    }

    #[tokio::test]
    async fn protected_games_survive_absence_and_keep_their_flag() {
        let mut protected = stored_game(7, 3, true);
        protected.protected = true;
        let mut relisted = stored_game(8, 3, true);
        relisted.protected = true;
        let store = seeded_store(vec![protected, relisted]).await;
        let source = Arc::new(FakeSource::new(&[(8, "🌕 promoted")]));

        let report = run(&store, &source, false).await.unwrap();
        assert_eq!(report.decurated, 0);
        assert!(game(&store, 7).await.curated);

        let relisted = game(&store, 8).await;
        assert!(relisted.protected);
        assert_eq!(relisted.tier, 5);
    }

    #[tokio::test]
    async fn tier_change_emits_event_with_both_tiers() {
        let store = seeded_store(vec![stored_game(5, 2, true)]).await;
        let source = Arc::new(FakeSource::new(&[(5, "🌔 harder now")]));

        let report = run(&store, &source, false).await.unwrap();
        assert_eq!(report.tier_changes, 1);
        assert_eq!(report.new_games, 0);
        assert_eq!(
            event_kinds(&store).await,
            vec![(
                5,
                CuratorEventKind::TierChange {
                    old_tier: 2,
                    new_tier: 4
                }
            )]
        );
        assert_eq!(game(&store, 5).await.tier, 4);
    }

    #[tokio::test]
    async fn unchanged_games_are_only_fetched_when_forced() {
        let store = seeded_store(vec![stored_game(1, 2, true), stored_game(2, 2, false)]).await;
        let source = Arc::new(FakeSource::new(&[(1, "🌒 same"), (2, "🌒 back again")]));

        let report = run(&store, &source, false).await.unwrap();
        // Game 2 is re-curated and therefore refreshed, game 1 is left alone.
        assert_eq!(source.requested(), vec![2]);
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.refreshed, 1);
        assert!(game(&store, 2).await.curated);
        assert_eq!(game(&store, 1).await.description, "🌒 same");
        assert!(event_kinds(&store).await.is_empty());

        let report = run(&store, &source, true).await.unwrap();
        assert_eq!(source.requested(), vec![2, 1, 2]);
        assert_eq!(report.refreshed, 2);
        assert_eq!(report.unchanged, 0);
    }

    #[tokio::test]
    async fn failed_detail_fetch_skips_only_that_game() {
        let store = seeded_store(vec![]).await;
        let source = Arc::new(FakeSource::new(&[(1, "🌑 a"), (2, "🌒 b"), (3, "🌓 c")]));
        source.details.lock().unwrap().remove(&2);

        let report = run(&store, &source, false).await.unwrap();
        assert_eq!(report.failures, 1);
        assert_eq!(report.new_games, 2);
        assert_eq!(source.requested(), vec![1, 2, 3]);
        let ids: Vec<AppId> = store.list_games().await.unwrap().iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn missing_title_and_discount_fall_back() {
        let store = seeded_store(vec![]).await;
        let source = Arc::new(FakeSource::new(&[(4, "🌑 untitled")]));
        source.details.lock().unwrap().insert(
            4,
            GameDetails {
                title: None,
                image: None,
                achievements_total: 0,
                discount_percent: 35,
            },
        );

        run(&store, &source, false).await.unwrap();
        let stored = game(&store, 4).await;
        assert_eq!(stored.title.as_deref(), Some(UNKNOWN_TITLE));
        assert_eq!(
            stored.sale,
            SaleEntity {
                on_sale: true,
                discount: 35
            }
        );
    }

    #[tokio::test]
    async fn empty_listing_aborts_without_touching_catalog() {
        let store = seeded_store(vec![stored_game(1, 2, true)]).await;
        let source = Arc::new(FakeSource::default());
        *source.listing.lock().unwrap() = Some("<html>maintenance</html>".into());

        let err = run(&store, &source, false).await.unwrap_err();
        assert!(matches!(err, SyncError::Parse));
        assert!(game(&store, 1).await.curated);
        assert!(event_kinds(&store).await.is_empty());
    }

    #[tokio::test]
    async fn listing_fetch_failure_is_fatal() {
        let store = seeded_store(vec![stored_game(1, 2, true)]).await;
        let source = Arc::new(FakeSource::default());

        let err = run(&store, &source, false).await.unwrap_err();
        assert!(matches!(err, SyncError::Fetch(_)));
        assert!(game(&store, 1).await.curated);
    }

    #[tokio::test]
    async fn write_failures_are_counted_not_fatal() {
        let store = seeded_store(vec![stored_game(9, 1, true)]).await;
        let source = Arc::new(FakeSource::new(&[(1, "🌑 a"), (2, "🌒 b")]));
        store.reject_writes(true);

        let report = run(&store, &source, false).await.unwrap();
        // One failed decuration and two failed detail writes.
        assert_eq!(report.failures, 3);
        assert_eq!(report.refreshed, 0);
        assert_eq!(source.requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn pipelined_fetches_keep_listing_order() {
        let store = seeded_store(vec![]).await;
        let listing: Vec<(AppId, &str)> = (1..=6).map(|id| (id, "🌓 x")).collect();
        let source = Arc::new(FakeSource::new(&listing));
        let config = CuratorConfig {
            max_in_flight: 3,
            ..quick_config()
        };

        let seen = Mutex::new(Vec::new());
        let plan = prepare(&store, source.as_ref()).await.unwrap();
        let report = apply(
            plan,
            Arc::new(store.clone()),
            source.clone(),
            &config,
            false,
            |progress| seen.lock().unwrap().push(progress.percent()),
        )
        .await;

        assert_eq!(report.new_games, 6);
        let order: Vec<AppId> = event_kinds(&store).await.into_iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5, 6]);
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.first(), Some(&20));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn progress_percent_spans_listing_and_details() {
        assert_eq!(SyncProgress { processed: 0, total: 0 }.percent(), 100);
        assert_eq!(SyncProgress { processed: 0, total: 4 }.percent(), 20);
        assert_eq!(SyncProgress { processed: 2, total: 4 }.percent(), 60);
        assert_eq!(SyncProgress { processed: 4, total: 4 }.percent(), 100);
    }
}
