//! In-process [`CuratorStore`] used for local development and tests.

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::dao::{
    curator_store::CuratorStore,
    models::{
        AppId, CuratorEventEntity, GameEntity, MemberEntity, RaceResultEntity, TierEntity, TierId,
    },
    storage::{StorageError, StorageResult},
};

/// Volatile store keeping every collection in memory.
#[derive(Clone, Default)]
pub struct MemoryCuratorStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    games: DashMap<AppId, GameEntity>,
    tiers: RwLock<Vec<TierEntity>>,
    events: RwLock<Vec<CuratorEventEntity>>,
    members: DashMap<String, MemberEntity>,
    results: DashMap<String, Vec<RaceResultEntity>>,
    reject_writes: AtomicBool,
    offline: AtomicBool,
}

impl MemoryCuratorStore {
    /// Empty store accepting writes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, mimicking a backend rejecting documents.
    pub fn reject_writes(&self, reject: bool) {
        self.inner.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Make health checks and reconnect attempts fail, mimicking a lost backend.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> StorageResult<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable(
                "memory store offline".into(),
                io::Error::new(io::ErrorKind::NotConnected, "store offline"),
            ));
        }
        Ok(())
    }

    fn check_writable(&self, what: &str) -> StorageResult<()> {
        if self.inner.reject_writes.load(Ordering::SeqCst) {
            return Err(StorageError::write(
                format!("memory store rejected {what}"),
                io::Error::new(io::ErrorKind::PermissionDenied, "writes disabled"),
            ));
        }
        Ok(())
    }

    fn sorted_games(&self, filter: impl Fn(&GameEntity) -> bool) -> Vec<GameEntity> {
        let mut games: Vec<GameEntity> = self
            .inner
            .games
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        games.sort_by_key(|game| game.id);
        games
    }
}

impl CuratorStore for MemoryCuratorStore {
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let games = self.sorted_games(|_| true);
        Box::pin(async move { Ok(games) })
    }

    fn list_games_by_tier(&self, tier: TierId) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let games = self.sorted_games(|game| game.tier == tier);
        Box::pin(async move { Ok(games) })
    }

    fn upsert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_writable("game upsert")?;
            store.inner.games.insert(game.id, game);
            Ok(())
        })
    }

    fn list_tiers(&self) -> BoxFuture<'static, StorageResult<Vec<TierEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tiers = store.inner.tiers.read().await.clone();
            tiers.sort_by_key(|tier| tier.id);
            Ok(tiers)
        })
    }

    fn replace_tiers(&self, tiers: Vec<TierEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_writable("tier replacement")?;
            *store.inner.tiers.write().await = tiers;
            Ok(())
        })
    }

    fn append_event(&self, event: CuratorEventEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_writable("event append")?;
            store.inner.events.write().await.push(event);
            Ok(())
        })
    }

    fn list_events(
        &self,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<CuratorEventEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let events = store.inner.events.read().await;
            Ok(events.iter().rev().take(limit).cloned().collect())
        })
    }

    fn list_members(&self) -> BoxFuture<'static, StorageResult<Vec<MemberEntity>>> {
        let mut members: Vec<MemberEntity> = self
            .inner
            .members
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        members.sort_by(|a, b| a.discord_id.cmp(&b.discord_id));
        Box::pin(async move { Ok(members) })
    }

    fn upsert_member(&self, member: MemberEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_writable("member upsert")?;
            store
                .inner
                .members
                .insert(member.discord_id.clone(), member);
            Ok(())
        })
    }

    fn record_results(
        &self,
        results: Vec<RaceResultEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_writable("race results")?;
            for result in results {
                store
                    .inner
                    .results
                    .entry(result.season_id.clone())
                    .or_default()
                    .push(result);
            }
            Ok(())
        })
    }

    fn list_season_results(
        &self,
        season_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<RaceResultEntity>>> {
        let results = self
            .inner
            .results
            .get(&season_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        Box::pin(async move { Ok(results) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let status = self.check_online();
        Box::pin(async move { status })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let status = self.check_online();
        Box::pin(async move { status })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use uuid::Uuid;

    use super::*;
    use crate::dao::models::CuratorEventKind;

    fn game(id: AppId, tier: TierId) -> GameEntity {
        GameEntity {
            id,
            description: format!("game {id}"),
            tier,
            title: None,
            image: None,
            url: None,
            achievements: Default::default(),
            sale: Default::default(),
            curated: true,
            protected: false,
            updated_at: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn upsert_replaces_existing_game() {
        let store = MemoryCuratorStore::new();
        store.upsert_game(game(10, 1)).await.unwrap();
        store.upsert_game(game(10, 4)).await.unwrap();
        store.upsert_game(game(5, 4)).await.unwrap();

        let games = store.list_games().await.unwrap();
        assert_eq!(games.iter().map(|g| g.id).collect::<Vec<_>>(), vec![5, 10]);

        let tier_four = store.list_games_by_tier(4).await.unwrap();
        assert_eq!(tier_four.len(), 2);
        assert!(store.list_games_by_tier(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn events_are_listed_newest_first() {
        let store = MemoryCuratorStore::new();
        for id in 1..=3 {
            store
                .append_event(CuratorEventEntity::now(id, CuratorEventKind::NewGame))
                .await
                .unwrap();
        }

        let events = store.list_events(2).await.unwrap();
        assert_eq!(events.iter().map(|e| e.game).collect::<Vec<_>>(), vec![3, 2]);
    }

    #[tokio::test]
    async fn rejected_writes_surface_as_write_errors() {
        let store = MemoryCuratorStore::new();
        store.reject_writes(true);

        let err = store.upsert_game(game(1, 1)).await.unwrap_err();
        assert!(matches!(err, StorageError::Write { .. }));
        assert!(store.list_games().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn results_are_partitioned_by_season() {
        let store = MemoryCuratorStore::new();
        let result = |season: &str| RaceResultEntity {
            id: Uuid::new_v4(),
            season_id: season.into(),
            race_id: "race".into(),
            discord_id: "p".into(),
            points: 1,
            dnf: false,
            disqualified: false,
            recorded_at: SystemTime::now(),
        };
        store
            .record_results(vec![result("s1"), result("s2"), result("s1")])
            .await
            .unwrap();

        assert_eq!(store.list_season_results("s1".into()).await.unwrap().len(), 2);
        assert_eq!(store.list_season_results("s2".into()).await.unwrap().len(), 1);
        assert!(store.list_season_results("s3".into()).await.unwrap().is_empty());
    }
}
