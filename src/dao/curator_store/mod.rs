pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    CuratorEventEntity, GameEntity, MemberEntity, RaceResultEntity, TierEntity, TierId,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the document store holding games, tiers, events, members and race results.
pub trait CuratorStore: Send + Sync {
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    fn list_games_by_tier(&self, tier: TierId) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    fn upsert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Tiers ordered by ascending identifier.
    fn list_tiers(&self) -> BoxFuture<'static, StorageResult<Vec<TierEntity>>>;
    fn replace_tiers(&self, tiers: Vec<TierEntity>) -> BoxFuture<'static, StorageResult<()>>;
    fn append_event(&self, event: CuratorEventEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Newest events first.
    fn list_events(&self, limit: usize)
    -> BoxFuture<'static, StorageResult<Vec<CuratorEventEntity>>>;
    fn list_members(&self) -> BoxFuture<'static, StorageResult<Vec<MemberEntity>>>;
    fn upsert_member(&self, member: MemberEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn record_results(
        &self,
        results: Vec<RaceResultEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn list_season_results(
        &self,
        season_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<RaceResultEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
