use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Client, Collection, Database, IndexModel, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoEventDocument, MongoGameDocument, MongoResultDocument, decode_documents, game_doc_id,
    },
};
use crate::dao::{
    curator_store::CuratorStore,
    models::{
        CuratorEventEntity, GameEntity, MemberEntity, RaceResultEntity, TierEntity, TierId,
    },
    storage::StorageResult,
};

const GAME_COLLECTION_NAME: &str = "games";
const TIER_COLLECTION_NAME: &str = "tiers";
const EVENT_COLLECTION_NAME: &str = "events";
const MEMBER_COLLECTION_NAME: &str = "members";
const RESULT_COLLECTION_NAME: &str = "race_results";

#[derive(Clone)]
pub struct MongoCuratorStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoCuratorStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let indexes: [(&'static str, &'static str, IndexModel); 4] = [
            (
                GAME_COLLECTION_NAME,
                "tier",
                IndexModel::builder()
                    .keys(doc! {"tier": 1})
                    .options(
                        IndexOptions::builder()
                            .name(Some("game_tier_idx".to_owned()))
                            .build(),
                    )
                    .build(),
            ),
            (
                EVENT_COLLECTION_NAME,
                "date",
                IndexModel::builder()
                    .keys(doc! {"date": -1})
                    .options(
                        IndexOptions::builder()
                            .name(Some("event_date_idx".to_owned()))
                            .build(),
                    )
                    .build(),
            ),
            (
                MEMBER_COLLECTION_NAME,
                "discord_id",
                IndexModel::builder()
                    .keys(doc! {"discord_id": 1})
                    .options(
                        IndexOptions::builder()
                            .name(Some("member_discord_idx".to_owned()))
                            .unique(Some(true))
                            .build(),
                    )
                    .build(),
            ),
            (
                RESULT_COLLECTION_NAME,
                "season_id",
                IndexModel::builder()
                    .keys(doc! {"season_id": 1})
                    .options(
                        IndexOptions::builder()
                            .name(Some("result_season_idx".to_owned()))
                            .build(),
                    )
                    .build(),
            ),
        ];

        for (collection, index, model) in indexes {
            database
                .collection::<mongodb::bson::Document>(collection)
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index,
                    source,
                })?;
        }

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn game_collection(&self) -> Collection<MongoGameDocument> {
        self.database()
            .await
            .collection::<MongoGameDocument>(GAME_COLLECTION_NAME)
    }

    async fn tier_collection(&self) -> Collection<TierEntity> {
        self.database()
            .await
            .collection::<TierEntity>(TIER_COLLECTION_NAME)
    }

    async fn event_collection(&self) -> Collection<MongoEventDocument> {
        self.database()
            .await
            .collection::<MongoEventDocument>(EVENT_COLLECTION_NAME)
    }

    async fn member_collection(&self) -> Collection<MemberEntity> {
        self.database()
            .await
            .collection::<MemberEntity>(MEMBER_COLLECTION_NAME)
    }

    async fn result_collection(&self) -> Collection<MongoResultDocument> {
        self.database()
            .await
            .collection::<MongoResultDocument>(RESULT_COLLECTION_NAME)
    }

    async fn find_games(&self, filter: mongodb::bson::Document) -> MongoResult<Vec<GameEntity>> {
        let documents: Vec<MongoGameDocument> = self
            .game_collection()
            .await
            .find(filter)
            .sort(doc! {"_id": 1})
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?;

        Ok(decode_documents(GAME_COLLECTION_NAME, documents))
    }

    async fn upsert_game(&self, game: GameEntity) -> MongoResult<()> {
        let id = game.id;
        let document: MongoGameDocument = game.into();
        self.game_collection()
            .await
            .replace_one(game_doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveGame { id, source })?;
        Ok(())
    }

    async fn list_tiers(&self) -> MongoResult<Vec<TierEntity>> {
        let mut tiers: Vec<TierEntity> = self
            .tier_collection()
            .await
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::ListTiers { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListTiers { source })?;
        // Ids may be stored as strings, so the server-side order is not reliable.
        tiers.sort_by_key(|tier| tier.id);
        Ok(tiers)
    }

    async fn replace_tiers(&self, tiers: Vec<TierEntity>) -> MongoResult<()> {
        let collection = self.tier_collection().await;
        collection
            .delete_many(doc! {})
            .await
            .map_err(|source| MongoDaoError::SaveTiers { source })?;
        if tiers.is_empty() {
            return Ok(());
        }
        collection
            .insert_many(&tiers)
            .await
            .map_err(|source| MongoDaoError::SaveTiers { source })?;
        Ok(())
    }

    async fn append_event(&self, event: CuratorEventEntity) -> MongoResult<()> {
        let game = event.game;
        let document: MongoEventDocument = event.into();
        self.event_collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::AppendEvent { game, source })?;
        Ok(())
    }

    async fn list_events(&self, limit: usize) -> MongoResult<Vec<CuratorEventEntity>> {
        let documents: Vec<MongoEventDocument> = self
            .event_collection()
            .await
            .find(doc! {})
            .sort(doc! {"date": -1})
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .await
            .map_err(|source| MongoDaoError::ListEvents { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListEvents { source })?;

        Ok(decode_documents(EVENT_COLLECTION_NAME, documents))
    }

    async fn list_members(&self) -> MongoResult<Vec<MemberEntity>> {
        self.member_collection()
            .await
            .find(doc! {})
            .sort(doc! {"discord_id": 1})
            .await
            .map_err(|source| MongoDaoError::ListMembers { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListMembers { source })
    }

    async fn upsert_member(&self, member: MemberEntity) -> MongoResult<()> {
        self.member_collection()
            .await
            .replace_one(doc! {"discord_id": member.discord_id.as_str()}, &member)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveMember {
                discord_id: member.discord_id.clone(),
                source,
            })?;
        Ok(())
    }

    async fn record_results(&self, results: Vec<RaceResultEntity>) -> MongoResult<()> {
        let Some(season_id) = results.first().map(|result| result.season_id.clone()) else {
            return Ok(());
        };
        let documents: Vec<MongoResultDocument> = results.into_iter().map(Into::into).collect();
        self.result_collection()
            .await
            .insert_many(&documents)
            .await
            .map_err(|source| MongoDaoError::SaveResults { season_id, source })?;
        Ok(())
    }

    async fn list_season_results(&self, season_id: String) -> MongoResult<Vec<RaceResultEntity>> {
        let documents: Vec<MongoResultDocument> = self
            .result_collection()
            .await
            .find(doc! {"season_id": season_id.as_str()})
            .await
            .map_err(|source| MongoDaoError::ListResults {
                season_id: season_id.clone(),
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListResults {
                season_id: season_id.clone(),
                source,
            })?;

        Ok(decode_documents(RESULT_COLLECTION_NAME, documents))
    }
}

impl CuratorStore for MongoCuratorStore {
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_games(doc! {}).await.map_err(Into::into) })
    }

    fn list_games_by_tier(&self, tier: TierId) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            // Legacy documents store the tier as a string.
            let filter = doc! {"tier": {"$in": [i32::from(tier), tier.to_string()]}};
            store.find_games(filter).await.map_err(Into::into)
        })
    }

    fn upsert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.upsert_game(game).await.map_err(Into::into) })
    }

    fn list_tiers(&self) -> BoxFuture<'static, StorageResult<Vec<TierEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_tiers().await.map_err(Into::into) })
    }

    fn replace_tiers(&self, tiers: Vec<TierEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.replace_tiers(tiers).await.map_err(Into::into) })
    }

    fn append_event(&self, event: CuratorEventEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.append_event(event).await.map_err(Into::into) })
    }

    fn list_events(
        &self,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<CuratorEventEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_events(limit).await.map_err(Into::into) })
    }

    fn list_members(&self) -> BoxFuture<'static, StorageResult<Vec<MemberEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_members().await.map_err(Into::into) })
    }

    fn upsert_member(&self, member: MemberEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.upsert_member(member).await.map_err(Into::into) })
    }

    fn record_results(
        &self,
        results: Vec<RaceResultEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.record_results(results).await.map_err(Into::into) })
    }

    fn list_season_results(
        &self,
        season_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<RaceResultEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_season_results(season_id)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
