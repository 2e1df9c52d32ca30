use mongodb::error::Error as MongoError;
use thiserror::Error;

use crate::dao::models::AppId;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to save game `{id}`")]
    SaveGame {
        id: AppId,
        #[source]
        source: MongoError,
    },
    #[error("failed to list games")]
    ListGames {
        #[source]
        source: MongoError,
    },
    #[error("failed to replace tiers")]
    SaveTiers {
        #[source]
        source: MongoError,
    },
    #[error("failed to list tiers")]
    ListTiers {
        #[source]
        source: MongoError,
    },
    #[error("failed to append event for game `{game}`")]
    AppendEvent {
        game: AppId,
        #[source]
        source: MongoError,
    },
    #[error("failed to list events")]
    ListEvents {
        #[source]
        source: MongoError,
    },
    #[error("failed to save member `{discord_id}`")]
    SaveMember {
        discord_id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to list members")]
    ListMembers {
        #[source]
        source: MongoError,
    },
    #[error("failed to record results for season `{season_id}`")]
    SaveResults {
        season_id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to list results for season `{season_id}`")]
    ListResults {
        season_id: String,
        #[source]
        source: MongoError,
    },
}

impl MongoDaoError {
    /// Whether the failure happened while writing documents.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            MongoDaoError::SaveGame { .. }
                | MongoDaoError::SaveTiers { .. }
                | MongoDaoError::AppendEvent { .. }
                | MongoDaoError::SaveMember { .. }
                | MongoDaoError::SaveResults { .. }
        )
    }
}
