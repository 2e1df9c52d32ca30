use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::dao::models::{
    AchievementsEntity, AppId, CuratorEventEntity, CuratorEventKind, GameEntity,
    RaceResultEntity, SaleEntity, TierId,
};

/// Stored numeric field that does not fit its domain type.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("field `{field}` holds out-of-range value {value}")]
pub struct OutOfRange {
    field: &'static str,
    value: i64,
}

fn narrow<T: TryFrom<i64>>(field: &'static str, value: i64) -> Result<T, OutOfRange> {
    T::try_from(value).map_err(|_| OutOfRange { field, value })
}

/// Convert stored documents, skipping the ones that cannot be represented.
pub fn decode_documents<D, T>(collection: &'static str, documents: Vec<D>) -> Vec<T>
where
    T: TryFrom<D, Error = OutOfRange>,
{
    documents
        .into_iter()
        .filter_map(|document| match T::try_from(document) {
            Ok(entity) => Some(entity),
            Err(err) => {
                warn!(collection, error = %err, "skipping malformed document");
                None
            }
        })
        .collect()
}

/// Stored shape of a game. Older documents keep the tier as a string.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    id: i64,
    description: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    tier: i32,
    title: Option<String>,
    image: Option<String>,
    url: Option<String>,
    #[serde(default)]
    achievements: AchievementsEntity,
    #[serde(default)]
    sale: SaleEntity,
    curated: bool,
    #[serde(default)]
    protected: bool,
    #[serde(default = "DateTime::now")]
    updated_at: DateTime,
}

impl From<GameEntity> for MongoGameDocument {
    fn from(value: GameEntity) -> Self {
        Self {
            id: i64::from(value.id),
            description: value.description,
            tier: i32::from(value.tier),
            title: value.title,
            image: value.image,
            url: value.url,
            achievements: value.achievements,
            sale: value.sale,
            curated: value.curated,
            protected: value.protected,
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoGameDocument> for GameEntity {
    type Error = OutOfRange;

    fn try_from(value: MongoGameDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: narrow::<AppId>("_id", value.id)?,
            description: value.description,
            tier: narrow::<TierId>("tier", i64::from(value.tier))?,
            title: value.title,
            image: value.image,
            url: value.url,
            achievements: value.achievements,
            sale: value.sale,
            curated: value.curated,
            protected: value.protected,
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoEventDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    date: DateTime,
    game: i64,
    #[serde(flatten)]
    kind: CuratorEventKind,
}

impl From<CuratorEventEntity> for MongoEventDocument {
    fn from(value: CuratorEventEntity) -> Self {
        Self {
            id: value.id,
            date: DateTime::from_system_time(value.date),
            game: i64::from(value.game),
            kind: value.kind,
        }
    }
}

impl TryFrom<MongoEventDocument> for CuratorEventEntity {
    type Error = OutOfRange;

    fn try_from(value: MongoEventDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            date: value.date.to_system_time(),
            game: narrow::<AppId>("game", value.game)?,
            kind: value.kind,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoResultDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    season_id: String,
    race_id: String,
    discord_id: String,
    points: i64,
    #[serde(default)]
    dnf: bool,
    #[serde(default)]
    disqualified: bool,
    recorded_at: DateTime,
}

impl From<RaceResultEntity> for MongoResultDocument {
    fn from(value: RaceResultEntity) -> Self {
        Self {
            id: value.id,
            season_id: value.season_id,
            race_id: value.race_id,
            discord_id: value.discord_id,
            points: i64::from(value.points),
            dnf: value.dnf,
            disqualified: value.disqualified,
            recorded_at: DateTime::from_system_time(value.recorded_at),
        }
    }
}

impl TryFrom<MongoResultDocument> for RaceResultEntity {
    type Error = OutOfRange;

    fn try_from(value: MongoResultDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            season_id: value.season_id,
            race_id: value.race_id,
            discord_id: value.discord_id,
            points: narrow::<u32>("points", value.points)?,
            dnf: value.dnf,
            disqualified: value.disqualified,
            recorded_at: value.recorded_at.to_system_time(),
        })
    }
}

pub fn game_doc_id(id: AppId) -> Document {
    doc! {"_id": i64::from(id)}
}
