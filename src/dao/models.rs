use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use std::time::SystemTime;
use uuid::Uuid;

/// Numeric tier identifier (1 is the lowest tier).
pub type TierId = u8;

/// Store identifier of a game (Steam app id).
pub type AppId = u32;

/// Tier definition used to classify curated games.
///
/// Legacy documents store the identifier as a string (`"3"`), hence the lenient decoding.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TierEntity {
    /// Tier identifier, ordered from easiest to hardest.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub id: TierId,
    /// Marker prefixing the curator description of games in this tier.
    pub symbol: String,
    /// Icon class name displayed by the front-end.
    pub icon: String,
    /// Points awarded for completing a game of this tier.
    pub score: u32,
    /// Short human readable description.
    pub description: String,
}

/// Achievement totals reported by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AchievementsEntity {
    pub total: u32,
}

/// Discount information reported by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaleEntity {
    pub on_sale: bool,
    pub discount: u8,
}

/// Game tracked by the curator, curated or not.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Store identifier of the game.
    pub id: AppId,
    /// Curator description, including the leading tier marker.
    pub description: String,
    /// Tier the game currently belongs to.
    pub tier: TierId,
    /// Title fetched from the store details endpoint.
    pub title: Option<String>,
    /// Header image fetched from the store details endpoint.
    pub image: Option<String>,
    /// Details endpoint the record was enriched from.
    pub url: Option<String>,
    #[serde(default)]
    pub achievements: AchievementsEntity,
    #[serde(default)]
    pub sale: SaleEntity,
    /// Whether the game is part of the curated catalog.
    pub curated: bool,
    /// Protected games are never decurated by a sync pass.
    #[serde(default)]
    pub protected: bool,
    /// Last time the record was written by a sync pass.
    pub updated_at: SystemTime,
}

impl GameEntity {
    /// True when the game should be listed publicly.
    pub fn is_listed(&self) -> bool {
        self.curated || self.protected
    }
}

/// Kind-specific payload of a curator change event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum CuratorEventKind {
    /// Game appeared in the curated listing for the first time.
    NewGame,
    /// Game vanished from the curated listing and was decurated.
    GameRemoved,
    /// Game moved to another tier.
    TierChange { old_tier: TierId, new_tier: TierId },
}

/// Append-only log entry describing a change of the curated catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CuratorEventEntity {
    /// Stable identifier of the event.
    pub id: Uuid,
    /// When the change was detected.
    pub date: SystemTime,
    /// Game affected by the change.
    pub game: AppId,
    #[serde(flatten)]
    pub kind: CuratorEventKind,
}

impl CuratorEventEntity {
    /// Build an event stamped with the current time.
    pub fn now(game: AppId, kind: CuratorEventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: SystemTime::now(),
            game,
            kind,
        }
    }
}

/// Member directory entry used to resolve race participants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemberEntity {
    /// Discord identifier, the key race results refer to.
    pub discord_id: String,
    /// Steam profile identifier, when the member linked one.
    pub steam_id: Option<String>,
    /// Display name.
    pub name: String,
    /// Avatar URL.
    pub avatar: Option<String>,
}

/// Single participation of a member in a single race.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RaceResultEntity {
    /// Stable identifier of the result.
    pub id: Uuid,
    /// Season the race belongs to.
    pub season_id: String,
    /// Race the result was recorded for.
    pub race_id: String,
    /// Discord identifier of the participant.
    pub discord_id: String,
    /// Points scored; lower is better.
    pub points: u32,
    /// Participant gave up.
    pub dnf: bool,
    /// Participant was disqualified.
    pub disqualified: bool,
    /// When the result was recorded.
    pub recorded_at: SystemTime,
}
