//! DTOs exposing the curated catalog: games, tiers and change events.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{AppId, CuratorEventEntity, CuratorEventKind, GameEntity, TierEntity, TierId},
    dto::{format_system_time, validation::validate_tier_list},
};

/// Number of events returned when the caller does not ask for a limit.
pub const DEFAULT_EVENTS_LIMIT: usize = 20;

/// Public projection of a curated game.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameSummary {
    pub id: AppId,
    pub description: String,
    pub tier: TierId,
    pub title: Option<String>,
    pub image: Option<String>,
    pub url: Option<String>,
    pub achievements_total: u32,
    pub on_sale: bool,
    pub discount: u8,
    pub curated: bool,
    pub protected: bool,
    /// RFC 3339 timestamp of the last sync write.
    pub updated_at: String,
}

impl From<GameEntity> for GameSummary {
    fn from(game: GameEntity) -> Self {
        Self {
            id: game.id,
            description: game.description,
            tier: game.tier,
            title: game.title,
            image: game.image,
            url: game.url,
            achievements_total: game.achievements.total,
            on_sale: game.sale.on_sale,
            discount: game.sale.discount,
            curated: game.curated,
            protected: game.protected,
            updated_at: format_system_time(game.updated_at),
        }
    }
}

/// Tier definition, both as listed and as submitted by administrators.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct TierDto {
    #[validate(range(min = 1))]
    pub id: TierId,
    /// Marker prefixing the curator description of games in this tier.
    #[validate(length(min = 1, max = 16))]
    pub symbol: String,
    #[validate(length(max = 64))]
    pub icon: String,
    pub score: u32,
    #[validate(length(max = 200))]
    pub description: String,
}

impl From<TierEntity> for TierDto {
    fn from(tier: TierEntity) -> Self {
        Self {
            id: tier.id,
            symbol: tier.symbol,
            icon: tier.icon,
            score: tier.score,
            description: tier.description,
        }
    }
}

impl From<TierDto> for TierEntity {
    fn from(tier: TierDto) -> Self {
        Self {
            id: tier.id,
            symbol: tier.symbol.trim().to_owned(),
            icon: tier.icon,
            score: tier.score,
            description: tier.description,
        }
    }
}

/// Full replacement of the tier reference list.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ReplaceTiersRequest {
    #[validate(nested, custom(function = "validate_tier_list"))]
    pub tiers: Vec<TierDto>,
}

/// Kind of a catalog change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    NewGame,
    GameRemoved,
    TierChange,
}

/// Catalog change event as exposed to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventSummary {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: EventType,
    pub game: AppId,
    /// RFC 3339 timestamp of the detection.
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_tier: Option<TierId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_tier: Option<TierId>,
}

impl From<CuratorEventEntity> for EventSummary {
    fn from(event: CuratorEventEntity) -> Self {
        let (kind, old_tier, new_tier) = match event.kind {
            CuratorEventKind::NewGame => (EventType::NewGame, None, None),
            CuratorEventKind::GameRemoved => (EventType::GameRemoved, None, None),
            CuratorEventKind::TierChange { old_tier, new_tier } => {
                (EventType::TierChange, Some(old_tier), Some(new_tier))
            }
        };
        Self {
            id: event.id,
            kind,
            game: event.game,
            date: format_system_time(event.date),
            old_tier,
            new_tier,
        }
    }
}

/// Query string of the events listing.
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct EventsQuery {
    /// Maximum number of events to return, newest first.
    #[validate(range(min = 1, max = 200))]
    pub limit: Option<usize>,
}

impl EventsQuery {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_EVENTS_LIMIT)
    }
}
