//! Read access to the curated catalog and administration of the tier list.

use tracing::info;

use crate::{
    dao::models::{TierEntity, TierId},
    dto::catalog::{EventSummary, GameSummary, TierDto},
    error::ServiceError,
    state::SharedState,
};

/// Games currently listed publicly: curated or protected.
pub async fn list_games(state: &SharedState) -> Result<Vec<GameSummary>, ServiceError> {
    let store = state.require_curator_store().await?;
    let games = store.list_games().await?;
    Ok(games
        .into_iter()
        .filter(|game| game.is_listed())
        .map(GameSummary::from)
        .collect())
}

/// Listed games of a single tier.
pub async fn list_games_by_tier(
    state: &SharedState,
    tier: TierId,
) -> Result<Vec<GameSummary>, ServiceError> {
    let store = state.require_curator_store().await?;
    let tiers = store.list_tiers().await?;
    if !tiers.is_empty() && !tiers.iter().any(|known| known.id == tier) {
        return Err(ServiceError::NotFound(format!("tier `{tier}`")));
    }

    let games = store.list_games_by_tier(tier).await?;
    Ok(games
        .into_iter()
        .filter(|game| game.is_listed())
        .map(GameSummary::from)
        .collect())
}

pub async fn list_tiers(state: &SharedState) -> Result<Vec<TierDto>, ServiceError> {
    let store = state.require_curator_store().await?;
    let tiers = store.list_tiers().await?;
    Ok(tiers.into_iter().map(TierDto::from).collect())
}

/// Replace the tier reference list used to classify listing descriptions.
pub async fn replace_tiers(
    state: &SharedState,
    tiers: Vec<TierDto>,
) -> Result<Vec<TierDto>, ServiceError> {
    let store = state.require_curator_store().await?;
    let mut entities: Vec<TierEntity> = tiers.into_iter().map(TierEntity::from).collect();
    entities.sort_by_key(|tier| tier.id);

    store.replace_tiers(entities.clone()).await?;
    info!(count = entities.len(), "tier list replaced");
    Ok(entities.into_iter().map(TierDto::from).collect())
}

/// Newest change events first.
pub async fn list_events(
    state: &SharedState,
    limit: usize,
) -> Result<Vec<EventSummary>, ServiceError> {
    let store = state.require_curator_store().await?;
    let events = store.list_events(limit).await?;
    Ok(events.into_iter().map(EventSummary::from).collect())
}
