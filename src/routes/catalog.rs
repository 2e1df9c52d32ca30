use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use axum_valid::Valid;

use crate::{
    dao::models::TierId,
    dto::catalog::{EventSummary, EventsQuery, GameSummary, TierDto},
    error::AppError,
    services::catalog_service,
    state::SharedState,
};

/// Public read-only catalog routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games", get(list_games))
        .route("/games/tier/{tier}", get(list_games_by_tier))
        .route("/tiers", get(list_tiers))
        .route("/events", get(list_events))
}

/// List curated and protected games.
#[utoipa::path(
    get,
    path = "/games",
    tag = "catalog",
    responses((status = 200, description = "Listed games", body = [GameSummary]))
)]
pub async fn list_games(
    State(state): State<SharedState>,
) -> Result<Json<Vec<GameSummary>>, AppError> {
    Ok(Json(catalog_service::list_games(&state).await?))
}

/// List the listed games of a single tier.
#[utoipa::path(
    get,
    path = "/games/tier/{tier}",
    tag = "catalog",
    params(("tier" = u8, Path, description = "Tier identifier")),
    responses(
        (status = 200, description = "Games of the tier", body = [GameSummary]),
        (status = 404, description = "Unknown tier")
    )
)]
pub async fn list_games_by_tier(
    State(state): State<SharedState>,
    Path(tier): Path<TierId>,
) -> Result<Json<Vec<GameSummary>>, AppError> {
    Ok(Json(catalog_service::list_games_by_tier(&state, tier).await?))
}

/// Tier reference list ordered by identifier.
#[utoipa::path(
    get,
    path = "/tiers",
    tag = "catalog",
    responses((status = 200, description = "Tiers", body = [TierDto]))
)]
pub async fn list_tiers(State(state): State<SharedState>) -> Result<Json<Vec<TierDto>>, AppError> {
    Ok(Json(catalog_service::list_tiers(&state).await?))
}

/// Most recent catalog change events.
#[utoipa::path(
    get,
    path = "/events",
    tag = "catalog",
    params(EventsQuery),
    responses((status = 200, description = "Events, newest first", body = [EventSummary]))
)]
pub async fn list_events(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<EventsQuery>>,
) -> Result<Json<Vec<EventSummary>>, AppError> {
    Ok(Json(catalog_service::list_events(&state, query.limit()).await?))
}
