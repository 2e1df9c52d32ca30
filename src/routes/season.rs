use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::season::{MemberDto, SeasonRankingResponse},
    error::AppError,
    services::season_service,
    state::SharedState,
};

/// Public member directory and ranking routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/members", get(list_members))
        .route("/seasons/{season_id}/ranking", get(season_ranking))
}

/// Member directory.
#[utoipa::path(
    get,
    path = "/members",
    tag = "seasons",
    responses((status = 200, description = "Members", body = [MemberDto]))
)]
pub async fn list_members(
    State(state): State<SharedState>,
) -> Result<Json<Vec<MemberDto>>, AppError> {
    Ok(Json(season_service::list_members(&state).await?))
}

/// Ranking of a season, lowest best-of score first.
#[utoipa::path(
    get,
    path = "/seasons/{season_id}/ranking",
    tag = "seasons",
    params(("season_id" = String, Path, description = "Season identifier")),
    responses(
        (status = 200, description = "Season ranking", body = SeasonRankingResponse),
        (status = 404, description = "No results recorded for the season")
    )
)]
pub async fn season_ranking(
    State(state): State<SharedState>,
    Path(season_id): Path<String>,
) -> Result<Json<SeasonRankingResponse>, AppError> {
    Ok(Json(season_service::season_ranking(&state, season_id).await?))
}
