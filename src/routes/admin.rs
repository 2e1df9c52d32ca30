use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use axum_valid::Valid;

use crate::{
    dto::{
        catalog::{ReplaceTiersRequest, TierDto},
        curator::{SyncAcceptedResponse, SyncStatusResponse},
        season::{MemberDto, MemberInput, RecordResultsRequest, RecordResultsResponse},
        validation::validate_discord_id,
    },
    error::AppError,
    services::{catalog_service, curator_service, season_service},
    state::SharedState,
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";
const FORCE_UPDATE_HEADER: &str = "force_update";

/// Admin-only routes driving the synchronizer and maintaining reference data.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/curator/sync", post(start_sync))
        .route("/admin/curator/status", get(sync_status))
        .route("/admin/tiers", put(replace_tiers))
        .route("/admin/members/{discord_id}", put(upsert_member))
        .route("/admin/seasons/{season_id}/results", post(record_results))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// Trigger a curator sync pass; details are fetched in the background.
#[utoipa::path(
    post,
    path = "/admin/curator/sync",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Admin token configured through ADMIN_TOKEN"),
        ("force_update" = Option<bool>, Header, description = "Refresh every listed game, not only changed ones")
    ),
    responses(
        (status = 202, description = "Sync accepted", body = SyncAcceptedResponse),
        (status = 409, description = "A sync is already running"),
        (status = 502, description = "The curator listing could not be fetched or parsed")
    )
)]
pub async fn start_sync(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<SyncAcceptedResponse>), AppError> {
    let force_update = force_update_requested(&headers);
    let accepted = curator_service::start_sync(&state, force_update).await?;
    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

/// Progress of the running pass or outcome of the last one.
#[utoipa::path(
    get,
    path = "/admin/curator/status",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token configured through ADMIN_TOKEN")),
    responses((status = 200, description = "Sync status", body = SyncStatusResponse))
)]
pub async fn sync_status(State(state): State<SharedState>) -> Json<SyncStatusResponse> {
    Json(curator_service::sync_status(&state))
}

/// Replace the tier reference list.
#[utoipa::path(
    put,
    path = "/admin/tiers",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token configured through ADMIN_TOKEN")),
    request_body = ReplaceTiersRequest,
    responses((status = 200, description = "Stored tiers", body = [TierDto]))
)]
pub async fn replace_tiers(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<ReplaceTiersRequest>>,
) -> Result<Json<Vec<TierDto>>, AppError> {
    Ok(Json(
        catalog_service::replace_tiers(&state, payload.tiers).await?,
    ))
}

/// Create or update a member profile.
#[utoipa::path(
    put,
    path = "/admin/members/{discord_id}",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Admin token configured through ADMIN_TOKEN"),
        ("discord_id" = String, Path, description = "Discord identifier of the member")
    ),
    request_body = MemberInput,
    responses((status = 200, description = "Stored member", body = MemberDto))
)]
pub async fn upsert_member(
    State(state): State<SharedState>,
    Path(discord_id): Path<String>,
    Valid(Json(payload)): Valid<Json<MemberInput>>,
) -> Result<Json<MemberDto>, AppError> {
    validate_discord_id(&discord_id)
        .map_err(|err| AppError::BadRequest(format!("invalid discord id: {err}")))?;
    Ok(Json(
        season_service::upsert_member(&state, discord_id, payload).await?,
    ))
}

/// Record race results for a season.
#[utoipa::path(
    post,
    path = "/admin/seasons/{season_id}/results",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Admin token configured through ADMIN_TOKEN"),
        ("season_id" = String, Path, description = "Season identifier")
    ),
    request_body = RecordResultsRequest,
    responses((status = 201, description = "Results recorded", body = RecordResultsResponse))
)]
pub async fn record_results(
    State(state): State<SharedState>,
    Path(season_id): Path<String>,
    Valid(Json(payload)): Valid<Json<RecordResultsRequest>>,
) -> Result<(StatusCode, Json<RecordResultsResponse>), AppError> {
    let recorded = season_service::record_results(&state, season_id, payload.results).await?;
    Ok((StatusCode::CREATED, Json(recorded)))
}

fn force_update_requested(headers: &HeaderMap) -> bool {
    headers
        .get(FORCE_UPDATE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    match state.admin_token() {
        Some(token) if token == provided => Ok(next.run(req).await),
        Some(_) => Err(AppError::Unauthorized("invalid admin token".into())),
        None => Err(AppError::Unauthorized(
            "admin token not configured on the server".into(),
        )),
    }
}
