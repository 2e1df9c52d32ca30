use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Curator Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::catalog::list_games,
        crate::routes::catalog::list_games_by_tier,
        crate::routes::catalog::list_tiers,
        crate::routes::catalog::list_events,
        crate::routes::season::list_members,
        crate::routes::season::season_ranking,
        crate::routes::admin::start_sync,
        crate::routes::admin::sync_status,
        crate::routes::admin::replace_tiers,
        crate::routes::admin::upsert_member,
        crate::routes::admin::record_results,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::catalog::GameSummary,
            crate::dto::catalog::TierDto,
            crate::dto::catalog::ReplaceTiersRequest,
            crate::dto::catalog::EventSummary,
            crate::dto::catalog::EventType,
            crate::dto::curator::SyncAcceptedResponse,
            crate::dto::curator::SyncStatusResponse,
            crate::dto::curator::SyncReportDto,
            crate::dto::season::MemberDto,
            crate::dto::season::MemberInput,
            crate::dto::season::RaceResultInput,
            crate::dto::season::RecordResultsRequest,
            crate::dto::season::RecordResultsResponse,
            crate::dto::season::RaceResultDto,
            crate::dto::season::RankingEntry,
            crate::dto::season::SeasonRankingResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "catalog", description = "Curated games, tiers and change events"),
        (name = "seasons", description = "Member directory and season rankings"),
        (name = "admin", description = "Token protected administration"),
    )
)]
pub struct ApiDoc;
