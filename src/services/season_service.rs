//! Member directory upkeep, race result recording and season rankings.

use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{MemberEntity, RaceResultEntity},
    dto::season::{
        MemberDto, MemberInput, RaceResultInput, RankingEntry, RecordResultsResponse,
        SeasonRankingResponse,
    },
    error::ServiceError,
    services::season_ranking,
    state::SharedState,
};

pub async fn list_members(state: &SharedState) -> Result<Vec<MemberDto>, ServiceError> {
    let store = state.require_curator_store().await?;
    let members = store.list_members().await?;
    Ok(members.into_iter().map(MemberDto::from).collect())
}

/// Create or replace the profile of `discord_id`.
pub async fn upsert_member(
    state: &SharedState,
    discord_id: String,
    input: MemberInput,
) -> Result<MemberDto, ServiceError> {
    let store = state.require_curator_store().await?;
    let member = MemberEntity {
        discord_id,
        steam_id: input.steam_id,
        name: input.name.trim().to_owned(),
        avatar: input.avatar,
    };
    store.upsert_member(member.clone()).await?;
    info!(discord_id = %member.discord_id, "member profile saved");
    Ok(member.into())
}

/// Append a batch of results to a season.
pub async fn record_results(
    state: &SharedState,
    season_id: String,
    results: Vec<RaceResultInput>,
) -> Result<RecordResultsResponse, ServiceError> {
    let season_id = normalize_season_id(season_id)?;
    let store = state.require_curator_store().await?;

    let recorded_at = SystemTime::now();
    let entities: Vec<RaceResultEntity> = results
        .into_iter()
        .map(|result| RaceResultEntity {
            id: Uuid::new_v4(),
            season_id: season_id.clone(),
            race_id: result.race_id,
            discord_id: result.discord_id,
            points: result.points,
            dnf: result.dnf,
            disqualified: result.disqualified,
            recorded_at,
        })
        .collect();
    let recorded = entities.len();

    store.record_results(entities).await?;
    info!(season_id = %season_id, recorded, "race results recorded");
    Ok(RecordResultsResponse {
        season_id,
        recorded,
    })
}

/// Aggregate the recorded results of a season into its ranking.
pub async fn season_ranking(
    state: &SharedState,
    season_id: String,
) -> Result<SeasonRankingResponse, ServiceError> {
    let season_id = normalize_season_id(season_id)?;
    let store = state.require_curator_store().await?;

    let results = store.list_season_results(season_id.clone()).await?;
    if results.is_empty() {
        return Err(ServiceError::NotFound(format!("season `{season_id}`")));
    }
    let members = store.list_members().await?;

    let policy = &state.config().ranking;
    let entries = season_ranking::rank(&results, &members, policy)
        .into_iter()
        .enumerate()
        .map(|(index, summary)| RankingEntry::new(index + 1, summary))
        .collect();

    Ok(SeasonRankingResponse {
        season_id,
        drop_worst: policy.drop_worst,
        entries,
    })
}

fn normalize_season_id(season_id: String) -> Result<String, ServiceError> {
    let trimmed = season_id.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidInput("season id must not be empty".into()));
    }
    Ok(trimmed.to_owned())
}
