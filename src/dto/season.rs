//! DTOs of the member directory and the season ranking.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{MemberEntity, RaceResultEntity},
    dto::{format_system_time, validation::validate_discord_id},
    services::season_ranking::SeasonSummary,
};

/// Member profile as exposed to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemberDto {
    pub discord_id: String,
    pub steam_id: Option<String>,
    pub name: String,
    pub avatar: Option<String>,
}

impl From<MemberEntity> for MemberDto {
    fn from(member: MemberEntity) -> Self {
        Self {
            discord_id: member.discord_id,
            steam_id: member.steam_id,
            name: member.name,
            avatar: member.avatar,
        }
    }
}

/// Profile fields submitted when creating or updating a member.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct MemberInput {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 32))]
    pub steam_id: Option<String>,
    #[serde(default)]
    #[validate(url)]
    pub avatar: Option<String>,
}

/// Single race result submitted by an administrator.
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct RaceResultInput {
    #[validate(length(min = 1, max = 64))]
    pub race_id: String,
    #[validate(custom(function = "validate_discord_id"))]
    pub discord_id: String,
    pub points: u32,
    #[serde(default)]
    pub dnf: bool,
    #[serde(default)]
    pub disqualified: bool,
}

/// Batch of race results recorded for a season.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RecordResultsRequest {
    #[validate(length(min = 1), nested)]
    pub results: Vec<RaceResultInput>,
}

/// Acknowledgement of a recorded batch.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordResultsResponse {
    pub season_id: String,
    pub recorded: usize,
}

/// Race result listed under a ranking entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct RaceResultDto {
    pub race_id: String,
    pub points: u32,
    pub dnf: bool,
    pub disqualified: bool,
    pub recorded_at: String,
}

impl From<RaceResultEntity> for RaceResultDto {
    fn from(result: RaceResultEntity) -> Self {
        Self {
            race_id: result.race_id,
            points: result.points,
            dnf: result.dnf,
            disqualified: result.disqualified,
            recorded_at: format_system_time(result.recorded_at),
        }
    }
}

/// Aggregated results of one participant.
#[derive(Debug, Serialize, ToSchema)]
pub struct RankingEntry {
    /// 1-based position in the ranking.
    pub position: usize,
    pub discord_id: String,
    pub member: Option<MemberDto>,
    pub points_total: u64,
    pub points_best: u64,
    pub participations_total: u32,
    pub dnfs_total: u32,
    pub golds: u32,
    pub silvers: u32,
    pub bronzes: u32,
    pub races: Vec<RaceResultDto>,
}

impl RankingEntry {
    pub fn new(position: usize, summary: SeasonSummary) -> Self {
        Self {
            position,
            discord_id: summary.discord_id,
            member: summary.member.map(MemberDto::from),
            points_total: summary.points_total,
            points_best: summary.points_best,
            participations_total: summary.participations_total,
            dnfs_total: summary.dnfs_total,
            golds: summary.golds,
            silvers: summary.silvers,
            bronzes: summary.bronzes,
            races: summary.races.into_iter().map(RaceResultDto::from).collect(),
        }
    }
}

/// Ranking of a season, best participant first.
#[derive(Debug, Serialize, ToSchema)]
pub struct SeasonRankingResponse {
    pub season_id: String,
    /// Worst results ignored by `points_best`.
    pub drop_worst: usize,
    pub entries: Vec<RankingEntry>,
}
