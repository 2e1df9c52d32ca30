//! Season leaderboard aggregation.
//!
//! Scoring is golf-style: every race awards points, fewer points is better and a
//! participant's best-of score ignores their worst results.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::dao::models::{MemberEntity, RaceResultEntity};

/// Worst results ignored by the best-of score unless configured otherwise.
pub const DEFAULT_DROP_WORST: usize = 3;

/// What to do with participants missing from the member directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnresolvedParticipants {
    /// Leave them out of the ranking.
    #[default]
    Exclude,
    /// Rank them without a member profile.
    Include,
}

/// Which results can earn a medal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MedalScope {
    /// Every result, DNF and disqualified entries included.
    #[default]
    AllEntries,
    /// Only completed participations.
    ParticipationsOnly,
}

/// Tunables of the aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingPolicy {
    /// Number of highest-point results removed from the best-of score.
    ///
    /// The drop is clamped: a participant with `drop_worst` results or fewer has a best-of
    /// score of zero.
    pub drop_worst: usize,
    /// Handling of participants absent from the member directory.
    pub unresolved: UnresolvedParticipants,
    /// Results taken into account for the medal tally.
    pub medals: MedalScope,
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self {
            drop_worst: DEFAULT_DROP_WORST,
            unresolved: UnresolvedParticipants::default(),
            medals: MedalScope::default(),
        }
    }
}

/// Placement bucket derived from the points of a single race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medal {
    /// Zero points.
    Gold,
    /// One or two points.
    Silver,
    /// Three to five points.
    Bronze,
}

impl Medal {
    /// Gold is exactly 0 points, silver `[1, 3)`, bronze `[3, 6)`, anything else earns nothing.
    pub fn for_points(points: u32) -> Option<Self> {
        match points {
            0 => Some(Medal::Gold),
            1..3 => Some(Medal::Silver),
            3..6 => Some(Medal::Bronze),
            _ => None,
        }
    }
}

/// Aggregated season results of one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonSummary {
    /// Participant identifier the results were grouped by.
    pub discord_id: String,
    /// Directory profile, `None` for unresolved participants.
    pub member: Option<MemberEntity>,
    /// Sum of the points of every result.
    pub points_total: u64,
    /// Sum of the points once the worst results are dropped.
    pub points_best: u64,
    /// Results that are neither DNF nor disqualified.
    pub participations_total: u32,
    /// Results flagged as DNF.
    pub dnfs_total: u32,
    /// Results worth a gold medal.
    pub golds: u32,
    /// Results worth a silver medal.
    pub silvers: u32,
    /// Results worth a bronze medal.
    pub bronzes: u32,
    /// Raw results of the participant, in input order.
    pub races: Vec<RaceResultEntity>,
}

/// Whether a result counts as a completed participation.
fn participated(result: &RaceResultEntity) -> bool {
    !result.dnf && !result.disqualified
}

/// Aggregate raw race results into a ranking, best (lowest best-of score) first.
///
/// Medals are counted over every result unless the policy restricts them to completed
/// participations. Ties are broken by total points, then by participant identifier.
pub fn rank(
    results: &[RaceResultEntity],
    members: &[MemberEntity],
    policy: &RankingPolicy,
) -> Vec<SeasonSummary> {
    let directory: HashMap<&str, &MemberEntity> = members
        .iter()
        .map(|member| (member.discord_id.as_str(), member))
        .collect();

    let mut groups: IndexMap<&str, Vec<&RaceResultEntity>> = IndexMap::new();
    for result in results {
        groups
            .entry(result.discord_id.as_str())
            .or_default()
            .push(result);
    }

    let mut ranking: Vec<SeasonSummary> = groups
        .into_iter()
        .filter_map(|(discord_id, races)| {
            let member = directory.get(discord_id).map(|member| (*member).clone());
            if member.is_none() && policy.unresolved == UnresolvedParticipants::Exclude {
                return None;
            }
            Some(summarize(discord_id, member, &races, policy))
        })
        .collect();

    ranking.sort_by(|a, b| {
        a.points_best
            .cmp(&b.points_best)
            .then(a.points_total.cmp(&b.points_total))
            .then_with(|| a.discord_id.cmp(&b.discord_id))
    });
    ranking
}

fn summarize(
    discord_id: &str,
    member: Option<MemberEntity>,
    races: &[&RaceResultEntity],
    policy: &RankingPolicy,
) -> SeasonSummary {
    let points_total = races.iter().map(|race| u64::from(race.points)).sum();

    let mut sorted_points: Vec<u64> = races.iter().map(|race| u64::from(race.points)).collect();
    sorted_points.sort_unstable();
    let kept = sorted_points.len().saturating_sub(policy.drop_worst);
    let points_best = sorted_points[..kept].iter().sum();

    let mut summary = SeasonSummary {
        discord_id: discord_id.to_owned(),
        member,
        points_total,
        points_best,
        participations_total: 0,
        dnfs_total: 0,
        golds: 0,
        silvers: 0,
        bronzes: 0,
        races: races.iter().map(|race| (*race).clone()).collect(),
    };

    for race in races {
        if race.dnf {
            summary.dnfs_total += 1;
        }
        let completed = participated(race);
        if completed {
            summary.participations_total += 1;
        }
        if !completed && policy.medals == MedalScope::ParticipationsOnly {
            continue;
        }
        match Medal::for_points(race.points) {
            Some(Medal::Gold) => summary.golds += 1,
            Some(Medal::Silver) => summary.silvers += 1,
            Some(Medal::Bronze) => summary.bronzes += 1,
            None => {}
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use uuid::Uuid;

    use super::*;

    fn result(discord_id: &str, points: u32) -> RaceResultEntity {
        RaceResultEntity {
            id: Uuid::new_v4(),
            season_id: "season".into(),
            race_id: Uuid::new_v4().to_string(),
            discord_id: discord_id.into(),
            points,
            dnf: false,
            disqualified: false,
            recorded_at: SystemTime::UNIX_EPOCH,
        }
    }

    fn member(discord_id: &str) -> MemberEntity {
        MemberEntity {
            discord_id: discord_id.into(),
            steam_id: None,
            name: discord_id.to_uppercase(),
            avatar: None,
        }
    }

    fn summary_of<'a>(ranking: &'a [SeasonSummary], discord_id: &str) -> &'a SeasonSummary {
        ranking
            .iter()
            .find(|summary| summary.discord_id == discord_id)
            .expect("participant ranked")
    }

    #[test]
    fn medal_buckets_follow_point_thresholds() {
        assert_eq!(Medal::for_points(0), Some(Medal::Gold));
        assert_eq!(Medal::for_points(1), Some(Medal::Silver));
        assert_eq!(Medal::for_points(2), Some(Medal::Silver));
        assert_eq!(Medal::for_points(3), Some(Medal::Bronze));
        assert_eq!(Medal::for_points(5), Some(Medal::Bronze));
        assert_eq!(Medal::for_points(6), None);
        assert_eq!(Medal::for_points(40), None);
    }

    #[test]
    fn three_results_leave_an_empty_best_of() {
        let results = vec![result("a", 0), result("a", 2), result("a", 5)];
        let ranking = rank(&results, &[member("a")], &RankingPolicy::default());

        let a = summary_of(&ranking, "a");
        assert_eq!(a.points_total, 7);
        assert_eq!(a.points_best, 0);
        assert_eq!(a.participations_total, 3);
        assert_eq!((a.golds, a.silvers, a.bronzes), (1, 1, 1));
    }

    #[test]
    fn best_of_drops_the_highest_point_results() {
        let results = vec![
            result("a", 9),
            result("a", 0),
            result("a", 5),
            result("a", 1),
            result("a", 2),
        ];
        let ranking = rank(&results, &[member("a")], &RankingPolicy::default());

        let a = summary_of(&ranking, "a");
        assert_eq!(a.points_total, 17);
        assert_eq!(a.points_best, 1);
        assert_eq!(a.races.len(), 5);
    }

    #[test]
    fn drop_count_is_configurable() {
        let results = vec![result("a", 4), result("a", 1), result("a", 2)];
        let policy = RankingPolicy {
            drop_worst: 1,
            ..RankingPolicy::default()
        };
        let ranking = rank(&results, &[member("a")], &policy);
        assert_eq!(summary_of(&ranking, "a").points_best, 3);
    }

    #[test]
    fn medals_count_every_entry_by_default() {
        let mut disqualified = result("a", 0);
        disqualified.disqualified = true;
        let mut dnf = result("a", 2);
        dnf.dnf = true;
        let results = vec![disqualified, dnf];

        let ranking = rank(&results, &[member("a")], &RankingPolicy::default());
        let a = summary_of(&ranking, "a");
        assert_eq!(a.participations_total, 0);
        assert_eq!(a.dnfs_total, 1);
        assert_eq!((a.golds, a.silvers, a.bronzes), (1, 1, 0));
    }

    #[test]
    fn medals_can_be_limited_to_participations() {
        let mut dnf = result("a", 0);
        dnf.dnf = true;
        let mut disqualified = result("a", 0);
        disqualified.disqualified = true;
        let results = vec![dnf, disqualified, result("a", 4)];
        let policy = RankingPolicy {
            medals: MedalScope::ParticipationsOnly,
            ..RankingPolicy::default()
        };

        let ranking = rank(&results, &[member("a")], &policy);
        let a = summary_of(&ranking, "a");
        assert_eq!(a.participations_total, 1);
        assert_eq!(a.dnfs_total, 1);
        assert_eq!((a.golds, a.silvers, a.bronzes), (0, 0, 1));
        // Excluded results still count towards the points.
        assert_eq!(a.points_total, 4);
    }

    #[test]
    fn unresolved_participants_are_excluded_by_default() {
        let results = vec![result("a", 1), result("ghost", 0)];
        let ranking = rank(&results, &[member("a")], &RankingPolicy::default());
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].discord_id, "a");
        assert_eq!(ranking[0].member.as_ref().map(|m| m.name.as_str()), Some("A"));
    }

    #[test]
    fn unresolved_participants_can_be_included() {
        let results = vec![result("a", 1), result("ghost", 0)];
        let policy = RankingPolicy {
            unresolved: UnresolvedParticipants::Include,
            ..RankingPolicy::default()
        };
        let ranking = rank(&results, &[member("a")], &policy);
        assert_eq!(ranking.len(), 2);
        assert!(summary_of(&ranking, "ghost").member.is_none());
    }

    #[test]
    fn ranking_is_sorted_by_best_of_then_total_then_id() {
        let policy = RankingPolicy {
            drop_worst: 0,
            ..RankingPolicy::default()
        };
        let results = vec![
            result("c", 3),
            result("b", 2),
            result("b", 1),
            result("a", 3),
            result("d", 1),
        ];
        let members = ["a", "b", "c", "d"].map(member);

        let ranking = rank(&results, &members, &policy);
        let order: Vec<&str> = ranking.iter().map(|s| s.discord_id.as_str()).collect();
        assert_eq!(order, vec!["d", "a", "b", "c"]);
    }

    #[test]
    fn ranking_is_deterministic_and_respects_invariants() {
        // Small linear congruential generator keeps the input reproducible.
        let mut seed: u64 = 0x5eed;
        let mut next = move |bound: u64| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) % bound
        };

        let ids = ["a", "b", "c", "d", "e"];
        let results: Vec<RaceResultEntity> = (0..60)
            .map(|_| {
                let mut entry = result(ids[next(ids.len() as u64) as usize], next(12) as u32);
                entry.dnf = next(8) == 0;
                entry.disqualified = next(10) == 0;
                entry
            })
            .collect();
        let members = ids.map(member);
        let policy = RankingPolicy::default();

        let first = rank(&results, &members, &policy);
        let second = rank(&results, &members, &policy);
        assert_eq!(first, second);

        for summary in &first {
            assert!(summary.points_best <= summary.points_total);
            assert!(summary.golds + summary.silvers + summary.bronzes <= summary.races.len() as u32);
        }
        assert!(first.windows(2).all(|w| w[0].points_best <= w[1].points_best));

        let strict = RankingPolicy {
            medals: MedalScope::ParticipationsOnly,
            ..RankingPolicy::default()
        };
        for summary in rank(&results, &members, &strict) {
            assert!(summary.golds + summary.silvers + summary.bronzes <= summary.participations_total);
        }
    }

    #[test]
    fn empty_input_yields_empty_ranking() {
        assert!(rank(&[], &[member("a")], &RankingPolicy::default()).is_empty());
    }
}
