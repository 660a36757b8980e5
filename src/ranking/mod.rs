// 🏆 Ranking Engines - Per-event, per-meeting, per-swimmer and per-group scores
//
// Both methods share the same pipeline:
//
//   race result ──score_event──▶ event score
//   event scores of one meeting ──▶ MeetingScore (best event + bonuses)
//   meeting scores of one swimmer ──▶ SwimmerSeasonScore (best N of M)
//   swimmers of one gender/category ──▶ GenderCategoryRanking
//
// Only the event scoring differs (`EventScorer`); `balanced` and `enhanced`
// each provide one.

pub mod balanced;
pub mod bonus;
pub mod enhanced;

use crate::config::RankingConfig;
use crate::entities::{CategoryType, EventType, GenderType, SeasonCatalog};
use crate::error::{RankingError, Result};
use crate::results::{RaceResult, ResultQuery, ResultRepository};
use bonus::{event_bonus, medal_bonus, EventBonusRule, MedalTally};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub use balanced::BalancedRankingEngine;
pub use enhanced::EnhancedRankingEngine;

// ============================================================================
// OPTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct RankingOptions {
    /// N in "best N of M" meetings
    pub best_meetings: usize,

    /// Only results swum up to this date (None = whole season)
    pub until: Option<NaiveDate>,

    pub event_bonuses: Vec<EventBonusRule>,

    /// Enhancement cap of the EIR method
    pub enhance_cap: u32,
}

impl Default for RankingOptions {
    fn default() -> Self {
        RankingOptions::from_config(&RankingConfig::default())
    }
}

impl RankingOptions {
    pub fn from_config(config: &RankingConfig) -> Self {
        RankingOptions {
            best_meetings: config.best_meetings,
            until: None,
            event_bonuses: config.event_bonuses.clone(),
            enhance_cap: config.enhance_cap,
        }
    }

    pub fn until(mut self, date: NaiveDate) -> Self {
        self.until = Some(date);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.best_meetings == 0 {
            return Err(RankingError::InvalidArgument(
                "best_meetings must be at least 1".to_string(),
            ));
        }
        if self.enhance_cap > enhanced::MAX_ENHANCE_POINTS {
            return Err(RankingError::InvalidArgument(format!(
                "enhance_cap {} exceeds {}",
                self.enhance_cap,
                enhanced::MAX_ENHANCE_POINTS
            )));
        }
        Ok(())
    }
}

// ============================================================================
// EVENT SCORING
// ============================================================================

/// Per-race score produced by a ranking method
pub trait EventPoints {
    fn event(&self) -> &EventType;
    fn rank(&self) -> Option<u32>;
    fn total(&self) -> f64;
}

/// A ranking method: turns one valid race result into an event score
pub trait EventScorer {
    type Score: EventPoints;

    fn score_event(&self, result: &RaceResult, event: &EventType) -> Result<Self::Score>;
}

// ============================================================================
// MEETING SCORE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingScore<E> {
    pub meeting_id: i64,
    pub swimmer_id: i64,
    pub session_date: NaiveDate,

    /// Sorted by total, highest first; ties keep encounter order
    pub event_scores: Vec<E>,

    pub event_bonus: u32,
    pub medal_tally: MedalTally,
    pub medal_bonus: u32,

    /// Total of the best single event
    pub best_event_total: f64,

    pub total: f64,
}

impl<E: EventPoints> MeetingScore<E> {
    pub fn new(
        meeting_id: i64,
        swimmer_id: i64,
        session_date: NaiveDate,
        mut event_scores: Vec<E>,
        bonus_rules: &[EventBonusRule],
    ) -> Self {
        let event_bonus = event_bonus(bonus_rules, event_scores.iter().map(|s| s.event()));
        let medal_tally = MedalTally::from_ranks(event_scores.iter().map(|s| s.rank()));
        let medal_bonus = medal_bonus(&medal_tally);

        // sort_by is stable
        event_scores.sort_by(|a, b| b.total().total_cmp(&a.total()));
        let best_event_total = event_scores.first().map_or(0.0, |s| s.total());

        MeetingScore {
            meeting_id,
            swimmer_id,
            session_date,
            event_scores,
            event_bonus,
            medal_tally,
            medal_bonus,
            best_event_total,
            total: best_event_total + f64::from(event_bonus) + f64::from(medal_bonus),
        }
    }

    pub fn best_event(&self) -> Option<&E> {
        self.event_scores.first()
    }
}

// ============================================================================
// SWIMMER SEASON SCORE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwimmerSeasonScore<E> {
    pub swimmer_id: i64,
    pub gender: GenderType,
    pub category_code: String,

    /// Sorted by total, highest first
    pub meetings: Vec<MeetingScore<E>>,

    pub best_meetings: usize,

    /// Sum of the best `best_meetings` meeting totals
    pub total: f64,
}

impl<E> SwimmerSeasonScore<E> {
    pub fn new(
        swimmer_id: i64,
        gender: GenderType,
        category_code: &str,
        mut meetings: Vec<MeetingScore<E>>,
        best_meetings: usize,
    ) -> Self {
        meetings.sort_by(|a, b| b.total.total_cmp(&a.total));
        let total = meetings.iter().take(best_meetings).map(|m| m.total).sum();

        SwimmerSeasonScore {
            swimmer_id,
            gender,
            category_code: category_code.to_string(),
            meetings,
            best_meetings,
            total,
        }
    }

    pub fn meeting_count(&self) -> usize {
        self.meetings.len()
    }

    /// Meetings that count towards the total
    pub fn counted_meetings(&self) -> &[MeetingScore<E>] {
        let counted = self.best_meetings.min(self.meetings.len());
        &self.meetings[..counted]
    }
}

// ============================================================================
// GENDER / CATEGORY RANKING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenderCategoryRanking<E> {
    pub gender: GenderType,
    pub category_code: String,

    /// Sorted by season total, highest first
    pub swimmers: Vec<SwimmerSeasonScore<E>>,
}

impl<E> GenderCategoryRanking<E> {
    pub fn new(gender: GenderType, category_code: &str, mut swimmers: Vec<SwimmerSeasonScore<E>>) -> Self {
        swimmers.sort_by(|a, b| b.total.total_cmp(&a.total));
        GenderCategoryRanking {
            gender,
            category_code: category_code.to_string(),
            swimmers,
        }
    }

    /// 1-based position of a swimmer
    pub fn position_of(&self, swimmer_id: i64) -> Option<usize> {
        self.swimmers
            .iter()
            .position(|s| s.swimmer_id == swimmer_id)
            .map(|p| p + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.swimmers.is_empty()
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Rank every gender/category group of the catalog with at least one swimmer
pub(crate) fn rank_season<S, R>(
    scorer: &S,
    repository: &R,
    catalog: &SeasonCatalog,
    options: &RankingOptions,
) -> Result<Vec<GenderCategoryRanking<S::Score>>>
where
    S: EventScorer,
    R: ResultRepository + ?Sized,
{
    options.validate()?;

    let mut rankings = Vec::new();
    for gender in &catalog.genders {
        for category in &catalog.categories {
            let ranking = rank_group(scorer, repository, catalog, *gender, category, options)?;
            if !ranking.is_empty() {
                rankings.push(ranking);
            }
        }
    }
    Ok(rankings)
}

pub(crate) fn rank_group<S, R>(
    scorer: &S,
    repository: &R,
    catalog: &SeasonCatalog,
    gender: GenderType,
    category: &CategoryType,
    options: &RankingOptions,
) -> Result<GenderCategoryRanking<S::Score>>
where
    S: EventScorer,
    R: ResultRepository + ?Sized,
{
    let query = ResultQuery::for_season(catalog.season_id())
        .gender(gender)
        .category(&category.code)
        .valid_only()
        .between(None, options.until);

    let mut results = repository.find_results(&query)?;
    // Encounter order: session date, then result id
    results.sort_by(|a, b| a.session_date.cmp(&b.session_date).then(a.id.cmp(&b.id)));

    // swimmer → meeting → results
    let mut by_swimmer: BTreeMap<i64, BTreeMap<i64, Vec<&RaceResult>>> = BTreeMap::new();
    for result in &results {
        by_swimmer
            .entry(result.swimmer_id)
            .or_default()
            .entry(result.meeting_id)
            .or_default()
            .push(result);
    }

    let mut swimmers = Vec::with_capacity(by_swimmer.len());
    for (swimmer_id, meetings) in by_swimmer {
        let mut meeting_scores = Vec::with_capacity(meetings.len());

        for (meeting_id, meeting_results) in meetings {
            let mut event_scores = Vec::with_capacity(meeting_results.len());
            for result in &meeting_results {
                let event = catalog.find_event(&result.event_code).ok_or_else(|| {
                    RankingError::InvalidArgument(format!(
                        "result {} swum in event '{}' unknown to season {}",
                        result.id,
                        result.event_code,
                        catalog.season_id()
                    ))
                })?;
                event_scores.push(scorer.score_event(result, event)?);
            }

            let session_date = meeting_results[0].session_date;
            meeting_scores.push(MeetingScore::new(
                meeting_id,
                swimmer_id,
                session_date,
                event_scores,
                &options.event_bonuses,
            ));
        }

        swimmers.push(SwimmerSeasonScore::new(
            swimmer_id,
            gender,
            &category.code,
            meeting_scores,
            options.best_meetings,
        ));
    }

    debug!(
        gender = %gender,
        category = %category,
        swimmers = swimmers.len(),
        "group ranked"
    );

    Ok(GenderCategoryRanking::new(gender, &category.code, swimmers))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct FlatScore {
        event: EventType,
        rank: Option<u32>,
        total: f64,
        tag: &'static str,
    }

    impl EventPoints for FlatScore {
        fn event(&self) -> &EventType {
            &self.event
        }

        fn rank(&self) -> Option<u32> {
            self.rank
        }

        fn total(&self) -> f64 {
            self.total
        }
    }

    fn flat(code: &str, rank: Option<u32>, total: f64, tag: &'static str) -> FlatScore {
        FlatScore {
            event: EventType::from_code(code).unwrap(),
            rank,
            total,
            tag,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn meeting(id: i64, total: f64) -> MeetingScore<FlatScore> {
        MeetingScore::new(id, 1, date(), vec![flat("50SL", None, total, "x")], &[])
    }

    #[test]
    fn test_meeting_total_is_best_event_plus_bonuses() {
        let score = MeetingScore::new(
            1,
            1,
            date(),
            vec![
                flat("50SL", Some(2), 90.0, "a"),
                flat("800SL", Some(1), 95.0, "b"),
            ],
            &bonus::default_event_bonuses(),
        );

        assert_eq!(score.event_bonus, 8);
        assert_eq!(score.medal_bonus, 8);
        assert_eq!(score.best_event_total, 95.0);
        assert_eq!(score.total, 111.0);
        assert_eq!(score.best_event().unwrap().tag, "b");
    }

    #[test]
    fn test_meeting_ties_keep_encounter_order() {
        let score = MeetingScore::new(
            1,
            1,
            date(),
            vec![
                flat("50SL", None, 80.0, "first"),
                flat("50DO", None, 90.0, "high"),
                flat("50FA", None, 80.0, "second"),
            ],
            &[],
        );

        let tags: Vec<&str> = score.event_scores.iter().map(|s| s.tag).collect();
        assert_eq!(tags, vec!["high", "first", "second"]);
    }

    #[test]
    fn test_best_five_of_six() {
        let meetings = (1..=6).map(|i| meeting(i, i as f64 * 10.0)).collect();
        let season = SwimmerSeasonScore::new(1, GenderType::Male, "M25", meetings, 5);

        assert_eq!(season.meeting_count(), 6);
        assert_eq!(season.counted_meetings().len(), 5);
        // 60 + 50 + 40 + 30 + 20
        assert_eq!(season.total, 200.0);
        assert_eq!(season.meetings[0].meeting_id, 6);

        let best_meeting = season.meetings.iter().map(|m| m.total).fold(0.0, f64::max);
        assert!(season.total <= 5.0 * best_meeting);
    }

    #[test]
    fn test_fewer_meetings_than_best_n() {
        let season = SwimmerSeasonScore::new(1, GenderType::Male, "M25", vec![meeting(1, 42.0)], 5);

        assert_eq!(season.total, 42.0);
        assert_eq!(season.counted_meetings().len(), 1);
    }

    #[test]
    fn test_group_ranking_sorted_descending() {
        let swimmers = vec![
            SwimmerSeasonScore::new(1, GenderType::Female, "M30", vec![meeting(1, 50.0)], 5),
            SwimmerSeasonScore::new(2, GenderType::Female, "M30", vec![meeting(1, 70.0)], 5),
            SwimmerSeasonScore::new(3, GenderType::Female, "M30", vec![meeting(1, 60.0)], 5),
        ];
        let ranking = GenderCategoryRanking::new(GenderType::Female, "M30", swimmers);

        let order: Vec<i64> = ranking.swimmers.iter().map(|s| s.swimmer_id).collect();
        assert_eq!(order, vec![2, 3, 1]);
        assert_eq!(ranking.position_of(1), Some(3));
        assert_eq!(ranking.position_of(9), None);
    }

    #[test]
    fn test_options_reject_zero_best_meetings() {
        let options = RankingOptions {
            best_meetings: 0,
            ..RankingOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_options_reject_enhance_cap_above_ten() {
        let options = RankingOptions {
            enhance_cap: 11,
            ..RankingOptions::default()
        };
        assert!(matches!(options.validate(), Err(RankingError::InvalidArgument(_))));
    }
}
