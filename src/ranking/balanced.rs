// ⚖️ Balanced Individual Ranking (BIR)
//
// Event score:
//   ranking_points = floor(100 × seasonal_best / actual)
//   total          = event_points + ranking_points
//
// Meetings, swimmers and groups follow the shared pipeline in `ranking`.

use super::{rank_season, EventPoints, EventScorer, RankingOptions};
use crate::entities::{EventType, GenderType, PoolType, SeasonCatalog};
use crate::error::{RankingError, Result};
use crate::results::{RaceResult, ResultRepository};
use crate::seasonal_best::SeasonalBests;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// EVENT SCORE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancedEventScore {
    pub result_id: i64,
    pub event_date: NaiveDate,
    pub event: EventType,
    pub gender: GenderType,
    pub category_code: String,
    pub pool: PoolType,
    pub rank: Option<u32>,
    pub event_points: f64,
    pub ranking_points: u64,
    pub total: f64,
}

impl EventPoints for BalancedEventScore {
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

pub type MeetingScore = super::MeetingScore<BalancedEventScore>;
pub type SwimmerSeasonScore = super::SwimmerSeasonScore<BalancedEventScore>;
pub type GenderCategoryRanking = super::GenderCategoryRanking<BalancedEventScore>;

/// floor(100 × best / actual), on hundredths
pub fn ranking_points(best_hundredths: u64, actual_hundredths: u64) -> u64 {
    if actual_hundredths == 0 {
        return 0;
    }
    100 * best_hundredths / actual_hundredths
}

// ============================================================================
// SCORER
// ============================================================================

pub struct BalancedScorer<'a> {
    seasonal_bests: &'a SeasonalBests,
}

impl<'a> BalancedScorer<'a> {
    pub fn new(seasonal_bests: &'a SeasonalBests) -> Self {
        BalancedScorer { seasonal_bests }
    }
}

impl EventScorer for BalancedScorer<'_> {
    type Score = BalancedEventScore;

    fn score_event(&self, result: &RaceResult, event: &EventType) -> Result<BalancedEventScore> {
        let best = self
            .seasonal_bests
            .get(result.gender, &result.category_code, &result.event_code)
            .ok_or_else(|| {
                RankingError::MissingReference(format!(
                    "seasonal best {} {} {}",
                    result.gender, result.category_code, result.event_code
                ))
            })?;

        let ranking_points =
            ranking_points(best.timing.to_hundredths(), result.timing.to_hundredths());

        Ok(BalancedEventScore {
            result_id: result.id,
            event_date: result.session_date,
            event: event.clone(),
            gender: result.gender,
            category_code: result.category_code.clone(),
            pool: result.pool,
            rank: result.rank,
            event_points: result.event_points,
            ranking_points,
            total: result.event_points + ranking_points as f64,
        })
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// Full BIR ranking of a season, computed eagerly on construction
pub struct BalancedRankingEngine {
    season_id: i64,
    rankings: Vec<GenderCategoryRanking>,
}

impl BalancedRankingEngine {
    pub fn new<R: ResultRepository + ?Sized>(
        repository: &R,
        catalog: &SeasonCatalog,
        seasonal_bests: &SeasonalBests,
        options: &RankingOptions,
    ) -> Result<Self> {
        if seasonal_bests.season_id != catalog.season_id() {
            return Err(RankingError::InvalidArgument(format!(
                "seasonal bests of season {} used to rank season {}",
                seasonal_bests.season_id,
                catalog.season_id()
            )));
        }

        let scorer = BalancedScorer::new(seasonal_bests);
        let rankings = rank_season(&scorer, repository, catalog, options)?;

        info!(
            season = catalog.season_id(),
            groups = rankings.len(),
            "balanced ranking computed"
        );

        Ok(BalancedRankingEngine {
            season_id: catalog.season_id(),
            rankings,
        })
    }

    pub fn season_id(&self) -> i64 {
        self.season_id
    }

    pub fn rankings(&self) -> &[GenderCategoryRanking] {
        &self.rankings
    }

    pub fn ranking_for(&self, gender: GenderType, category_code: &str) -> Option<&GenderCategoryRanking> {
        self.rankings
            .iter()
            .find(|r| r.gender == gender && r.category_code == category_code)
    }

    pub fn swimmer_score(&self, swimmer_id: i64) -> Option<&SwimmerSeasonScore> {
        self.rankings
            .iter()
            .flat_map(|r| r.swimmers.iter())
            .find(|s| s.swimmer_id == swimmer_id)
    }
}

// ============================================================================
// TESTS
// ============================================================================
