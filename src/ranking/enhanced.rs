// 📈 Enhanced Individual Ranking (EIR)
//
// Event score:
//   performance_points = score(actual vs seasonal best, reference 100, 0 decimals)
//   enhance_points     = improvement over the swimmer's personal standard
//                        min(floor(100 × standard / actual) − 100, cap)
//   total              = event_points + performance_points + enhance_points
//
// No standard, or a standard not beaten, gives no enhancement.

use super::{rank_season, EventPoints, EventScorer, RankingOptions};
use crate::entities::{EventType, GenderType, PoolType, SeasonCatalog};
use crate::error::{RankingError, Result};
use crate::results::{RaceResult, ResultRepository};
use crate::score_calculator::ScoreCalculator;
use crate::seasonal_best::SeasonalBests;
use crate::timing::Timing;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

// ============================================================================
// PERSONAL STANDARDS
// ============================================================================

/// Prior-season personal standards, keyed by the season they apply to
pub trait PersonalStandards {
    fn personal_standard(
        &self,
        season_id: i64,
        swimmer_id: i64,
        pool: PoolType,
        event_code: &str,
    ) -> Option<Timing>;

    fn has_standard(&self, season_id: i64, swimmer_id: i64, pool: PoolType, event_code: &str) -> bool {
        self.personal_standard(season_id, swimmer_id, pool, event_code)
            .is_some()
    }
}

type StandardKey = (i64, i64, PoolType, String);

#[derive(Debug, Clone, Default)]
pub struct PersonalStandardStore {
    standards: HashMap<StandardKey, Timing>,
}

impl PersonalStandardStore {
    pub fn new() -> Self {
        PersonalStandardStore::default()
    }

    pub fn insert(&mut self, season_id: i64, swimmer_id: i64, pool: PoolType, event_code: &str, timing: Timing) {
        self.standards
            .insert((season_id, swimmer_id, pool, event_code.to_string()), timing);
    }

    /// Personal standards for `season_id` taken from the fastest valid result
    /// of each swimmer/pool/event in `prior_results`
    pub fn from_prior_results(season_id: i64, prior_results: &[RaceResult]) -> Self {
        let mut store = PersonalStandardStore::new();

        for result in prior_results.iter().filter(|r| r.is_valid()) {
            let key = (season_id, result.swimmer_id, result.pool, result.event_code.clone());
            store
                .standards
                .entry(key)
                .and_modify(|t| {
                    if result.timing < *t {
                        *t = result.timing;
                    }
                })
                .or_insert(result.timing);
        }

        store
    }

    pub fn len(&self) -> usize {
        self.standards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.standards.is_empty()
    }
}

impl PersonalStandards for PersonalStandardStore {
    fn personal_standard(
        &self,
        season_id: i64,
        swimmer_id: i64,
        pool: PoolType,
        event_code: &str,
    ) -> Option<Timing> {
        self.standards
            .get(&(season_id, swimmer_id, pool, event_code.to_string()))
            .copied()
    }
}

/// Highest enhancement an event can earn; configured caps may only lower it
pub const MAX_ENHANCE_POINTS: u32 = 10;

/// Floor first, subtract 100, then cap
pub fn enhance_points(standard: Option<&Timing>, actual: &Timing, cap: u32) -> u32 {
    let standard = match standard {
        Some(standard) => standard,
        None => return 0,
    };

    if actual.is_zero() || *standard <= *actual {
        return 0;
    }

    let ratio = 100 * standard.to_hundredths() / actual.to_hundredths();
    let improvement = ratio.saturating_sub(100);
    improvement.min(u64::from(cap)) as u32
}

// ============================================================================
// EVENT SCORE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedEventScore {
    pub result_id: i64,
    pub event_date: NaiveDate,
    pub event: EventType,
    pub gender: GenderType,
    pub category_code: String,
    pub pool: PoolType,
    pub rank: Option<u32>,
    pub event_points: f64,
    pub performance_points: f64,
    pub enhance_points: u32,
    pub total: f64,
}

impl EventPoints for EnhancedEventScore {
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

pub type MeetingScore = super::MeetingScore<EnhancedEventScore>;
pub type SwimmerSeasonScore = super::SwimmerSeasonScore<EnhancedEventScore>;
pub type GenderCategoryRanking = super::GenderCategoryRanking<EnhancedEventScore>;

// ============================================================================
// SCORER
// ============================================================================

pub struct EnhancedScorer<'a, P: PersonalStandards + ?Sized> {
    seasonal_bests: &'a SeasonalBests,
    standards: &'a P,
    enhance_cap: u32,
}

impl<'a, P: PersonalStandards + ?Sized> EnhancedScorer<'a, P> {
    pub fn new(seasonal_bests: &'a SeasonalBests, standards: &'a P, enhance_cap: u32) -> Self {
        EnhancedScorer {
            seasonal_bests,
            standards,
            enhance_cap,
        }
    }
}

impl<P: PersonalStandards + ?Sized> EventScorer for EnhancedScorer<'_, P> {
    type Score = EnhancedEventScore;

    fn score_event(&self, result: &RaceResult, event: &EventType) -> Result<EnhancedEventScore> {
        let calculator = ScoreCalculator::new(
            self.seasonal_bests,
            result.season_id,
            result.gender,
            &result.category_code,
            result.pool,
            &result.event_code,
        )?;
        let performance_points = calculator.compute_score(&result.timing, 100.0, 0);

        let standard = self.standards.personal_standard(
            result.season_id,
            result.swimmer_id,
            result.pool,
            &result.event_code,
        );
        let enhance_points = enhance_points(standard.as_ref(), &result.timing, self.enhance_cap);

        Ok(EnhancedEventScore {
            result_id: result.id,
            event_date: result.session_date,
            event: event.clone(),
            gender: result.gender,
            category_code: result.category_code.clone(),
            pool: result.pool,
            rank: result.rank,
            event_points: result.event_points,
            performance_points,
            enhance_points,
            total: result.event_points + performance_points + f64::from(enhance_points),
        })
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// Full EIR ranking of a season, computed eagerly on construction
pub struct EnhancedRankingEngine {
    season_id: i64,
    rankings: Vec<GenderCategoryRanking>,
}

impl EnhancedRankingEngine {
    pub fn new<R, P>(
        repository: &R,
        catalog: &SeasonCatalog,
        seasonal_bests: &SeasonalBests,
        standards: &P,
        options: &RankingOptions,
    ) -> Result<Self>
    where
        R: ResultRepository + ?Sized,
        P: PersonalStandards + ?Sized,
    {
        if seasonal_bests.season_id != catalog.season_id() {
            return Err(RankingError::InvalidArgument(format!(
                "seasonal bests of season {} used to rank season {}",
                seasonal_bests.season_id,
                catalog.season_id()
            )));
        }

        let scorer = EnhancedScorer::new(seasonal_bests, standards, options.enhance_cap);
        let rankings = rank_season(&scorer, repository, catalog, options)?;

        info!(
            season = catalog.season_id(),
            groups = rankings.len(),
            "enhanced ranking computed"
        );

        Ok(EnhancedRankingEngine {
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
