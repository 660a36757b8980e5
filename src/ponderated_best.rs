// ⚖️ Ponderated Best Calculator - Trimmed mean of historical bests
//
// For each (gender, category, event, pool):
//   1. collect the (bests_to_ignore + max_results) fastest valid results of
//      every prior season of the same season type
//   2. when the full amount was found, drop the fastest bests_to_ignore
//      (outliers); otherwise keep everything
//   3. ponderated time = arithmetic mean of what is left, in hundredths
//
// The result is used as next season's qualifying standard.

use crate::entities::{GenderType, PoolType, Season, SeasonCatalog};
use crate::error::{RankingError, Result};
use crate::results::{ResultQuery, ResultRepository};
use crate::score_calculator::ReferenceTimes;
use crate::timing::Timing;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use tracing::{debug, info};

// ============================================================================
// POLICY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PonderatedPolicy {
    /// Results averaged once outliers are dropped (default: 10)
    pub max_results: usize,

    /// Fastest results dropped as outliers (default: 1)
    pub bests_to_ignore: usize,
}

impl Default for PonderatedPolicy {
    fn default() -> Self {
        PonderatedPolicy {
            max_results: 10,
            bests_to_ignore: 1,
        }
    }
}

impl PonderatedPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.max_results == 0 {
            return Err(RankingError::InvalidArgument(
                "ponderated max_results must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn results_to_collect(&self) -> usize {
        self.bests_to_ignore + self.max_results
    }
}

// ============================================================================
// PONDERATED BEST
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PonderatedBest {
    pub season_id: i64,
    pub gender: GenderType,
    pub category_code: String,
    pub event_code: String,
    pub pool: PoolType,
    pub max_results: usize,
    pub bests_to_ignore: usize,

    /// Valid results found in the prior seasons, before any limit
    pub total_results_available: usize,

    /// Collected times, fastest first (outliers included)
    pub collected_results: Vec<Timing>,

    pub ponderated_time: Timing,
}

impl PonderatedBest {
    /// Build from collected times (ascending); `None` when nothing was collected
    pub fn from_collected(
        season_id: i64,
        gender: GenderType,
        category_code: &str,
        event_code: &str,
        pool: PoolType,
        policy: &PonderatedPolicy,
        total_results_available: usize,
        collected_results: Vec<Timing>,
    ) -> Option<Self> {
        let averaged: &[Timing] = if collected_results.len() < policy.results_to_collect() {
            &collected_results
        } else {
            &collected_results[policy.bests_to_ignore..]
        };

        if averaged.is_empty() {
            return None;
        }

        let sum: u64 = averaged.iter().map(Timing::to_hundredths).sum();
        let mean = (sum as f64 / averaged.len() as f64).round() as u64;

        Some(PonderatedBest {
            season_id,
            gender,
            category_code: category_code.to_string(),
            event_code: event_code.to_string(),
            pool,
            max_results: policy.max_results,
            bests_to_ignore: policy.bests_to_ignore,
            total_results_available,
            ponderated_time: Timing::from_hundredths(mean),
            collected_results,
        })
    }
}

// ============================================================================
// CALCULATOR
// ============================================================================

pub struct PonderatedBestCalculator<'a, R: ResultRepository + ?Sized> {
    repository: &'a R,
    season: Season,
    prior_season_ids: Vec<i64>,
    policy: PonderatedPolicy,
}

impl<'a, R: ResultRepository + ?Sized> PonderatedBestCalculator<'a, R> {
    /// `season` is the season the standards are computed for
    pub fn new(repository: &'a R, season: &Season, policy: PonderatedPolicy) -> Result<Self> {
        policy.validate()?;

        let prior_season_ids: Vec<i64> = repository
            .seasons()?
            .iter()
            .filter(|s| s.precedes_same_type(season))
            .map(|s| s.id)
            .collect();

        debug!(
            season = season.id,
            prior_seasons = prior_season_ids.len(),
            "ponderated calculator ready"
        );

        Ok(PonderatedBestCalculator {
            repository,
            season: season.clone(),
            prior_season_ids,
            policy,
        })
    }

    pub fn prior_season_ids(&self) -> &[i64] {
        &self.prior_season_ids
    }

    pub fn compute(
        &self,
        gender: GenderType,
        category_code: &str,
        event_code: &str,
        pool: PoolType,
    ) -> Result<Option<PonderatedBest>> {
        // An empty season list would match every season
        if self.prior_season_ids.is_empty() {
            return Ok(None);
        }

        let query = ResultQuery::for_seasons(self.prior_season_ids.clone())
            .gender(gender)
            .category(category_code)
            .event(event_code)
            .pool(pool)
            .valid_only();

        let available = self.repository.find_results(&query)?;
        let total_results_available = available.len();
        let collected: Vec<Timing> = available
            .into_iter()
            .take(self.policy.results_to_collect())
            .map(|r| r.timing)
            .collect();

        Ok(PonderatedBest::from_collected(
            self.season.id,
            gender,
            category_code,
            event_code,
            pool,
            &self.policy,
            total_results_available,
            collected,
        ))
    }

    /// Every gender/category/event/pool combination of the target catalog
    pub fn compute_all(&self, catalog: &SeasonCatalog) -> Result<Vec<PonderatedBest>> {
        if catalog.season_id() != self.season.id {
            return Err(RankingError::InvalidArgument(format!(
                "catalog of season {} handed to the calculator of season {}",
                catalog.season_id(),
                self.season.id
            )));
        }

        let mut bests = Vec::new();
        for gender in &catalog.genders {
            for category in &catalog.categories {
                for event in &catalog.events {
                    for pool in &catalog.pools {
                        if let Some(best) = self.compute(*gender, &category.code, &event.code, *pool)? {
                            bests.push(best);
                        }
                    }
                }
            }
        }

        info!(season = self.season.id, standards = bests.len(), "ponderated bests computed");
        Ok(bests)
    }
}

// ============================================================================
// CSV EXPORT
// ============================================================================

pub const CSV_HEADER: [&str; 7] = [
    "gender",
    "category",
    "event",
    "pool",
    "total_results",
    "ponderated best",
    "best results",
];

/// Semicolon-separated export; the trailing "best results" column expands to
/// one field per collected time.
///
/// Times are written in their display form (`1'01"00`) with quoting off, so
/// the bare `"` inside each time means the file is meant for reading by eye
/// or by a `;`-splitting loader, not by an RFC 4180 CSV parser.
pub fn write_csv<W: io::Write>(writer: W, bests: &[PonderatedBest]) -> anyhow::Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(writer);

    wtr.write_record(CSV_HEADER)?;

    for best in bests {
        let mut record = vec![
            best.gender.code().to_string(),
            best.category_code.clone(),
            best.event_code.clone(),
            best.pool.code().to_string(),
            best.total_results_available.to_string(),
            best.ponderated_time.to_string(),
        ];
        record.extend(best.collected_results.iter().map(|t| t.to_string()));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

// ============================================================================
// QUALIFYING STANDARDS
// ============================================================================

/// Qualifying standard as stored by the persistence collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifyingStandard {
    pub season_id: i64,
    pub gender: GenderType,
    pub category_code: String,
    pub pool: PoolType,
    pub event_code: String,
    pub timing: Timing,
}

impl QualifyingStandard {
    fn key(&self) -> StandardKey {
        (
            self.season_id,
            self.gender,
            self.category_code.clone(),
            self.pool,
            self.event_code.clone(),
        )
    }
}

impl From<&PonderatedBest> for QualifyingStandard {
    fn from(best: &PonderatedBest) -> Self {
        QualifyingStandard {
            season_id: best.season_id,
            gender: best.gender,
            category_code: best.category_code.clone(),
            pool: best.pool,
            event_code: best.event_code.clone(),
            timing: best.ponderated_time,
        }
    }
}

/// Column values of a standard write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardValues {
    pub season_id: i64,
    pub gender: GenderType,
    pub category_code: String,
    pub pool: PoolType,
    pub event_code: String,
    pub minutes: u64,
    pub seconds: u32,
    pub hundredths: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StandardInstruction {
    Insert(StandardValues),
    Update(StandardValues),
}

type StandardKey = (i64, GenderType, String, PoolType, String);

/// Classify each ponderated best as an insert or an update of `existing`,
/// matching on season/gender/category/pool/event. Nothing is written.
pub fn classify_standards(
    bests: &[PonderatedBest],
    existing: &[QualifyingStandard],
) -> Vec<StandardInstruction> {
    let known: Vec<StandardKey> = existing.iter().map(QualifyingStandard::key).collect();

    bests
        .iter()
        .map(|best| {
            let standard = QualifyingStandard::from(best);
            let values = StandardValues {
                season_id: standard.season_id,
                gender: standard.gender,
                category_code: standard.category_code.clone(),
                pool: standard.pool,
                event_code: standard.event_code.clone(),
                minutes: standard.timing.total_minutes(),
                seconds: standard.timing.seconds(),
                hundredths: standard.timing.hundredths(),
            };

            if known.contains(&standard.key()) {
                StandardInstruction::Update(values)
            } else {
                StandardInstruction::Insert(values)
            }
        })
        .collect()
}

/// Qualifying standards seen as reference times (pool-specific)
#[derive(Debug, Clone, Default)]
pub struct QualifyingStandards {
    standards: HashMap<StandardKey, Timing>,
}

impl QualifyingStandards {
    pub fn from_standards(standards: &[QualifyingStandard]) -> Self {
        QualifyingStandards {
            standards: standards.iter().map(|s| (s.key(), s.timing)).collect(),
        }
    }

    pub fn from_ponderated(bests: &[PonderatedBest]) -> Self {
        let standards: Vec<QualifyingStandard> = bests.iter().map(QualifyingStandard::from).collect();
        QualifyingStandards::from_standards(&standards)
    }

    pub fn len(&self) -> usize {
        self.standards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.standards.is_empty()
    }
}

impl ReferenceTimes for QualifyingStandards {
    fn reference_time(
        &self,
        season_id: i64,
        gender: GenderType,
        category_code: &str,
        pool: PoolType,
        event_code: &str,
    ) -> Option<Timing> {
        self.standards
            .get(&(
                season_id,
                gender,
                category_code.to_string(),
                pool,
                event_code.to_string(),
            ))
            .copied()
    }
}

// ============================================================================
// TESTS
// ============================================================================
