// 🏊 Race Results - Read-only input records and the repository boundary
//
// The ranking core never builds queries against a live data source: it asks a
// `ResultRepository` for already-filtered, already-ordered sequences described
// by a `ResultQuery`.

use crate::entities::{EventType, GenderType, PoolType, Season};
use crate::error::Result;
use crate::timing::Timing;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// RACE RESULT
// ============================================================================

/// One individual race swum by one swimmer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub id: i64,
    pub swimmer_id: i64,
    pub meeting_id: i64,

    /// Date of the meeting session the race was swum in
    pub session_date: NaiveDate,

    pub season_id: i64,
    pub event_code: String,
    pub category_code: String,
    pub gender: GenderType,
    pub pool: PoolType,

    /// Placement in the race; `None` when the swimmer was not ranked
    pub rank: Option<u32>,

    pub is_disqualified: bool,
    pub timing: Timing,

    /// Raw points awarded by the meeting
    pub event_points: f64,
}

impl RaceResult {
    /// A result counts for rankings when it was not disqualified and has a time
    pub fn is_valid(&self) -> bool {
        !self.is_disqualified && !self.timing.is_zero()
    }

    pub fn has_rank(&self, rank: u32) -> bool {
        self.rank == Some(rank)
    }

    /// Same result with its event code in canonical form
    pub fn canonicalized(mut self) -> Self {
        self.event_code = EventType::canonical_code(&self.event_code);
        self
    }
}

// ============================================================================
// RESULT QUERY
// ============================================================================

/// Filter handed to a `ResultRepository`. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultQuery {
    pub season_ids: Vec<i64>,
    pub gender: Option<GenderType>,
    pub category_code: Option<String>,
    pub event_code: Option<String>,
    pub pool: Option<PoolType>,
    pub swimmer_id: Option<i64>,
    pub valid_only: bool,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub limit: Option<usize>,
}

impl ResultQuery {
    pub fn for_season(season_id: i64) -> Self {
        ResultQuery {
            season_ids: vec![season_id],
            ..Default::default()
        }
    }

    pub fn for_seasons(season_ids: Vec<i64>) -> Self {
        ResultQuery {
            season_ids,
            ..Default::default()
        }
    }

    pub fn gender(mut self, gender: GenderType) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn category(mut self, code: &str) -> Self {
        self.category_code = Some(code.to_string());
        self
    }

    pub fn event(mut self, code: &str) -> Self {
        self.event_code = Some(EventType::canonical_code(code));
        self
    }

    pub fn pool(mut self, pool: PoolType) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn swimmer(mut self, swimmer_id: i64) -> Self {
        self.swimmer_id = Some(swimmer_id);
        self
    }

    pub fn valid_only(mut self) -> Self {
        self.valid_only = true;
        self
    }

    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, result: &RaceResult) -> bool {
        if !self.season_ids.is_empty() && !self.season_ids.contains(&result.season_id) {
            return false;
        }
        if self.gender.map_or(false, |g| g != result.gender) {
            return false;
        }
        if self
            .category_code
            .as_deref()
            .map_or(false, |c| c != result.category_code)
        {
            return false;
        }
        if self
            .event_code
            .as_deref()
            .map_or(false, |e| e != result.event_code)
        {
            return false;
        }
        if self.pool.map_or(false, |p| p != result.pool) {
            return false;
        }
        if self.swimmer_id.map_or(false, |s| s != result.swimmer_id) {
            return false;
        }
        if self.valid_only && !result.is_valid() {
            return false;
        }
        if self.date_from.map_or(false, |from| result.session_date < from) {
            return false;
        }
        if self.date_to.map_or(false, |to| result.session_date > to) {
            return false;
        }
        true
    }
}

// ============================================================================
// REPOSITORY
// ============================================================================

/// Source of race results and seasons.
///
/// `find_results` returns results ordered by timing ascending, ties broken by
/// result id.
pub trait ResultRepository {
    fn find_results(&self, query: &ResultQuery) -> Result<Vec<RaceResult>>;

    fn seasons(&self) -> Result<Vec<Season>>;

    /// Fastest result matching the query
    fn fastest(&self, query: &ResultQuery) -> Result<Option<RaceResult>> {
        let query = query.clone().limit(1);
        Ok(self.find_results(&query)?.into_iter().next())
    }
}

/// Results held in memory; used by tests and library callers that already
/// loaded their data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryResults {
    seasons: Vec<Season>,
    results: Vec<RaceResult>,
}

impl InMemoryResults {
    /// Event codes are canonicalized on the way in
    pub fn new(seasons: Vec<Season>, results: Vec<RaceResult>) -> Self {
        let results = results.into_iter().map(RaceResult::canonicalized).collect();
        InMemoryResults { seasons, results }
    }

    pub fn add_season(&mut self, season: Season) {
        self.seasons.push(season);
    }

    pub fn add_result(&mut self, result: RaceResult) {
        self.results.push(result.canonicalized());
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn all_results(&self) -> &[RaceResult] {
        &self.results
    }
}

impl ResultRepository for InMemoryResults {
    fn find_results(&self, query: &ResultQuery) -> Result<Vec<RaceResult>> {
        let mut found: Vec<RaceResult> = self
            .results
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();

        found.sort_by(|a, b| a.timing.cmp(&b.timing).then(a.id.cmp(&b.id)));

        if let Some(limit) = query.limit {
            found.truncate(limit);
        }

        Ok(found)
    }

    fn seasons(&self) -> Result<Vec<Season>> {
        Ok(self.seasons.clone())
    }
}

// ============================================================================
// TESTS
// ============================================================================
