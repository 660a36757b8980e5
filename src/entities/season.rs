// 📅 Season - Competition season and the dimensions scanned inside it
//
// A season belongs to a season type (e.g. "masters federation"); historical
// comparisons only ever look at prior seasons of the same type.

use super::{CategoryType, EventType, GenderType, PoolType};
use crate::error::{RankingError, Result};
use crate::results::RaceResult;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// SEASON
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub id: i64,
    pub season_type_id: i64,
    pub description: String,
    pub begin_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Season {
    pub fn new(
        id: i64,
        season_type_id: i64,
        description: &str,
        begin_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self> {
        if end_date < begin_date {
            return Err(RankingError::InvalidArgument(format!(
                "season {} ends before it begins",
                id
            )));
        }

        Ok(Season {
            id,
            season_type_id,
            description: description.to_string(),
            begin_date,
            end_date,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.begin_date && date <= self.end_date
    }

    /// True when `self` is an earlier season of the same type as `other`
    pub fn precedes_same_type(&self, other: &Season) -> bool {
        self.season_type_id == other.season_type_id && self.begin_date < other.begin_date
    }
}

// ============================================================================
// SEASON CATALOG
// ============================================================================

/// The gender × category × event × pool dimensions scanned for one season
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonCatalog {
    pub season: Season,
    pub genders: Vec<GenderType>,
    pub categories: Vec<CategoryType>,
    pub events: Vec<EventType>,
    pub pools: Vec<PoolType>,
}

impl SeasonCatalog {
    pub fn new(
        season: Season,
        genders: Vec<GenderType>,
        categories: Vec<CategoryType>,
        events: Vec<EventType>,
        pools: Vec<PoolType>,
    ) -> Self {
        SeasonCatalog {
            season,
            genders,
            categories,
            events,
            pools,
        }
    }

    /// Derive the catalog from the results swum in the season.
    ///
    /// Results belonging to other seasons are ignored.
    pub fn from_results(season: Season, results: &[RaceResult]) -> Result<Self> {
        let mut genders = BTreeSet::new();
        let mut categories = BTreeSet::new();
        let mut events = BTreeSet::new();
        let mut pools = BTreeSet::new();

        for result in results.iter().filter(|r| r.season_id == season.id) {
            genders.insert(result.gender);
            pools.insert(result.pool);
            categories.insert(CategoryType::new(&result.category_code)?);
            events.insert(EventType::from_code(&result.event_code)?);
        }

        Ok(SeasonCatalog {
            season,
            genders: genders.into_iter().collect(),
            categories: categories.into_iter().collect(),
            events: events.into_iter().collect(),
            pools: pools.into_iter().collect(),
        })
    }

    pub fn season_id(&self) -> i64 {
        self.season.id
    }

    pub fn find_category(&self, code: &str) -> Option<&CategoryType> {
        self.categories.iter().find(|c| c.code == code)
    }

    pub fn find_event(&self, code: &str) -> Option<&EventType> {
        let code = EventType::canonical_code(code);
        self.events.iter().find(|e| e.code == code)
    }
}
