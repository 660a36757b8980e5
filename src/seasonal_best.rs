// 🥇 Seasonal Best Finder - Reference time per gender/category/event
//
// For every (gender, category, event) of a season:
//   1. take the fastest valid result, whatever the pool
//   2. long-course fastest → convert it to short course and use that
//   3. short-course fastest → also look at the fastest long-course result and
//      use its converted time when strictly faster
//
// Bests are therefore always expressed as short-course times.

use crate::course_converter::{ConversionFactor, CourseConverter};
use crate::entities::{CategoryType, EventType, GenderType, PoolType, Season, SeasonCatalog};
use crate::error::{RankingError, Result};
use crate::results::{ResultQuery, ResultRepository};
use crate::score_calculator::ReferenceTimes;
use crate::timing::Timing;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

// ============================================================================
// SEASONAL BEST
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalBest {
    pub gender: GenderType,
    pub category_code: String,
    pub event_code: String,
    pub timing: Timing,

    /// True when the best comes from a converted long-course result
    pub was_converted: bool,

    /// Result the best was taken from
    pub source_result_id: i64,

    /// Event types scanned for this gender/category in the season
    pub total_events_in_season: usize,

    /// Event types with at least one valid result for this gender/category
    pub events_actually_swum: usize,
}

type BestKey = (GenderType, String, String);

/// All seasonal bests of one season
#[derive(Debug, Clone, Default)]
pub struct SeasonalBests {
    pub season_id: i64,
    bests: BTreeMap<BestKey, SeasonalBest>,
}

impl SeasonalBests {
    pub fn new(season_id: i64) -> Self {
        SeasonalBests {
            season_id,
            bests: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, best: SeasonalBest) {
        let key = (best.gender, best.category_code.clone(), best.event_code.clone());
        self.bests.insert(key, best);
    }

    pub fn get(&self, gender: GenderType, category_code: &str, event_code: &str) -> Option<&SeasonalBest> {
        self.bests
            .get(&(gender, category_code.to_string(), event_code.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeasonalBest> {
        self.bests.values()
    }

    pub fn len(&self) -> usize {
        self.bests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bests.is_empty()
    }
}

/// Seasonal bests are course-normalized, so the pool is not part of the key
impl ReferenceTimes for SeasonalBests {
    fn reference_time(
        &self,
        season_id: i64,
        gender: GenderType,
        category_code: &str,
        _pool: PoolType,
        event_code: &str,
    ) -> Option<Timing> {
        if season_id != self.season_id {
            return None;
        }
        self.get(gender, category_code, event_code).map(|b| b.timing)
    }
}

// ============================================================================
// SEASONAL BEST FINDER
// ============================================================================

pub struct SeasonalBestFinder<'a, R: ResultRepository + ?Sized> {
    repository: &'a R,
    season: Season,
    converter: CourseConverter,
}

impl<'a, R: ResultRepository + ?Sized> SeasonalBestFinder<'a, R> {
    pub fn new(repository: &'a R, season: &Season, factors: &[ConversionFactor]) -> Self {
        SeasonalBestFinder {
            repository,
            season: season.clone(),
            converter: CourseConverter::new(season, factors),
        }
    }

    pub fn converter(&self) -> &CourseConverter {
        &self.converter
    }

    /// Scan every gender/category/event of the catalog
    pub fn find_all(&self, catalog: &SeasonCatalog) -> Result<SeasonalBests> {
        self.check_catalog(catalog)?;

        let mut bests = SeasonalBests::new(self.season.id);
        for gender in &catalog.genders {
            for category in &catalog.categories {
                for best in self.find_group(catalog, *gender, category)? {
                    bests.insert(best);
                }
            }
        }

        info!(
            season = self.season.id,
            bests = bests.len(),
            "seasonal bests computed"
        );
        Ok(bests)
    }

    /// Bests of one gender/category group, one per event with valid results
    pub fn find_group(
        &self,
        catalog: &SeasonCatalog,
        gender: GenderType,
        category: &CategoryType,
    ) -> Result<Vec<SeasonalBest>> {
        self.check_catalog(catalog)?;

        let mut found = Vec::new();
        for event in &catalog.events {
            if let Some((source_result_id, timing, was_converted)) =
                self.best_timing(gender, category, event)?
            {
                found.push(SeasonalBest {
                    gender,
                    category_code: category.code.clone(),
                    event_code: event.code.clone(),
                    timing,
                    was_converted,
                    source_result_id,
                    total_events_in_season: 0,
                    events_actually_swum: 0,
                });
            }
        }

        let total_events_in_season = catalog.events.len();
        let events_actually_swum = found.len();
        for best in &mut found {
            best.total_events_in_season = total_events_in_season;
            best.events_actually_swum = events_actually_swum;
        }

        debug!(
            gender = %gender,
            category = %category,
            swum = events_actually_swum,
            total = total_events_in_season,
            "seasonal bests for group"
        );
        Ok(found)
    }

    fn best_timing(
        &self,
        gender: GenderType,
        category: &CategoryType,
        event: &EventType,
    ) -> Result<Option<(i64, Timing, bool)>> {
        let query = ResultQuery::for_season(self.season.id)
            .gender(gender)
            .category(&category.code)
            .event(&event.code)
            .valid_only();

        let fastest = match self.repository.fastest(&query)? {
            Some(result) => result,
            None => return Ok(None),
        };

        let convertible = self.converter.is_conversion_possible(gender, &event.code);

        if fastest.pool.is_long_course() {
            if !convertible {
                warn!(
                    gender = %gender,
                    event = %event,
                    "no course conversion defined, keeping long-course best"
                );
                return Ok(Some((fastest.id, fastest.timing, false)));
            }

            let converted =
                self.converter
                    .convert_to_short_course(&fastest.timing, gender, &event.code)?;
            return Ok(Some((fastest.id, converted, true)));
        }

        if convertible {
            if let Some(long_course) = self
                .repository
                .fastest(&query.clone().pool(PoolType::LongCourse))?
            {
                let converted = self.converter.convert_to_short_course(
                    &long_course.timing,
                    gender,
                    &event.code,
                )?;
                if converted < fastest.timing {
                    return Ok(Some((long_course.id, converted, true)));
                }
            }
        }

        Ok(Some((fastest.id, fastest.timing, false)))
    }

    fn check_catalog(&self, catalog: &SeasonCatalog) -> Result<()> {
        if catalog.season_id() != self.season.id {
            return Err(RankingError::InvalidArgument(format!(
                "catalog of season {} handed to the finder of season {}",
                catalog.season_id(),
                self.season.id
            )));
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course_converter::default_conversion_factors;
    use crate::results::tests::create_test_result;
    use crate::results::{InMemoryResults, RaceResult};
    use chrono::NaiveDate;

    fn create_test_season() -> Season {
        Season::new(
            1,
            1,
            "2023/24",
            NaiveDate::from_ymd_opt(2023, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 9, 30).unwrap(),
        )
        .unwrap()
    }

    fn run_finder(results: Vec<RaceResult>) -> SeasonalBests {
        let season = create_test_season();
        let catalog = SeasonCatalog::from_results(season.clone(), &results).unwrap();
        let repo = InMemoryResults::new(vec![season.clone()], results);
        let finder = SeasonalBestFinder::new(&repo, &season, &default_conversion_factors());
        finder.find_all(&catalog).unwrap()
    }

    fn male(id: i64, event: &str, pool: PoolType, hundredths: u64) -> RaceResult {
        create_test_result(id, id, event, "M25", GenderType::Male, pool, hundredths)
    }

    #[test]
    fn test_short_course_only_best() {
        let bests = run_finder(vec![
            male(1, "50FA", PoolType::ShortCourse, 3_000),
            male(2, "50FA", PoolType::ShortCourse, 3_200),
        ]);

        let best = bests.get(GenderType::Male, "M25", "50FA").unwrap();
        assert_eq!(best.timing.to_hundredths(), 3_000);
        assert!(!best.was_converted);
        assert_eq!(best.source_result_id, 1);
    }

    #[test]
    fn test_long_course_fastest_is_converted() {
        let bests = run_finder(vec![
            male(1, "100SL", PoolType::LongCourse, 5_800),
            male(2, "100SL", PoolType::ShortCourse, 6_000),
        ]);

        let best = bests.get(GenderType::Male, "M25", "100SL").unwrap();
        // 5800 × 0.972 = 5637.6
        assert_eq!(best.timing.to_hundredths(), 5_638);
        assert!(best.was_converted);
    }

    #[test]
    fn test_converted_long_course_beats_short_course() {
        let bests = run_finder(vec![
            male(1, "100SL", PoolType::ShortCourse, 5_900),
            male(2, "100SL", PoolType::LongCourse, 6_000),
        ]);

        let best = bests.get(GenderType::Male, "M25", "100SL").unwrap();
        assert_eq!(best.timing.to_hundredths(), 5_832);
        assert!(best.was_converted);
        assert_eq!(best.source_result_id, 2);
    }

    #[test]
    fn test_slower_converted_long_course_is_ignored() {
        let bests = run_finder(vec![
            male(1, "100SL", PoolType::ShortCourse, 5_800),
            male(2, "100SL", PoolType::LongCourse, 6_000),
        ]);

        let best = bests.get(GenderType::Male, "M25", "100SL").unwrap();
        assert_eq!(best.timing.to_hundredths(), 5_800);
        assert!(!best.was_converted);
    }

    #[test]
    fn test_unconvertible_long_course_keeps_raw_time() {
        let bests = run_finder(vec![male(1, "100MI", PoolType::LongCourse, 7_000)]);

        let best = bests.get(GenderType::Male, "M25", "100MI").unwrap();
        assert_eq!(best.timing.to_hundredths(), 7_000);
        assert!(!best.was_converted);
    }

    #[test]
    fn test_invalid_results_are_skipped() {
        let mut dq = male(1, "50SL", PoolType::ShortCourse, 2_500);
        dq.is_disqualified = true;

        let bests = run_finder(vec![dq, male(2, "50SL", PoolType::ShortCourse, 2_800)]);

        assert_eq!(
            bests.get(GenderType::Male, "M25", "50SL").unwrap().timing.to_hundredths(),
            2_800
        );
    }

    #[test]
    fn test_group_counters() {
        let bests = run_finder(vec![
            male(1, "50SL", PoolType::ShortCourse, 2_800),
            male(2, "100SL", PoolType::ShortCourse, 6_100),
            create_test_result(3, 3, "200MI", "M25", GenderType::Female, PoolType::ShortCourse, 16_000),
        ]);

        let best = bests.get(GenderType::Male, "M25", "50SL").unwrap();
        assert_eq!(best.total_events_in_season, 3);
        assert_eq!(best.events_actually_swum, 2);
        assert!(bests.get(GenderType::Male, "M25", "200MI").is_none());
    }

    #[test]
    fn test_best_is_never_slower_than_any_candidate() {
        let results = vec![
            male(1, "200SL", PoolType::ShortCourse, 13_000),
            male(2, "200SL", PoolType::LongCourse, 13_100),
            male(3, "200SL", PoolType::LongCourse, 13_500),
            male(4, "200SL", PoolType::ShortCourse, 12_900),
            male(5, "200SL", PoolType::ShortCourse, 14_000),
        ];
        let converter = CourseConverter::new(&create_test_season(), &default_conversion_factors());
        let candidates: Vec<u64> = results
            .iter()
            .map(|r| match r.pool {
                PoolType::LongCourse => converter
                    .convert_to_short_course(&r.timing, r.gender, &r.event_code)
                    .unwrap()
                    .to_hundredths(),
                PoolType::ShortCourse => r.timing.to_hundredths(),
            })
            .collect();

        let bests = run_finder(results);
        let best = bests.get(GenderType::Male, "M25", "200SL").unwrap();

        assert!(candidates.iter().all(|c| best.timing.to_hundredths() <= *c));
    }

    #[test]
    fn test_reference_times_ignore_pool() {
        let bests = run_finder(vec![male(1, "50FA", PoolType::ShortCourse, 3_000)]);

        let short = bests.reference_time(1, GenderType::Male, "M25", PoolType::ShortCourse, "50FA");
        let long = bests.reference_time(1, GenderType::Male, "M25", PoolType::LongCourse, "50FA");
        assert_eq!(short, long);
        assert!(bests
            .reference_time(2, GenderType::Male, "M25", PoolType::ShortCourse, "50FA")
            .is_none());
    }

    #[test]
    fn test_catalog_of_other_season_is_rejected() {
        let season = create_test_season();
        let mut other = season.clone();
        other.id = 99;
        let catalog = SeasonCatalog::new(other, vec![], vec![], vec![], vec![]);
        let repo = InMemoryResults::default();
        let finder = SeasonalBestFinder::new(&repo, &season, &default_conversion_factors());

        assert!(matches!(
            finder.find_all(&catalog),
            Err(RankingError::InvalidArgument(_))
        ));
    }
}
