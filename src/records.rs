// 🥇 Record Tracker - Best-known results per pool/gender/event/category
//
// At most one element exists per exact 4-key: adding a record for a key that
// is already held replaces it.
//
// Lookups accept event and category as wildcards. Deletion always works on
// the full 4-key and removes every element matching it.

use crate::entities::{GenderType, PoolType};
use crate::results::RaceResult;
use crate::timing::Timing;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// RECORD ELEMENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordElement {
    pub pool: PoolType,
    pub gender: GenderType,
    pub event_code: String,
    pub category_code: String,
    pub result: RaceResult,
}

impl RecordElement {
    fn has_key(&self, pool: PoolType, gender: GenderType, event_code: &str, category_code: &str) -> bool {
        self.pool == pool
            && self.gender == gender
            && self.event_code == event_code
            && self.category_code == category_code
    }

    fn matches(
        &self,
        pool: PoolType,
        gender: GenderType,
        event_code: Option<&str>,
        category_code: Option<&str>,
    ) -> bool {
        self.pool == pool
            && self.gender == gender
            && event_code.map_or(true, |e| self.event_code == e)
            && category_code.map_or(true, |c| self.category_code == c)
    }

    pub fn value(&self, attribute: RecordAttribute) -> RecordValue {
        let result = &self.result;
        match attribute {
            RecordAttribute::ResultId => RecordValue::Id(result.id),
            RecordAttribute::SwimmerId => RecordValue::Id(result.swimmer_id),
            RecordAttribute::MeetingId => RecordValue::Id(result.meeting_id),
            RecordAttribute::SeasonId => RecordValue::Id(result.season_id),
            RecordAttribute::Timing => RecordValue::Timing(result.timing),
            RecordAttribute::SessionDate => RecordValue::Date(result.session_date),
            RecordAttribute::Rank => RecordValue::Rank(result.rank),
            RecordAttribute::EventPoints => RecordValue::Points(result.event_points),
        }
    }
}

/// Named attribute of the result held by a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordAttribute {
    ResultId,
    SwimmerId,
    MeetingId,
    SeasonId,
    Timing,
    SessionDate,
    Rank,
    EventPoints,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordValue {
    Id(i64),
    Timing(Timing),
    Date(NaiveDate),
    Rank(Option<u32>),
    Points(f64),
}

/// Key overrides for `add_record`; `None` takes the value from the result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordKeyOverrides {
    pub category_code: Option<String>,
    pub pool: Option<PoolType>,
    pub gender: Option<GenderType>,
    pub event_code: Option<String>,
}

// ============================================================================
// RECORD TRACKER
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordTracker {
    records: Vec<RecordElement>,
}

impl RecordTracker {
    pub fn new() -> Self {
        RecordTracker::default()
    }

    /// Best valid result per 4-key of `results`
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a RaceResult>,
    {
        let mut tracker = RecordTracker::new();
        for result in results {
            tracker.add_if_better(result);
        }
        tracker
    }

    /// Store `result` under its key (with overrides), replacing any element
    /// already held for that exact key.
    pub fn add_record(&mut self, result: &RaceResult, overrides: RecordKeyOverrides) {
        let pool = overrides.pool.unwrap_or(result.pool);
        let gender = overrides.gender.unwrap_or(result.gender);
        let event_code = overrides
            .event_code
            .unwrap_or_else(|| result.event_code.clone());
        let category_code = overrides
            .category_code
            .unwrap_or_else(|| result.category_code.clone());

        if self
            .has_record_for(pool, gender, Some(&event_code), Some(&category_code))
            .is_some()
        {
            self.delete_record(pool, gender, &event_code, &category_code);
        }

        debug!(
            pool = %pool,
            gender = %gender,
            event = %event_code,
            category = %category_code,
            result = result.id,
            "record stored"
        );

        self.records.push(RecordElement {
            pool,
            gender,
            event_code,
            category_code,
            result: result.clone(),
        });
    }

    /// Keep `result` when it beats the record of its own key.
    /// Returns true when the tracker changed.
    pub fn add_if_better(&mut self, result: &RaceResult) -> bool {
        if !result.is_valid() {
            return false;
        }

        let current = self.has_record_for(
            result.pool,
            result.gender,
            Some(&result.event_code),
            Some(&result.category_code),
        );

        if let Some(index) = current {
            if self.records[index].result.timing <= result.timing {
                return false;
            }
        }

        self.add_record(result, RecordKeyOverrides::default());
        true
    }

    /// Index of the last element matching the key; omitted event/category
    /// match anything
    pub fn has_record_for(
        &self,
        pool: PoolType,
        gender: GenderType,
        event_code: Option<&str>,
        category_code: Option<&str>,
    ) -> Option<usize> {
        self.records
            .iter()
            .rposition(|r| r.matches(pool, gender, event_code, category_code))
    }

    /// Remove every element holding the full 4-key; returns how many went
    pub fn delete_record(
        &mut self,
        pool: PoolType,
        gender: GenderType,
        event_code: &str,
        category_code: &str,
    ) -> usize {
        let before = self.records.len();
        self.records
            .retain(|r| !r.has_key(pool, gender, event_code, category_code));
        before - self.records.len()
    }

    pub fn record(
        &self,
        pool: PoolType,
        gender: GenderType,
        event_code: Option<&str>,
        category_code: Option<&str>,
    ) -> Option<&RecordElement> {
        self.has_record_for(pool, gender, event_code, category_code)
            .map(|index| &self.records[index])
    }

    pub fn get_record(
        &self,
        pool: PoolType,
        gender: GenderType,
        event_code: Option<&str>,
        category_code: Option<&str>,
        attribute: RecordAttribute,
    ) -> Option<RecordValue> {
        self.record(pool, gender, event_code, category_code)
            .map(|r| r.value(attribute))
    }

    pub fn records(&self) -> &[RecordElement] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::tests::create_test_result;

    fn create_test_record(id: i64, event: &str, category: &str, hundredths: u64) -> RaceResult {
        create_test_result(id, id, event, category, GenderType::Female, PoolType::LongCourse, hundredths)
    }

    #[test]
    fn test_add_twice_overwrites() {
        let mut tracker = RecordTracker::new();
        tracker.add_record(&create_test_record(1, "100DO", "M35", 7_000), RecordKeyOverrides::default());
        tracker.add_record(&create_test_record(2, "100DO", "M35", 7_500), RecordKeyOverrides::default());

        assert_eq!(tracker.len(), 1);
        assert_eq!(
            tracker.get_record(PoolType::LongCourse, GenderType::Female, Some("100DO"), Some("M35"), RecordAttribute::ResultId),
            Some(RecordValue::Id(2))
        );
    }

    #[test]
    fn test_overrides_replace_result_keys() {
        let mut tracker = RecordTracker::new();
        let overrides = RecordKeyOverrides {
            category_code: Some("ABS".to_string()),
            pool: Some(PoolType::ShortCourse),
            ..RecordKeyOverrides::default()
        };
        tracker.add_record(&create_test_record(1, "50FA", "M35", 3_100), overrides);

        assert!(tracker
            .has_record_for(PoolType::ShortCourse, GenderType::Female, Some("50FA"), Some("ABS"))
            .is_some());
        assert!(tracker
            .has_record_for(PoolType::LongCourse, GenderType::Female, Some("50FA"), Some("M35"))
            .is_none());
    }

    #[test]
    fn test_wildcard_lookup_returns_last_match() {
        let mut tracker = RecordTracker::new();
        tracker.add_record(&create_test_record(1, "50SL", "M30", 2_900), RecordKeyOverrides::default());
        tracker.add_record(&create_test_record(2, "100SL", "M30", 6_300), RecordKeyOverrides::default());
        tracker.add_record(&create_test_record(3, "50SL", "M40", 3_000), RecordKeyOverrides::default());

        assert_eq!(tracker.has_record_for(PoolType::LongCourse, GenderType::Female, None, None), Some(2));
        assert_eq!(
            tracker.has_record_for(PoolType::LongCourse, GenderType::Female, Some("50SL"), None),
            Some(2)
        );
        assert_eq!(
            tracker.has_record_for(PoolType::LongCourse, GenderType::Female, None, Some("M30")),
            Some(1)
        );
        assert_eq!(tracker.has_record_for(PoolType::LongCourse, GenderType::Male, None, None), None);
    }

    #[test]
    fn test_delete_removes_full_key_matches_only() {
        let mut tracker = RecordTracker::new();
        tracker.add_record(&create_test_record(1, "50SL", "M30", 2_900), RecordKeyOverrides::default());
        tracker.add_record(&create_test_record(2, "50SL", "M40", 3_000), RecordKeyOverrides::default());

        let removed = tracker.delete_record(PoolType::LongCourse, GenderType::Female, "50SL", "M30");

        assert_eq!(removed, 1);
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.delete_record(PoolType::LongCourse, GenderType::Female, "50SL", "M30"), 0);
    }

    #[test]
    fn test_delete_removes_every_element_sharing_the_key() {
        let mut tracker = RecordTracker::new();
        tracker.add_record(&create_test_record(1, "50SL", "M30", 2_900), RecordKeyOverrides::default());

        // Two elements under one key can only come from outside add_record
        let mut json = serde_json::to_value(&tracker).unwrap();
        let mut second = json["records"][0].clone();
        second["result"]["id"] = serde_json::json!(2);
        json["records"].as_array_mut().unwrap().push(second);
        let mut tracker: RecordTracker = serde_json::from_value(json).unwrap();

        assert_eq!(tracker.len(), 2);
        assert_eq!(
            tracker.has_record_for(PoolType::LongCourse, GenderType::Female, Some("50SL"), Some("M30")),
            Some(1)
        );
        assert_eq!(
            tracker.get_record(PoolType::LongCourse, GenderType::Female, Some("50SL"), Some("M30"), RecordAttribute::ResultId),
            Some(RecordValue::Id(2))
        );

        assert_eq!(tracker.delete_record(PoolType::LongCourse, GenderType::Female, "50SL", "M30"), 2);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_get_record_attributes() {
        let mut tracker = RecordTracker::new();
        tracker.add_record(&create_test_record(7, "200RA", "M50", 19_050), RecordKeyOverrides::default());

        let get = |attribute| {
            tracker.get_record(PoolType::LongCourse, GenderType::Female, Some("200RA"), None, attribute)
        };

        assert_eq!(get(RecordAttribute::Timing), Some(RecordValue::Timing(Timing::from_hundredths(19_050))));
        assert_eq!(get(RecordAttribute::SwimmerId), Some(RecordValue::Id(7)));
        assert_eq!(get(RecordAttribute::Rank), Some(RecordValue::Rank(None)));
        assert_eq!(
            tracker.get_record(PoolType::ShortCourse, GenderType::Female, None, None, RecordAttribute::Timing),
            None
        );
    }

    #[test]
    fn test_add_if_better_keeps_fastest() {
        let mut tracker = RecordTracker::new();

        assert!(tracker.add_if_better(&create_test_record(1, "50SL", "M30", 2_900)));
        assert!(!tracker.add_if_better(&create_test_record(2, "50SL", "M30", 2_950)));
        assert!(tracker.add_if_better(&create_test_record(3, "50SL", "M30", 2_850)));

        let mut dq = create_test_record(4, "50SL", "M30", 2_000);
        dq.is_disqualified = true;
        assert!(!tracker.add_if_better(&dq));

        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.records()[0].result.id, 3);
    }

    #[test]
    fn test_from_results() {
        let results = vec![
            create_test_record(1, "50SL", "M30", 2_900),
            create_test_record(2, "50SL", "M30", 2_800),
            create_test_record(3, "100SL", "M30", 6_400),
        ];

        let tracker = RecordTracker::from_results(&results);

        assert_eq!(tracker.len(), 2);
        assert_eq!(
            tracker.get_record(PoolType::LongCourse, GenderType::Female, Some("50SL"), Some("M30"), RecordAttribute::ResultId),
            Some(RecordValue::Id(2))
        );
    }
}
