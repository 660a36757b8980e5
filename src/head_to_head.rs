// 🤝 Head to Head - Win/loss history between two fixed swimmers
//
// Every match pairs one result of the locale swimmer with one of the visitor,
// from the locale's point of view:
//   faster → win, slower → loss, same time → neutral
//
// A disqualified swim never beats anything.

use crate::error::{RankingError, Result};
use crate::results::RaceResult;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchKind {
    Win,
    Loss,
    Neutral,
}

/// Outcome of `add_match`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddMatch {
    Added(MatchKind),
    /// One of the results is already part of a recorded match
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingRef {
    pub meeting_id: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadToHeadMatch {
    pub locale: RaceResult,
    pub visitor: RaceResult,
    pub description: Option<String>,
    pub meeting: MeetingRef,
    pub event_code: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub wins: u32,
    pub losses: u32,
    pub neutrals: u32,
}

impl EventSummary {
    pub fn total(&self) -> u32 {
        self.wins + self.losses + self.neutrals
    }

    fn count(&mut self, kind: MatchKind) {
        match kind {
            MatchKind::Win => self.wins += 1,
            MatchKind::Loss => self.losses += 1,
            MatchKind::Neutral => self.neutrals += 1,
        }
    }
}

fn comparable_time(result: &RaceResult) -> u64 {
    if result.is_disqualified {
        u64::MAX
    } else {
        result.timing.to_hundredths()
    }
}

// ============================================================================
// MATCHER
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct HeadToHeadMatcher {
    locale_swimmer_id: i64,
    visitor_swimmer_id: i64,

    wins: Vec<HeadToHeadMatch>,
    losses: Vec<HeadToHeadMatch>,
    neutrals: Vec<HeadToHeadMatch>,

    /// Running tally per event code
    event_summaries: BTreeMap<String, EventSummary>,

    first_meeting: Option<NaiveDate>,
    last_meeting: Option<NaiveDate>,
}

impl HeadToHeadMatcher {
    pub fn new(locale_swimmer_id: i64, visitor_swimmer_id: i64) -> Result<Self> {
        if locale_swimmer_id == visitor_swimmer_id {
            return Err(RankingError::InvalidArgument(format!(
                "head to head needs two different swimmers, got {} twice",
                locale_swimmer_id
            )));
        }

        Ok(HeadToHeadMatcher {
            locale_swimmer_id,
            visitor_swimmer_id,
            wins: Vec::new(),
            losses: Vec::new(),
            neutrals: Vec::new(),
            event_summaries: BTreeMap::new(),
            first_meeting: None,
            last_meeting: None,
        })
    }

    /// Record one match. Meeting and event default to the locale result's own.
    pub fn add_match(
        &mut self,
        locale: &RaceResult,
        visitor: &RaceResult,
        description: Option<String>,
        meeting: Option<MeetingRef>,
        event_code: Option<String>,
    ) -> Result<AddMatch> {
        if locale.swimmer_id != self.locale_swimmer_id {
            return Err(RankingError::InvalidArgument(format!(
                "result {} belongs to swimmer {}, expected locale swimmer {}",
                locale.id, locale.swimmer_id, self.locale_swimmer_id
            )));
        }
        if visitor.swimmer_id != self.visitor_swimmer_id {
            return Err(RankingError::InvalidArgument(format!(
                "result {} belongs to swimmer {}, expected visitor swimmer {}",
                visitor.id, visitor.swimmer_id, self.visitor_swimmer_id
            )));
        }

        if self.contains_result(locale.id) || self.contains_result(visitor.id) {
            debug!(locale = locale.id, visitor = visitor.id, "duplicate match skipped");
            return Ok(AddMatch::Duplicate);
        }

        let kind = match comparable_time(locale).cmp(&comparable_time(visitor)) {
            Ordering::Less => MatchKind::Win,
            Ordering::Greater => MatchKind::Loss,
            Ordering::Equal => MatchKind::Neutral,
        };

        let meeting = meeting.unwrap_or(MeetingRef {
            meeting_id: locale.meeting_id,
            date: locale.session_date,
        });
        let event_code = event_code.unwrap_or_else(|| locale.event_code.clone());

        self.first_meeting = Some(self.first_meeting.map_or(meeting.date, |d| d.min(meeting.date)));
        self.last_meeting = Some(self.last_meeting.map_or(meeting.date, |d| d.max(meeting.date)));
        self.event_summaries
            .entry(event_code.clone())
            .or_default()
            .count(kind);

        let recorded = HeadToHeadMatch {
            locale: locale.clone(),
            visitor: visitor.clone(),
            description,
            meeting,
            event_code,
        };
        match kind {
            MatchKind::Win => self.wins.push(recorded),
            MatchKind::Loss => self.losses.push(recorded),
            MatchKind::Neutral => self.neutrals.push(recorded),
        }

        Ok(AddMatch::Added(kind))
    }

    /// Pair locale and visitor results swum in the same meeting and event.
    /// Returns how many matches were added.
    pub fn collect_matches(&mut self, locale_results: &[RaceResult], visitor_results: &[RaceResult]) -> Result<usize> {
        let mut added = 0;

        for locale in locale_results {
            let opponent = visitor_results
                .iter()
                .find(|v| v.meeting_id == locale.meeting_id && v.event_code == locale.event_code);

            if let Some(visitor) = opponent {
                if let AddMatch::Added(_) = self.add_match(locale, visitor, None, None, None)? {
                    added += 1;
                }
            }
        }

        debug!(
            locale = self.locale_swimmer_id,
            visitor = self.visitor_swimmer_id,
            added,
            "matches collected"
        );
        Ok(added)
    }

    fn contains_result(&self, result_id: i64) -> bool {
        self.all_matches()
            .any(|m| m.locale.id == result_id || m.visitor.id == result_id)
    }

    pub fn all_matches(&self) -> impl Iterator<Item = &HeadToHeadMatch> {
        self.wins
            .iter()
            .chain(self.losses.iter())
            .chain(self.neutrals.iter())
    }

    pub fn locale_swimmer_id(&self) -> i64 {
        self.locale_swimmer_id
    }

    pub fn visitor_swimmer_id(&self) -> i64 {
        self.visitor_swimmer_id
    }

    pub fn wins(&self) -> &[HeadToHeadMatch] {
        &self.wins
    }

    pub fn losses(&self) -> &[HeadToHeadMatch] {
        &self.losses
    }

    pub fn neutrals(&self) -> &[HeadToHeadMatch] {
        &self.neutrals
    }

    pub fn event_summaries(&self) -> &BTreeMap<String, EventSummary> {
        &self.event_summaries
    }

    pub fn first_meeting(&self) -> Option<NaiveDate> {
        self.first_meeting
    }

    pub fn last_meeting(&self) -> Option<NaiveDate> {
        self.last_meeting
    }

    pub fn match_count(&self) -> usize {
        self.wins.len() + self.losses.len() + self.neutrals.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{GenderType, PoolType};
    use crate::results::tests::create_test_result;

    const LOCALE: i64 = 10;
    const VISITOR: i64 = 20;

    fn create_test_swim(id: i64, swimmer_id: i64, meeting_id: i64, event: &str, hundredths: u64) -> RaceResult {
        let mut result =
            create_test_result(id, swimmer_id, event, "M30", GenderType::Male, PoolType::ShortCourse, hundredths);
        result.meeting_id = meeting_id;
        result.session_date = NaiveDate::from_ymd_opt(2024, 3, meeting_id as u32).unwrap();
        result
    }

    #[test]
    fn test_same_swimmer_is_rejected() {
        assert!(matches!(
            HeadToHeadMatcher::new(LOCALE, LOCALE),
            Err(RankingError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_classification() {
        let mut matcher = HeadToHeadMatcher::new(LOCALE, VISITOR).unwrap();

        let win = matcher
            .add_match(
                &create_test_swim(1, LOCALE, 1, "50SL", 2_900),
                &create_test_swim(2, VISITOR, 1, "50SL", 3_000),
                None,
                None,
                None,
            )
            .unwrap();
        let loss = matcher
            .add_match(
                &create_test_swim(3, LOCALE, 2, "50SL", 3_100),
                &create_test_swim(4, VISITOR, 2, "50SL", 3_000),
                None,
                None,
                None,
            )
            .unwrap();
        let neutral = matcher
            .add_match(
                &create_test_swim(5, LOCALE, 3, "100DO", 7_000),
                &create_test_swim(6, VISITOR, 3, "100DO", 7_000),
                Some("dead heat".to_string()),
                None,
                None,
            )
            .unwrap();

        assert_eq!(win, AddMatch::Added(MatchKind::Win));
        assert_eq!(loss, AddMatch::Added(MatchKind::Loss));
        assert_eq!(neutral, AddMatch::Added(MatchKind::Neutral));
        assert_eq!(matcher.match_count(), 3);

        let free = matcher.event_summaries()["50SL"];
        assert_eq!((free.wins, free.losses, free.neutrals), (1, 1, 0));
        assert_eq!(matcher.event_summaries()["100DO"].neutrals, 1);
        assert_eq!(matcher.first_meeting(), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(matcher.last_meeting(), NaiveDate::from_ymd_opt(2024, 3, 3));
    }

    #[test]
    fn test_disqualified_locale_loses() {
        let mut matcher = HeadToHeadMatcher::new(LOCALE, VISITOR).unwrap();
        let mut dq = create_test_swim(1, LOCALE, 1, "50SL", 2_500);
        dq.is_disqualified = true;

        let outcome = matcher
            .add_match(&dq, &create_test_swim(2, VISITOR, 1, "50SL", 3_500), None, None, None)
            .unwrap();

        assert_eq!(outcome, AddMatch::Added(MatchKind::Loss));
    }

    #[test]
    fn test_duplicate_result_is_reported() {
        let mut matcher = HeadToHeadMatcher::new(LOCALE, VISITOR).unwrap();
        let locale = create_test_swim(1, LOCALE, 1, "50SL", 2_900);

        matcher
            .add_match(&locale, &create_test_swim(2, VISITOR, 1, "50SL", 3_000), None, None, None)
            .unwrap();
        let again = matcher
            .add_match(&locale, &create_test_swim(3, VISITOR, 1, "50SL", 3_100), None, None, None)
            .unwrap();

        assert_eq!(again, AddMatch::Duplicate);
        assert_eq!(matcher.match_count(), 1);
    }

    #[test]
    fn test_wrong_swimmer_is_invalid() {
        let mut matcher = HeadToHeadMatcher::new(LOCALE, VISITOR).unwrap();

        let result = matcher.add_match(
            &create_test_swim(1, VISITOR, 1, "50SL", 2_900),
            &create_test_swim(2, VISITOR, 1, "50SL", 3_000),
            None,
            None,
            None,
        );

        assert!(matches!(result, Err(RankingError::InvalidArgument(_))));
    }

    #[test]
    fn test_explicit_meeting_and_event() {
        let mut matcher = HeadToHeadMatcher::new(LOCALE, VISITOR).unwrap();
        let meeting = MeetingRef {
            meeting_id: 99,
            date: NaiveDate::from_ymd_opt(2023, 12, 24).unwrap(),
        };

        matcher
            .add_match(
                &create_test_swim(1, LOCALE, 1, "50SL", 2_900),
                &create_test_swim(2, VISITOR, 1, "50SL", 3_000),
                None,
                Some(meeting),
                Some("RELAY".to_string()),
            )
            .unwrap();

        assert_eq!(matcher.wins()[0].meeting.meeting_id, 99);
        assert_eq!(matcher.first_meeting(), Some(meeting.date));
        assert!(matcher.event_summaries().contains_key("RELAY"));
    }

    #[test]
    fn test_collect_matches_pairs_meeting_and_event() {
        let mut matcher = HeadToHeadMatcher::new(LOCALE, VISITOR).unwrap();
        let locale = vec![
            create_test_swim(1, LOCALE, 1, "50SL", 2_900),
            create_test_swim(2, LOCALE, 1, "100SL", 6_500),
            create_test_swim(3, LOCALE, 2, "50SL", 2_950),
        ];
        let visitor = vec![
            create_test_swim(4, VISITOR, 1, "50SL", 3_000),
            create_test_swim(5, VISITOR, 2, "50SL", 2_900),
            create_test_swim(6, VISITOR, 2, "200SL", 14_000),
        ];

        let added = matcher.collect_matches(&locale, &visitor).unwrap();

        assert_eq!(added, 2);
        assert_eq!(matcher.wins().len(), 1);
        assert_eq!(matcher.losses().len(), 1);
        assert_eq!(matcher.event_summaries()["50SL"].total(), 2);
    }
}
