// 🎖️ Meeting Bonuses - Shared by both ranking methods
//
// Event bonus: swimming a demanding event in a meeting earns a flat bonus,
// the highest applicable one wins.
//
// Medal bonus: derived from how many 1st/2nd/3rd places the swimmer took in
// the meeting.

use crate::entities::{EventType, StrokeType};
use serde::{Deserialize, Serialize};

// ============================================================================
// EVENT BONUS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBonusRule {
    pub stroke: StrokeType,
    pub length_in_meters: u32,
    pub bonus: u32,
}

impl EventBonusRule {
    pub fn new(stroke: StrokeType, length_in_meters: u32, bonus: u32) -> Self {
        EventBonusRule {
            stroke,
            length_in_meters,
            bonus,
        }
    }

    pub fn applies_to(&self, event: &EventType) -> bool {
        event.is_stroke(self.stroke, self.length_in_meters)
    }
}

/// 800 free → 8; 400 free, 200 medley, 100 free → 4
pub fn default_event_bonuses() -> Vec<EventBonusRule> {
    vec![
        EventBonusRule::new(StrokeType::Freestyle, 800, 8),
        EventBonusRule::new(StrokeType::Freestyle, 400, 4),
        EventBonusRule::new(StrokeType::IndividualMedley, 200, 4),
        EventBonusRule::new(StrokeType::Freestyle, 100, 4),
    ]
}

/// Highest bonus among the events swum; only ever grows as events are added
pub fn event_bonus<'a, I>(rules: &[EventBonusRule], events: I) -> u32
where
    I: IntoIterator<Item = &'a EventType>,
{
    let mut bonus = 0;
    for event in events {
        for rule in rules.iter().filter(|r| r.applies_to(event)) {
            if rule.bonus > bonus {
                bonus = rule.bonus;
            }
        }
    }
    bonus
}

// ============================================================================
// MEDAL BONUS
// ============================================================================

/// Count of podium placements in one meeting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalTally {
    pub first: u32,
    pub second: u32,
    pub third: u32,
}

impl MedalTally {
    pub fn from_ranks<I: IntoIterator<Item = Option<u32>>>(ranks: I) -> Self {
        let mut tally = MedalTally::default();
        for rank in ranks {
            match rank {
                Some(1) => tally.first += 1,
                Some(2) => tally.second += 1,
                Some(3) => tally.third += 1,
                _ => {}
            }
        }
        tally
    }
}

/// Thresholds are checked from the highest value down, each one only
/// replacing the current bonus when larger.
pub fn medal_bonus(tally: &MedalTally) -> u32 {
    let thresholds = [
        (tally.first >= 2, 10),
        (tally.first == 1 && tally.second >= 1, 8),
        (tally.first == 1 && tally.third >= 1, 6),
        (tally.second >= 2, 4),
        (tally.second == 1 && tally.third >= 1, 2),
        (tally.third >= 2, 1),
    ];

    let mut bonus = 0;
    for (reached, value) in thresholds {
        if reached && value > bonus {
            bonus = value;
        }
    }
    bonus
}

// ============================================================================
// TESTS
// ============================================================================
