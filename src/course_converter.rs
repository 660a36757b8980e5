// 🔄 Course Converter - Long-course (50m) to short-course (25m) times
//
// Long-course races have fewer turns and are structurally slower. A converted
// time is the long-course time multiplied by a per gender/event ratio:
//
//   short_course = round(long_course_hundredths × ratio)
//
// Events that are not swum in long course (e.g. 100MI) have no ratio and
// cannot be converted.

use crate::entities::{GenderType, Season};
use crate::error::{RankingError, Result};
use crate::timing::Timing;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

// ============================================================================
// CONVERSION FACTOR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionFactor {
    pub gender: GenderType,
    pub event_code: String,

    /// short-course time = long-course time × ratio
    pub ratio: f64,

    /// Restrict the factor to one season type (None = every season)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season_type_id: Option<i64>,
}

/// (event, male ratio, female ratio)
const DEFAULT_RATIOS: &[(&str, f64, f64)] = &[
    ("50SL", 0.9750, 0.9760),
    ("100SL", 0.9720, 0.9740),
    ("200SL", 0.9730, 0.9750),
    ("400SL", 0.9760, 0.9770),
    ("800SL", 0.9780, 0.9790),
    ("1500SL", 0.9790, 0.9800),
    ("50DO", 0.9560, 0.9600),
    ("100DO", 0.9600, 0.9640),
    ("200DO", 0.9650, 0.9680),
    ("50RA", 0.9680, 0.9700),
    ("100RA", 0.9700, 0.9720),
    ("200RA", 0.9720, 0.9740),
    ("50FA", 0.9760, 0.9780),
    ("100FA", 0.9770, 0.9790),
    ("200FA", 0.9780, 0.9800),
    ("200MI", 0.9700, 0.9720),
    ("400MI", 0.9740, 0.9760),
];

pub fn default_conversion_factors() -> Vec<ConversionFactor> {
    DEFAULT_RATIOS
        .iter()
        .flat_map(|(event, male, female)| {
            [(GenderType::Male, *male), (GenderType::Female, *female)]
                .into_iter()
                .map(move |(gender, ratio)| ConversionFactor {
                    gender,
                    event_code: event.to_string(),
                    ratio,
                    season_type_id: None,
                })
        })
        .collect()
}

// ============================================================================
// COURSE CONVERTER
// ============================================================================

pub struct CourseConverter {
    season_id: i64,
    ratios: HashMap<(GenderType, String), f64>,
}

impl CourseConverter {
    /// Build the converter for a season.
    ///
    /// Factors restricted to the season's type override generic ones.
    pub fn new(season: &Season, factors: &[ConversionFactor]) -> Self {
        let mut ratios = HashMap::new();

        for factor in factors.iter().filter(|f| f.season_type_id.is_none()) {
            ratios.insert((factor.gender, factor.event_code.clone()), factor.ratio);
        }
        for factor in factors
            .iter()
            .filter(|f| f.season_type_id == Some(season.season_type_id))
        {
            ratios.insert((factor.gender, factor.event_code.clone()), factor.ratio);
        }

        debug!(season = season.id, ratios = ratios.len(), "course converter ready");

        CourseConverter {
            season_id: season.id,
            ratios,
        }
    }

    pub fn season_id(&self) -> i64 {
        self.season_id
    }

    pub fn ratio(&self, gender: GenderType, event_code: &str) -> Option<f64> {
        self.ratios.get(&(gender, event_code.to_string())).copied()
    }

    pub fn is_conversion_possible(&self, gender: GenderType, event_code: &str) -> bool {
        self.ratio(gender, event_code).is_some()
    }

    pub fn convert_to_short_course(
        &self,
        timing: &Timing,
        gender: GenderType,
        event_code: &str,
    ) -> Result<Timing> {
        let ratio = self.ratio(gender, event_code).ok_or_else(|| {
            RankingError::UnsupportedConversion {
                gender: gender.code().to_string(),
                event: event_code.to_string(),
            }
        })?;

        let converted = (timing.to_hundredths() as f64 * ratio).round() as u64;
        Ok(Timing::from_hundredths(converted))
    }
}

// ============================================================================
// TESTS
// ============================================================================
