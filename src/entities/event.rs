// 🏁 Event Type - Distance + stroke, identified by a compact code
//
// Codes follow the "<distance><stroke>" convention used by meet result feeds:
//   50FA  → 50m butterfly
//   100SL → 100m freestyle
//   200MI → 200m individual medley

use crate::error::{RankingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// STROKE TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StrokeType {
    Freestyle,
    Backstroke,
    Breaststroke,
    Butterfly,
    IndividualMedley,
}

impl StrokeType {
    pub fn code(&self) -> &'static str {
        match self {
            StrokeType::Freestyle => "SL",
            StrokeType::Backstroke => "DO",
            StrokeType::Breaststroke => "RA",
            StrokeType::Butterfly => "FA",
            StrokeType::IndividualMedley => "MI",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrokeType::Freestyle => "Freestyle",
            StrokeType::Backstroke => "Backstroke",
            StrokeType::Breaststroke => "Breaststroke",
            StrokeType::Butterfly => "Butterfly",
            StrokeType::IndividualMedley => "Individual Medley",
        }
    }

    pub fn from_code(code: &str) -> Result<Self> {
        match code.to_uppercase().as_str() {
            "SL" => Ok(StrokeType::Freestyle),
            "DO" => Ok(StrokeType::Backstroke),
            "RA" => Ok(StrokeType::Breaststroke),
            "FA" => Ok(StrokeType::Butterfly),
            "MI" => Ok(StrokeType::IndividualMedley),
            other => Err(RankingError::InvalidArgument(format!(
                "unknown stroke code '{}'",
                other
            ))),
        }
    }
}

// ============================================================================
// EVENT TYPE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventType {
    /// Canonical code, e.g. "100SL"
    pub code: String,

    pub length_in_meters: u32,

    pub stroke: StrokeType,
}

impl EventType {
    pub fn new(length_in_meters: u32, stroke: StrokeType) -> Self {
        EventType {
            code: format!("{}{}", length_in_meters, stroke.code()),
            length_in_meters,
            stroke,
        }
    }

    /// Parse a "<distance><stroke>" code
    pub fn from_code(code: &str) -> Result<Self> {
        let code = code.trim();
        let split = code
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| {
                RankingError::InvalidArgument(format!("event code '{}' has no stroke", code))
            })?;

        let (distance, stroke) = code.split_at(split);
        let length_in_meters = distance.parse::<u32>().map_err(|_| {
            RankingError::InvalidArgument(format!("event code '{}' has no distance", code))
        })?;

        if length_in_meters == 0 {
            return Err(RankingError::InvalidArgument(format!(
                "event code '{}' has a zero distance",
                code
            )));
        }

        Ok(EventType::new(length_in_meters, StrokeType::from_code(stroke)?))
    }

    /// Canonical form of `code` ("50sl" → "50SL"); unparseable codes are
    /// only trimmed and uppercased
    pub fn canonical_code(code: &str) -> String {
        match EventType::from_code(code) {
            Ok(event) => event.code,
            Err(_) => code.trim().to_uppercase(),
        }
    }

    pub fn is_stroke(&self, stroke: StrokeType, length_in_meters: u32) -> bool {
        self.stroke == stroke && self.length_in_meters == length_in_meters
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_codes() {
        let event = EventType::from_code("50FA").unwrap();
        assert_eq!(event.length_in_meters, 50);
        assert_eq!(event.stroke, StrokeType::Butterfly);

        let event = EventType::from_code("1500sl").unwrap();
        assert_eq!(event.code, "1500SL");
        assert!(event.is_stroke(StrokeType::Freestyle, 1500));
    }

    #[test]
    fn test_reject_malformed_event_codes() {
        assert!(EventType::from_code("SL").is_err());
        assert!(EventType::from_code("100").is_err());
        assert!(EventType::from_code("100XX").is_err());
        assert!(EventType::from_code("0SL").is_err());
    }
}
