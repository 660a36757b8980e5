// ⏱️ Timing - Immutable race duration
// Days / hours / minutes / seconds / hundredths, always kept normalized.
//
// Canonical total is expressed in hundredths of a second:
//   total = (((days * 24 + hours) * 60 + minutes) * 60 + seconds) * 100 + hundredths

use crate::error::{RankingError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

const HUNDREDTHS_PER_SECOND: u64 = 100;
const HUNDREDTHS_PER_MINUTE: u64 = 60 * HUNDREDTHS_PER_SECOND;
const HUNDREDTHS_PER_HOUR: u64 = 60 * HUNDREDTHS_PER_MINUTE;
const HUNDREDTHS_PER_DAY: u64 = 24 * HUNDREDTHS_PER_HOUR;

// ============================================================================
// TIMING
// ============================================================================

/// A race duration.
///
/// Normalized form always satisfies `hundredths < 100`, `seconds < 60`,
/// `minutes < 60` and `hours < 24`; every higher unit carries into the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawTiming")]
pub struct Timing {
    hundredths: u32,
    seconds: u32,
    minutes: u32,
    hours: u32,
    days: u32,
}

/// Wire form of a timing; any component may overflow its unit
#[derive(Deserialize)]
struct RawTiming {
    #[serde(default)]
    hundredths: u64,
    #[serde(default)]
    seconds: u64,
    #[serde(default)]
    minutes: u64,
    #[serde(default)]
    hours: u64,
    #[serde(default)]
    days: u64,
}

impl From<RawTiming> for Timing {
    fn from(raw: RawTiming) -> Self {
        Timing::new(raw.hundredths, raw.seconds, raw.minutes, raw.hours, raw.days)
    }
}

impl Timing {
    /// Build a timing from raw components, carrying any overflow upwards
    pub fn new(hundredths: u64, seconds: u64, minutes: u64, hours: u64, days: u64) -> Self {
        let total = hundredths
            + seconds * HUNDREDTHS_PER_SECOND
            + minutes * HUNDREDTHS_PER_MINUTE
            + hours * HUNDREDTHS_PER_HOUR
            + days * HUNDREDTHS_PER_DAY;
        Timing::from_hundredths(total)
    }

    pub fn from_hundredths(total: u64) -> Self {
        Timing {
            hundredths: (total % HUNDREDTHS_PER_SECOND) as u32,
            seconds: ((total / HUNDREDTHS_PER_SECOND) % 60) as u32,
            minutes: ((total / HUNDREDTHS_PER_MINUTE) % 60) as u32,
            hours: ((total / HUNDREDTHS_PER_HOUR) % 24) as u32,
            days: (total / HUNDREDTHS_PER_DAY) as u32,
        }
    }

    pub fn zero() -> Self {
        Timing::default()
    }

    pub fn to_hundredths(&self) -> u64 {
        u64::from(self.hundredths)
            + u64::from(self.seconds) * HUNDREDTHS_PER_SECOND
            + u64::from(self.minutes) * HUNDREDTHS_PER_MINUTE
            + u64::from(self.hours) * HUNDREDTHS_PER_HOUR
            + u64::from(self.days) * HUNDREDTHS_PER_DAY
    }

    pub fn hundredths(&self) -> u32 {
        self.hundredths
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// Minutes including the ones carried into hours and days.
    /// Qualifying standards are stored as minutes/seconds/hundredths only.
    pub fn total_minutes(&self) -> u64 {
        self.to_hundredths() / HUNDREDTHS_PER_MINUTE
    }

    pub fn is_zero(&self) -> bool {
        self.to_hundredths() == 0
    }

    /// Compare against a possibly absent timing.
    ///
    /// Comparing with nothing is undefined and fails with `InvalidComparison`.
    pub fn compare(&self, other: Option<&Timing>) -> Result<Ordering> {
        match other {
            Some(other) => Ok(self.cmp(other)),
            None => Err(RankingError::InvalidComparison(format!(
                "cannot compare {} against an absent timing",
                self
            ))),
        }
    }

    /// Subtract, returning `None` when the result would be negative
    pub fn checked_sub(&self, other: &Timing) -> Option<Timing> {
        self.to_hundredths()
            .checked_sub(other.to_hundredths())
            .map(Timing::from_hundredths)
    }

    /// Render as `M'SS"hh`, prefixed by hours and days when present.
    ///
    /// Zero minutes are omitted (`30"00`) unless `show_zero_minutes` is set
    /// (`0'30"00`).
    pub fn format(&self, show_zero_minutes: bool) -> String {
        let mut text = String::new();
        let has_hours = self.days > 0 || self.hours > 0;

        if self.days > 0 {
            text.push_str(&format!("{}d ", self.days));
        }
        if has_hours {
            text.push_str(&format!("{}h ", self.hours));
        }

        if has_hours {
            text.push_str(&format!("{:02}'{:02}\"", self.minutes, self.seconds));
        } else if self.minutes > 0 || show_zero_minutes {
            text.push_str(&format!("{}'{:02}\"", self.minutes, self.seconds));
        } else {
            text.push_str(&format!("{}\"", self.seconds));
        }

        text.push_str(&format!("{:02}", self.hundredths));
        text
    }
}

impl PartialOrd for Timing {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timing {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_hundredths().cmp(&other.to_hundredths())
    }
}

impl Add for Timing {
    type Output = Timing;

    fn add(self, rhs: Timing) -> Timing {
        Timing::from_hundredths(self.to_hundredths() + rhs.to_hundredths())
    }
}

/// Saturates at zero: negative durations are not representable, callers that
/// care must use `checked_sub`.
impl Sub for Timing {
    type Output = Timing;

    fn sub(self, rhs: Timing) -> Timing {
        Timing::from_hundredths(self.to_hundredths().saturating_sub(rhs.to_hundredths()))
    }
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

// ============================================================================
// PARSING
// ============================================================================

/// Accepts `1'02"34`, `1:02.34`, `30.5`, `1:00:00.00` or a bare integer of
/// hundredths (`6234`).
impl FromStr for Timing {
    type Err = RankingError;

    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        if text.is_empty() {
            return Err(RankingError::InvalidTiming("empty timing".to_string()));
        }

        if text.chars().all(|c| c.is_ascii_digit()) {
            let total = text
                .parse::<u64>()
                .map_err(|e| RankingError::InvalidTiming(format!("{}: {}", text, e)))?;
            return Ok(Timing::from_hundredths(total));
        }

        let normalized = text.replace('\'', ":").replace('"', ".");
        let (clock, fraction) = match normalized.rsplit_once('.') {
            Some((clock, fraction)) => (clock, fraction),
            None => (normalized.as_str(), ""),
        };

        let hundredths = parse_fraction(text, fraction)?;

        let parts: Vec<&str> = clock.split(':').collect();
        if parts.len() > 3 {
            return Err(RankingError::InvalidTiming(format!(
                "{}: too many clock components",
                text
            )));
        }

        // seconds, minutes, hours
        let mut units = [0u64; 3];
        for (slot, part) in parts.iter().rev().enumerate() {
            units[slot] = part
                .trim()
                .parse::<u64>()
                .map_err(|e| RankingError::InvalidTiming(format!("{}: {}", text, e)))?;
        }

        Ok(Timing::new(hundredths, units[0], units[1], units[2], 0))
    }
}

fn parse_fraction(original: &str, fraction: &str) -> Result<u64> {
    let value = if fraction.is_empty() {
        0
    } else {
        fraction
            .parse::<u64>()
            .map_err(|e| RankingError::InvalidTiming(format!("{}: {}", original, e)))?
    };

    match fraction.len() {
        0 | 2 => Ok(value),
        1 => Ok(value * 10),
        _ => Err(RankingError::InvalidTiming(format!(
            "{}: at most two fractional digits",
            original
        ))),
    }
}

// ============================================================================
// TESTS
// ============================================================================
