// ⚙️ Ranking Configuration - Policies as data
// Every tunable constant of the engines lives here, loadable from JSON.

use crate::course_converter::{default_conversion_factors, ConversionFactor};
use crate::error::RankingError;
use crate::ponderated_best::PonderatedPolicy;
use crate::ranking::bonus::{default_event_bonuses, EventBonusRule};
use crate::ranking::enhanced::MAX_ENHANCE_POINTS;
use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// N in "best N of M" meetings (default: 5)
    pub best_meetings: usize,

    /// Policy for ponderated (trimmed mean) standards
    pub ponderated: PonderatedPolicy,

    /// Maximum enhancement points awarded by the EIR method (default: 10)
    pub enhance_cap: u32,

    /// Event bonuses awarded per meeting
    pub event_bonuses: Vec<EventBonusRule>,

    /// Long-course to short-course ratios
    pub conversion_factors: Vec<ConversionFactor>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        RankingConfig {
            best_meetings: 5,
            ponderated: PonderatedPolicy::default(),
            enhance_cap: MAX_ENHANCE_POINTS,
            event_bonuses: default_event_bonuses(),
            conversion_factors: default_conversion_factors(),
        }
    }
}

impl RankingConfig {
    /// Load configuration from a JSON file; missing keys keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: RankingConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), RankingError> {
        if self.best_meetings == 0 {
            return Err(RankingError::InvalidArgument(
                "best_meetings must be at least 1".to_string(),
            ));
        }

        if self.enhance_cap > MAX_ENHANCE_POINTS {
            return Err(RankingError::InvalidArgument(format!(
                "enhance_cap {} exceeds {}",
                self.enhance_cap, MAX_ENHANCE_POINTS
            )));
        }

        self.ponderated.validate()?;

        if let Some(factor) = self
            .conversion_factors
            .iter()
            .find(|f| !(f.ratio.is_finite() && f.ratio > 0.0))
        {
            return Err(RankingError::InvalidArgument(format!(
                "conversion ratio for {} {} must be positive",
                factor.gender, factor.event_code
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
    use std::io::Write;

    #[test]
    fn test_enhance_cap_above_ten_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"enhance_cap": 20}}"#).unwrap();

        assert!(RankingConfig::from_file(file.path()).is_err());

        let lowered = RankingConfig {
            enhance_cap: 5,
            ..RankingConfig::default()
        };
        assert!(lowered.validate().is_ok());
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = RankingConfig::default();

        assert_eq!(config.best_meetings, 5);
        assert_eq!(config.ponderated.max_results, 10);
        assert_eq!(config.ponderated.bests_to_ignore, 1);
        assert_eq!(config.enhance_cap, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "best_meetings": 3, "ponderated": {{ "max_results": 6 }} }}"#).unwrap();

        let config = RankingConfig::from_file(file.path()).unwrap();

        assert_eq!(config.best_meetings, 3);
        assert_eq!(config.ponderated.max_results, 6);
        assert_eq!(config.ponderated.bests_to_ignore, 1);
        assert_eq!(config.event_bonuses, default_event_bonuses());
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "best_meetings": 0 }}"#).unwrap();

        assert!(RankingConfig::from_file(file.path()).is_err());
        assert!(RankingConfig::from_file("/nonexistent/ranking.json").is_err());
    }
}
