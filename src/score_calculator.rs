// 🎯 Score Calculator - Proportional score against a reference time
//
//   score = reference_score × reference_hundredths / timing_hundredths
//
// An equal time earns exactly the reference score, a slower one strictly less.

use crate::entities::{GenderType, PoolType};
use crate::error::{RankingError, Result};
use crate::timing::Timing;

// ============================================================================
// REFERENCE TIMES
// ============================================================================

/// Anything able to supply the reference ("best") time for a
/// season/gender/category/pool/event combination.
pub trait ReferenceTimes {
    fn reference_time(
        &self,
        season_id: i64,
        gender: GenderType,
        category_code: &str,
        pool: PoolType,
        event_code: &str,
    ) -> Option<Timing>;
}

// ============================================================================
// SCORE CALCULATOR
// ============================================================================

#[derive(Debug, Clone)]
pub struct ScoreCalculator {
    pub season_id: i64,
    pub gender: GenderType,
    pub category_code: String,
    pub pool: PoolType,
    pub event_code: String,
    reference: Timing,
}

impl ScoreCalculator {
    /// Fails with `MissingReference` when `references` has no usable time
    pub fn new<R: ReferenceTimes + ?Sized>(
        references: &R,
        season_id: i64,
        gender: GenderType,
        category_code: &str,
        pool: PoolType,
        event_code: &str,
    ) -> Result<Self> {
        if category_code.trim().is_empty() || event_code.trim().is_empty() {
            return Err(RankingError::InvalidArgument(
                "score calculator needs both a category and an event".to_string(),
            ));
        }

        let reference = references
            .reference_time(season_id, gender, category_code, pool, event_code)
            .filter(|t| !t.is_zero())
            .ok_or_else(|| {
                RankingError::MissingReference(format!(
                    "season {} {} {} {} {}",
                    season_id, gender, category_code, pool, event_code
                ))
            })?;

        Ok(ScoreCalculator {
            season_id,
            gender,
            category_code: category_code.to_string(),
            pool,
            event_code: event_code.to_string(),
            reference,
        })
    }

    pub fn reference_time(&self) -> Timing {
        self.reference
    }

    /// Score `timing` relative to the reference, rounded to `decimals`.
    /// A zero timing has no performance and scores 0.
    pub fn compute_score(&self, timing: &Timing, reference_score: f64, decimals: u32) -> f64 {
        if timing.is_zero() {
            return 0.0;
        }

        let score =
            reference_score * self.reference.to_hundredths() as f64 / timing.to_hundredths() as f64;
        round_to(score, decimals)
    }
}

pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct FixedReference(Option<Timing>);

    impl ReferenceTimes for FixedReference {
        fn reference_time(&self, _: i64, _: GenderType, _: &str, _: PoolType, _: &str) -> Option<Timing> {
            self.0
        }
    }

    fn create_test_calculator(reference: u64) -> ScoreCalculator {
        ScoreCalculator::new(
            &FixedReference(Some(Timing::from_hundredths(reference))),
            1,
            GenderType::Male,
            "M25",
            PoolType::ShortCourse,
            "100SL",
        )
        .unwrap()
    }

    #[test]
    fn test_equal_timing_scores_reference() {
        let calculator = create_test_calculator(6_000);
        let score = calculator.compute_score(&Timing::from_hundredths(6_000), 100.0, 0);

        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_slower_timing_scores_less() {
        let calculator = create_test_calculator(3_000);

        let close = calculator.compute_score(&Timing::from_hundredths(3_100), 100.0, 2);
        let far = calculator.compute_score(&Timing::from_hundredths(3_500), 100.0, 2);

        assert_relative_eq!(close, 96.77);
        assert!(far < close);
        assert_eq!(calculator.compute_score(&Timing::from_hundredths(3_100), 100.0, 0), 97.0);
    }

    #[test]
    fn test_zero_timing_scores_zero() {
        let calculator = create_test_calculator(3_000);
        assert_eq!(calculator.compute_score(&Timing::zero(), 1000.0, 2), 0.0);
    }

    #[test]
    fn test_missing_reference_fails() {
        let result = ScoreCalculator::new(
            &FixedReference(None),
            1,
            GenderType::Female,
            "M25",
            PoolType::LongCourse,
            "50RA",
        );

        assert!(matches!(result, Err(RankingError::MissingReference(_))));
    }

    #[test]
    fn test_empty_codes_are_invalid() {
        let result = ScoreCalculator::new(
            &FixedReference(Some(Timing::from_hundredths(3_000))),
            1,
            GenderType::Female,
            "",
            PoolType::LongCourse,
            "50RA",
        );

        assert!(matches!(result, Err(RankingError::InvalidArgument(_))));
    }
}
