//! Error types for the ranking engine

use thiserror::Error;

/// Result type for ranking computations
pub type Result<T> = std::result::Result<T, RankingError>;

/// Hard failures of the ranking core.
///
/// Absent data (no seasonal best, no personal standard, no match) is never an
/// error: it is returned as `None` or an empty collection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RankingError {
    /// A constructor received a missing or malformed reference
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No reference time exists for the requested dimensions
    #[error("Missing reference time for {0}")]
    MissingReference(String),

    /// No long-course to short-course ratio is defined for the pair
    #[error("Unsupported course conversion for {gender} {event}")]
    UnsupportedConversion { gender: String, event: String },

    /// A timing was compared against an absent value
    #[error("Invalid comparison: {0}")]
    InvalidComparison(String),

    /// Text could not be parsed as a timing
    #[error("Invalid timing: {0}")]
    InvalidTiming(String),

    /// The result repository failed to answer a query
    #[error("Repository error: {0}")]
    Repository(String),
}

impl From<rusqlite::Error> for RankingError {
    fn from(err: rusqlite::Error) -> Self {
        RankingError::Repository(err.to_string())
    }
}
