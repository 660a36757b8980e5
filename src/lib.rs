// Swim Rankings - Core Library
// Exposes all modules for use in the CLI and tests

pub mod config;           // Ranking configuration (JSON)
pub mod course_converter; // Long course → short course conversion
pub mod db;               // SQLite result store + CSV import
pub mod entities;         // Gender, pool, event, category, season
pub mod error;
pub mod head_to_head;     // Win/loss history between two swimmers
pub mod ponderated_best;  // Weighted historical standards + CSV export
pub mod ranking;          // BIR / EIR ranking engines
pub mod records;          // Record tracker
pub mod results;          // Race results + repository boundary
pub mod score_calculator;
pub mod seasonal_best;
pub mod timing;

// Re-export commonly used types
pub use config::RankingConfig;
pub use course_converter::{default_conversion_factors, ConversionFactor, CourseConverter};
pub use db::{
    insert_results, insert_season, load_csv, load_seasons_csv, setup_database,
    verify_count, SqliteResultRepository,
};
pub use entities::{
    CategoryType, EventType, GenderType, PoolType, Season, SeasonCatalog, StrokeType,
};
pub use error::{RankingError, Result};
pub use head_to_head::{AddMatch, HeadToHeadMatcher, MatchKind, MeetingRef};
pub use ponderated_best::{
    classify_standards, write_csv, PonderatedBest, PonderatedBestCalculator,
    PonderatedPolicy, QualifyingStandard, QualifyingStandards, StandardInstruction,
};
pub use ranking::enhanced::{PersonalStandardStore, PersonalStandards};
pub use ranking::{BalancedRankingEngine, EnhancedRankingEngine, RankingOptions};
pub use records::{RecordAttribute, RecordKeyOverrides, RecordTracker, RecordValue};
pub use results::{InMemoryResults, RaceResult, ResultQuery, ResultRepository};
pub use score_calculator::{ReferenceTimes, ScoreCalculator};
pub use seasonal_best::{SeasonalBest, SeasonalBestFinder, SeasonalBests};
pub use timing::Timing;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
