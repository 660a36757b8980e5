// Swim Rankings CLI
// Imports meet results into SQLite and computes bests, rankings, standards,
// records and head-to-head history as JSON.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swim_rankings::{
    classify_standards, load_csv, load_seasons_csv, write_csv, BalancedRankingEngine,
    EnhancedRankingEngine, HeadToHeadMatcher, PersonalStandardStore, PonderatedBestCalculator,
    QualifyingStandard, RankingConfig, RankingOptions, RecordTracker, ResultQuery,
    ResultRepository, Season, SeasonCatalog, SeasonalBestFinder, SeasonalBests,
    SqliteResultRepository,
};

/// Command-line arguments for swim-rankings
#[derive(Parser, Debug)]
#[command(name = "swim-rankings")]
#[command(about = "Season rankings, standards and records for swimming meets")]
#[command(version)]
struct Args {
    /// SQLite database holding seasons and results
    #[arg(long, default_value = "rankings.db", env = "SWIM_RANKINGS_DB")]
    db: PathBuf,

    /// Ranking configuration (JSON); built-in defaults when omitted
    #[arg(long, env = "SWIM_RANKINGS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import seasons and race results from CSV
    Import {
        /// Race results CSV
        #[arg(long)]
        results: PathBuf,

        /// Seasons CSV
        #[arg(long)]
        seasons: Option<PathBuf>,
    },

    /// Seasonal best per gender/category/event
    Bests {
        #[arg(long)]
        season: i64,
    },

    /// Rank every gender/category group of a season
    Rank {
        #[arg(long)]
        season: i64,

        #[arg(long, value_enum, default_value_t = Method::Balanced)]
        method: Method,

        /// Only results swum up to this date (YYYY-MM-DD)
        #[arg(long)]
        until: Option<NaiveDate>,
    },

    /// Ponderated standards computed from prior seasons
    Standards {
        #[arg(long)]
        season: i64,

        /// Write the semicolon-separated export here instead of JSON
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Standards already stored (JSON), to classify inserts and updates
        #[arg(long)]
        existing: Option<PathBuf>,
    },

    /// Record holders per pool/gender/event/category
    Records {
        /// Restrict to one season
        #[arg(long)]
        season: Option<i64>,
    },

    /// Win/loss history between two swimmers
    HeadToHead {
        #[arg(long)]
        locale: i64,

        #[arg(long)]
        visitor: i64,

        /// Restrict to one season
        #[arg(long)]
        season: Option<i64>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Method {
    /// Balanced Individual Ranking
    Balanced,
    /// Enhanced Individual Ranking
    Enhanced,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RankingConfig::from_file(path)?,
        None => RankingConfig::default(),
    };

    let repo = SqliteResultRepository::open(&args.db)?;
    info!("Database: {}", args.db.display());

    match args.command {
        Command::Import { results, seasons } => run_import(&repo, &results, seasons.as_deref()),
        Command::Bests { season } => run_bests(&repo, &config, season),
        Command::Rank {
            season,
            method,
            until,
        } => run_rank(&repo, &config, season, method, until),
        Command::Standards {
            season,
            csv,
            existing,
        } => run_standards(&repo, &config, season, csv.as_deref(), existing.as_deref()),
        Command::Records { season } => run_records(&repo, season),
        Command::HeadToHead {
            locale,
            visitor,
            season,
        } => run_head_to_head(&repo, locale, visitor, season),
    }
}

// ============================================================================
// COMMANDS
// ============================================================================

fn run_import(repo: &SqliteResultRepository, results: &Path, seasons: Option<&Path>) -> Result<()> {
    if let Some(path) = seasons {
        let seasons = load_seasons_csv(path)?;
        for season in &seasons {
            repo.insert_season(season)?;
        }
        info!("Imported {} seasons", seasons.len());
    }

    let results = load_csv(results)?;
    let inserted = repo.insert_results(&results)?;

    print_json(&ImportSummary {
        loaded: results.len(),
        inserted,
        duplicates: results.len() - inserted,
    })
}

fn run_bests(repo: &SqliteResultRepository, config: &RankingConfig, season_id: i64) -> Result<()> {
    let (season, catalog) = load_catalog(repo, season_id)?;
    let bests = find_bests(repo, config, &season, &catalog)?;

    print_json(&bests.iter().collect::<Vec<_>>())
}

fn run_rank(
    repo: &SqliteResultRepository,
    config: &RankingConfig,
    season_id: i64,
    method: Method,
    until: Option<NaiveDate>,
) -> Result<()> {
    let (season, catalog) = load_catalog(repo, season_id)?;
    let bests = find_bests(repo, config, &season, &catalog)?;

    let mut options = RankingOptions::from_config(config);
    if let Some(date) = until {
        options = options.until(date);
    }

    match method {
        Method::Balanced => {
            let engine = BalancedRankingEngine::new(repo, &catalog, &bests, &options)?;
            print_json(&engine.rankings())
        }
        Method::Enhanced => {
            let standards = personal_standards(repo, &season)?;
            let engine = EnhancedRankingEngine::new(repo, &catalog, &bests, &standards, &options)?;
            print_json(&engine.rankings())
        }
    }
}

fn run_standards(
    repo: &SqliteResultRepository,
    config: &RankingConfig,
    season_id: i64,
    csv: Option<&Path>,
    existing: Option<&Path>,
) -> Result<()> {
    let (season, catalog) = load_catalog(repo, season_id)?;
    let calculator = PonderatedBestCalculator::new(repo, &season, config.ponderated)?;

    if calculator.prior_season_ids().is_empty() {
        warn!("Season {} has no prior season of the same type", season_id);
    }

    let bests = calculator.compute_all(&catalog)?;

    if let Some(path) = csv {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_csv(file, &bests)?;
        info!("Wrote {} standards to {}", bests.len(), path.display());
        return Ok(());
    }

    let existing: Vec<QualifyingStandard> = match existing {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&content).context("Failed to parse existing standards JSON")?
        }
        None => Vec::new(),
    };

    print_json(&classify_standards(&bests, &existing))
}

fn run_records(repo: &SqliteResultRepository, season: Option<i64>) -> Result<()> {
    let query = match season {
        Some(id) => ResultQuery::for_season(id),
        None => ResultQuery::default(),
    }
    .valid_only();

    let results = repo.find_results(&query)?;
    let tracker = RecordTracker::from_results(&results);
    info!("{} records from {} results", tracker.len(), results.len());

    print_json(tracker.records())
}

fn run_head_to_head(
    repo: &SqliteResultRepository,
    locale: i64,
    visitor: i64,
    season: Option<i64>,
) -> Result<()> {
    let base = match season {
        Some(id) => ResultQuery::for_season(id),
        None => ResultQuery::default(),
    };

    let locale_results = repo.find_results(&base.clone().swimmer(locale))?;
    let visitor_results = repo.find_results(&base.swimmer(visitor))?;

    let mut matcher = HeadToHeadMatcher::new(locale, visitor)?;
    let added = matcher.collect_matches(&locale_results, &visitor_results)?;
    info!("{} matches between {} and {}", added, locale, visitor);

    print_json(&matcher)
}

// ============================================================================
// HELPERS
// ============================================================================

#[derive(Serialize)]
struct ImportSummary {
    loaded: usize,
    inserted: usize,
    duplicates: usize,
}

fn load_catalog(repo: &SqliteResultRepository, season_id: i64) -> Result<(Season, SeasonCatalog)> {
    let season = repo.season(season_id)?;
    let results = repo.find_results(&ResultQuery::for_season(season_id))?;

    if results.is_empty() {
        bail!("Season {} has no results", season_id);
    }

    let catalog = SeasonCatalog::from_results(season.clone(), &results)?;
    Ok((season, catalog))
}

fn find_bests(
    repo: &SqliteResultRepository,
    config: &RankingConfig,
    season: &Season,
    catalog: &SeasonCatalog,
) -> Result<SeasonalBests> {
    let finder = SeasonalBestFinder::new(repo, season, &config.conversion_factors);
    Ok(finder.find_all(catalog)?)
}

/// Personal standards taken from the latest prior season of the same type
fn personal_standards(repo: &SqliteResultRepository, season: &Season) -> Result<PersonalStandardStore> {
    let prior = repo
        .seasons()?
        .into_iter()
        .filter(|s| s.precedes_same_type(season))
        .max_by_key(|s| s.begin_date);

    let prior = match prior {
        Some(prior) => prior,
        None => {
            warn!("No prior season for {}, enhancement disabled", season.id);
            return Ok(PersonalStandardStore::new());
        }
    };

    let results = repo.find_results(&ResultQuery::for_season(prior.id).valid_only())?;
    Ok(PersonalStandardStore::from_prior_results(season.id, &results))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
