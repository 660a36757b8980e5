use crate::entities::{EventType, GenderType, PoolType, Season};
use crate::error::RankingError;
use crate::results::{RaceResult, ResultQuery, ResultRepository};
use crate::timing::Timing;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, info};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// CSV RECORDS
// ============================================================================

/// One race result row as exported by the results collaborator
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ResultRecord {
    #[serde(rename = "Result_Id")]
    pub result_id: i64,

    #[serde(rename = "Swimmer_Id")]
    pub swimmer_id: i64,

    #[serde(rename = "Meeting_Id")]
    pub meeting_id: i64,

    #[serde(rename = "Session_Date")]
    pub session_date: NaiveDate,

    #[serde(rename = "Season_Id")]
    pub season_id: i64,

    #[serde(rename = "Event")]
    pub event_code: String,

    #[serde(rename = "Category")]
    pub category_code: String,

    #[serde(rename = "Gender")]
    pub gender: String,

    #[serde(rename = "Pool")]
    pub pool: String,

    /// Empty when the swimmer was not ranked
    #[serde(rename = "Rank")]
    pub rank: Option<u32>,

    #[serde(rename = "Disqualified")]
    pub disqualified: bool,

    /// Any format accepted by `Timing::from_str` (1'02"34, 1:02.34, 62.34)
    #[serde(rename = "Timing")]
    pub timing: String,

    #[serde(rename = "Event_Points", default)]
    pub event_points: f64,
}

impl ResultRecord {
    pub fn into_result(self) -> Result<RaceResult> {
        let timing: Timing = self
            .timing
            .parse()
            .with_context(|| format!("Result {}: bad timing '{}'", self.result_id, self.timing))?;

        Ok(RaceResult {
            id: self.result_id,
            swimmer_id: self.swimmer_id,
            meeting_id: self.meeting_id,
            session_date: self.session_date,
            season_id: self.season_id,
            event_code: EventType::canonical_code(&self.event_code),
            category_code: self.category_code.trim().to_string(),
            gender: GenderType::from_code(&self.gender)
                .with_context(|| format!("Result {}: bad gender", self.result_id))?,
            pool: PoolType::from_code(&self.pool)
                .with_context(|| format!("Result {}: bad pool", self.result_id))?,
            rank: self.rank,
            is_disqualified: self.disqualified,
            timing,
            event_points: self.event_points,
        })
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SeasonRecord {
    #[serde(rename = "Season_Id")]
    pub id: i64,

    #[serde(rename = "Season_Type_Id")]
    pub season_type_id: i64,

    #[serde(rename = "Description")]
    pub description: String,

    #[serde(rename = "Begin_Date")]
    pub begin_date: NaiveDate,

    #[serde(rename = "End_Date")]
    pub end_date: NaiveDate,
}

/// Dedup key of a result. The source id keeps heats and finals with the
/// same time apart; the remaining fields catch a re-exported row.
pub fn compute_idempotency_hash(result: &RaceResult) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!(
        "{}|{}|{}|{}|{}|{}|{}|{}",
        result.id,
        result.swimmer_id,
        result.meeting_id,
        result.session_date.format(DATE_FORMAT),
        EventType::canonical_code(&result.event_code),
        result.pool.code(),
        result.timing.to_hundredths(),
        result.is_disqualified
    ));
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS seasons (
            id INTEGER PRIMARY KEY,
            season_type_id INTEGER NOT NULL,
            description TEXT NOT NULL,
            begin_date TEXT NOT NULL,
            end_date TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS race_results (
            id INTEGER PRIMARY KEY,
            idempotency_hash TEXT UNIQUE NOT NULL,
            swimmer_id INTEGER NOT NULL,
            meeting_id INTEGER NOT NULL,
            session_date TEXT NOT NULL,
            season_id INTEGER NOT NULL,
            event_code TEXT NOT NULL,
            category_code TEXT NOT NULL,
            gender TEXT NOT NULL,
            pool TEXT NOT NULL,
            rank INTEGER,
            is_disqualified INTEGER NOT NULL DEFAULT 0,
            timing_hundredths INTEGER NOT NULL,
            event_points REAL NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_results_group ON race_results(season_id, gender, category_code)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_results_event ON race_results(season_id, event_code, pool, timing_hundredths)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_results_swimmer ON race_results(swimmer_id)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// IMPORT
// ============================================================================

pub fn load_csv(csv_path: &Path) -> Result<Vec<RaceResult>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open results CSV file")?;

    let mut results = Vec::new();
    for (line, record) in rdr.deserialize().enumerate() {
        let record: ResultRecord =
            record.with_context(|| format!("Failed to deserialize result on row {}", line + 1))?;
        results.push(record.into_result()?);
    }

    debug!(path = %csv_path.display(), results = results.len(), "results CSV loaded");
    Ok(results)
}

pub fn load_seasons_csv(csv_path: &Path) -> Result<Vec<Season>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open seasons CSV file")?;

    let mut seasons = Vec::new();
    for record in rdr.deserialize() {
        let record: SeasonRecord = record.context("Failed to deserialize season")?;
        seasons.push(Season::new(
            record.id,
            record.season_type_id,
            &record.description,
            record.begin_date,
            record.end_date,
        )?);
    }

    Ok(seasons)
}

pub fn insert_season(conn: &Connection, season: &Season) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO seasons (id, season_type_id, description, begin_date, end_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            season.id,
            season.season_type_id,
            season.description,
            season.begin_date.format(DATE_FORMAT).to_string(),
            season.end_date.format(DATE_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

/// Insert results, skipping any already stored. Returns how many were new.
pub fn insert_results(conn: &Connection, results: &[RaceResult]) -> Result<usize> {
    let mut inserted = 0;
    let mut duplicates = 0;

    for result in results {
        let hash = compute_idempotency_hash(result);

        let outcome = conn.execute(
            "INSERT INTO race_results (
                id, idempotency_hash, swimmer_id, meeting_id, session_date, season_id,
                event_code, category_code, gender, pool, rank, is_disqualified,
                timing_hundredths, event_points
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                result.id,
                hash,
                result.swimmer_id,
                result.meeting_id,
                result.session_date.format(DATE_FORMAT).to_string(),
                result.season_id,
                EventType::canonical_code(&result.event_code),
                result.category_code,
                result.gender.code(),
                result.pool.code(),
                result.rank,
                result.is_disqualified,
                result.timing.to_hundredths() as i64,
                result.event_points,
            ],
        );

        match outcome {
            Ok(_) => inserted += 1,
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                duplicates += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(inserted, duplicates, "race results imported");
    Ok(inserted)
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM race_results", [], |row| row.get(0))?;
    Ok(count)
}

// ============================================================================
// REPOSITORY
// ============================================================================

/// Row as stored, before codes and dates are parsed back
struct StoredResult {
    id: i64,
    swimmer_id: i64,
    meeting_id: i64,
    session_date: String,
    season_id: i64,
    event_code: String,
    category_code: String,
    gender: String,
    pool: String,
    rank: Option<u32>,
    is_disqualified: bool,
    timing_hundredths: i64,
    event_points: f64,
}

fn parse_date(text: &str) -> crate::error::Result<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|e| RankingError::Repository(format!("bad stored date '{}': {}", text, e)))
}

impl StoredResult {
    fn into_result(self) -> crate::error::Result<RaceResult> {
        Ok(RaceResult {
            id: self.id,
            swimmer_id: self.swimmer_id,
            meeting_id: self.meeting_id,
            session_date: parse_date(&self.session_date)?,
            season_id: self.season_id,
            event_code: self.event_code,
            category_code: self.category_code,
            gender: GenderType::from_code(&self.gender)?,
            pool: PoolType::from_code(&self.pool)?,
            rank: self.rank,
            is_disqualified: self.is_disqualified,
            timing: Timing::from_hundredths(self.timing_hundredths.max(0) as u64),
            event_points: self.event_points,
        })
    }
}

/// Translate a `ResultQuery` into a WHERE clause and its parameters
fn build_select(query: &ResultQuery) -> (String, Vec<Value>) {
    let mut sql = String::from(
        "SELECT id, swimmer_id, meeting_id, session_date, season_id, event_code, category_code,
                gender, pool, rank, is_disqualified, timing_hundredths, event_points
         FROM race_results WHERE 1 = 1",
    );
    let mut values = Vec::new();

    if !query.season_ids.is_empty() {
        let placeholders = vec!["?"; query.season_ids.len()].join(", ");
        sql.push_str(&format!(" AND season_id IN ({})", placeholders));
        values.extend(query.season_ids.iter().map(|id| Value::Integer(*id)));
    }
    if let Some(gender) = query.gender {
        sql.push_str(" AND gender = ?");
        values.push(Value::Text(gender.code().to_string()));
    }
    if let Some(category) = &query.category_code {
        sql.push_str(" AND category_code = ?");
        values.push(Value::Text(category.clone()));
    }
    if let Some(event) = &query.event_code {
        sql.push_str(" AND event_code = ?");
        values.push(Value::Text(event.clone()));
    }
    if let Some(pool) = query.pool {
        sql.push_str(" AND pool = ?");
        values.push(Value::Text(pool.code().to_string()));
    }
    if let Some(swimmer) = query.swimmer_id {
        sql.push_str(" AND swimmer_id = ?");
        values.push(Value::Integer(swimmer));
    }
    if query.valid_only {
        sql.push_str(" AND is_disqualified = 0 AND timing_hundredths > 0");
    }
    if let Some(from) = query.date_from {
        sql.push_str(" AND session_date >= ?");
        values.push(Value::Text(from.format(DATE_FORMAT).to_string()));
    }
    if let Some(to) = query.date_to {
        sql.push_str(" AND session_date <= ?");
        values.push(Value::Text(to.format(DATE_FORMAT).to_string()));
    }

    sql.push_str(" ORDER BY timing_hundredths ASC, id ASC");
    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        values.push(Value::Integer(limit as i64));
    }

    (sql, values)
}

/// `ResultRepository` backed by the SQLite store
pub struct SqliteResultRepository {
    conn: Connection,
}

impl SqliteResultRepository {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;
        setup_database(&conn)?;
        Ok(SqliteResultRepository { conn })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(SqliteResultRepository { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn insert_season(&self, season: &Season) -> Result<()> {
        insert_season(&self.conn, season)
    }

    pub fn insert_results(&self, results: &[RaceResult]) -> Result<usize> {
        insert_results(&self.conn, results)
    }

    pub fn season(&self, season_id: i64) -> Result<Season> {
        self.seasons()?
            .into_iter()
            .find(|s| s.id == season_id)
            .with_context(|| format!("Season {} not found", season_id))
    }
}

impl ResultRepository for SqliteResultRepository {
    fn find_results(&self, query: &ResultQuery) -> crate::error::Result<Vec<RaceResult>> {
        let (sql, values) = build_select(query);
        let mut stmt = self.conn.prepare(&sql)?;

        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok(StoredResult {
                    id: row.get(0)?,
                    swimmer_id: row.get(1)?,
                    meeting_id: row.get(2)?,
                    session_date: row.get(3)?,
                    season_id: row.get(4)?,
                    event_code: row.get(5)?,
                    category_code: row.get(6)?,
                    gender: row.get(7)?,
                    pool: row.get(8)?,
                    rank: row.get(9)?,
                    is_disqualified: row.get(10)?,
                    timing_hundredths: row.get(11)?,
                    event_points: row.get(12)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(StoredResult::into_result).collect()
    }

    fn seasons(&self) -> crate::error::Result<Vec<Season>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, season_type_id, description, begin_date, end_date
             FROM seasons ORDER BY begin_date",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, type_id, description, begin, end)| {
                Season::new(id, type_id, &description, parse_date(&begin)?, parse_date(&end)?)
            })
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::tests::create_test_result;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_season(id: i64, begin_year: i32) -> Season {
        Season::new(
            id,
            1,
            &format!("{}/{}", begin_year, begin_year + 1),
            NaiveDate::from_ymd_opt(begin_year, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(begin_year + 1, 9, 30).unwrap(),
        )
        .unwrap()
    }

    fn create_test_repository() -> SqliteResultRepository {
        let repo = SqliteResultRepository::in_memory().unwrap();
        repo.insert_season(&create_test_season(1, 2023)).unwrap();
        repo.insert_results(&[
            create_test_result(1, 1, "50SL", "M25", GenderType::Male, PoolType::ShortCourse, 3_100),
            create_test_result(2, 2, "50SL", "M25", GenderType::Male, PoolType::ShortCourse, 2_900),
            create_test_result(3, 3, "50SL", "M25", GenderType::Female, PoolType::ShortCourse, 3_300),
            create_test_result(4, 4, "100SL", "M25", GenderType::Male, PoolType::LongCourse, 6_500),
        ])
        .unwrap();
        repo
    }

    #[test]
    fn test_idempotency_import_twice() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let results = vec![
            create_test_result(1, 1, "50SL", "M25", GenderType::Male, PoolType::ShortCourse, 3_100),
            create_test_result(2, 2, "100RA", "M30", GenderType::Female, PoolType::LongCourse, 9_000),
        ];

        let inserted1 = insert_results(&conn, &results).unwrap();
        let inserted2 = insert_results(&conn, &results).unwrap();

        assert_eq!(inserted1, 2, "First import should insert 2 results");
        assert_eq!(inserted2, 0, "Second import should insert nothing");
        assert_eq!(verify_count(&conn).unwrap(), 2);
    }

    #[test]
    fn test_same_time_in_heat_and_final_both_import() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let heat = create_test_result(1, 7, "100SL", "M25", GenderType::Male, PoolType::ShortCourse, 6_000);
        let mut final_swim = heat.clone();
        final_swim.id = 2;

        assert_ne!(compute_idempotency_hash(&heat), compute_idempotency_hash(&final_swim));
        assert_eq!(insert_results(&conn, &[heat, final_swim]).unwrap(), 2);
        assert_eq!(verify_count(&conn).unwrap(), 2);
    }

    #[test]
    fn test_stored_event_codes_are_canonical() {
        let repo = SqliteResultRepository::in_memory().unwrap();
        repo.insert_results(&[create_test_result(1, 1, "50sl", "M25", GenderType::Male, PoolType::ShortCourse, 2_900)])
            .unwrap();

        let found = repo.find_results(&ResultQuery::for_season(1).event("50SL")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].event_code, "50SL");
    }

    #[test]
    fn test_compute_idempotency_hash() {
        let result = create_test_result(1, 1, "50SL", "M25", GenderType::Male, PoolType::ShortCourse, 3_100);
        let mut other = result.clone();
        other.timing = Timing::from_hundredths(3_101);

        assert_eq!(compute_idempotency_hash(&result), compute_idempotency_hash(&result));
        assert_ne!(compute_idempotency_hash(&result), compute_idempotency_hash(&other));
        assert_eq!(compute_idempotency_hash(&result).len(), 64);
    }

    #[test]
    fn test_find_results_filters_and_orders() {
        let repo = create_test_repository();

        let found = repo
            .find_results(&ResultQuery::for_season(1).gender(GenderType::Male).event("50SL"))
            .unwrap();

        let ids: Vec<i64> = found.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(found[0].timing, Timing::from_hundredths(2_900));
        assert_eq!(found[0].session_date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_valid_only_and_limit() {
        let repo = SqliteResultRepository::in_memory().unwrap();
        let mut dq = create_test_result(1, 1, "50SL", "M25", GenderType::Male, PoolType::ShortCourse, 2_500);
        dq.is_disqualified = true;
        repo.insert_results(&[
            dq,
            create_test_result(2, 2, "50SL", "M25", GenderType::Male, PoolType::ShortCourse, 2_800),
            create_test_result(3, 3, "50SL", "M25", GenderType::Male, PoolType::ShortCourse, 2_700),
        ])
        .unwrap();

        let fastest = repo
            .fastest(&ResultQuery::for_season(1).valid_only())
            .unwrap()
            .unwrap();
        assert_eq!(fastest.id, 3);

        let all = repo.find_results(&ResultQuery::for_season(1)).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].is_disqualified);
    }

    #[test]
    fn test_date_range_filter() {
        let repo = create_test_repository();

        let before = repo
            .find_results(&ResultQuery::for_season(1).between(None, NaiveDate::from_ymd_opt(2024, 1, 14)))
            .unwrap();
        let including = repo
            .find_results(&ResultQuery::for_season(1).between(None, NaiveDate::from_ymd_opt(2024, 1, 15)))
            .unwrap();

        assert!(before.is_empty());
        assert_eq!(including.len(), 4);
    }

    #[test]
    fn test_seasons_round_trip() {
        let repo = create_test_repository();
        repo.insert_season(&create_test_season(2, 2022)).unwrap();

        let seasons = repo.seasons().unwrap();
        assert_eq!(seasons.len(), 2);
        assert_eq!(seasons[0].id, 2);
        assert_eq!(repo.season(1).unwrap().description, "2023/2024");
        assert!(repo.season(9).is_err());
    }

    #[test]
    fn test_load_csv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "Result_Id,Swimmer_Id,Meeting_Id,Session_Date,Season_Id,Event,Category,Gender,Pool,Rank,Disqualified,Timing,Event_Points"
        )
        .unwrap();
        writeln!(file, "1,10,5,2024-02-03,1,50sl,M30,M,25,1,false,29.85,12.5").unwrap();
        writeln!(file, "2,11,5,2024-02-03,1,100DO,M30,F,50,,true,1:10.00,0").unwrap();

        let results = load_csv(file.path()).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].event_code, "50SL");
        assert_eq!(results[0].timing, Timing::from_hundredths(2_985));
        assert_eq!(results[0].rank, Some(1));
        assert_eq!(results[1].pool, PoolType::LongCourse);
        assert_eq!(results[1].rank, None);
        assert!(results[1].is_disqualified);
        assert_eq!(results[1].timing, Timing::from_hundredths(7_000));
    }

    #[test]
    fn test_load_csv_rejects_bad_timing() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "Result_Id,Swimmer_Id,Meeting_Id,Session_Date,Season_Id,Event,Category,Gender,Pool,Rank,Disqualified,Timing,Event_Points"
        )
        .unwrap();
        writeln!(file, "1,10,5,2024-02-03,1,50SL,M30,M,25,1,false,fast,0").unwrap();

        assert!(load_csv(file.path()).is_err());
    }
}
