//! SQLite-based session history and application state.
//!
//! Provides persistent storage for:
//! - Finished breathing sessions
//! - Session statistics (daily and all-time)
//! - Key-value store for the active session, protocol progress,
//!   calibration result and streak

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Local, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::DatabaseError;
use crate::history::{SessionRecord, StreakState};

pub const ACTIVE_SESSION_KEY: &str = "active_session";
pub const PROTOCOL_KEY: &str = "protocol";
pub const CALIBRATION_KEY: &str = "calibration";
pub const STREAK_KEY: &str = "streak";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HistoryStats {
    pub total_sessions: u64,
    pub total_breaths: u64,
    pub total_minutes: f64,
    /// Session count keyed by protocol week.
    pub sessions_per_week: BTreeMap<u8, u64>,
}

/// SQLite database for session storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/breathwork/breathwork.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, crate::error::CoreError> {
        let path = data_dir()?.join("breathwork.db");
        Ok(Self::open_at(&path)?)
    }

    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id            TEXT PRIMARY KEY,
                kind          TEXT NOT NULL,
                week          INTEGER NOT NULL,
                breaths       INTEGER NOT NULL,
                duration_secs INTEGER NOT NULL,
                started_at    TEXT NOT NULL,
                ended_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_ended_at ON sessions(ended_at);",
        )?;
        Ok(())
    }

    /// Record a finished session.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(&self, record: &SessionRecord) -> Result<(), DatabaseError> {
        TxView(&self.conn).insert(record)
    }

    /// Record a finished session and advance the streak in one transaction.
    /// Returns the new streak.
    pub fn complete_session(&mut self, record: &SessionRecord) -> Result<u32, DatabaseError> {
        let tx = self.conn.transaction()?;
        {
            let db = TxView(&tx);
            db.insert(record)?;
            let mut streak: StreakState = db.load(STREAK_KEY)?.unwrap_or_default();
            streak.record_session(record.local_day());
            db.store(STREAK_KEY, &streak)?;
        }
        tx.commit()?;
        Ok(self.streak()?.streak)
    }

    /// Most recent sessions first.
    pub fn list_sessions(&self, limit: Option<usize>) -> Result<Vec<SessionRecord>, DatabaseError> {
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, week, breaths, duration_secs, started_at, ended_at
             FROM sessions
             ORDER BY ended_at DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], row_to_record)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    pub fn stats_all(&self) -> Result<HistoryStats, DatabaseError> {
        self.stats_since(None)
    }

    /// Sessions that ended since local midnight.
    pub fn stats_today(&self) -> Result<HistoryStats, DatabaseError> {
        let midnight = Local::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .and_then(|t| t.and_local_timezone(Local).earliest())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);
        self.stats_since(Some(midnight))
    }

    pub fn stats_since(&self, since: Option<DateTime<Utc>>) -> Result<HistoryStats, DatabaseError> {
        let since = since
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        let mut stmt = self.conn.prepare(
            "SELECT week, COUNT(*), COALESCE(SUM(breaths), 0), COALESCE(SUM(duration_secs), 0)
             FROM sessions
             WHERE ended_at >= ?1
             GROUP BY week",
        )?;
        let rows = stmt.query_map(params![since], |row| {
            Ok((
                row.get::<_, u8>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, u64>(3)?,
            ))
        })?;

        let mut stats = HistoryStats::default();
        let mut total_secs = 0u64;
        for row in rows {
            let (week, count, breaths, secs) = row?;
            stats.total_sessions += count;
            stats.total_breaths += breaths;
            total_secs += secs;
            stats.sessions_per_week.insert(week, count);
        }
        stats.total_minutes = total_secs as f64 / 60.0;
        Ok(stats)
    }

    pub fn streak(&self) -> Result<StreakState, DatabaseError> {
        Ok(self.load_json(STREAK_KEY)?.unwrap_or_default())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        TxView(&self.conn).get(key)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        TxView(&self.conn).set(key, value)
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Decode a JSON value from the kv store.
    pub fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DatabaseError> {
        TxView(&self.conn).load(key)
    }

    pub fn save_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), DatabaseError> {
        TxView(&self.conn).store(key, value)
    }
}

/// Statement helpers shared by the plain connection and transactions.
struct TxView<'a>(&'a Connection);

impl TxView<'_> {
    fn insert(&self, record: &SessionRecord) -> Result<(), DatabaseError> {
        self.0.execute(
            "INSERT INTO sessions (id, kind, week, breaths, duration_secs, started_at, ended_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id,
                record.kind.as_str(),
                record.week,
                record.breaths,
                record.duration_secs as i64,
                record.started_at.to_rfc3339(),
                record.ended_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.0.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.0.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DatabaseError> {
        match self.get(key)? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| DatabaseError::CorruptValue {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    fn store<T: Serialize>(&self, key: &str, value: &T) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(value).map_err(|e| DatabaseError::CorruptValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.set(key, &json)
    }
}

fn row_to_record(row: &Row<'_>) -> Result<SessionRecord, rusqlite::Error> {
    let kind: String = row.get(1)?;
    Ok(SessionRecord {
        id: row.get(0)?,
        kind: kind
            .parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?,
        week: row.get(2)?,
        breaths: row.get(3)?,
        duration_secs: row.get::<_, i64>(4)?.max(0) as u64,
        started_at: parse_timestamp(row, 5)?,
        ended_at: parse_timestamp(row, 6)?,
    })
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
