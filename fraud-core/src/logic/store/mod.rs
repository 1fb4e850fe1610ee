//! Store Module - Append-only prediction log (SQLite)
//!
//! Every operation opens its own short-lived connection, so a
//! `PredictionStore` is just a path and can be shared across threads.

pub mod record;


use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use thiserror::Error;

pub use record::{NewPrediction, PredictionRecord, PredictionSummary};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to prepare database directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode input data: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct PredictionStore {
    path: PathBuf,
}

impl PredictionStore {
    /// Point at a database file, creating its directory if needed
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Create the schema. Safe to call on every startup.
    pub fn init(&self) -> Result<(), StoreError> {
        let conn = self.connect()?;
        let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        log::debug!("journal_mode={}", mode);
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS predictions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                input_data TEXT NOT NULL,
                prediction_score REAL NOT NULL,
                is_fraud INTEGER NOT NULL,
                latency_ms REAL NOT NULL
            );
            "#,
        )?;

        log::info!("Prediction store ready at {}", self.path.display());
        Ok(())
    }

    /// Append one record; committed whole or not at all
    pub fn insert(&self, prediction: &NewPrediction) -> Result<i64, StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO predictions (timestamp, input_data, prediction_score, is_fraud, latency_ms)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                prediction.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
                prediction.input_data,
                prediction.prediction_score,
                prediction.is_fraud as i64,
                prediction.latency_ms,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        log::debug!("Stored prediction {}", id);
        Ok(id)
    }

    /// Most recent records, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<PredictionRecord>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, input_data, prediction_score, is_fraud, latency_ms
             FROM predictions ORDER BY id DESC LIMIT ?1",
        )?;

        let records = stmt
            .query_map(params![limit as i64], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// KPIs over the most recent `limit` records
    pub fn summary(&self, limit: usize) -> Result<PredictionSummary, StoreError> {
        let conn = self.connect()?;
        let summary = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(is_fraud), 0), COALESCE(AVG(latency_ms), 0.0),
                    COALESCE(MAX(latency_ms), 0.0), COALESCE(AVG(prediction_score), 0.0)
             FROM (SELECT is_fraud, latency_ms, prediction_score
                   FROM predictions ORDER BY id DESC LIMIT ?1)",
            params![limit as i64],
            |row| {
                Ok(PredictionSummary::from_window(
                    row.get::<_, i64>(0)? as u64,
                    row.get::<_, i64>(1)? as u64,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            },
        )?;

        Ok(summary)
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM predictions", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<PredictionRecord> {
    let raw: String = row.get(1)?;
    let timestamp = DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

    Ok(PredictionRecord {
        id: row.get(0)?,
        timestamp,
        input_data: row.get(2)?,
        prediction_score: row.get(3)?,
        is_fraud: row.get::<_, i64>(4)? != 0,
        latency_ms: row.get(5)?,
    })
}
