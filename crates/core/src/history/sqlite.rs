//! SQLite-backed history store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use super::{HistoryError, HistoryRecord, HistoryStatus, HistoryStore};
use crate::db;

pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    /// Create a new SQLite history store, creating the database file and table if needed.
    pub fn new(path: &Path) -> Result<Self, HistoryError> {
        let conn = db::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite history store (useful for testing).
    pub fn in_memory() -> Result<Self, HistoryError> {
        let conn = db::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), HistoryError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                file_id TEXT NOT NULL,
                file_name TEXT NOT NULL,
                duration_secs REAL NOT NULL,
                artifact_location TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (user_id, file_id)
            );

            CREATE INDEX IF NOT EXISTS idx_history_user_created
                ON history(user_id, created_at DESC);
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, HistoryError> {
        self.conn
            .lock()
            .map_err(|_| HistoryError::Database("connection mutex poisoned".to_string()))
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<HistoryRecord> {
        let status: String = row.get(5)?;
        let created_at: String = row.get(6)?;

        Ok(HistoryRecord {
            user_id: row.get(0)?,
            file_id: row.get(1)?,
            file_name: row.get(2)?,
            duration_secs: row.get(3)?,
            artifact_location: row.get(4)?,
            status: status.parse().unwrap_or(HistoryStatus::Completed),
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

const SELECT_COLUMNS: &str =
    "SELECT user_id, file_id, file_name, duration_secs, artifact_location, status, created_at FROM history";

impl HistoryStore for SqliteHistoryStore {
    fn append(&self, record: &HistoryRecord) -> Result<(), HistoryError> {
        let conn = self.lock()?;
        let result = conn.execute(
            "INSERT INTO history (user_id, file_id, file_name, duration_secs, artifact_location, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.user_id,
                record.file_id,
                record.file_name,
                record.duration_secs,
                record.artifact_location,
                record.status.as_str(),
                record.created_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(HistoryError::Duplicate {
                    user_id: record.user_id.clone(),
                    file_id: record.file_id.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn find(&self, user_id: &str, file_id: &str) -> Result<Option<HistoryRecord>, HistoryError> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                &format!("{} WHERE user_id = ?1 AND file_id = ?2", SELECT_COLUMNS),
                params![user_id, file_id],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn list_for_user(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<HistoryRecord>, HistoryError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE user_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
            SELECT_COLUMNS
        ))?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let records = stmt
            .query_map(
                params![user_id, limit, offset],
                Self::row_to_record,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn count_for_user(&self, user_id: &str) -> Result<u64, HistoryError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM history WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
