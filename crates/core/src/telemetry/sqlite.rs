use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{TelemetryError, TelemetryEvent, TelemetryFilter, TelemetryRecord, TelemetryStore};
use crate::db;

/// SQLite-backed telemetry store: the support-visible error record.
pub struct SqliteTelemetryStore {
    conn: Mutex<Connection>,
}

impl SqliteTelemetryStore {
    pub fn new(path: &Path) -> Result<Self, TelemetryError> {
        let conn = db::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing)
    pub fn in_memory() -> Result<Self, TelemetryError> {
        let conn = db::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TelemetryError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS telemetry_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_type TEXT NOT NULL,
                file_id TEXT,
                user_id TEXT,
                error_kind TEXT,
                data TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_telemetry_timestamp ON telemetry_events(timestamp);
            CREATE INDEX IF NOT EXISTS idx_telemetry_file_id ON telemetry_events(file_id);
            CREATE INDEX IF NOT EXISTS idx_telemetry_user_id ON telemetry_events(user_id);
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, TelemetryError> {
        self.conn
            .lock()
            .map_err(|_| TelemetryError::Database("connection mutex poisoned".to_string()))
    }

    fn build_where_clause(filter: &TelemetryFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref event_type) = filter.event_type {
            conditions.push("event_type = ?");
            params.push(Box::new(event_type.clone()));
        }

        if let Some(ref file_id) = filter.file_id {
            conditions.push("file_id = ?");
            params.push(Box::new(file_id.clone()));
        }

        if let Some(ref user_id) = filter.user_id {
            conditions.push("user_id = ?");
            params.push(Box::new(user_id.clone()));
        }

        if let Some(ref error_kind) = filter.error_kind {
            conditions.push("error_kind = ?");
            params.push(Box::new(error_kind.clone()));
        }

        if let Some(ref from) = filter.from {
            conditions.push("timestamp >= ?");
            params.push(Box::new(from.to_rfc3339()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }
}

impl TelemetryStore for SqliteTelemetryStore {
    fn insert(&self, record: &TelemetryRecord) -> Result<i64, TelemetryError> {
        let data_json = serde_json::to_string(&record.data)
            .map_err(|e| TelemetryError::Serialization(e.to_string()))?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO telemetry_events (timestamp, event_type, file_id, user_id, error_kind, data)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                record.timestamp.to_rfc3339(),
                record.event_type,
                record.file_id,
                record.user_id,
                record.error_kind,
                data_json,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn query(&self, filter: &TelemetryFilter) -> Result<Vec<TelemetryRecord>, TelemetryError> {
        let conn = self.lock()?;
        let (where_clause, mut params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT id, timestamp, event_type, file_id, user_id, error_kind, data FROM telemetry_events {}
             ORDER BY timestamp DESC, id DESC LIMIT ? OFFSET ?",
            where_clause
        );
        params.push(Box::new(filter.limit));
        params.push(Box::new(filter.offset));
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, timestamp, event_type, file_id, user_id, error_kind, data_json) = row?;

            let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&timestamp)
                .map_err(|e| TelemetryError::Database(format!("Invalid timestamp: {}", e)))?
                .into();
            let data: TelemetryEvent = serde_json::from_str(&data_json)
                .map_err(|e| TelemetryError::Serialization(e.to_string()))?;

            records.push(TelemetryRecord {
                id,
                timestamp,
                event_type,
                file_id,
                user_id,
                error_kind,
                data,
            });
        }

        Ok(records)
    }

    fn count(&self, filter: &TelemetryFilter) -> Result<i64, TelemetryError> {
        let conn = self.lock()?;
        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM telemetry_events {}", where_clause);
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let count: i64 = conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))?;
        Ok(count)
    }
}
