//! SQLite-backed usage store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{Plan, UsageError, UsageRecord, UsageStore, UserAccount};
use crate::db;

/// SQLite-backed usage store.
///
/// Reads the `users` table (owned by the account side of the product) and
/// owns the `usage` table.
pub struct SqliteUsageStore {
    conn: Mutex<Connection>,
}

impl SqliteUsageStore {
    /// Create a new SQLite usage store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, UsageError> {
        let conn = db::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite usage store (useful for testing).
    pub fn in_memory() -> Result<Self, UsageError> {
        let conn = db::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), UsageError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                plan TEXT NOT NULL DEFAULT 'free',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS usage (
                user_id TEXT PRIMARY KEY,
                monthly_usage REAL NOT NULL DEFAULT 0,
                total_usage REAL NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, UsageError> {
        self.conn
            .lock()
            .map_err(|_| UsageError::Database("connection mutex poisoned".to_string()))
    }

    /// Insert or update a user account.
    ///
    /// Accounts are normally written by the account service; this exists for
    /// seeding and tests.
    pub fn upsert_user(&self, user_id: &str, plan: Plan) -> Result<(), UsageError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO users (id, plan, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET plan = excluded.plan",
            params![user_id, plan.as_str(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

impl UsageStore for SqliteUsageStore {
    fn find_user(&self, user_id: &str) -> Result<Option<UserAccount>, UsageError> {
        let conn = self.lock()?;

        let plan: Option<String> = conn
            .query_row(
                "SELECT plan FROM users WHERE id = ?",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;

        plan.map(|p| {
            let plan = p.parse::<Plan>().map_err(|reason| UsageError::InvalidPlan {
                user_id: user_id.to_string(),
                reason,
            })?;
            Ok(UserAccount {
                id: user_id.to_string(),
                plan,
            })
        })
        .transpose()
    }

    fn find_usage(&self, user_id: &str) -> Result<Option<UsageRecord>, UsageError> {
        let conn = self.lock()?;

        let record = conn
            .query_row(
                "SELECT user_id, monthly_usage, total_usage, updated_at FROM usage WHERE user_id = ?",
                params![user_id],
                |row| {
                    let updated_at: String = row.get(3)?;
                    Ok(UsageRecord {
                        user_id: row.get(0)?,
                        monthly_usage: row.get(1)?,
                        total_usage: row.get(2)?,
                        updated_at: DateTime::parse_from_rfc3339(&updated_at)
                            .map(|dt| dt.with_timezone(&Utc))
                            .unwrap_or_else(|_| Utc::now()),
                    })
                },
            )
            .optional()?;

        Ok(record)
    }

    fn increment_usage(&self, user_id: &str, seconds: f64) -> Result<(), UsageError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO usage (user_id, monthly_usage, total_usage, updated_at) VALUES (?1, ?2, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                monthly_usage = monthly_usage + excluded.monthly_usage,
                total_usage = total_usage + excluded.total_usage,
                updated_at = excluded.updated_at",
            params![user_id, seconds, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}
