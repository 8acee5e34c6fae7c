//! SQLite slot store.
//!
//! One database file, two append-only tables:
//! - `messages`: the per-user transcript
//! - `slots`: namespaced key/value records, newest-wins on read
//!
//! Timestamps are RFC 3339 UTC text with fixed microsecond precision, so
//! lexicographic comparison in SQL matches chronological order. The
//! autoincrement id breaks ties between rows written in the same tick.

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use switchboard_core::error::MemoryError;
use switchboard_core::memory::SlotStore;
use switchboard_core::transcript::{Role, TranscriptEntry};
use tracing::{debug, info};

/// A durable slot store backed by SQLite.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `url`, e.g. `sqlite://switchboard.db`
    /// or `sqlite::memory:` for tests.
    ///
    /// An in-memory database is pinned to a single pooled connection, since
    /// every new connection to `:memory:` would see its own empty database.
    pub async fn new(url: &str) -> Result<Self, MemoryError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| MemoryError::Storage(format!("Invalid SQLite URL: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let max_connections = if url.contains(":memory:") { 1 } else { 4 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite slot store initialized at {url}");
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                role    TEXT NOT NULL,
                content TEXT NOT NULL,
                ts      TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("messages table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_user_ts ON messages(user_id, ts DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("messages index: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS slots (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id   TEXT NOT NULL,
                namespace TEXT NOT NULL,
                key       TEXT NOT NULL,
                value     TEXT NOT NULL,
                ts        TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("slots table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_slots_lookup ON slots(user_id, namespace, key, ts DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("slots index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn now_text() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<TranscriptEntry, MemoryError> {
        let user_id: String = row
            .try_get("user_id")
            .map_err(|e| MemoryError::QueryFailed(format!("user_id column: {e}")))?;
        let role_str: String = row
            .try_get("role")
            .map_err(|e| MemoryError::QueryFailed(format!("role column: {e}")))?;
        let content: String = row
            .try_get("content")
            .map_err(|e| MemoryError::QueryFailed(format!("content column: {e}")))?;
        let ts_str: String = row
            .try_get("ts")
            .map_err(|e| MemoryError::QueryFailed(format!("ts column: {e}")))?;

        let role = Role::parse(&role_str)
            .ok_or_else(|| MemoryError::QueryFailed(format!("unknown role '{role_str}'")))?;
        let timestamp = DateTime::parse_from_rfc3339(&ts_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| MemoryError::QueryFailed(format!("bad timestamp '{ts_str}': {e}")))?;

        Ok(TranscriptEntry {
            user_id,
            role,
            content,
            timestamp,
        })
    }
}

#[async_trait]
impl SlotStore for SqliteStore {
    async fn append_message(
        &self,
        user_id: &str,
        role: Role,
        content: &str,
    ) -> Result<(), MemoryError> {
        sqlx::query("INSERT INTO messages (user_id, role, content, ts) VALUES (?1, ?2, ?3, ?4)")
            .bind(user_id)
            .bind(role.as_str())
            .bind(content)
            .bind(Self::now_text())
            .execute(&self.pool)
            .await
            .map_err(|e| MemoryError::Storage(format!("append_message: {e}")))?;
        Ok(())
    }

    async fn recent_messages(
        &self,
        user_id: &str,
        k: u32,
    ) -> Result<Vec<TranscriptEntry>, MemoryError> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, role, content, ts FROM messages
            WHERE user_id = ?1
            ORDER BY ts DESC, id DESC
            LIMIT ?2
            "#,
        )
        .bind(user_id)
        .bind(i64::from(k))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MemoryError::QueryFailed(format!("recent_messages: {e}")))?;

        let mut entries = rows
            .iter()
            .map(Self::row_to_entry)
            .collect::<Result<Vec<_>, _>>()?;
        entries.reverse();
        Ok(entries)
    }

    async fn set_slot(
        &self,
        user_id: &str,
        namespace: &str,
        key: &str,
        value: &str,
    ) -> Result<(), MemoryError> {
        sqlx::query(
            "INSERT INTO slots (user_id, namespace, key, value, ts) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(user_id)
        .bind(namespace)
        .bind(key)
        .bind(value)
        .bind(Self::now_text())
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::Storage(format!("set_slot: {e}")))?;
        Ok(())
    }

    async fn get_slot(
        &self,
        user_id: &str,
        namespace: &str,
        key: &str,
        max_age: Option<Duration>,
    ) -> Result<Option<String>, MemoryError> {
        // Without a freshness bound the cutoff is the empty string, which
        // every stored timestamp compares above.
        let cutoff = max_age
            .map(|age| (Utc::now() - age).to_rfc3339_opts(SecondsFormat::Micros, true))
            .unwrap_or_default();

        let row = sqlx::query(
            r#"
            SELECT value FROM slots
            WHERE user_id = ?1 AND namespace = ?2 AND key = ?3 AND ts >= ?4
            ORDER BY ts DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(namespace)
        .bind(key)
        .bind(&cutoff)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MemoryError::QueryFailed(format!("get_slot: {e}")))?;

        row.map(|r| {
            r.try_get::<String, _>("value")
                .map_err(|e| MemoryError::QueryFailed(format!("value column: {e}")))
        })
        .transpose()
    }
}
