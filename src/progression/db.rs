//! SQLite persistence for session progress
//!
//! Stores unlocked achievements and streaks per session so a learner's
//! progress survives restarts of the API server (`~/.howtobase/progress.db`).

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension};
use tracing::warn;

use super::definitions::AchievementId;
use super::store::ProgressionStore;
use super::streaks::Streak;

const DAY_FORMAT: &str = "%Y-%m-%d";

/// Shared handle to the progress database
#[derive(Clone)]
pub struct ProgressDb {
    conn: Arc<Mutex<Connection>>,
}

impl ProgressDb {
    /// Open or create the progress database at a specific path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data dir: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open progress db: {}", path.display()))?;

        // WAL lets the CLI read while the server writes
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Self::from_connection(conn)
    }

    /// In-memory database (nothing survives the process)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory progress db")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Progress DB lock poisoned"))
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA_SQL)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
            [SCHEMA_VERSION],
        )?;
        Ok(())
    }

    /// Persist an unlock. Returns false if it was already stored.
    pub fn record_unlock(
        &self,
        session_id: &str,
        id: AchievementId,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO unlocked_achievements (session_id, achievement_id, unlocked_at)
             VALUES (?1, ?2, ?3)",
            (session_id, id.as_str(), at.timestamp_millis()),
        )?;
        Ok(inserted > 0)
    }

    /// When `id` was stored as unlocked for the session, if it was
    pub fn unlocked_at(&self, session_id: &str, id: AchievementId) -> Result<Option<DateTime<Utc>>> {
        let conn = self.conn()?;
        let ms: Option<i64> = conn
            .query_row(
                "SELECT unlocked_at FROM unlocked_achievements
                 WHERE session_id = ?1 AND achievement_id = ?2",
                (session_id, id.as_str()),
                |r| r.get(0),
            )
            .optional()?;
        Ok(ms.and_then(DateTime::<Utc>::from_timestamp_millis))
    }

    /// Stored unlocks for a session, oldest first
    pub fn load_unlocks(&self, session_id: &str) -> Result<Vec<(String, DateTime<Utc>)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT achievement_id, unlocked_at FROM unlocked_achievements
             WHERE session_id = ?1 ORDER BY unlocked_at, rowid",
        )?;
        let rows = stmt.query_map([session_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut unlocks = Vec::new();
        for row in rows {
            let (id, ms) = row?;
            match DateTime::<Utc>::from_timestamp_millis(ms) {
                Some(at) => unlocks.push((id, at)),
                None => warn!("[howtobase:db] Bad unlock timestamp {} for {}", ms, id),
            }
        }
        Ok(unlocks)
    }

    pub fn save_streak(&self, session_id: &str, streak: &Streak) -> Result<()> {
        let day = streak
            .last_active_day
            .map(|d| d.format(DAY_FORMAT).to_string());
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO session_streaks (session_id, current_count, best_count, last_activity_day)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(session_id) DO UPDATE SET
                current_count = ?2, best_count = ?3, last_activity_day = ?4
            "#,
            (session_id, streak.current, streak.longest, day),
        )?;
        Ok(())
    }

    pub fn load_streak(&self, session_id: &str) -> Result<Option<Streak>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT current_count, best_count, last_activity_day FROM session_streaks
                 WHERE session_id = ?1",
                [session_id],
                |r| {
                    Ok((
                        r.get::<_, u32>(0)?,
                        r.get::<_, u32>(1)?,
                        r.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.map(|(current, longest, day)| Streak {
            current,
            longest,
            last_active_day: day.and_then(|d| NaiveDate::parse_from_str(&d, DAY_FORMAT).ok()),
        }))
    }

    /// Rebuild a session's store by replaying its stored unlocks
    pub fn load_store(&self, session_id: &str) -> Result<ProgressionStore> {
        let mut store = ProgressionStore::new();

        for (id, at) in self.load_unlocks(session_id)? {
            if store.complete_achievement_at(&id, at).is_none() {
                warn!(
                    "[howtobase:db] Skipping stored achievement {:?} for session {}",
                    id, session_id
                );
            }
        }

        if let Some(streak) = self.load_streak(session_id)? {
            store.restore_streak(streak);
        }

        Ok(store)
    }

    /// Delete all progress for a session
    pub fn reset_session(&self, session_id: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM unlocked_achievements WHERE session_id = ?1",
            [session_id],
        )?;
        conn.execute(
            "DELETE FROM session_streaks WHERE session_id = ?1",
            [session_id],
        )?;
        Ok(())
    }
}

/// Current schema version
const SCHEMA_VERSION: i64 = 1;

/// SQL schema for the progress database
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- One row per (session, achievement); the primary key enforces at-most-once
CREATE TABLE IF NOT EXISTS unlocked_achievements (
    session_id TEXT NOT NULL,
    achievement_id TEXT NOT NULL,
    unlocked_at INTEGER NOT NULL,
    PRIMARY KEY (session_id, achievement_id)
);
CREATE INDEX IF NOT EXISTS idx_unlocked_session ON unlocked_achievements(session_id);

CREATE TABLE IF NOT EXISTS session_streaks (
    session_id TEXT PRIMARY KEY,
    current_count INTEGER NOT NULL DEFAULT 0,
    best_count INTEGER NOT NULL DEFAULT 0,
    last_activity_day TEXT
);
"#;
