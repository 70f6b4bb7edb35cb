//! SQLite database setup and connection management for the feedback store
//! Handles database initialization, schema creation, and transactions.

use anyhow::Result;
use rusqlite::{Connection, Transaction};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::repository::{
    DbConn, EditPatternRepository, FeedbackEventRepository, GenerationStatsRepository,
    QualityMetricRepository, UserPreferenceRepository, lock_conn,
};

const SCHEMA_VERSION: i32 = 1;

/// Database wrapper that manages the SQLite connection
pub struct Database {
    conn: DbConn,
    path: Option<PathBuf>,
}

impl Database {
    /// Create an in-memory database (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        };
        db.init()?;
        Ok(db)
    }

    /// Create or open the database at a specific path
    pub fn open_at(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path),
        };
        db.init()?;
        log::info!("Feedback database initialized at {}", db.display_path());
        Ok(db)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Path for reporting; in-memory databases report `:memory:`.
    pub fn display_path(&self) -> String {
        self.path()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| ":memory:".to_string())
    }

    /// Initialize database schema
    fn init(&self) -> Result<()> {
        let conn = lock_conn(&self.conn)?;

        let existing_version: i32 =
            conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        if existing_version > SCHEMA_VERSION {
            anyhow::bail!(
                "database schema version {existing_version} is newer than supported \
                 version {SCHEMA_VERSION}"
            );
        }

        Self::create_schema(&conn)?;
        if existing_version < SCHEMA_VERSION {
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }

        Ok(())
    }

    /// Get a reference to the connection
    pub fn connection(&self) -> DbConn {
        self.conn.clone()
    }

    /// Run `f` inside a single SQLite transaction; any error rolls it back.
    pub fn transaction<T, E>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<rusqlite::Error> + From<anyhow::Error>,
    {
        let mut conn = lock_conn(&self.conn)?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    pub fn event_repo(&self) -> FeedbackEventRepository {
        FeedbackEventRepository::new(self.connection())
    }

    pub fn stats_repo(&self) -> GenerationStatsRepository {
        GenerationStatsRepository::new(self.connection())
    }

    pub fn quality_repo(&self) -> QualityMetricRepository {
        QualityMetricRepository::new(self.connection())
    }

    pub fn pattern_repo(&self) -> EditPatternRepository {
        EditPatternRepository::new(self.connection())
    }

    pub fn preference_repo(&self) -> UserPreferenceRepository {
        UserPreferenceRepository::new(self.connection())
    }

    fn create_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS feedback_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                content_type TEXT NOT NULL CHECK (length(content_type) > 0),
                content_text TEXT NOT NULL,
                user_action TEXT NOT NULL CHECK (user_action IN ('accept','edit','reject')),
                original_prompt TEXT,
                generation_time REAL,
                content_hash TEXT NOT NULL,
                metadata TEXT
            );

            CREATE TABLE IF NOT EXISTS generation_stats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content_type TEXT NOT NULL UNIQUE,
                total_generated INTEGER NOT NULL DEFAULT 0,
                total_accepted INTEGER NOT NULL DEFAULT 0,
                total_rejected INTEGER NOT NULL DEFAULT 0,
                total_edited INTEGER NOT NULL DEFAULT 0,
                avg_generation_time REAL NOT NULL DEFAULT 0.0,
                last_updated TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS edit_patterns (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content_type TEXT NOT NULL,
                edit_type TEXT NOT NULL,
                description TEXT NOT NULL,
                frequency INTEGER NOT NULL DEFAULT 1,
                examples TEXT NOT NULL DEFAULT '[]',
                last_seen TEXT NOT NULL,
                UNIQUE(content_type, edit_type, description)
            );

            CREATE TABLE IF NOT EXISTS quality_metrics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                feedback_id INTEGER NOT NULL,
                content_type TEXT NOT NULL,
                user_action TEXT NOT NULL,
                readability_score REAL NOT NULL,
                complexity_score REAL NOT NULL,
                length_chars INTEGER NOT NULL,
                length_words INTEGER NOT NULL,
                timestamp TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS user_preferences (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content_type TEXT NOT NULL,
                preference_type TEXT NOT NULL,
                preference_value TEXT NOT NULL,
                confidence_score REAL NOT NULL,
                last_updated TEXT NOT NULL,
                UNIQUE(content_type, preference_type)
            );

            CREATE INDEX IF NOT EXISTS idx_feedback_timestamp ON feedback_history(timestamp);
            CREATE INDEX IF NOT EXISTS idx_feedback_content_type ON feedback_history(content_type);
            CREATE INDEX IF NOT EXISTS idx_feedback_action ON feedback_history(user_action);
            CREATE INDEX IF NOT EXISTS idx_edit_patterns_type ON edit_patterns(content_type);
            CREATE INDEX IF NOT EXISTS idx_quality_metrics_type ON quality_metrics(content_type);
            CREATE INDEX IF NOT EXISTS idx_user_preferences_type ON user_preferences(content_type);
            "#,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(conn: &Connection, kind: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = ?1")
            .unwrap();
        stmt.query_map([kind], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<String>, _>>()
            .unwrap()
    }

    #[test]
    fn test_database_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.display_path(), ":memory:");
        let conn = db.connection();
        let guard = conn.lock().unwrap();
        let res: i32 = guard.query_row("SELECT 1", [], |row| row.get(0)).unwrap();
        assert_eq!(res, 1);
    }

    #[test]
    fn test_schema_creates_tables_and_indexes() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        let guard = conn.lock().unwrap();

        let tables = names(&guard, "table");
        for table in [
            "feedback_history",
            "generation_stats",
            "edit_patterns",
            "quality_metrics",
            "user_preferences",
        ] {
            assert!(tables.iter().any(|t| t == table), "missing table {table}");
        }

        let indexes = names(&guard, "index");
        for index in [
            "idx_feedback_timestamp",
            "idx_feedback_content_type",
            "idx_feedback_action",
            "idx_edit_patterns_type",
            "idx_quality_metrics_type",
            "idx_user_preferences_type",
        ] {
            assert!(indexes.iter().any(|i| i == index), "missing index {index}");
        }

        let version: i32 = guard
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_newer_schema_is_refused() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        };
        assert!(db.init().is_err());
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();
        let result: Result<()> = db.transaction(|tx| {
            tx.execute(
                "INSERT INTO generation_stats (content_type, last_updated) VALUES ('x', 'now')",
                [],
            )?;
            anyhow::bail!("boom")
        });
        assert!(result.is_err());

        let count = db.stats_repo().count().unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_open_at_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("memory.sqlite");
        let db = Database::open_at(&path).unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), Some(path.as_path()));
    }
}
