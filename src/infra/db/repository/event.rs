use super::{DbConn, Repository, lock_conn};
use crate::domain::{FeedbackEvent, FeedbackId, FeedbackMetadata, NewFeedback, UserAction};
use anyhow::{Context, Result};
use rusqlite::{Connection, Row, params};
use std::str::FromStr;

/// Repository for the append-only `feedback_history` table.
pub struct FeedbackEventRepository {
    conn: DbConn,
}

impl Repository for FeedbackEventRepository {}

impl FeedbackEventRepository {
    pub fn new(conn: DbConn) -> Self {
        Self { conn }
    }

    /// Insert one event and return its identifier.
    pub fn insert(
        conn: &Connection,
        feedback: &NewFeedback,
        timestamp: &str,
        content_hash: &str,
    ) -> Result<FeedbackId> {
        let metadata = if feedback.metadata.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&feedback.metadata).context("encode metadata")?)
        };

        conn.execute(
            r#"
            INSERT INTO feedback_history (
                timestamp, content_type, content_text, user_action,
                original_prompt, generation_time, content_hash, metadata
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                timestamp,
                feedback.content_type,
                feedback.content_text,
                feedback.user_action.as_str(),
                feedback.original_prompt,
                feedback.generation_time,
                content_hash,
                metadata
            ],
        )
        .context("insert feedback event")?;

        Ok(conn.last_insert_rowid())
    }

    /// Delete the oldest events so that at most `max_records` remain.
    ///
    /// Returns the number of removed rows.
    pub fn enforce_limit(conn: &Connection, max_records: usize) -> Result<usize> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM feedback_history",
            [],
            |row| row.get(0),
        )?;
        let excess = count - max_records as i64;
        if excess <= 0 {
            return Ok(0);
        }

        let removed = conn
            .execute(
                r#"
                DELETE FROM feedback_history
                WHERE id IN (
                    SELECT id FROM feedback_history
                    ORDER BY timestamp ASC, id ASC
                    LIMIT ?1
                )
                "#,
                [excess],
            )
            .context("prune feedback history")?;
        Ok(removed)
    }

    /// Most recent events first, optionally restricted to one content type.
    pub fn list_recent(
        &self,
        content_type: Option<&str>,
        limit: usize,
    ) -> Result<Vec<FeedbackEvent>> {
        let conn = lock_conn(&self.conn)?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, timestamp, content_type, content_text, user_action,
                   original_prompt, generation_time, content_hash, metadata
            FROM feedback_history
            WHERE (?1 IS NULL OR content_type = ?1)
            ORDER BY timestamp DESC, id DESC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt.query_map(params![content_type, limit as i64], Self::row_to_event)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Outcome of every retained event in insertion order, for replaying aggregates.
    pub fn list_outcomes(conn: &Connection) -> Result<Vec<(String, UserAction, Option<f64>)>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT content_type, user_action, generation_time
            FROM feedback_history
            ORDER BY timestamp ASC, id ASC
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            let action: String = row.get(1)?;
            let action = UserAction::from_str(&action).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, e.into())
            })?;
            Ok((row.get(0)?, action, row.get(2)?))
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = lock_conn(&self.conn)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM feedback_history",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Earliest and latest event timestamps, `None` when the log is empty.
    pub fn date_range(&self) -> Result<(Option<String>, Option<String>)> {
        let conn = lock_conn(&self.conn)?;
        let range = conn.query_row(
            "SELECT MIN(timestamp), MAX(timestamp) FROM feedback_history",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(range)
    }

    fn row_to_event(row: &Row<'_>) -> rusqlite::Result<FeedbackEvent> {
        let action: String = row.get(4)?;
        let user_action = UserAction::from_str(&action).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
        })?;

        let metadata: Option<String> = row.get(8)?;
        let metadata = match metadata {
            Some(raw) => serde_json::from_str::<FeedbackMetadata>(&raw).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, e.into())
            })?,
            None => FeedbackMetadata::default(),
        };

        Ok(FeedbackEvent {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            content_type: row.get(2)?,
            content_text: row.get(3)?,
            user_action,
            original_prompt: row.get(5)?,
            generation_time: row.get(6)?,
            content_hash: row.get(7)?,
            metadata,
        })
    }
}
