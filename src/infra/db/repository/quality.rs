use super::{DbConn, Repository, lock_conn};
use crate::domain::{
    ActionQuality, FeedbackId, QualityByAction, QualityMetricSample, TextMetrics, UserAction,
};
use anyhow::{Context, Result};
use rusqlite::{Connection, Row, params};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Repository for per-event `quality_metrics` samples.
pub struct QualityMetricRepository {
    conn: DbConn,
}

impl Repository for QualityMetricRepository {}

impl QualityMetricRepository {
    pub fn new(conn: DbConn) -> Self {
        Self { conn }
    }

    pub fn insert(
        conn: &Connection,
        feedback_id: FeedbackId,
        content_type: &str,
        action: UserAction,
        metrics: &TextMetrics,
        timestamp: &str,
    ) -> Result<i64> {
        conn.execute(
            r#"
            INSERT INTO quality_metrics (
                feedback_id, content_type, user_action, readability_score,
                complexity_score, length_chars, length_words, timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                feedback_id,
                content_type,
                action.as_str(),
                metrics.readability,
                metrics.complexity,
                metrics.char_length as i64,
                metrics.word_count as i64,
                timestamp
            ],
        )
        .context("insert quality metrics")?;
        Ok(conn.last_insert_rowid())
    }

    /// Per-action averages for one content type.
    pub fn analysis(&self, content_type: &str) -> Result<QualityByAction> {
        let conn = lock_conn(&self.conn)?;
        let mut stmt = conn.prepare(
            r#"
            SELECT content_type, user_action, AVG(readability_score), AVG(complexity_score),
                   AVG(length_words), AVG(length_chars), COUNT(*)
            FROM quality_metrics
            WHERE content_type = ?1
            GROUP BY user_action
            "#,
        )?;
        let rows = stmt.query_map([content_type], Self::row_to_quality)?;

        let mut analysis = QualityByAction::new();
        for row in rows {
            let (_, action, quality) = row?;
            analysis.insert(action, quality);
        }
        Ok(analysis)
    }

    /// Per-action averages for every content type.
    pub fn analysis_all(&self) -> Result<BTreeMap<String, QualityByAction>> {
        let conn = lock_conn(&self.conn)?;
        let mut stmt = conn.prepare(
            r#"
            SELECT content_type, user_action, AVG(readability_score), AVG(complexity_score),
                   AVG(length_words), AVG(length_chars), COUNT(*)
            FROM quality_metrics
            GROUP BY content_type, user_action
            "#,
        )?;
        let rows = stmt.query_map([], Self::row_to_quality)?;

        let mut analysis: BTreeMap<String, QualityByAction> = BTreeMap::new();
        for row in rows {
            let (content_type, action, quality) = row?;
            analysis
                .entry(content_type)
                .or_default()
                .insert(action, quality);
        }
        Ok(analysis)
    }

    /// Most recent samples first, optionally restricted to one content type.
    pub fn list_samples(
        &self,
        content_type: Option<&str>,
        limit: usize,
    ) -> Result<Vec<QualityMetricSample>> {
        let conn = lock_conn(&self.conn)?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, feedback_id, content_type, user_action, readability_score,
                   complexity_score, length_chars, length_words, timestamp
            FROM quality_metrics
            WHERE (?1 IS NULL OR content_type = ?1)
            ORDER BY timestamp DESC, id DESC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt.query_map(params![content_type, limit as i64], |row| {
            let action: String = row.get(3)?;
            let user_action = UserAction::from_str(&action).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, e.into())
            })?;
            Ok(QualityMetricSample {
                id: row.get(0)?,
                feedback_id: row.get(1)?,
                content_type: row.get(2)?,
                user_action,
                readability_score: row.get(4)?,
                complexity_score: row.get(5)?,
                length_chars: row.get(6)?,
                length_words: row.get(7)?,
                timestamp: row.get(8)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = lock_conn(&self.conn)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM quality_metrics",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn row_to_quality(row: &Row<'_>) -> rusqlite::Result<(String, UserAction, ActionQuality)> {
        let action: String = row.get(1)?;
        let action = UserAction::from_str(&action).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, e.into())
        })?;
        Ok((
            row.get(0)?,
            action,
            ActionQuality {
                avg_readability: row.get(2)?,
                avg_complexity: row.get(3)?,
                avg_length: row.get(4)?,
                avg_char_length: row.get(5)?,
                sample_count: row.get(6)?,
            },
        ))
    }
}
