use super::{DbConn, Repository, lock_conn};
use crate::domain::{PreferenceKind, PreferenceSignal, UserPreference, reinforced_confidence};
use crate::infra::app_config::LearningConfig;
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::str::FromStr;

/// Repository for learned `user_preferences`, unique per (content type, preference type).
pub struct UserPreferenceRepository {
    conn: DbConn,
}

impl Repository for UserPreferenceRepository {}

const SELECT_PREFERENCE: &str = r#"
    SELECT content_type, preference_type, preference_value, confidence_score, last_updated
    FROM user_preferences
"#;

impl UserPreferenceRepository {
    pub fn new(conn: DbConn) -> Self {
        Self { conn }
    }

    pub fn find(
        conn: &Connection,
        content_type: &str,
        kind: PreferenceKind,
    ) -> Result<Option<UserPreference>> {
        let sql = format!("{SELECT_PREFERENCE} WHERE content_type = ?1 AND preference_type = ?2");
        let preference = conn
            .query_row(
                &sql,
                params![content_type, kind.as_str()],
                Self::row_to_preference,
            )
            .optional()?;
        Ok(preference)
    }

    /// Apply one observation: overwrite the value and step confidence up,
    /// or create the row at the initial confidence.
    pub fn reinforce(
        conn: &Connection,
        content_type: &str,
        signal: &PreferenceSignal,
        learning: &LearningConfig,
        now: &str,
    ) -> Result<UserPreference> {
        let confidence = match Self::find(conn, content_type, signal.kind)? {
            Some(existing) => reinforced_confidence(
                existing.confidence_score,
                learning.confidence_step,
                learning.max_confidence,
            ),
            None => learning.initial_confidence.min(learning.max_confidence),
        };

        conn.execute(
            r#"
            INSERT INTO user_preferences (
                content_type, preference_type, preference_value, confidence_score, last_updated
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(content_type, preference_type) DO UPDATE SET
                preference_value = excluded.preference_value,
                confidence_score = excluded.confidence_score,
                last_updated = excluded.last_updated
            "#,
            params![
                content_type,
                signal.kind.as_str(),
                signal.value,
                confidence,
                now
            ],
        )
        .context("save user preference")?;

        Ok(UserPreference {
            content_type: content_type.to_string(),
            preference_type: signal.kind,
            preference_value: signal.value.clone(),
            confidence_score: confidence,
            last_updated: now.to_string(),
        })
    }

    /// Preferences at or above `min_confidence`, most confident first.
    pub fn list(
        &self,
        content_type: Option<&str>,
        min_confidence: f64,
    ) -> Result<Vec<UserPreference>> {
        let conn = lock_conn(&self.conn)?;
        let sql = format!(
            "{SELECT_PREFERENCE} WHERE (?1 IS NULL OR content_type = ?1) \
             AND confidence_score >= ?2 \
             ORDER BY confidence_score DESC, content_type ASC, preference_type ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![content_type, min_confidence],
            Self::row_to_preference,
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn row_to_preference(row: &Row<'_>) -> rusqlite::Result<UserPreference> {
        let kind: String = row.get(1)?;
        let preference_type = PreferenceKind::from_str(&kind).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, e.into())
        })?;
        Ok(UserPreference {
            content_type: row.get(0)?,
            preference_type,
            preference_value: row.get(2)?,
            confidence_score: row.get(3)?,
            last_updated: row.get(4)?,
        })
    }
}
