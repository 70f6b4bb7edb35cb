use super::{DbConn, Repository, lock_conn};
use crate::domain::{EditPattern, EditType, PatternObservation, merge_examples};
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::str::FromStr;

/// Repository for mined `edit_patterns`, unique per (content type, edit type, description).
pub struct EditPatternRepository {
    conn: DbConn,
}

impl Repository for EditPatternRepository {}

const SELECT_PATTERN: &str = r#"
    SELECT id, content_type, edit_type, description, frequency, examples, last_seen
    FROM edit_patterns
"#;

impl EditPatternRepository {
    pub fn new(conn: DbConn) -> Self {
        Self { conn }
    }

    pub fn find_by_key(
        conn: &Connection,
        content_type: &str,
        edit_type: EditType,
        description: &str,
    ) -> Result<Option<EditPattern>> {
        let sql = format!(
            "{SELECT_PATTERN} WHERE content_type = ?1 AND edit_type = ?2 AND description = ?3"
        );
        let pattern = conn
            .query_row(
                &sql,
                params![content_type, edit_type.to_string(), description],
                Self::row_to_pattern,
            )
            .optional()?;
        Ok(pattern)
    }

    /// Record one observation: a repeat bumps frequency, merges examples and
    /// refreshes `last_seen`; a first sighting inserts at frequency 1.
    pub fn record_observation(
        conn: &Connection,
        content_type: &str,
        observation: &PatternObservation,
        max_examples: usize,
        now: &str,
    ) -> Result<EditPattern> {
        let existing = Self::find_by_key(
            conn,
            content_type,
            observation.edit_type,
            &observation.description,
        )?;

        match existing {
            Some(mut pattern) => {
                pattern.frequency += 1;
                pattern.examples =
                    merge_examples(&pattern.examples, &observation.examples, max_examples);
                pattern.last_seen = now.to_string();

                conn.execute(
                    r#"
                    UPDATE edit_patterns
                    SET frequency = ?2, examples = ?3, last_seen = ?4
                    WHERE id = ?1
                    "#,
                    params![
                        pattern.id,
                        pattern.frequency,
                        serde_json::to_string(&pattern.examples)?,
                        pattern.last_seen
                    ],
                )
                .context("update edit pattern")?;
                Ok(pattern)
            }
            None => {
                let examples = merge_examples(&[], &observation.examples, max_examples);
                conn.execute(
                    r#"
                    INSERT INTO edit_patterns (
                        content_type, edit_type, description, frequency, examples, last_seen
                    ) VALUES (?1, ?2, ?3, 1, ?4, ?5)
                    "#,
                    params![
                        content_type,
                        observation.edit_type.to_string(),
                        observation.description,
                        serde_json::to_string(&examples)?,
                        now
                    ],
                )
                .context("insert edit pattern")?;

                Ok(EditPattern {
                    id: conn.last_insert_rowid(),
                    content_type: content_type.to_string(),
                    edit_type: observation.edit_type,
                    description: observation.description.clone(),
                    frequency: 1,
                    examples,
                    last_seen: now.to_string(),
                })
            }
        }
    }

    /// Patterns at or above `min_frequency`, most frequent first.
    pub fn list(&self, content_type: Option<&str>, min_frequency: i64) -> Result<Vec<EditPattern>> {
        let conn = lock_conn(&self.conn)?;
        let sql = format!(
            "{SELECT_PATTERN} WHERE (?1 IS NULL OR content_type = ?1) AND frequency >= ?2 \
             ORDER BY frequency DESC, last_seen DESC, id ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![content_type, min_frequency], Self::row_to_pattern)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = lock_conn(&self.conn)?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM edit_patterns", [], |row| row.get(0))?;
        Ok(count)
    }

    fn row_to_pattern(row: &Row<'_>) -> rusqlite::Result<EditPattern> {
        let edit_type: String = row.get(2)?;
        let edit_type = EditType::from_str(&edit_type).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, e.into())
        })?;
        let examples: String = row.get(5)?;
        let examples: Vec<String> = serde_json::from_str(&examples).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, e.into())
        })?;

        Ok(EditPattern {
            id: row.get(0)?,
            content_type: row.get(1)?,
            edit_type,
            description: row.get(3)?,
            frequency: row.get(4)?,
            examples,
            last_seen: row.get(6)?,
        })
    }
}
