use super::{DbConn, Repository, lock_conn};
use crate::domain::{GenerationStats, acceptance_rate};
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};

/// Repository for the per-content-type `generation_stats` aggregates.
pub struct GenerationStatsRepository {
    conn: DbConn,
}

impl Repository for GenerationStatsRepository {}

const SELECT_STATS: &str = r#"
    SELECT content_type, total_generated, total_accepted, total_rejected,
           total_edited, avg_generation_time, last_updated
    FROM generation_stats
"#;

impl GenerationStatsRepository {
    pub fn new(conn: DbConn) -> Self {
        Self { conn }
    }

    pub fn find(conn: &Connection, content_type: &str) -> Result<Option<GenerationStats>> {
        let sql = format!("{SELECT_STATS} WHERE content_type = ?1");
        let stats = conn
            .query_row(&sql, [content_type], Self::row_to_stats)
            .optional()?;
        Ok(stats)
    }

    pub fn save(conn: &Connection, stats: &GenerationStats) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO generation_stats (
                content_type, total_generated, total_accepted, total_rejected,
                total_edited, avg_generation_time, last_updated
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(content_type) DO UPDATE SET
                total_generated = excluded.total_generated,
                total_accepted = excluded.total_accepted,
                total_rejected = excluded.total_rejected,
                total_edited = excluded.total_edited,
                avg_generation_time = excluded.avg_generation_time,
                last_updated = excluded.last_updated
            "#,
            params![
                stats.content_type,
                stats.total_generated,
                stats.total_accepted,
                stats.total_rejected,
                stats.total_edited,
                stats.avg_generation_time,
                stats.last_updated
            ],
        )
        .context("save generation stats")?;
        Ok(())
    }

    /// Remove every aggregate row; used before replaying the event log.
    pub fn clear(conn: &Connection) -> Result<usize> {
        let removed = conn.execute("DELETE FROM generation_stats", [])?;
        Ok(removed)
    }

    pub fn list(&self, content_type: Option<&str>) -> Result<Vec<GenerationStats>> {
        let conn = lock_conn(&self.conn)?;
        let sql = format!(
            "{SELECT_STATS} WHERE (?1 IS NULL OR content_type = ?1) ORDER BY content_type ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([content_type], Self::row_to_stats)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = lock_conn(&self.conn)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM generation_stats",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn row_to_stats(row: &Row<'_>) -> rusqlite::Result<GenerationStats> {
        let total_generated: i64 = row.get(1)?;
        let total_accepted: i64 = row.get(2)?;
        Ok(GenerationStats {
            content_type: row.get(0)?,
            total_generated,
            total_accepted,
            total_rejected: row.get(3)?,
            total_edited: row.get(4)?,
            acceptance_rate: acceptance_rate(total_accepted, total_generated),
            avg_generation_time: row.get(5)?,
            last_updated: row.get(6)?,
        })
    }
}
