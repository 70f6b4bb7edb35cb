//! Repository implementations for data access in the feedback store.
//!
//! Read operations lock the shared connection themselves. Write operations
//! take a `&Connection` so the store can run them inside one transaction
//! (a `rusqlite::Transaction` derefs to a `Connection`).

mod edit_pattern;
mod event;
mod preference;
mod quality;
mod stats;

pub use edit_pattern::EditPatternRepository;
pub use event::FeedbackEventRepository;
pub use preference::UserPreferenceRepository;
pub use quality::QualityMetricRepository;
pub use stats::GenerationStatsRepository;

use anyhow::{Result, anyhow};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};

pub type DbConn = Arc<Mutex<Connection>>;

/// Acquire the shared connection, turning a poisoned lock into an error.
pub(crate) fn lock_conn(conn: &DbConn) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| anyhow!("database connection lock poisoned"))
}

/// Marker trait for repository types.
///
/// Documents that a type follows the common repository pattern of being
/// constructed with a `DbConn`.
pub trait Repository {}
