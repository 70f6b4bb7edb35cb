use rusqlite::Connection;

const TABLES: [&str; 5] = [
    "feedback_history",
    "generation_stats",
    "quality_metrics",
    "edit_patterns",
    "user_preferences",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    run()
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = content_memory::infra::app_config::load_config();
    let db_path = content_memory::infra::app_config::database_path(&config);

    if !db_path.exists() {
        println!("Database does not exist at: {}", db_path.display());
        println!("No reset needed.");
        return Ok(());
    }

    println!("Connecting to database at: {}", db_path.display());

    let conn = Connection::open(&db_path)?;

    let tables_exist: i32 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='feedback_history'",
        [],
        |row| row.get(0),
    )?;

    if tables_exist == 0 {
        println!("Tables do not exist. No reset needed.");
        return Ok(());
    }

    println!("Current record counts:");
    for table in TABLES {
        println!("  {}: {}", table, count_rows(&conn, table)?);
    }

    let tx = conn.unchecked_transaction()?;
    for table in TABLES {
        tx.execute(&format!("DELETE FROM {table}"), [])?;
        println!("Cleared {table} table");
    }
    tx.commit()?;

    println!("\nAfter reset:");
    let mut remaining = 0;
    for table in TABLES {
        let count = count_rows(&conn, table)?;
        remaining += count;
        println!("  {}: {}", table, count);
    }

    if remaining == 0 {
        println!("\nDatabase successfully reset! All records have been deleted.");
    } else {
        eprintln!("\nWarning: Some records still exist in the database.");
    }

    println!("Database location: {}", db_path.display());

    Ok(())
}

fn count_rows(conn: &Connection, table: &str) -> rusqlite::Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    conn.query_row(&sql, [], |row| row.get(0))
}
