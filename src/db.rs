// Storage Gateway - SQLite connection, schema bootstrap and parameterized statements

use crate::error::{ExpenseError, Result};
use rusqlite::{Connection, Params, Row};
use std::path::Path;
use tracing::{debug, info};

/// Single process-wide database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database file and make sure the schema exists.
    /// Any failure here is a `Connection` error.
    pub fn initialize(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ExpenseError::Connection(format!("cannot create {}: {}", parent.display(), e))
                })?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| ExpenseError::Connection(format!("{}: {}", path.display(), e)))?;

        // WAL for crash recovery, in-memory databases ignore it
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| ExpenseError::Connection(e.to_string()))?;

        setup_database(&conn).map_err(|e| ExpenseError::Connection(e.to_string()))?;

        info!(path = %path.display(), "database ready");
        Ok(Self { conn })
    }

    /// Fresh in-memory database with the schema applied
    pub fn initialize_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| ExpenseError::Connection(e.to_string()))?;
        setup_database(&conn).map_err(|e| ExpenseError::Connection(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Run a parameterized statement, returns the number of affected rows.
    /// Each call commits on its own.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        debug!(sql, "execute");
        Ok(self.conn.execute(sql, params)?)
    }

    /// Run a parameterized query and map every row
    pub fn query<T, P, F>(&self, sql: &str, params: P, map: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        debug!(sql, "query");
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, map)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Id assigned by the most recent successful insert
    pub fn last_insert_rowid(&self) -> i64 {
        self.conn.last_insert_rowid()
    }
}

pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    // ==========================================================================
    // Expenses Table
    // AUTOINCREMENT keeps deleted ids from ever being handed out again
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            category TEXT NOT NULL,
            amount REAL NOT NULL,
            date DATE NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date)",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    #[test]
    fn test_setup_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        setup_database(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'expenses'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_execute_binds_parameters() {
        let db = Database::initialize_in_memory().unwrap();

        // A hostile category is stored as plain text
        let hostile = "Food'); DROP TABLE expenses; --";
        let affected = db
            .execute(
                "INSERT INTO expenses (category, amount, date) VALUES (?1, ?2, ?3)",
                params![hostile, 4.0, "2024-01-01"],
            )
            .unwrap();
        assert_eq!(affected, 1);

        let categories: Vec<String> = db
            .query("SELECT category FROM expenses", [], |row| row.get(0))
            .unwrap();
        assert_eq!(categories, vec![hostile.to_string()]);

        println!("✅ Parameter binding test PASSED");
    }

    #[test]
    fn test_initialize_creates_file_and_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("expenses.db");

        let db = Database::initialize(&path).unwrap();
        db.execute(
            "INSERT INTO expenses (category, amount, date) VALUES (?1, ?2, ?3)",
            params!["Rent", 900.0, "2024-02-01"],
        )
        .unwrap();
        drop(db);

        // Reopening sees the committed row
        let db = Database::initialize(&path).unwrap();
        let amounts: Vec<f64> = db
            .query("SELECT amount FROM expenses", [], |row| row.get(0))
            .unwrap();
        assert_eq!(amounts, vec![900.0]);
    }

    #[test]
    fn test_initialize_fails_with_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a database file
        let result = Database::initialize(dir.path());
        assert!(matches!(result, Err(ExpenseError::Connection(_))));
    }
}
