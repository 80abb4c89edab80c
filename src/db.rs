use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Connection;
use std::path::Path;
use tracing::debug;

/// Open (or create) the ledger database and make sure the schema exists
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    setup_database(&conn).context("Failed to initialize database schema")?;
    debug!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Employee contributions
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS employees (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL CHECK (length(name) > 0),
            contribution_amount INTEGER NOT NULL CHECK (contribution_amount > 0),
            status TEXT NOT NULL DEFAULT 'Pending'
                CHECK (status IN ('Paid', 'Pending', 'AwaitingPermit')),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Event expenses (no foreign keys, independent of employees)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            description TEXT NOT NULL CHECK (length(description) > 0),
            amount INTEGER NOT NULL CHECK (amount > 0),
            purchase_date TEXT NOT NULL
                CHECK (purchase_date GLOB '[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]'),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// Read an RFC 3339 timestamp column
pub(crate) fn timestamp_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn count_rows(conn: &Connection, table: Table) -> rusqlite::Result<i64> {
    conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", table.as_str()),
        [],
        |row| row.get(0),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Employees,
    Expenses,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Employees => "employees",
            Table::Expenses => "expenses",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        setup_database(&conn).unwrap();

        assert_eq!(count_rows(&conn, Table::Employees).unwrap(), 0);
        assert_eq!(count_rows(&conn, Table::Expenses).unwrap(), 0);
    }

    #[test]
    fn test_check_constraints_guard_invariants() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO employees (name, contribution_amount, status, created_at, updated_at)
             VALUES ('Ana', 100, 'Unknown', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err(), "status outside the enum must be rejected");

        let result = conn.execute(
            "INSERT INTO expenses (description, amount, purchase_date, created_at, updated_at)
             VALUES ('Buffet', 0, '2024-01-01', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err(), "zero amount must be rejected");

        for date in ["2024/01/01", "24-01-01", "2024-01-01T00:00", ""] {
            let result = conn.execute(
                "INSERT INTO expenses (description, amount, purchase_date, created_at, updated_at)
                 VALUES ('Buffet', 100, ?1, '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
                [date],
            );
            assert!(result.is_err(), "purchase date {:?} must be rejected", date);
        }
    }

    #[test]
    fn test_open_database_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");

        {
            let conn = open_database(&path).unwrap();
            conn.execute(
                "INSERT INTO expenses (description, amount, purchase_date, created_at, updated_at)
                 VALUES ('Cake', 5000, '2024-12-20', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
                [],
            )
            .unwrap();
        }

        // Reopening keeps data and does not recreate tables
        let conn = open_database(&path).unwrap();
        assert_eq!(count_rows(&conn, Table::Expenses).unwrap(), 1);
    }
}
