pub mod migrations;
pub mod models;
pub mod queries;

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let mut conn = Connection::open(path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&mut conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Private, migrated database that lives as long as this handle.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migrations::run(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }

    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&mut conn)
    }
}

/// True when the error comes from SQLite rejecting a statement because a
/// table or column the statement names does not exist.
pub fn is_schema_error(err: &anyhow::Error) -> bool {
    err.chain()
        .filter(|cause| cause.downcast_ref::<rusqlite::Error>().is_some())
        .any(|cause| {
            let msg = cause.to_string();
            msg.contains("no such column") || msg.contains("no such table")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_errors_are_recognised() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE queries (id INTEGER PRIMARY KEY, name TEXT)")
            .unwrap();

        let err: anyhow::Error = conn
            .prepare("SELECT student_id FROM queries")
            .err()
            .expect("legacy table has no student_id")
            .into();
        assert!(is_schema_error(&err));

        let err: anyhow::Error = conn
            .prepare("SELECT id FROM admins")
            .err()
            .expect("admins table is missing")
            .into();
        assert!(is_schema_error(&err));

        assert!(!is_schema_error(&anyhow::anyhow!("no such column, but not from sqlite")));
    }
}
