use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Latest schema version this build knows how to produce.
pub const SCHEMA_VERSION: i64 = 2;

/// Bring the schema up to [`SCHEMA_VERSION`].
///
/// Runs once at startup. Databases created before `schema_version` existed
/// report version 0 and go through every step; each step only adds, so
/// existing rows survive.
pub fn run(conn: &mut Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version = current_version(conn)?;

    if version < 1 {
        info!("Running migration v1 (queries and admins tables)");
        let tx = conn.transaction()?;
        tx.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS queries (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                email       TEXT NOT NULL,
                message     TEXT NOT NULL,
                status      TEXT NOT NULL DEFAULT 'pending',
                response    TEXT,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS admins (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                username        TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
        tx.commit()?;
    }

    if version < 2 {
        info!("Running migration v2 (queries.student_id)");
        let tx = conn.transaction()?;
        if !has_column(&tx, "queries", "student_id")? {
            tx.execute_batch("ALTER TABLE queries ADD COLUMN student_id TEXT;")?;
            info!("Added missing column queries.student_id");
        }
        tx.execute_batch(
            "
            CREATE INDEX IF NOT EXISTS idx_queries_student
                ON queries(student_id, created_at);

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
        tx.commit()?;
    }

    info!("Database migrations complete (schema v{})", SCHEMA_VERSION);
    Ok(())
}

pub fn current_version(conn: &Connection) -> Result<i64> {
    let version =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| {
            r.get(0)
        })?;
    Ok(version)
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names.iter().any(|name| name == column))
}
