use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};

use querydesk_types::models::{Admin, Query, QueryStatus};

use crate::Database;
use crate::models::{AdminRow, QueryRow, format_timestamp};

const QUERY_COLUMNS: &str =
    "id, name, email, message, status, response, student_id, created_at";

/// Fields for a new query row. Validation happens before this point.
pub struct NewQuery<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub message: &'a str,
    pub student_id: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

impl Database {
    // -- Queries --

    pub fn insert_query(&self, new: &NewQuery<'_>) -> Result<Query> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO queries (name, email, message, status, student_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    new.name,
                    new.email,
                    new.message,
                    QueryStatus::Pending.as_str(),
                    new.student_id,
                    format_timestamp(new.created_at),
                ],
            )?;
            let id = conn.last_insert_rowid();

            query_by_id(conn, id)?
                .ok_or_else(|| anyhow::anyhow!("Inserted query {} vanished", id))
        })
    }

    pub fn get_query(&self, id: i64) -> Result<Option<Query>> {
        self.with_conn(|conn| query_by_id(conn, id))
    }

    /// Every query, most recent first.
    pub fn list_queries(&self) -> Result<Vec<Query>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM queries ORDER BY created_at DESC, id DESC",
                QUERY_COLUMNS
            ))?;
            let rows = stmt
                .query_map([], map_query_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(Query::from).collect())
        })
    }

    /// Queries submitted by one student, most recent first.
    pub fn list_queries_for_student(&self, student_id: &str) -> Result<Vec<Query>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM queries WHERE student_id = ?1 ORDER BY created_at DESC, id DESC",
                QUERY_COLUMNS
            ))?;
            let rows = stmt
                .query_map([student_id], map_query_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(Query::from).collect())
        })
    }

    /// Overwrite whichever of status/response is `Some`; the other keeps its
    /// stored value. Returns the updated record, or `None` if `id` is unknown.
    pub fn update_query(
        &self,
        id: i64,
        status: Option<QueryStatus>,
        response: Option<&str>,
    ) -> Result<Option<Query>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE queries
                 SET status = COALESCE(?2, status), response = COALESCE(?3, response)
                 WHERE id = ?1",
                rusqlite::params![id, status.map(QueryStatus::as_str), response],
            )?;
            let updated = if changed == 0 { None } else { query_by_id(&tx, id)? };
            tx.commit()?;
            Ok(updated)
        })
    }

    // -- Admins --

    pub fn get_admin_by_username(&self, username: &str) -> Result<Option<Admin>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, username, password_hash FROM admins WHERE username = ?1",
                    [username],
                    |row| {
                        Ok(AdminRow {
                            id: row.get(0)?,
                            username: row.get(1)?,
                            password_hash: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(row.map(Admin::from))
        })
    }

    pub fn count_admins(&self) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))?)
        })
    }

    /// Insert the bootstrap admin if the table is empty.
    /// Returns true when a row was written.
    pub fn seed_admin_if_empty(&self, username: &str, password_hash: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO admins (username, password_hash)
                 SELECT ?1, ?2 WHERE NOT EXISTS (SELECT 1 FROM admins)",
                (username, password_hash),
            )?;
            Ok(inserted == 1)
        })
    }
}

fn query_by_id(conn: &Connection, id: i64) -> Result<Option<Query>> {
    let row = conn
        .query_row(
            &format!("SELECT {} FROM queries WHERE id = ?1", QUERY_COLUMNS),
            [id],
            map_query_row,
        )
        .optional()?;
    Ok(row.map(Query::from))
}

fn map_query_row(row: &Row<'_>) -> rusqlite::Result<QueryRow> {
    Ok(QueryRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        message: row.get(3)?,
        status: row.get(4)?,
        response: row.get(5)?,
        student_id: row.get(6)?,
        created_at: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_query<'a>(name: &'a str, student_id: Option<&'a str>, at: DateTime<Utc>) -> NewQuery<'a> {
        NewQuery {
            name,
            email: "someone@example.com",
            message: "Where is room 101?",
            student_id,
            created_at: at,
        }
    }

    #[test]
    fn insert_assigns_id_and_pending_status() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();

        let query = db.insert_query(&new_query("Ann", None, now)).unwrap();

        assert!(query.id > 0);
        assert_eq!(query.status, QueryStatus::Pending);
        assert_eq!(query.response, None);
        assert_eq!(query.student_id, None);
        assert_eq!(query.created_at, now);
    }

    #[test]
    fn lists_are_newest_first_and_scoped() {
        let db = Database::open_in_memory().unwrap();
        let t0 = Utc::now();
        db.insert_query(&new_query("first", Some("s1"), t0)).unwrap();
        db.insert_query(&new_query("guest", None, t0 + Duration::seconds(1))).unwrap();
        db.insert_query(&new_query("second", Some("s1"), t0 + Duration::seconds(2))).unwrap();
        db.insert_query(&new_query("other", Some("s2"), t0 + Duration::seconds(3))).unwrap();

        let all: Vec<String> = db.list_queries().unwrap().into_iter().map(|q| q.name).collect();
        assert_eq!(all, ["other", "second", "guest", "first"]);

        let mine: Vec<String> = db
            .list_queries_for_student("s1")
            .unwrap()
            .into_iter()
            .map(|q| q.name)
            .collect();
        assert_eq!(mine, ["second", "first"]);
    }

    #[test]
    fn update_touches_only_supplied_fields() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_query(&new_query("Ann", None, Utc::now())).unwrap().id;

        let q = db.update_query(id, None, Some("Try the library")).unwrap().unwrap();
        assert_eq!(q.status, QueryStatus::Pending);
        assert_eq!(q.response.as_deref(), Some("Try the library"));

        let q = db.update_query(id, Some(QueryStatus::Resolved), None).unwrap().unwrap();
        assert_eq!(q.status, QueryStatus::Resolved);
        assert_eq!(q.response.as_deref(), Some("Try the library"));

        assert!(db.update_query(id + 100, Some(QueryStatus::Resolved), None).unwrap().is_none());
    }

    #[test]
    fn admin_seed_happens_once() {
        let db = Database::open_in_memory().unwrap();

        assert!(db.seed_admin_if_empty("admin", "hash-1").unwrap());
        assert!(!db.seed_admin_if_empty("admin", "hash-2").unwrap());
        assert_eq!(db.count_admins().unwrap(), 1);

        let admin = db.get_admin_by_username("admin").unwrap().unwrap();
        assert_eq!(admin.password_hash, "hash-1");
        assert!(db.get_admin_by_username("nobody").unwrap().is_none());
    }
}
