//! Database row types. These map directly to SQLite rows and are converted
//! into the shared `querydesk-types` models at the crate boundary.

use chrono::{DateTime, NaiveDateTime, Utc};
use querydesk_types::models::{Admin, Query, QueryStatus};
use tracing::warn;

/// Format written for `queries.created_at`. Fixed width, so text order is
/// time order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f";

pub struct QueryRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
    pub status: Option<String>,
    pub response: Option<String>,
    pub student_id: Option<String>,
    pub created_at: Option<String>,
}

pub struct AdminRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

impl From<QueryRow> for Query {
    fn from(row: QueryRow) -> Self {
        let status = match row.status.as_deref() {
            None | Some("") => QueryStatus::Pending,
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("Query {} has {}; treating as pending", row.id, e);
                QueryStatus::Pending
            }),
        };

        let created_at = match row.created_at.as_deref() {
            Some(raw) => parse_timestamp(raw).unwrap_or_else(|| {
                warn!("Corrupt created_at '{}' on query {}", raw, row.id);
                DateTime::default()
            }),
            None => {
                warn!("Query {} has no created_at", row.id);
                DateTime::default()
            }
        };

        Query {
            id: row.id,
            name: row.name,
            email: row.email,
            message: row.message,
            status,
            response: row.response,
            student_id: row.student_id,
            created_at,
        }
    }
}

impl From<AdminRow> for Admin {
    fn from(row: AdminRow) -> Self {
        Admin {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
        }
    }
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Accepts our own format, SQLite's `datetime('now')` output and RFC 3339.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = raw.parse::<DateTime<Utc>>() {
        return Some(ts);
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .map(|ndt| ndt.and_utc())
        .ok()
}
