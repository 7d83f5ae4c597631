//! Query submission, listing and review, independent of HTTP.

use chrono::Utc;
use tracing::{error, info};

use querydesk_db::Database;
use querydesk_db::queries::NewQuery;
use querydesk_types::models::{Query, QueryStatus};

use crate::auth::AppState;
use crate::error::AppError;

pub struct QueryService<'a> {
    db: &'a Database,
}

impl<'a> QueryService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Store a new pending query. Fails without writing anything if name,
    /// email or message is missing or blank.
    pub fn submit(
        &self,
        name: Option<&str>,
        email: Option<&str>,
        message: Option<&str>,
        student_id: Option<&str>,
    ) -> Result<Query, AppError> {
        let name = required("Name", name)?;
        let email = required("Email", email)?;
        let message = required("Message", message)?;

        let query = self.db.insert_query(&NewQuery {
            name,
            email,
            message,
            student_id,
            created_at: Utc::now(),
        })?;

        info!(
            "Query #{} submitted by {}",
            query.id,
            student_id.map_or_else(|| "guest".to_string(), |id| format!("student '{}'", id))
        );
        Ok(query)
    }

    pub fn get(&self, id: i64) -> Result<Query, AppError> {
        self.db.get_query(id)?.ok_or(AppError::NotFound(id))
    }

    /// All queries, newest first.
    pub fn list_all(&self) -> Result<Vec<Query>, AppError> {
        Ok(self.db.list_queries()?)
    }

    /// Only the queries carrying this student's identifier, newest first.
    pub fn list_for_student(&self, student_id: &str) -> Result<Vec<Query>, AppError> {
        Ok(self.db.list_queries_for_student(student_id)?)
    }

    /// Partial update: blank or absent values leave the stored field alone.
    pub fn update(
        &self,
        id: i64,
        status: Option<&str>,
        response: Option<&str>,
    ) -> Result<Query, AppError> {
        let status = match non_blank(status) {
            Some(raw) => Some(raw.parse::<QueryStatus>().map_err(|_| {
                AppError::Validation(format!("'{}' is not a valid status.", raw))
            })?),
            None => None,
        };
        let response = non_blank(response);

        let query = self
            .db
            .update_query(id, status, response)?
            .ok_or(AppError::NotFound(id))?;

        info!("Query #{} updated (status: {})", id, query.status);
        Ok(query)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn required<'v>(field: &str, value: Option<&'v str>) -> Result<&'v str, AppError> {
    non_blank(value).ok_or_else(|| AppError::Validation(format!("{} is required.", field)))
}

/// Run service work on the blocking pool.
pub async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(QueryService<'_>) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(QueryService::new(&state.db)))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            AppError::Internal(anyhow::anyhow!("Background task failed: {}", e))
        })?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn submit_then_list_all() {
        let db = db();
        let service = QueryService::new(&db);
        let before = Utc::now();

        service.submit(Some("Ann"), Some("ann@x.com"), Some("Help"), None).unwrap();

        let all = service.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Ann");
        assert_eq!(all[0].status, QueryStatus::Pending);
        assert_eq!(all[0].response, None);
        assert!(all[0].created_at >= before);
    }

    #[test]
    fn stored_timestamp_never_precedes_submission() {
        let db = db();
        let service = QueryService::new(&db);

        for _ in 0..200 {
            let before = Utc::now();
            let query = service.submit(Some("Ann"), Some("ann@x.com"), Some("Help"), None).unwrap();
            assert!(query.created_at >= before, "{} < {}", query.created_at, before);
            assert_eq!(service.get(query.id).unwrap().created_at, query.created_at);
        }
    }

    #[test]
    fn submit_trims_fields() {
        let db = db();
        let query = QueryService::new(&db)
            .submit(Some("  Ann "), Some(" ann@x.com"), Some("Help\n"), Some("student"))
            .unwrap();
        assert_eq!(query.name, "Ann");
        assert_eq!(query.email, "ann@x.com");
        assert_eq!(query.message, "Help");
        assert_eq!(query.student_id.as_deref(), Some("student"));
    }

    #[test]
    fn missing_or_blank_fields_write_nothing() {
        let db = db();
        let service = QueryService::new(&db);

        let cases = [
            (None, Some("a@x.com"), Some("m")),
            (Some("Ann"), Some("   "), Some("m")),
            (Some("Ann"), Some("a@x.com"), Some("")),
            (Some(""), None, None),
        ];
        for (name, email, message) in cases {
            let err = service.submit(name, email, message, None).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{:?}", err);
        }
        assert!(service.list_all().unwrap().is_empty());
    }

    #[test]
    fn update_is_partial() {
        let db = db();
        let service = QueryService::new(&db);
        let id = service.submit(Some("Ann"), Some("a@x.com"), Some("m"), None).unwrap().id;

        let q = service.update(id, Some("in-progress"), None).unwrap();
        assert_eq!(q.status, QueryStatus::InProgress);
        assert_eq!(q.response, None);

        let q = service.update(id, Some(""), Some("Looking into it")).unwrap();
        assert_eq!(q.status, QueryStatus::InProgress);
        assert_eq!(q.response.as_deref(), Some("Looking into it"));

        let q = service.update(id, Some("resolved"), Some("  ")).unwrap();
        assert_eq!(q.status, QueryStatus::Resolved);
        assert_eq!(q.response.as_deref(), Some("Looking into it"));
    }

    #[test]
    fn update_rejects_unknown_ids_and_statuses() {
        let db = db();
        let service = QueryService::new(&db);
        let id = service.submit(Some("Ann"), Some("a@x.com"), Some("m"), None).unwrap().id;

        assert!(matches!(service.update(id + 1, Some("resolved"), None), Err(AppError::NotFound(n)) if n == id + 1));
        assert!(matches!(service.update(id + 1, None, None), Err(AppError::NotFound(_))));
        assert!(matches!(service.update(id, Some("closed"), None), Err(AppError::Validation(_))));
        assert_eq!(service.get(id).unwrap().status, QueryStatus::Pending);
    }

    #[test]
    fn student_listing_excludes_others_and_guests() {
        let db = db();
        let service = QueryService::new(&db);
        service.submit(Some("Me"), Some("me@x.com"), Some("mine"), Some("s1")).unwrap();
        service.submit(Some("Guest"), Some("g@x.com"), Some("guest"), None).unwrap();
        service.submit(Some("Other"), Some("o@x.com"), Some("theirs"), Some("s2")).unwrap();

        let mine = service.list_for_student("s1").unwrap();
        assert_eq!(mine.len(), 1);
        assert!(mine.iter().all(|q| q.student_id.as_deref() == Some("s1")));
    }
}
