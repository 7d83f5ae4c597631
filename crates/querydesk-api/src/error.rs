use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::views;

#[derive(Debug, Error)]
pub enum AppError {
    /// A required field was missing or blank. Nothing was written.
    #[error("{0}")]
    Validation(String),

    #[error("Query #{0} was not found.")]
    NotFound(i64),

    /// The database is missing a table or column this build expects.
    #[error("Database schema mismatch: {0}")]
    Schema(anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        if querydesk_db::is_schema_error(&err) {
            AppError::Schema(err)
        } else {
            AppError::Internal(err)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Schema(e) => {
                error!("Schema mismatch, run migrations against this database: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Please try again later.".to_string(),
                )
            }
            AppError::Internal(e) => {
                error!("{:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Please try again later.".to_string(),
                )
            }
        };

        (status, views::error_page(status, &message)).into_response()
    }
}
