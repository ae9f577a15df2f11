use crate::db::DbError;
use crate::override_store::OverrideStoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Override store error: {0}")]
    OverrideStore(#[from] OverrideStoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.to_owned()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.to_owned()),
            AppError::Database(DbError::Conflict(what)) => {
                (StatusCode::CONFLICT, format!("{what} already exists"))
            }
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server error accessing the database".to_string(),
            ),
            AppError::OverrideStore(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server error saving override".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "request rejected");
        }

        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}
