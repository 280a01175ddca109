use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::{auth::errors::AuthError, store::StoreError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("unauthenticated: {0}")]
    Auth(#[from] AuthError),

    /// Authenticated, but the record belongs to another account.
    #[error("forbidden: {0} belongs to another account")]
    Forbidden(&'static str),

    #[error("not found: {0}")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            // Same outcome as a missing record so foreign ids are not confirmed.
            AppError::Forbidden(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::Conflict(msg) => msg.clone(),
            AppError::Auth(e) => e.public_message().to_string(),
            AppError::Forbidden(entity) | AppError::NotFound(entity) => {
                format!("{entity} not found")
            }
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation(what) => AppError::Conflict(format!("{what} already exists")),
            StoreError::ForeignKeyViolation(what) => {
                AppError::Validation(format!("{what} does not exist"))
            }
            StoreError::Database(e) => AppError::Internal(anyhow::Error::new(e)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Internal(e) => error!(error = ?e, "internal error"),
            AppError::Auth(e) => warn!(reason = %e, "request not authenticated"),
            _ => {}
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}
