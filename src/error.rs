use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::{debug, error};

// SQLite primary result codes; extended codes carry these in the low byte.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

#[derive(Debug, ThisError)]
pub enum StudentError {
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("unique constraint violated: {0}")]
    UniqueConstraintViolation(String),

    #[error("storage locked: {0}")]
    StorageLocked(#[source] SqlxError),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] SqlxError),
}

impl StudentError {
    pub fn malformed(detail: impl Into<String>) -> Self {
        StudentError::MalformedRequest(detail.into())
    }

    /// Wire name of the error kind, used as the `error` field of the envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            StudentError::MalformedRequest(_) => "malformed_request",
            StudentError::UniqueConstraintViolation(_) => "unique_constraint_violation",
            StudentError::StorageLocked(_) => "storage_locked",
            StudentError::StorageUnavailable(_) => "storage_unavailable",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            StudentError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            StudentError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
            StudentError::StorageLocked(_) => StatusCode::SERVICE_UNAVAILABLE,
            StudentError::StorageUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// True when SQLite rejected the statement because another connection holds the lock.
pub fn is_lock_contention(err: &SqlxError) -> bool {
    let SqlxError::Database(db_err) = err else {
        return false;
    };
    let primary = db_err
        .code()
        .and_then(|code| code.parse::<i32>().ok())
        .map(|code| code & 0xff);
    if matches!(primary, Some(SQLITE_BUSY | SQLITE_LOCKED)) {
        return true;
    }
    db_err.message().to_ascii_lowercase().contains("locked")
}

impl From<SqlxError> for StudentError {
    fn from(err: SqlxError) -> Self {
        if let SqlxError::Database(db_err) = &err
            && db_err.is_unique_violation()
        {
            return StudentError::UniqueConstraintViolation(db_err.message().to_string());
        }
        if is_lock_contention(&err) {
            return StudentError::StorageLocked(err);
        }
        StudentError::StorageUnavailable(err)
    }
}

impl IntoResponse for StudentError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let detail = match &self {
            StudentError::MalformedRequest(detail) => {
                debug!(%detail, "rejected malformed request");
                detail.clone()
            }
            StudentError::UniqueConstraintViolation(detail) => {
                debug!(%detail, "rejected duplicate email");
                "A student with this email already exists.".to_string()
            }
            StudentError::StorageLocked(e) => {
                error!(error = %e, "storage still locked after retries");
                "Storage is busy; try again shortly.".to_string()
            }
            StudentError::StorageUnavailable(e) => {
                error!(error = %e, "storage failure");
                "An internal server error occurred.".to_string()
            }
        };
        let body = ApiErrorResponse {
            error: self.kind(),
            detail,
        };
        (status, Json(body)).into_response()
    }
}

/// Uniform JSON error envelope: `{"error": "<kind>", "detail": "..."}`.
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: &'static str,
    pub detail: String,
}
