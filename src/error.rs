use axum::http::StatusCode;
use thiserror::Error;
use time::Date;
use tracing::error;

/// Coarse error classes surfaced to callers of the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    NotTracking,
    InvalidTimezone,
    BadRequest,
    TransactionFailure,
    Internal,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("task tracking is already in progress for user {user_id} on task {task_id} for date {date}")]
    AlreadyTracking { user_id: i64, task_id: i64, date: Date },

    #[error("no active task tracking found for user {user_id} on task {task_id} for date {date}")]
    NotTracking { user_id: i64, task_id: i64, date: Date },

    #[error("invalid timezone {0:?}")]
    InvalidTimezone(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("transaction failed: {0}")]
    TransactionFailure(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::NotFound(_) => ErrorKind::NotFound,
            LedgerError::Conflict(_) | LedgerError::AlreadyTracking { .. } => ErrorKind::Conflict,
            LedgerError::NotTracking { .. } => ErrorKind::NotTracking,
            LedgerError::InvalidTimezone(_) => ErrorKind::InvalidTimezone,
            LedgerError::BadRequest(_) => ErrorKind::BadRequest,
            LedgerError::TransactionFailure(_) => ErrorKind::TransactionFailure,
            LedgerError::Database(_) | LedgerError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict | ErrorKind::NotTracking => StatusCode::CONFLICT,
            ErrorKind::InvalidTimezone | ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::TransactionFailure | ErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Begin/commit failures are retryable as a whole.
    pub(crate) fn tx(e: sqlx::Error) -> Self {
        LedgerError::TransactionFailure(e.to_string())
    }
}

/// Converts a repository error into the `(StatusCode, String)` rejection the
/// handlers return. Server-side failures are logged here once.
pub fn http_error(e: LedgerError) -> (StatusCode, String) {
    let status = e.status();
    if status.is_server_error() {
        error!(error = %e, "request failed");
        return (status, "internal server error".into());
    }
    (status, e.to_string())
}
