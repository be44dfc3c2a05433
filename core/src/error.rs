use thiserror::Error;

/// The closed set of failure classes every operation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unauthenticated,
    Forbidden,
    NotFound,
    Conflict,
    Transient,
    Internal,
}

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("{0}")]
    Validation(String),

    /// No actor of the kind the operation requires.
    #[error("{0}")]
    Unauthenticated(String),

    /// An actor of the right kind, but not the one allowed to act.
    #[error("{0}")]
    Forbidden(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DeskResult<T> = Result<T, DeskError>;

impl DeskError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeskError::Validation(_) => ErrorKind::Validation,
            DeskError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            DeskError::Forbidden(_) => ErrorKind::Forbidden,
            DeskError::NotFound { .. } => ErrorKind::NotFound,
            DeskError::Conflict(_) => ErrorKind::Conflict,
            DeskError::Database(e) if is_busy(e) => ErrorKind::Transient,
            DeskError::Database(_) | DeskError::Serialization(_) | DeskError::Other(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// HTTP status the client boundary reports for this error.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::Unauthenticated => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Transient => 503,
            ErrorKind::Internal => 500,
        }
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

fn is_busy(e: &rusqlite::Error) -> bool {
    matches!(
        e.sqlite_error_code(),
        Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked)
    )
}

/// True when `e` is a UNIQUE / PRIMARY KEY violation raised by an insert.
pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    match e {
        rusqlite::Error::SqliteFailure(err, _) => {
            err.code == rusqlite::ErrorCode::ConstraintViolation
                && matches!(
                    err.extended_code,
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                        | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                )
        }
        _ => false,
    }
}
