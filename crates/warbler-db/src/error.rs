use rusqlite::{ErrorCode, ffi};
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum DbError {
    /// A UNIQUE or PRIMARY KEY constraint rejected the write.
    #[error("UniqueViolation: {0}")]
    UniqueViolation(String),

    /// A required column was left empty.
    #[error("NotNullViolation: {0}")]
    NotNullViolation(String),

    /// The row, or a row it references, does not exist.
    #[error("Record not found")]
    NotFound,

    /// The requester does not own the row it tried to change.
    #[error("Access unauthorized")]
    AuthorizationFailed,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Password hash error: {0}")]
    Hash(String),

    #[error("Timestamp parse error: {0}")]
    ChronoParse(#[from] chrono::ParseError),

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("Database error: {0}")]
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, msg) = &err {
            if code.code == ErrorCode::ConstraintViolation {
                let detail = msg.clone().unwrap_or_else(|| code.to_string());
                match code.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        return DbError::UniqueViolation(detail);
                    }
                    ffi::SQLITE_CONSTRAINT_NOTNULL => return DbError::NotNullViolation(detail),
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return DbError::NotFound,
                    _ => {}
                }
            }
        }

        if let rusqlite::Error::QueryReturnedNoRows = err {
            return DbError::NotFound;
        }

        DbError::Sqlite(err)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DbError>;
