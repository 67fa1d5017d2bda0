//! Persistence error type

use sqlx::error::ErrorKind;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    /// A unique constraint rejected the write
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// Foreign key, not-null, or check constraint rejected the write
    #[error("integrity error: {message}")]
    Integrity { message: String },
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            match db_err.kind() {
                ErrorKind::UniqueViolation => {
                    return Self::UniqueViolation {
                        constraint: db_err.constraint().unwrap_or("unknown").to_owned(),
                    }
                }
                ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => {
                    return Self::Integrity {
                        message: db_err.message().to_owned(),
                    }
                }
                _ => {}
            }
        }

        Self::Sqlx(e)
    }
}
