use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database connection settings: {0}")]
    ConnectionConfigError(String),

    #[error("Database operation failed: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Backup I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("A player named '{0}' already exists")]
    DuplicateName(String),

    #[error("Operation not allowed: {0}")]
    ForbiddenOperation(String),

    #[error(transparent)]
    Validation(#[from] CoreError),
}

impl DbError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DbError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// True for failures of the underlying store rather than of the request.
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            DbError::ConnectionConfigError(_)
                | DbError::Storage(_)
                | DbError::MigrationError(_)
                | DbError::Io(_)
        )
    }
}

/// Maps a `UNIQUE(name)` violation on `players` to `DuplicateName`.
pub(crate) fn map_unique_name(err: sqlx::Error, name: &str) -> DbError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            DbError::DuplicateName(name.to_string())
        }
        _ => DbError::Storage(err),
    }
}
