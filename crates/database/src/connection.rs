use crate::error::DbError;
use configuration::DatabaseSettings;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::time::Duration;

/// Opens (and creates on first use) the SQLite database file.
///
/// Every pooled connection enforces foreign keys and runs in WAL mode, so
/// readers never block the single writer. Writers that find the database
/// locked wait up to `busy_timeout_secs` before the statement fails.
pub async fn connect(settings: &DatabaseSettings) -> Result<SqlitePool, DbError> {
    if settings.path.as_os_str().is_empty() {
        return Err(DbError::ConnectionConfigError(
            "database.path must not be empty".to_string(),
        ));
    }

    let options = SqliteConnectOptions::new()
        .filename(&settings.path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(settings.busy_timeout_secs));

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await?;

    tracing::debug!(path = %settings.path.display(), "Opened SQLite pool.");
    Ok(pool)
}

/// Applies the embedded schema migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
