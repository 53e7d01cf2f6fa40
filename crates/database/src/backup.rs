use crate::error::DbError;
use chrono::{DateTime, NaiveDateTime, Utc};
use configuration::BackupSettings;
use core_types::CoreError;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::io;
use std::path::{Path, PathBuf};

/// Timestamp layout embedded in snapshot file names (UTC).
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const BACKUP_EXTENSION: &str = "db";

/// Metadata of one snapshot file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupInfo {
    pub filename: String,
    pub size_bytes: u64,
    pub created: DateTime<Utc>,
}

/// Writes and lists timestamped snapshots of the SQLite database.
#[derive(Debug, Clone)]
pub struct BackupManager {
    pool: SqlitePool,
    directory: PathBuf,
    prefix: String,
}

impl BackupManager {
    pub fn new(pool: SqlitePool, settings: &BackupSettings) -> Self {
        Self {
            pool,
            directory: settings.directory.clone(),
            prefix: settings.prefix.clone(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Writes a snapshot named `<prefix>_<YYYYMMDD_HHMMSS>.db`.
    ///
    /// Uses `VACUUM INTO`, which copies a transactionally consistent image of
    /// the database even while other connections keep writing. Two snapshots
    /// within the same second collide; the second one fails.
    pub async fn create_backup(&self) -> Result<BackupInfo, DbError> {
        tokio::fs::create_dir_all(&self.directory).await?;

        let created = Utc::now();
        let filename = format!(
            "{}_{}.{}",
            self.prefix,
            created.format(TIMESTAMP_FORMAT),
            BACKUP_EXTENSION
        );
        let path = self.directory.join(&filename);
        if tokio::fs::try_exists(&path).await? {
            return Err(DbError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("backup {filename} already exists"),
            )));
        }

        sqlx::query("VACUUM INTO ?")
            .bind(path.to_string_lossy().into_owned())
            .execute(&self.pool)
            .await?;

        let size_bytes = tokio::fs::metadata(&path).await?.len();
        tracing::info!(file = %filename, size_bytes, "Created database backup.");

        Ok(BackupInfo {
            size_bytes,
            created: parse_backup_name(&self.prefix, &filename)
                .map(|ts| ts.and_utc())
                .unwrap_or(created),
            filename,
        })
    }

    /// Lists every snapshot in the backup directory, newest first.
    /// Files that do not follow the naming pattern are ignored.
    pub async fn list_backups(&self) -> Result<Vec<BackupInfo>, DbError> {
        let mut entries = match tokio::fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut backups = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Some(filename) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            let Some(created) = parse_backup_name(&self.prefix, &filename) else {
                continue;
            };
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            backups.push(BackupInfo {
                filename,
                size_bytes: metadata.len(),
                created: created.and_utc(),
            });
        }

        backups.sort_by(|a, b| {
            b.created
                .cmp(&a.created)
                .then_with(|| b.filename.cmp(&a.filename))
        });
        Ok(backups)
    }

    /// Reads a snapshot back, e.g. to offer it as a download.
    pub async fn read_backup(&self, filename: &str) -> Result<Vec<u8>, DbError> {
        if parse_backup_name(&self.prefix, filename).is_none() {
            let reason = format!("'{filename}' is not a backup file name");
            return Err(CoreError::Validation(reason).into());
        }
        match tokio::fs::read(self.directory.join(filename)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(DbError::not_found("backup", filename))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Extracts the timestamp from `<prefix>_<YYYYMMDD_HHMMSS>.db`, or `None` if
/// `filename` does not match the pattern exactly.
pub fn parse_backup_name(prefix: &str, filename: &str) -> Option<NaiveDateTime> {
    let stamp = filename
        .strip_prefix(prefix)?
        .strip_prefix('_')?
        .strip_suffix(BACKUP_EXTENSION)?
        .strip_suffix('.')?;
    if stamp.len() != 15 || !stamp.bytes().all(|b| b.is_ascii_digit() || b == b'_') {
        return None;
    }
    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
}
