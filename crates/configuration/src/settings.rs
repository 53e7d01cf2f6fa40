use crate::error::ConfigError;
use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub backup: BackupSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Where the HTTP API listens.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Socket address in `host:port` form (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_address.parse().map_err(|_| {
            ConfigError::ValidationError(format!(
                "server.bind_address '{}' is not a valid socket address",
                self.bind_address
            ))
        })
    }
}

/// Location and pooling of the SQLite store.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Path of the SQLite database file. Created on first start.
    pub path: PathBuf,
    pub max_connections: u32,
    /// How long a writer waits on a locked database before giving up.
    pub busy_timeout_secs: u64,
}

/// Where database snapshots are written.
#[derive(Debug, Clone, Deserialize)]
pub struct BackupSettings {
    pub directory: PathBuf,
    /// File name prefix; snapshots are named `<prefix>_<YYYYMMDD_HHMMSS>.db`.
    pub prefix: String,
}

/// The two shared secrets of the access tiers.
#[derive(Clone, Deserialize)]
pub struct AuthSettings {
    /// Grants reading plus creating players and matches.
    pub read_password: String,
    /// Grants every update, delete and administrative operation.
    pub admin_password: String,
}

// Secrets must never reach the logs.
impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("read_password", &"<redacted>")
            .field("admin_password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

/// Values supplied on the command line, applied on top of every other source.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct CliOverrides {
    /// Path to the TOML configuration file.
    #[cfg_attr(feature = "clap", arg(long, short, default_value = crate::DEFAULT_CONFIG_FILE))]
    pub config: PathBuf,

    /// Overrides `server.bind_address`.
    #[cfg_attr(feature = "clap", arg(long))]
    pub bind: Option<String>,

    /// Overrides `database.path`.
    #[cfg_attr(feature = "clap", arg(long))]
    pub database: Option<PathBuf>,
}

impl Default for CliOverrides {
    fn default() -> Self {
        Self {
            config: PathBuf::from(crate::DEFAULT_CONFIG_FILE),
            bind: None,
            database: None,
        }
    }
}

/// Seeds the builder with every value that has a sensible default.
/// The two passwords deliberately have none.
pub(crate) fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder
        .set_default("server.bind_address", "0.0.0.0:8000")?
        .set_default("database.path", "football.db")?
        .set_default("database.max_connections", 5_i64)?
        .set_default("database.busy_timeout_secs", 5_i64)?
        .set_default("backup.directory", "backups")?
        .set_default("backup.prefix", "football_backup")?
        .set_default("logging.level", "info")?)
}

impl Settings {
    /// Checks the cross-field rules that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.read_password.is_empty() || self.auth.admin_password.is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.read_password and auth.admin_password must both be set".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        let prefix_ok = !self.backup.prefix.is_empty()
            && self
                .backup
                .prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !prefix_ok {
            return Err(ConfigError::ValidationError(format!(
                "backup.prefix '{}' may only contain letters, digits, '_' and '-'",
                self.backup.prefix
            )));
        }
        self.server.socket_addr()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{load_settings, load_settings_with, CliOverrides};
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("league.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn file_values_layer_over_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
            [auth]
            read_password = "reader"
            admin_password = "boss"

            [backup]
            prefix = "league"
            "#,
        );

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.server.bind_address, "0.0.0.0:8000");
        assert_eq!(settings.database.path, PathBuf::from("football.db"));
        assert_eq!(settings.database.max_connections, 5);
        assert_eq!(settings.backup.prefix, "league");
        assert_eq!(settings.auth.read_password, "reader");
        assert_eq!(settings.logging.level, "info");
        assert!(settings.logging.directory.is_none());
    }

    #[test]
    fn cli_overrides_win() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
            [server]
            bind_address = "127.0.0.1:9000"
            [auth]
            read_password = "reader"
            admin_password = "boss"
            "#,
        );

        let settings = load_settings_with(&CliOverrides {
            config: path,
            bind: Some("127.0.0.1:7000".to_string()),
            database: Some(PathBuf::from("/tmp/other.db")),
        })
        .unwrap();
        assert_eq!(settings.server.bind_address, "127.0.0.1:7000");
        assert_eq!(settings.database.path, PathBuf::from("/tmp/other.db"));
    }

    #[test]
    fn empty_password_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
            [auth]
            read_password = ""
            admin_password = "boss"
            "#,
        );
        assert!(load_settings(&path).is_err());
    }

    #[test]
    fn bad_bind_address_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
            [server]
            bind_address = "not-an-address"
            [auth]
            read_password = "reader"
            admin_password = "boss"
            "#,
        );
        assert!(load_settings(&path).is_err());
    }

    #[test]
    fn debug_output_hides_passwords() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
            [auth]
            read_password = "reader-secret"
            admin_password = "boss-secret"
            "#,
        );
        let settings = load_settings(&path).unwrap();
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("reader-secret"));
        assert!(!rendered.contains("boss-secret"));
    }
}
