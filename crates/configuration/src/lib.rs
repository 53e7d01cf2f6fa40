use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    AuthSettings, BackupSettings, CliOverrides, DatabaseSettings, LoggingSettings, ServerSettings,
    Settings,
};

/// The configuration file read when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "league.toml";

/// Loads the application settings.
///
/// Sources are layered in increasing priority: built-in defaults, the TOML
/// file at `path` (optional, skipped when missing), then `LEAGUE__SECTION__KEY`
/// environment variables. A `.env` file in the working directory is read
/// first so that secrets can live outside the TOML file.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    load_settings_with(&CliOverrides {
        config: path.to_path_buf(),
        ..CliOverrides::default()
    })
}

/// Same as [`load_settings`], with command-line overrides applied on top.
pub fn load_settings_with(overrides: &CliOverrides) -> Result<Settings, ConfigError> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            tracing::warn!(error = %e, "Ignoring unreadable .env file.");
        }
    }

    let builder = settings::with_defaults(config::Config::builder())?
        .add_source(config::File::from(overrides.config.as_path()).required(false))
        .add_source(
            config::Environment::with_prefix("LEAGUE")
                .prefix_separator("__")
                .separator("__"),
        )
        .set_override_option("server.bind_address", overrides.bind.clone())?
        .set_override_option(
            "database.path",
            overrides
                .database
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
        )?
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;

    Ok(settings)
}
