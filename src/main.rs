use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use configuration::{CliOverrides, Settings};
use database::{connect, run_migrations, BackupManager, DbRepository};

/// The main entry point for the football league service.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = configuration::load_settings_with(&cli.overrides)
        .with_context(|| {
            format!("failed to load settings from {}", cli.overrides.config.display())
        })?;
    // Dropping the guard flushes the file logger, so it lives as long as main.
    let _guard = configuration::init_tracing(&settings.logging)?;

    match cli.command {
        Commands::Serve => web_server::run_server(&settings).await?,
        Commands::Seed => handle_seed(&settings).await?,
        Commands::Backup { action } => handle_backup(action, &settings).await?,
    }
    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Record keeping for a two-team amateur football league.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    overrides: CliOverrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API.
    Serve,
    /// Insert the default roster, skipping names that already exist.
    Seed,
    /// Manage database snapshots.
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },
}

#[derive(Subcommand)]
enum BackupAction {
    /// Write a new snapshot into the backup directory.
    Create,
    /// Show every snapshot, newest first.
    List,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn open_repository(settings: &Settings) -> anyhow::Result<DbRepository> {
    let pool = connect(&settings.database).await?;
    run_migrations(&pool).await?;
    Ok(DbRepository::new(pool))
}

async fn handle_seed(settings: &Settings) -> anyhow::Result<()> {
    let repo = open_repository(settings).await?;
    let report = repo.seed_default_roster().await?;
    println!(
        "Default roster: {} added, {} already present.",
        report.added, report.skipped
    );
    Ok(())
}

async fn handle_backup(action: BackupAction, settings: &Settings) -> anyhow::Result<()> {
    let repo = open_repository(settings).await?;
    let manager = BackupManager::new(repo.pool().clone(), &settings.backup);

    match action {
        BackupAction::Create => {
            let info = manager.create_backup().await?;
            println!(
                "Wrote {} ({} bytes) to {}",
                info.filename,
                info.size_bytes,
                manager.directory().display()
            );
        }
        BackupAction::List => {
            let backups = manager.list_backups().await?;
            if backups.is_empty() {
                println!("No backups in {}", manager.directory().display());
                return Ok(());
            }
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_header(vec!["File", "Created (UTC)", "Size (bytes)"]);
            for backup in backups {
                table.add_row(vec![
                    backup.filename,
                    backup.created.format("%Y-%m-%d %H:%M:%S").to_string(),
                    backup.size_bytes.to_string(),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}
