//! Shared fixtures for the database integration tests.
//!
//! Every test gets its own file-backed SQLite database inside a temporary
//! directory, so tests can run in parallel without seeing each other's rows.

#![allow(dead_code)]

use chrono::NaiveDate;
use configuration::{BackupSettings, DatabaseSettings};
use core_types::{GoalSpec, MatchInput, MatchView, NewPlayer, PlayerView, Team};
use database::{connect, run_migrations, BackupManager, DbRepository};
use tempfile::TempDir;

pub struct TestDb {
    pub repo: DbRepository,
    pub dir: TempDir,
}

impl TestDb {
    pub fn backups(&self) -> BackupManager {
        BackupManager::new(
            self.repo.pool().clone(),
            &BackupSettings {
                directory: self.dir.path().join("backups"),
                prefix: "football_backup".to_string(),
            },
        )
    }
}

/// Create an initialized, empty database for one test
pub async fn setup() -> TestDb {
    setup_with_connections(2).await
}

/// Like `setup`, with a pool wide enough for concurrent writers.
pub async fn setup_with_connections(max_connections: u32) -> TestDb {
    let dir = TempDir::new().expect("failed to create temp dir");
    let settings = DatabaseSettings {
        path: dir.path().join("league.db"),
        max_connections,
        busy_timeout_secs: 10,
    };
    let pool = connect(&settings).await.expect("failed to open SQLite pool");
    run_migrations(&pool).await.expect("failed to run migrations");
    TestDb {
        repo: DbRepository::new(pool),
        dir,
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("bad test date")
}

pub async fn add_player(repo: &DbRepository, name: &str, birthdate: &str) -> PlayerView {
    repo.create_player(&NewPlayer::new(name, date(birthdate)))
        .await
        .expect("failed to create player")
}

pub fn goal(player_id: i64, team: Team) -> GoalSpec {
    GoalSpec {
        player_id,
        is_own_goal: false,
        team,
    }
}

pub fn match_input(day: &str, young: i32, old: i32, goals: Vec<GoalSpec>) -> MatchInput {
    MatchInput {
        date: date(day),
        team_young_score: young,
        team_old_score: old,
        goals,
    }
}

pub async fn add_match(repo: &DbRepository, input: MatchInput) -> MatchView {
    repo.create_match(&input)
        .await
        .expect("failed to create match")
}
