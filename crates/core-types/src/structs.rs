use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::enums::Team;
use crate::error::CoreError;

/// The reserved name of the placeholder player that inherits goals from
/// deleted players. No other player may ever carry this name.
pub const SENTINEL_PLAYER_NAME: &str = "Unknown Player (Deleted)";

/// Upper bound on a player's display name, in characters.
const MAX_NAME_LEN: usize = 100;

/// The fixed birthdate stored on the sentinel player.
pub fn sentinel_birthdate() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

// ==============================================================================
// Persisted entities (one struct per table row)
// ==============================================================================

/// A row of the `players` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Player {
    pub id: i64,
    pub name: String,
    pub birthdate: NaiveDate,
}

impl Player {
    pub fn is_sentinel(&self) -> bool {
        self.name == SENTINEL_PLAYER_NAME
    }
}

/// A row of the `matches` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Match {
    pub id: i64,
    pub date: NaiveDate,
    pub team_young_score: i32,
    pub team_old_score: i32,
}

impl Match {
    /// Human-readable label used when reporting a deletion, e.g. `2024-07-20 - 1:2`.
    /// The old team's score comes first.
    pub fn label(&self) -> String {
        format!(
            "{} - {}:{}",
            self.date, self.team_old_score, self.team_young_score
        )
    }
}

/// A row of the `goals` table: a pure join between a match and a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Goal {
    pub id: i64,
    pub match_id: i64,
    pub player_id: i64,
    pub is_own_goal: bool,
    pub team: Team,
}

// ==============================================================================
// Inputs
// ==============================================================================

/// Input for creating or fully replacing a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlayer {
    pub name: String,
    pub birthdate: NaiveDate,
}

impl NewPlayer {
    pub fn new(name: impl Into<String>, birthdate: NaiveDate) -> Self {
        Self {
            name: name.into(),
            birthdate,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("player name must not be empty".to_string()));
        }
        if self.name.chars().count() > MAX_NAME_LEN {
            return Err(CoreError::Validation(format!(
                "player name must be at most {MAX_NAME_LEN} characters"
            )));
        }
        Ok(())
    }
}

/// One goal inside a match create/update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalSpec {
    pub player_id: i64,
    #[serde(default)]
    pub is_own_goal: bool,
    pub team: Team,
}

/// Input for creating a match, or for replacing one wholesale (goal set included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchInput {
    pub date: NaiveDate,
    pub team_young_score: i32,
    pub team_old_score: i32,
    #[serde(default)]
    pub goals: Vec<GoalSpec>,
}

impl MatchInput {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.team_young_score < 0 || self.team_old_score < 0 {
            return Err(CoreError::Validation("scores must not be negative".to_string()));
        }
        Ok(())
    }

    /// The distinct player ids referenced by the goal list.
    pub fn player_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.goals.iter().map(|g| g.player_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Moves goals held by the sentinel player over to a real player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassignRequest {
    pub goal_ids: Vec<i64>,
    pub new_player_id: i64,
}

impl ReassignRequest {
    /// The requested goal ids, sorted and with repeats dropped.
    pub fn distinct_goal_ids(&self) -> Vec<i64> {
        let mut ids = self.goal_ids.clone();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
