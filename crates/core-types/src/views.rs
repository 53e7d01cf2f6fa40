//! Read-side projections.
//!
//! Every view expands its relationships exactly one level deep: a player
//! carries its goals and each goal a [`ShallowMatch`], a match carries its
//! goals and each goal a [`ShallowPlayer`]. The shallow types hold no further
//! relationships, so a player can never re-expand into its matches' goals.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enums::Team;
use crate::structs::{Goal, Match, Player};

/// Enough of a match to render its date and scoreline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShallowMatch {
    pub id: i64,
    pub date: NaiveDate,
    pub team_young_score: i32,
    pub team_old_score: i32,
}

impl From<&Match> for ShallowMatch {
    fn from(m: &Match) -> Self {
        Self {
            id: m.id,
            date: m.date,
            team_young_score: m.team_young_score,
            team_old_score: m.team_old_score,
        }
    }
}

/// Enough of a player to render a scorer's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShallowPlayer {
    pub id: i64,
    pub name: String,
}

impl From<&Player> for ShallowPlayer {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
        }
    }
}

/// A goal as seen from its scorer's career list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerGoalView {
    pub id: i64,
    pub player_id: i64,
    pub is_own_goal: bool,
    pub team: Team,
    #[serde(rename = "match")]
    pub match_info: ShallowMatch,
}

impl PlayerGoalView {
    pub fn new(goal: &Goal, m: &Match) -> Self {
        Self {
            id: goal.id,
            player_id: goal.player_id,
            is_own_goal: goal.is_own_goal,
            team: goal.team,
            match_info: ShallowMatch::from(m),
        }
    }
}

/// A goal as seen from the match it was scored in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchGoalView {
    pub id: i64,
    pub player_id: i64,
    pub is_own_goal: bool,
    pub team: Team,
    pub player: ShallowPlayer,
}

impl MatchGoalView {
    pub fn new(goal: &Goal, player: &Player) -> Self {
        Self {
            id: goal.id,
            player_id: goal.player_id,
            is_own_goal: goal.is_own_goal,
            team: goal.team,
            player: ShallowPlayer::from(player),
        }
    }
}

/// A player with their full goal history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: i64,
    pub name: String,
    pub birthdate: NaiveDate,
    pub goals: Vec<PlayerGoalView>,
}

impl PlayerView {
    pub fn new(player: Player, goals: Vec<PlayerGoalView>) -> Self {
        Self {
            id: player.id,
            name: player.name,
            birthdate: player.birthdate,
            goals,
        }
    }
}

/// A match with its scorers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchView {
    pub id: i64,
    pub date: NaiveDate,
    pub team_young_score: i32,
    pub team_old_score: i32,
    pub goals: Vec<MatchGoalView>,
}

impl MatchView {
    pub fn new(m: Match, goals: Vec<MatchGoalView>) -> Self {
        Self {
            id: m.id,
            date: m.date,
            team_young_score: m.team_young_score,
            team_old_score: m.team_old_score,
            goals,
        }
    }
}
