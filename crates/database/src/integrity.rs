//! Mutating operations that keep the player/match/goal graph consistent.
//!
//! - Goals never dangle: deleting a player first moves their goals to the
//!   sentinel player, deleting a match takes its goals with it.
//! - Player names stay unique; the `UNIQUE(name)` constraint is the final word.
//! - Every multi-row change runs in one transaction, except player deletion,
//!   which is two committed transactions (see [`DbRepository::delete_player`]).

use crate::error::DbError;
use crate::repository::{
    delete_goals_for_match, delete_match_row, delete_player_row, ensure_players_exist,
    ensure_sentinel, fetch_match, fetch_player, fetch_player_by_name, insert_goals, insert_match,
    insert_player, load_match_view, load_player_view, move_all_goals, move_selected_goals,
    update_match_row, update_player_row, DbRepository,
};
use core_types::{
    MatchInput, MatchView, NewPlayer, PlayerView, ReassignRequest, SENTINEL_PLAYER_NAME,
};
use serde::{Deserialize, Serialize};

/// Outcome of deleting a single player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDeletion {
    pub deleted_player: String,
    pub reassigned_goals: u64,
}

/// Outcome of deleting a single match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchDeletion {
    pub deleted_match: String,
    pub deleted_goals: u64,
}

impl DbRepository {
    // --- Players ---

    /// Creates a player. Fails with `DuplicateName` if the exact name is taken
    /// (the sentinel's reserved name always counts as taken).
    pub async fn create_player(&self, input: &NewPlayer) -> Result<PlayerView, DbError> {
        input.validate()?;
        if input.name == SENTINEL_PLAYER_NAME {
            return Err(DbError::DuplicateName(input.name.clone()));
        }

        let mut tx = self.begin_write().await?;
        // Fast path; the unique constraint on insert is what actually decides.
        if fetch_player_by_name(&mut tx, &input.name).await?.is_some() {
            return Err(DbError::DuplicateName(input.name.clone()));
        }
        let player = insert_player(&mut tx, input).await?;
        tx.commit().await?;

        tracing::info!(player_id = player.id, name = %player.name, "Created player.");
        Ok(PlayerView::new(player, Vec::new()))
    }

    /// Replaces a player's name and birthdate.
    pub async fn update_player(
        &self,
        player_id: i64,
        input: &NewPlayer,
    ) -> Result<PlayerView, DbError> {
        input.validate()?;

        let mut tx = self.begin_write().await?;
        let current = fetch_player(&mut tx, player_id)
            .await?
            .ok_or_else(|| DbError::not_found("player", player_id))?;
        if current.is_sentinel() {
            return Err(DbError::ForbiddenOperation(
                "the unknown player cannot be edited".to_string(),
            ));
        }
        if input.name == SENTINEL_PLAYER_NAME {
            return Err(DbError::DuplicateName(input.name.clone()));
        }
        if let Some(other) = fetch_player_by_name(&mut tx, &input.name).await? {
            if other.id != player_id {
                return Err(DbError::DuplicateName(input.name.clone()));
            }
        }
        let player = update_player_row(&mut tx, player_id, input).await?;
        let view = load_player_view(&mut tx, player).await?;
        tx.commit().await?;

        tracing::info!(player_id, name = %view.name, "Updated player.");
        Ok(view)
    }

    /// Deletes a player without losing their goals.
    ///
    /// Runs as two committed transactions, in this order:
    /// 1. every goal of the player is moved to the sentinel player (created on
    ///    demand);
    /// 2. the player row is deleted, after sweeping up any goal recorded for
    ///    them in between.
    ///
    /// A crash between the two leaves a live player with no goals, never a
    /// goal pointing at a missing player. Repeating the call finishes the job.
    pub async fn delete_player(&self, player_id: i64) -> Result<PlayerDeletion, DbError> {
        let mut tx = self.begin_write().await?;
        let player = fetch_player(&mut tx, player_id)
            .await?
            .ok_or_else(|| DbError::not_found("player", player_id))?;
        if player.is_sentinel() {
            return Err(DbError::ForbiddenOperation(
                "the unknown player cannot be deleted".to_string(),
            ));
        }
        let sentinel = ensure_sentinel(&mut tx).await?;
        let mut reassigned = move_all_goals(&mut tx, player_id, sentinel.id).await?;
        tx.commit().await?;
        tracing::debug!(player_id, reassigned, "Goals handed to the unknown player.");

        let mut tx = self.begin_write().await?;
        reassigned += move_all_goals(&mut tx, player_id, sentinel.id).await?;
        if delete_player_row(&mut tx, player_id).await? == 0 {
            return Err(DbError::not_found("player", player_id));
        }
        tx.commit().await?;

        tracing::info!(
            player_id,
            name = %player.name,
            reassigned_goals = reassigned,
            "Deleted player."
        );
        Ok(PlayerDeletion {
            deleted_player: player.name,
            reassigned_goals: reassigned,
        })
    }

    /// Deletes every player and every goal. Matches keep their scores.
    /// Returns the number of players removed.
    pub async fn delete_all_players(&self) -> Result<u64, DbError> {
        let mut tx = self.begin_write().await?;
        let goals = sqlx::query("DELETE FROM goals").execute(&mut *tx).await?;
        let players = sqlx::query("DELETE FROM players").execute(&mut *tx).await?;
        tx.commit().await?;

        tracing::info!(
            players = players.rows_affected(),
            goals = goals.rows_affected(),
            "Deleted all players."
        );
        Ok(players.rows_affected())
    }

    // --- Matches ---

    /// Creates a match together with its goals.
    pub async fn create_match(&self, input: &MatchInput) -> Result<MatchView, DbError> {
        input.validate()?;

        let mut tx = self.begin_write().await?;
        ensure_players_exist(&mut tx, &input.player_ids()).await?;
        let m = insert_match(&mut tx, input).await?;
        insert_goals(&mut tx, m.id, &input.goals).await?;
        let view = load_match_view(&mut tx, m).await?;
        tx.commit().await?;

        tracing::info!(match_id = view.id, goals = view.goals.len(), "Created match.");
        Ok(view)
    }

    /// Replaces a match's date, scores and its entire goal set.
    pub async fn update_match(
        &self,
        match_id: i64,
        input: &MatchInput,
    ) -> Result<MatchView, DbError> {
        input.validate()?;

        let mut tx = self.begin_write().await?;
        let m = update_match_row(&mut tx, match_id, input)
            .await?
            .ok_or_else(|| DbError::not_found("match", match_id))?;
        ensure_players_exist(&mut tx, &input.player_ids()).await?;
        let removed = delete_goals_for_match(&mut tx, match_id).await?;
        insert_goals(&mut tx, match_id, &input.goals).await?;
        let view = load_match_view(&mut tx, m).await?;
        tx.commit().await?;

        tracing::info!(
            match_id,
            removed_goals = removed,
            goals = view.goals.len(),
            "Updated match."
        );
        Ok(view)
    }

    /// Deletes a match and all of its goals.
    pub async fn delete_match(&self, match_id: i64) -> Result<MatchDeletion, DbError> {
        let mut tx = self.begin_write().await?;
        let m = fetch_match(&mut tx, match_id)
            .await?
            .ok_or_else(|| DbError::not_found("match", match_id))?;
        let deleted_goals = delete_goals_for_match(&mut tx, match_id).await?;
        delete_match_row(&mut tx, match_id).await?;
        tx.commit().await?;

        tracing::info!(match_id, deleted_goals, "Deleted match.");
        Ok(MatchDeletion {
            deleted_match: m.label(),
            deleted_goals,
        })
    }

    /// Deletes every match and every goal. Returns the number of matches removed.
    pub async fn delete_all_matches(&self) -> Result<u64, DbError> {
        let mut tx = self.begin_write().await?;
        let goals = sqlx::query("DELETE FROM goals").execute(&mut *tx).await?;
        let matches = sqlx::query("DELETE FROM matches").execute(&mut *tx).await?;
        tx.commit().await?;

        tracing::info!(
            matches = matches.rows_affected(),
            goals = goals.rows_affected(),
            "Deleted all matches."
        );
        Ok(matches.rows_affected())
    }

    // --- Goals ---

    /// Hands goals held by the sentinel player to a real player.
    ///
    /// Ids of goals owned by anyone else, unknown ids and repeats are skipped
    /// without error, so the returned count may be lower than the number of
    /// ids given.
    pub async fn reassign_goals(&self, request: &ReassignRequest) -> Result<u64, DbError> {
        let goal_ids = request.distinct_goal_ids();

        let mut tx = self.begin_write().await?;
        let target = fetch_player(&mut tx, request.new_player_id)
            .await?
            .ok_or_else(|| DbError::not_found("player", request.new_player_id))?;
        if target.is_sentinel() {
            return Err(DbError::ForbiddenOperation(
                "goals cannot be reassigned to the unknown player".to_string(),
            ));
        }
        // No sentinel means no player was ever deleted, so nothing to hand back.
        let Some(sentinel) = fetch_player_by_name(&mut tx, SENTINEL_PLAYER_NAME).await? else {
            return Ok(0);
        };
        let reassigned = move_selected_goals(&mut tx, &goal_ids, sentinel.id, target.id).await?;
        tx.commit().await?;

        tracing::info!(
            new_player_id = target.id,
            requested = request.goal_ids.len(),
            reassigned,
            "Reassigned unknown player goals."
        );
        Ok(reassigned)
    }
}
