use crate::error::{map_unique_name, DbError};
use core_types::{
    sentinel_birthdate, Goal, GoalSpec, Match, MatchGoalView, MatchInput, MatchView, NewPlayer,
    Player, PlayerGoalView, PlayerView, SENTINEL_PLAYER_NAME,
};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, Transaction};
use std::collections::HashMap;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: SqlitePool,
}

/// Hard ceiling on the page size of list queries.
pub const MAX_PAGE_SIZE: u32 = 1000;

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Opens a transaction that holds the write lock from its first statement.
    /// A deferred transaction that reads before writing fails with
    /// `SQLITE_BUSY` without waiting once another writer has committed.
    pub(crate) async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin_with("BEGIN IMMEDIATE").await
    }

    // --- Players ---
    // Multi-query reads run inside a transaction so that every level of the
    // hydration sees the same snapshot of the store.

    /// Fetches a single player with their goal history.
    pub async fn get_player(&self, player_id: i64) -> Result<PlayerView, DbError> {
        let mut tx = self.pool.begin().await?;
        let player = fetch_player(&mut tx, player_id)
            .await?
            .ok_or_else(|| DbError::not_found("player", player_id))?;
        let view = load_player_view(&mut tx, player).await?;
        tx.commit().await?;
        Ok(view)
    }

    /// Fetches a page of players in insertion order, each with their goals and
    /// each goal with its match.
    pub async fn list_players(&self, skip: u32, limit: u32) -> Result<Vec<PlayerView>, DbError> {
        let mut tx = self.pool.begin().await?;
        let players = sqlx::query_as::<_, Player>(
            "SELECT id, name, birthdate FROM players ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(limit.min(MAX_PAGE_SIZE))
        .bind(skip)
        .fetch_all(&mut *tx)
        .await?;
        let views = hydrate_players(&mut tx, players).await?;
        tx.commit().await?;
        Ok(views)
    }

    /// Looks up the sentinel player without creating it.
    pub async fn find_sentinel_player(&self) -> Result<Option<Player>, DbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(fetch_player_by_name(&mut conn, SENTINEL_PLAYER_NAME).await?)
    }

    /// Returns the sentinel player, creating it if it does not exist yet.
    /// Safe to call concurrently: the `UNIQUE(name)` constraint admits one row.
    pub async fn ensure_sentinel_player(&self) -> Result<Player, DbError> {
        let mut conn = self.pool.acquire().await?;
        ensure_sentinel(&mut conn).await
    }

    // --- Matches ---

    /// Fetches a single match with its goals and each goal's scorer.
    pub async fn get_match(&self, match_id: i64) -> Result<MatchView, DbError> {
        let mut tx = self.pool.begin().await?;
        let m = fetch_match(&mut tx, match_id)
            .await?
            .ok_or_else(|| DbError::not_found("match", match_id))?;
        let view = load_match_view(&mut tx, m).await?;
        tx.commit().await?;
        Ok(view)
    }

    /// Fetches a page of matches in insertion order, fully hydrated.
    pub async fn list_matches(&self, skip: u32, limit: u32) -> Result<Vec<MatchView>, DbError> {
        let mut tx = self.pool.begin().await?;
        let matches = sqlx::query_as::<_, Match>(
            "SELECT id, date, team_young_score, team_old_score FROM matches \
             ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(limit.min(MAX_PAGE_SIZE))
        .bind(skip)
        .fetch_all(&mut *tx)
        .await?;
        let views = hydrate_matches(&mut tx, matches).await?;
        tx.commit().await?;
        Ok(views)
    }

    // --- Goals ---

    /// Fetches every goal currently held by the sentinel player, each with the
    /// match it was scored in. Empty when no player has ever been deleted.
    pub async fn list_unknown_player_goals(&self) -> Result<Vec<PlayerGoalView>, DbError> {
        let mut tx = self.pool.begin().await?;
        let Some(sentinel) = fetch_player_by_name(&mut tx, SENTINEL_PLAYER_NAME).await? else {
            return Ok(Vec::new());
        };
        let view = load_player_view(&mut tx, sentinel).await?;
        tx.commit().await?;
        Ok(view.goals)
    }

    /// Fetches the raw goal rows of a match.
    pub async fn get_goals_for_match(&self, match_id: i64) -> Result<Vec<Goal>, DbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(fetch_by_ids::<Goal>(&mut conn, GOAL_COLUMNS, "match_id", &[match_id]).await?)
    }

    /// Fetches the raw goal rows of a player.
    pub async fn get_goals_for_player(&self, player_id: i64) -> Result<Vec<Goal>, DbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(fetch_by_ids::<Goal>(&mut conn, GOAL_COLUMNS, "player_id", &[player_id]).await?)
    }
}

// ==============================================================================
// Store primitives
// ==============================================================================
// Each primitive takes a bare connection so that callers can compose several
// of them inside one transaction (`&mut *tx`).

/// Bound ids per `IN (...)` list, well under SQLite's host parameter limit.
const MAX_IDS_PER_QUERY: usize = 500;

const GOAL_COLUMNS: &str = "SELECT id, match_id, player_id, is_own_goal, team FROM goals";
const PLAYER_COLUMNS: &str = "SELECT id, name, birthdate FROM players";
const MATCH_COLUMNS: &str = "SELECT id, date, team_young_score, team_old_score FROM matches";

pub(crate) async fn fetch_player(
    conn: &mut SqliteConnection,
    player_id: i64,
) -> Result<Option<Player>, sqlx::Error> {
    sqlx::query_as::<_, Player>("SELECT id, name, birthdate FROM players WHERE id = ?")
        .bind(player_id)
        .fetch_optional(&mut *conn)
        .await
}

pub(crate) async fn fetch_player_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<Player>, sqlx::Error> {
    sqlx::query_as::<_, Player>("SELECT id, name, birthdate FROM players WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
}

pub(crate) async fn insert_player(
    conn: &mut SqliteConnection,
    input: &NewPlayer,
) -> Result<Player, DbError> {
    sqlx::query_as::<_, Player>(
        "INSERT INTO players (name, birthdate) VALUES (?, ?) RETURNING id, name, birthdate",
    )
    .bind(&input.name)
    .bind(input.birthdate)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| map_unique_name(e, &input.name))
}

pub(crate) async fn update_player_row(
    conn: &mut SqliteConnection,
    player_id: i64,
    input: &NewPlayer,
) -> Result<Player, DbError> {
    sqlx::query_as::<_, Player>(
        "UPDATE players SET name = ?, birthdate = ? WHERE id = ? RETURNING id, name, birthdate",
    )
    .bind(&input.name)
    .bind(input.birthdate)
    .bind(player_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| map_unique_name(e, &input.name))?
    .ok_or_else(|| DbError::not_found("player", player_id))
}

pub(crate) async fn delete_player_row(
    conn: &mut SqliteConnection,
    player_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM players WHERE id = ?")
        .bind(player_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Get-or-create of the sentinel row. The insert is a no-op when the row
/// already exists, so racing callers converge on the same player.
pub(crate) async fn ensure_sentinel(conn: &mut SqliteConnection) -> Result<Player, DbError> {
    sqlx::query("INSERT INTO players (name, birthdate) VALUES (?, ?) ON CONFLICT (name) DO NOTHING")
        .bind(SENTINEL_PLAYER_NAME)
        .bind(sentinel_birthdate())
        .execute(&mut *conn)
        .await?;
    fetch_player_by_name(conn, SENTINEL_PLAYER_NAME)
        .await?
        .ok_or_else(|| DbError::not_found("player", SENTINEL_PLAYER_NAME))
}

/// Fails with `NotFound` on the first referenced player id that has no row.
pub(crate) async fn ensure_players_exist(
    conn: &mut SqliteConnection,
    player_ids: &[i64],
) -> Result<(), DbError> {
    let found = fetch_by_ids::<Player>(conn, PLAYER_COLUMNS, "id", player_ids).await?;
    if let Some(missing) = player_ids
        .iter()
        .find(|id| !found.iter().any(|p| p.id == **id))
    {
        return Err(DbError::not_found("player", missing));
    }
    Ok(())
}

pub(crate) async fn fetch_match(
    conn: &mut SqliteConnection,
    match_id: i64,
) -> Result<Option<Match>, sqlx::Error> {
    sqlx::query_as::<_, Match>(
        "SELECT id, date, team_young_score, team_old_score FROM matches WHERE id = ?",
    )
    .bind(match_id)
    .fetch_optional(&mut *conn)
    .await
}

pub(crate) async fn insert_match(
    conn: &mut SqliteConnection,
    input: &MatchInput,
) -> Result<Match, sqlx::Error> {
    sqlx::query_as::<_, Match>(
        r#"
        INSERT INTO matches (date, team_young_score, team_old_score)
        VALUES (?, ?, ?)
        RETURNING id, date, team_young_score, team_old_score
        "#,
    )
    .bind(input.date)
    .bind(input.team_young_score)
    .bind(input.team_old_score)
    .fetch_one(&mut *conn)
    .await
}

pub(crate) async fn update_match_row(
    conn: &mut SqliteConnection,
    match_id: i64,
    input: &MatchInput,
) -> Result<Option<Match>, sqlx::Error> {
    sqlx::query_as::<_, Match>(
        r#"
        UPDATE matches SET date = ?, team_young_score = ?, team_old_score = ?
        WHERE id = ?
        RETURNING id, date, team_young_score, team_old_score
        "#,
    )
    .bind(input.date)
    .bind(input.team_young_score)
    .bind(input.team_old_score)
    .bind(match_id)
    .fetch_optional(&mut *conn)
    .await
}

pub(crate) async fn delete_match_row(
    conn: &mut SqliteConnection,
    match_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM matches WHERE id = ?")
        .bind(match_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn insert_goals(
    conn: &mut SqliteConnection,
    match_id: i64,
    goals: &[GoalSpec],
) -> Result<Vec<Goal>, sqlx::Error> {
    let mut inserted = Vec::with_capacity(goals.len());
    for spec in goals {
        let goal = sqlx::query_as::<_, Goal>(
            r#"
            INSERT INTO goals (match_id, player_id, is_own_goal, team)
            VALUES (?, ?, ?, ?)
            RETURNING id, match_id, player_id, is_own_goal, team
            "#,
        )
        .bind(match_id)
        .bind(spec.player_id)
        .bind(spec.is_own_goal)
        .bind(spec.team)
        .fetch_one(&mut *conn)
        .await?;
        inserted.push(goal);
    }
    Ok(inserted)
}

pub(crate) async fn delete_goals_for_match(
    conn: &mut SqliteConnection,
    match_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM goals WHERE match_id = ?")
        .bind(match_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Moves every goal of one player to another. Returns how many moved.
pub(crate) async fn move_all_goals(
    conn: &mut SqliteConnection,
    from_player_id: i64,
    to_player_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE goals SET player_id = ? WHERE player_id = ?")
        .bind(to_player_id)
        .bind(from_player_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Moves the listed goals to `to_player_id`, but only those currently held by
/// `from_player_id`; other ids are left alone. Returns how many moved.
pub(crate) async fn move_selected_goals(
    conn: &mut SqliteConnection,
    goal_ids: &[i64],
    from_player_id: i64,
    to_player_id: i64,
) -> Result<u64, sqlx::Error> {
    let mut moved = 0;
    for chunk in goal_ids.chunks(MAX_IDS_PER_QUERY) {
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE goals SET player_id = ");
        query.push_bind(to_player_id);
        query.push(" WHERE player_id = ");
        query.push_bind(from_player_id);
        query.push(" AND id IN (");
        let mut ids = query.separated(", ");
        for id in chunk {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
        moved += query.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(moved)
}

/// Runs `<select> WHERE <column> IN (<ids>) ORDER BY id`, in slices of at most
/// `MAX_IDS_PER_QUERY` bound ids. Results are merged back into id order.
async fn fetch_by_ids<T>(
    conn: &mut SqliteConnection,
    select: &str,
    column: &str,
    ids: &[i64],
) -> Result<Vec<T>, sqlx::Error>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + HasId,
{
    let mut rows = Vec::new();
    for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
        let mut query = QueryBuilder::<Sqlite>::new(select);
        query.push(" WHERE ").push(column).push(" IN (");
        let mut bound = query.separated(", ");
        for id in chunk {
            bound.push_bind(*id);
        }
        bound.push_unseparated(") ORDER BY id");
        rows.extend(query.build_query_as::<T>().fetch_all(&mut *conn).await?);
    }
    if ids.len() > MAX_IDS_PER_QUERY {
        rows.sort_by_key(|row| row.id());
    }
    Ok(rows)
}

/// Row types that `fetch_by_ids` can put back in id order.
trait HasId {
    fn id(&self) -> i64;
}

impl HasId for Player {
    fn id(&self) -> i64 {
        self.id
    }
}

impl HasId for Match {
    fn id(&self) -> i64 {
        self.id
    }
}

impl HasId for Goal {
    fn id(&self) -> i64 {
        self.id
    }
}

fn distinct(ids: impl Iterator<Item = i64>) -> Vec<i64> {
    let mut ids: Vec<i64> = ids.collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

// ==============================================================================
// Hydration
// ==============================================================================
// One batched query per relationship level instead of one query per row.

pub(crate) async fn hydrate_players(
    conn: &mut SqliteConnection,
    players: Vec<Player>,
) -> Result<Vec<PlayerView>, DbError> {
    let player_ids: Vec<i64> = players.iter().map(|p| p.id).collect();
    let goals = fetch_by_ids::<Goal>(conn, GOAL_COLUMNS, "player_id", &player_ids).await?;
    let match_ids = distinct(goals.iter().map(|g| g.match_id));
    let matches: HashMap<i64, Match> = fetch_by_ids::<Match>(conn, MATCH_COLUMNS, "id", &match_ids)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    let mut goals_by_player: HashMap<i64, Vec<PlayerGoalView>> = HashMap::new();
    for goal in &goals {
        let m = matches
            .get(&goal.match_id)
            .ok_or_else(|| DbError::not_found("match", goal.match_id))?;
        goals_by_player
            .entry(goal.player_id)
            .or_default()
            .push(PlayerGoalView::new(goal, m));
    }

    Ok(players
        .into_iter()
        .map(|p| {
            let goals = goals_by_player.remove(&p.id).unwrap_or_default();
            PlayerView::new(p, goals)
        })
        .collect())
}

pub(crate) async fn hydrate_matches(
    conn: &mut SqliteConnection,
    matches: Vec<Match>,
) -> Result<Vec<MatchView>, DbError> {
    let match_ids: Vec<i64> = matches.iter().map(|m| m.id).collect();
    let goals = fetch_by_ids::<Goal>(conn, GOAL_COLUMNS, "match_id", &match_ids).await?;
    let player_ids = distinct(goals.iter().map(|g| g.player_id));
    let players: HashMap<i64, Player> =
        fetch_by_ids::<Player>(conn, PLAYER_COLUMNS, "id", &player_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

    let mut goals_by_match: HashMap<i64, Vec<MatchGoalView>> = HashMap::new();
    for goal in &goals {
        let player = players
            .get(&goal.player_id)
            .ok_or_else(|| DbError::not_found("player", goal.player_id))?;
        goals_by_match
            .entry(goal.match_id)
            .or_default()
            .push(MatchGoalView::new(goal, player));
    }

    Ok(matches
        .into_iter()
        .map(|m| {
            let goals = goals_by_match.remove(&m.id).unwrap_or_default();
            MatchView::new(m, goals)
        })
        .collect())
}

pub(crate) async fn load_player_view(
    conn: &mut SqliteConnection,
    player: Player,
) -> Result<PlayerView, DbError> {
    let player_id = player.id;
    let mut views = hydrate_players(conn, vec![player]).await?;
    views.pop().ok_or_else(|| DbError::not_found("player", player_id))
}

pub(crate) async fn load_match_view(
    conn: &mut SqliteConnection,
    m: Match,
) -> Result<MatchView, DbError> {
    let match_id = m.id;
    let mut views = hydrate_matches(conn, vec![m]).await?;
    views.pop().ok_or_else(|| DbError::not_found("match", match_id))
}
