use crate::auth::{AccessTier, AdminAccess, ReadAccess};
use crate::{error::AppError, AppState};
use axum::{
    extract::{FromRequest, FromRequestParts, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use core_types::{MatchInput, MatchView, NewPlayer, PlayerGoalView, PlayerView, ReassignRequest};
use database::{BackupInfo, MatchDeletion, PlayerDeletion, SeedReport};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// `axum::Json` with rejections turned into `AppError`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `axum::extract::Query` with rejections turned into `AppError`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// `axum::extract::Path` with rejections turned into `AppError`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    skip: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}
fn default_limit() -> u32 {
    100
}

#[derive(Debug, Deserialize)]
pub struct PasswordCheck {
    password: String,
}

#[derive(Debug, Serialize)]
pub struct ReassignResponse {
    pub reassigned: u64,
}

#[derive(Debug, Serialize)]
pub struct BackupList {
    pub backups: Vec<BackupInfo>,
}

/// # GET /
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Football League API" }))
}

/// # GET /api/health
pub async fn health() -> &'static str {
    "OK"
}

/// # POST /auth/global
/// Lets the login screen check the read credential without touching data.
pub async fn verify_global(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<PasswordCheck>,
) -> Result<Json<Value>, AppError> {
    verify(&state, AccessTier::Read, &body.password)
}

/// # POST /auth/admin
pub async fn verify_admin(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<PasswordCheck>,
) -> Result<Json<Value>, AppError> {
    verify(&state, AccessTier::Admin, &body.password)
}

fn verify(state: &AppState, tier: AccessTier, password: &str) -> Result<Json<Value>, AppError> {
    if state.gate.verify(tier, password) {
        Ok(Json(json!({ "authenticated": true, "tier": tier.to_string() })))
    } else {
        tracing::warn!(tier = %tier, "Login attempt rejected.");
        Err(AppError::Unauthorized(tier))
    }
}

// --- Players ---

/// # POST /players/
pub async fn create_player(
    _access: ReadAccess,
    State(state): State<Arc<AppState>>,
    AppJson(input): AppJson<NewPlayer>,
) -> Result<Json<PlayerView>, AppError> {
    Ok(Json(state.db_repo.create_player(&input).await?))
}

/// # GET /players/
pub async fn list_players(
    _access: ReadAccess,
    State(state): State<Arc<AppState>>,
    AppQuery(page): AppQuery<Pagination>,
) -> Result<Json<Vec<PlayerView>>, AppError> {
    Ok(Json(state.db_repo.list_players(page.skip, page.limit).await?))
}

/// # GET /players/:player_id
pub async fn get_player(
    _access: ReadAccess,
    AppPath(player_id): AppPath<i64>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PlayerView>, AppError> {
    Ok(Json(state.db_repo.get_player(player_id).await?))
}

/// # PUT /players/:player_id
pub async fn update_player(
    _access: AdminAccess,
    AppPath(player_id): AppPath<i64>,
    State(state): State<Arc<AppState>>,
    AppJson(input): AppJson<NewPlayer>,
) -> Result<Json<PlayerView>, AppError> {
    Ok(Json(state.db_repo.update_player(player_id, &input).await?))
}

/// # DELETE /players/:player_id
/// The player's goals move to the unknown player before the row goes.
pub async fn delete_player(
    _access: AdminAccess,
    AppPath(player_id): AppPath<i64>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PlayerDeletion>, AppError> {
    Ok(Json(state.db_repo.delete_player(player_id).await?))
}

/// # DELETE /players/
pub async fn delete_all_players(
    _access: AdminAccess,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, AppError> {
    state.db_repo.delete_all_players().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// # POST /players/defaults
pub async fn seed_default_players(
    _access: AdminAccess,
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<SeedReport>), AppError> {
    let report = state.db_repo.seed_default_roster().await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// # GET /players/unknown/goals
pub async fn list_unknown_player_goals(
    _access: ReadAccess,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PlayerGoalView>>, AppError> {
    Ok(Json(state.db_repo.list_unknown_player_goals().await?))
}

/// # POST /goals/reassign
pub async fn reassign_goals(
    _access: AdminAccess,
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<ReassignRequest>,
) -> Result<Json<ReassignResponse>, AppError> {
    let reassigned = state.db_repo.reassign_goals(&request).await?;
    Ok(Json(ReassignResponse { reassigned }))
}

// --- Matches ---

/// # POST /matches/
pub async fn create_match(
    _access: ReadAccess,
    State(state): State<Arc<AppState>>,
    AppJson(input): AppJson<MatchInput>,
) -> Result<Json<MatchView>, AppError> {
    Ok(Json(state.db_repo.create_match(&input).await?))
}

/// # GET /matches/
pub async fn list_matches(
    _access: ReadAccess,
    State(state): State<Arc<AppState>>,
    AppQuery(page): AppQuery<Pagination>,
) -> Result<Json<Vec<MatchView>>, AppError> {
    Ok(Json(state.db_repo.list_matches(page.skip, page.limit).await?))
}

/// # GET /matches/:match_id
pub async fn get_match(
    _access: ReadAccess,
    AppPath(match_id): AppPath<i64>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<MatchView>, AppError> {
    Ok(Json(state.db_repo.get_match(match_id).await?))
}

/// # PUT /matches/:match_id
/// Replaces the match's goal set wholesale.
pub async fn update_match(
    _access: AdminAccess,
    AppPath(match_id): AppPath<i64>,
    State(state): State<Arc<AppState>>,
    AppJson(input): AppJson<MatchInput>,
) -> Result<Json<MatchView>, AppError> {
    Ok(Json(state.db_repo.update_match(match_id, &input).await?))
}

/// # DELETE /matches/:match_id
pub async fn delete_match(
    _access: AdminAccess,
    AppPath(match_id): AppPath<i64>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<MatchDeletion>, AppError> {
    Ok(Json(state.db_repo.delete_match(match_id).await?))
}

/// # DELETE /matches/
pub async fn delete_all_matches(
    _access: AdminAccess,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, AppError> {
    state.db_repo.delete_all_matches().await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Backups ---

/// # POST /backup/create
/// Writes a snapshot and hands it straight back as a download.
pub async fn create_backup(
    _access: AdminAccess,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let info = state.backups.create_backup().await?;
    let bytes = state.backups.read_backup(&info.filename).await?;
    let disposition = format!("attachment; filename=\"{}\"", info.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

/// # GET /backup/list
pub async fn list_backups(
    _access: AdminAccess,
    State(state): State<Arc<AppState>>,
) -> Result<Json<BackupList>, AppError> {
    let backups = state.backups.list_backups().await?;
    Ok(Json(BackupList { backups }))
}

/// Fallback for unknown routes.
pub async fn not_found() -> AppError {
    AppError::NotFound("no such route".to_string())
}
