use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use configuration::Settings;
use database::{BackupManager, DbRepository};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod auth;
pub mod error;
pub mod handlers;

use auth::AccessGate;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub db_repo: DbRepository,
    pub backups: BackupManager,
    pub gate: AccessGate,
}

impl AppState {
    pub fn new(db_repo: DbRepository, settings: &Settings) -> Self {
        let backups = BackupManager::new(db_repo.pool().clone(), &settings.backup);
        Self {
            db_repo,
            backups,
            gate: AccessGate::new(&settings.auth),
        }
    }
}

/// Builds the full route table. Kept separate from `run_server` so tests can
/// drive it in-process.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/", get(handlers::root))
        .route("/api/health", get(handlers::health))
        .route("/auth/global", post(handlers::verify_global))
        .route("/auth/admin", post(handlers::verify_admin))
        .route(
            "/players/",
            get(handlers::list_players)
                .post(handlers::create_player)
                .delete(handlers::delete_all_players),
        )
        .route("/players/defaults", post(handlers::seed_default_players))
        .route("/players/unknown/goals", get(handlers::list_unknown_player_goals))
        .route(
            "/players/:player_id",
            get(handlers::get_player)
                .put(handlers::update_player)
                .delete(handlers::delete_player),
        )
        .route("/goals/reassign", post(handlers::reassign_goals))
        .route(
            "/matches/",
            get(handlers::list_matches)
                .post(handlers::create_match)
                .delete(handlers::delete_all_matches),
        )
        .route(
            "/matches/:match_id",
            get(handlers::get_match)
                .put(handlers::update_match)
                .delete(handlers::delete_match),
        )
        .route("/backup/create", post(handlers::create_backup))
        .route("/backup/list", get(handlers::list_backups))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024))
}

/// Opens the database, applies migrations and serves the API until the
/// process is stopped.
pub async fn run_server(settings: &Settings) -> anyhow::Result<()> {
    let addr = settings.server.socket_addr()?;

    let db_pool = database::connect(&settings.database).await?;
    database::run_migrations(&db_pool).await?;
    let db_repo = DbRepository::new(db_pool);

    let app = build_router(Arc::new(AppState::new(db_repo, settings)));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server started and listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Web server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal.");
        std::future::pending::<()>().await;
    }
}
