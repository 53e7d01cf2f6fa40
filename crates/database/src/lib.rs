//! # League Database Crate
//!
//! This crate acts as a high-level, application-specific interface to the
//! SQLite store holding players, matches and goals. It owns every rule that
//! keeps that graph consistent.
//!
//! ## Architectural Principles
//!
//! - **Single Adapter:** All SQL lives here. The rest of the application only
//!   sees `DbRepository` methods and the types from `core-types`.
//! - **No Dangling Goals:** Deleting a player hands their goals to a reserved
//!   "unknown player" first; deleting a match removes its goals with it.
//! - **Transactional Units:** Every multi-row write commits or rolls back as a
//!   whole. A dropped `sqlx::Transaction` rolls back, so early returns are safe.
//! - **Shallow Hydration:** Reads return player → goals → match and
//!   match → goals → player, one level deep, never a cyclic graph.
//!
//! ## Public API
//!
//! - `connect` / `run_migrations`: open the pool and apply the embedded schema.
//! - `DbRepository`: reads (`list_players`, `get_match`, ...), mutations
//!   (`create_player`, `delete_player`, `update_match`, `reassign_goals`, ...)
//!   and `seed_default_roster`.
//! - `BackupManager`: timestamped snapshots of the database file.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod backup;
pub mod connection;
pub mod error;
pub mod integrity;
pub mod repository;
pub mod roster;

// Re-export the key components to create a clean, public-facing API.
pub use backup::{BackupInfo, BackupManager};
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use integrity::{MatchDeletion, PlayerDeletion};
pub use repository::{DbRepository, MAX_PAGE_SIZE};
pub use roster::{SeedReport, DEFAULT_ROSTER};
