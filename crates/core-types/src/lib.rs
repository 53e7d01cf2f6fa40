pub mod enums;
pub mod error;
pub mod structs;
pub mod views;

// Re-export the core types to provide a clean public API.
pub use enums::Team;
pub use error::CoreError;
pub use structs::{
    Goal, GoalSpec, Match, MatchInput, NewPlayer, Player, ReassignRequest, SENTINEL_PLAYER_NAME,
    sentinel_birthdate,
};
pub use views::{MatchGoalView, MatchView, PlayerGoalView, PlayerView, ShallowMatch, ShallowPlayer};
