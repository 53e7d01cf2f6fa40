use serde::{Deserialize, Serialize};

/// The two fixed sides of every league match.
///
/// A goal's team is the side whose score it counts toward. For an own goal
/// that is the side that benefits, not the scorer's usual side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Team {
    Young,
    Old,
}
