use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::stats::{GameId, Metric, StatValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

/// What a position is shown as: a medal for the podium, the number otherwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Placement {
    Medal(Medal),
    Position(usize),
}

impl Placement {
    pub fn for_position(position: usize) -> Self {
        match position {
            1 => Placement::Medal(Medal::Gold),
            2 => Placement::Medal(Medal::Silver),
            3 => Placement::Medal(Medal::Bronze),
            other => Placement::Position(other),
        }
    }
}

/// One row of a ranked leaderboard, before pagination
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub player_id: String,
    pub value: StatValue,
    /// Set for lower-is-better metrics when the player has nothing to show
    /// for the paired counter either
    pub no_data: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub position: usize,
    pub placement: Placement,
    pub player_id: String,
    pub value: StatValue,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_data: bool,
}

/// A single page of a leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    pub game: GameId,
    /// Human-readable game title for page headers
    pub game_name: String,
    pub metric: Metric,
    pub entries: Vec<LeaderboardEntry>,
    /// 1-based position of the first entry; 0 when the page is empty
    pub position_start: usize,
    /// 1-based position of the last entry; 0 when the page is empty
    pub position_end: usize,
    pub total: usize,
    pub page_index: usize,
    pub max_page: usize,
}

/// Query string for leaderboard requests
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: usize,
}
