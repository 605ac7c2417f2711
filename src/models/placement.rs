use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RankedItem;

/// The user's answer to "is the new title better than this one?"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOutcome {
    /// New title beats the opponent
    Better,
    /// New title loses to the opponent
    Worse,
}

/// Where a placement session stands after its latest step
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlacementProgress {
    /// Waiting on the user to compare the candidate against `opponent`
    Comparing {
        session_id: Uuid,
        candidate_title: String,
        opponent: RankedItem,
        /// 1-based number of the comparison being asked
        comparison_number: u32,
    },
    /// The candidate has been inserted
    Placed { item: RankedItem },
}
