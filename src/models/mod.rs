use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

pub mod metadata;
pub mod placement;
pub mod ranked_item;
pub mod taste;

pub use metadata::{BackfillReport, TitleMetadata, TmdbGenre, TmdbTitleDetails};
pub use placement::{ComparisonOutcome, PlacementProgress};
pub use ranked_item::{NewRankedItem, RankedItem, RankedItemView};
pub use taste::{Archetype, GenreShare, TasteDna, TasteProfile};

/// Kind of title; each media type is ranked in its own partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Show,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Show => "show",
        }
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "movie" => Ok(MediaType::Movie),
            "show" | "tv" | "series" => Ok(MediaType::Show),
            _ => Err(format!("Unknown media type: {}", s)),
        }
    }
}

/// Coarse bucket the user picks before placement.
///
/// Tier is never derived from rank; it only changes on explicit user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Good,
    Medium,
    Bad,
}

impl Tier {
    /// Score band owned by this tier as `(high, low)`
    pub fn score_band(&self) -> (f64, f64) {
        match self {
            Tier::Good => (10.0, 7.0),
            Tier::Medium => (6.9, 4.0),
            Tier::Bad => (3.9, 1.0),
        }
    }

    /// Weight on the 1-3 scale used by the taste DNA average
    pub fn weight(&self) -> f64 {
        match self {
            Tier::Good => 3.0,
            Tier::Medium => 2.0,
            Tier::Bad => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Good => "good",
            Tier::Medium => "medium",
            Tier::Bad => "bad",
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "good" => Ok(Tier::Good),
            "medium" => Ok(Tier::Medium),
            "bad" => Ok(Tier::Bad),
            _ => Err(format!("Unknown tier: {}", s)),
        }
    }
}
