use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MediaType, Tier};

/// A title the user has finished ranking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedItem {
    pub id: Uuid,
    /// External catalog id (TMDB id); unique together with `media_type`
    pub catalog_id: String,
    pub title: String,
    pub media_type: MediaType,
    /// Dense 1-based position within the media type partition, 1 = best
    pub rank: u32,
    pub tier: Tier,
    /// Pairwise comparisons used to place this item
    pub comparison_count: u32,
    pub date_added: DateTime<Utc>,
    pub review: Option<String>,
    /// Empty until backfilled
    pub genre_names: Vec<String>,
    /// 0 until backfilled
    pub runtime_minutes: u32,
    pub release_date: Option<String>,
}

impl RankedItem {
    /// Four-digit year taken from the start of `release_date`
    pub fn release_year(&self) -> Option<i32> {
        let date = self.release_date.as_deref()?;
        let year = date.get(..4)?;
        if year.chars().all(|c| c.is_ascii_digit()) {
            year.parse().ok()
        } else {
            None
        }
    }

    /// Whether metadata has never been filled in.
    ///
    /// Keyed on genres alone: a runtime of 0 is a legitimate provider answer.
    pub fn needs_backfill(&self) -> bool {
        self.genre_names.is_empty()
    }
}

/// A title entering placement, before it has a rank
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewRankedItem {
    pub catalog_id: String,
    pub title: String,
    pub media_type: MediaType,
    pub tier: Tier,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genre_names: Vec<String>,
    #[serde(default)]
    pub runtime_minutes: u32,
}

impl NewRankedItem {
    /// Creates a candidate with no metadata yet
    pub fn new(catalog_id: String, title: String, media_type: MediaType, tier: Tier) -> Self {
        Self {
            catalog_id,
            title,
            media_type,
            tier,
            release_date: None,
            genre_names: Vec::new(),
            runtime_minutes: 0,
        }
    }

    /// Materializes the record created at the end of a placement session
    pub fn into_ranked(self, rank: u32, comparison_count: u32) -> RankedItem {
        RankedItem {
            id: Uuid::new_v4(),
            catalog_id: self.catalog_id,
            title: self.title,
            media_type: self.media_type,
            rank,
            tier: self.tier,
            comparison_count,
            date_added: Utc::now(),
            review: None,
            genre_names: self.genre_names,
            runtime_minutes: self.runtime_minutes,
            release_date: self.release_date,
        }
    }
}

/// Ranked item as returned to clients, with its score computed on read
#[derive(Debug, Clone, Serialize)]
pub struct RankedItemView {
    #[serde(flatten)]
    pub item: RankedItem,
    pub score: f64,
}
