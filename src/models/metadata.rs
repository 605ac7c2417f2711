use serde::{Deserialize, Serialize};

/// Metadata returned by the backfill collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleMetadata {
    pub genre_names: Vec<String>,
    pub runtime_minutes: u32,
}

/// Outcome of a bulk backfill pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillReport {
    /// Items that needed metadata
    pub attempted: usize,
    pub updated: usize,
    pub failed: usize,
}

// ============================================================================
// TMDB API Types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenre {
    pub name: String,
}

/// Subset of the `/3/movie/{id}` and `/3/tv/{id}` responses that we store
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbTitleDetails {
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    /// Movies only
    #[serde(default)]
    pub runtime: Option<u32>,
    /// Shows only; TMDB lists one entry per distinct episode length
    #[serde(default)]
    pub episode_run_time: Vec<u32>,
}

impl From<TmdbTitleDetails> for TitleMetadata {
    fn from(details: TmdbTitleDetails) -> Self {
        let runtime_minutes = details
            .runtime
            .or_else(|| details.episode_run_time.first().copied())
            .unwrap_or(0);

        TitleMetadata {
            genre_names: details.genres.into_iter().map(|g| g.name).collect(),
            runtime_minutes,
        }
    }
}
