//! Title metadata provider abstraction
//!
//! Ranking never waits on metadata: genres and runtime are filled in after an
//! item is placed, and only feed the taste classifier.

use crate::{
    error::AppResult,
    models::{MediaType, TitleMetadata},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Trait for metadata backfill sources
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch genres and runtime for a catalog title
    async fn fetch_metadata(
        &self,
        catalog_id: &str,
        media_type: MediaType,
    ) -> AppResult<TitleMetadata>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
