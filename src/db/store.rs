use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{MediaType, RankedItem, Tier, TitleMetadata},
};

/// Record store for ranked items
///
/// The engine only reads and writes rank, tier, review and metadata fields on
/// records it is given. Per-record setters report `false` when the record no
/// longer exists so callers can treat stale input as a no-op.
#[async_trait::async_trait]
pub trait RankStore: Send + Sync {
    /// All items of one media type, ascending by rank
    async fn list_partition(&self, media_type: MediaType) -> AppResult<Vec<RankedItem>>;

    /// Every item across partitions, ordered by media type then rank
    async fn list_all(&self) -> AppResult<Vec<RankedItem>>;

    async fn get(&self, id: Uuid) -> AppResult<Option<RankedItem>>;

    async fn find_by_catalog_id(
        &self,
        catalog_id: &str,
        media_type: MediaType,
    ) -> AppResult<Option<RankedItem>>;

    /// Inserts a new record
    ///
    /// Fails with `AppError::DuplicateItem` when the `(catalog_id, media_type)`
    /// pair is already present.
    async fn insert(&self, item: RankedItem) -> AppResult<()>;

    /// Removes a record, returning it if it existed
    async fn remove(&self, id: Uuid) -> AppResult<Option<RankedItem>>;

    async fn set_rank(&self, id: Uuid, rank: u32) -> AppResult<bool>;

    async fn set_tier(&self, id: Uuid, tier: Tier) -> AppResult<bool>;

    async fn set_review(&self, id: Uuid, review: Option<String>) -> AppResult<bool>;

    async fn set_metadata(&self, id: Uuid, metadata: &TitleMetadata) -> AppResult<bool>;

    /// Store name for logging
    fn name(&self) -> &'static str;
}
