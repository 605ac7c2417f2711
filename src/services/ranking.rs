use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::RankStore,
    error::{AppError, AppResult},
    models::{MediaType, RankedItem},
};

/// Keeps each media type partition's ranks dense (`1..=N`, no gaps, no
/// duplicates) across insertions, deletions and manual reorders.
///
/// Shifts are applied one record at a time. A record that disappears while
/// being shifted is skipped, so re-running a partially applied shift is safe.
#[derive(Clone)]
pub struct RankMaintainer {
    store: Arc<dyn RankStore>,
}

impl RankMaintainer {
    pub fn new(store: Arc<dyn RankStore>) -> Self {
        Self { store }
    }

    /// Inserts `item` at `target_rank`, pushing every item at or below that
    /// rank down by one.
    ///
    /// `target_rank` is clamped into `1..=N+1` against the current partition.
    pub async fn insert_at(&self, mut item: RankedItem, target_rank: u32) -> AppResult<RankedItem> {
        if self
            .store
            .find_by_catalog_id(&item.catalog_id, item.media_type)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicateItem {
                catalog_id: item.catalog_id,
                media_type: item.media_type,
            });
        }

        let partition = self.store.list_partition(item.media_type).await?;
        let max_rank = partition.len() as u32 + 1;
        let rank = target_rank.clamp(1, max_rank);
        if rank != target_rank {
            tracing::warn!(
                media_type = %item.media_type,
                requested = target_rank,
                clamped = rank,
                "Insertion rank outside partition, clamping"
            );
        }

        // Shift from the bottom so no two records share a rank mid-pass
        let mut shifted = 0;
        for existing in partition.iter().rev().filter(|existing| existing.rank >= rank) {
            if self.store.set_rank(existing.id, existing.rank + 1).await? {
                shifted += 1;
            } else {
                tracing::debug!(item_id = %existing.id, "Item vanished during shift, skipping");
            }
        }

        item.rank = rank;
        if let Err(e) = self.store.insert(item.clone()).await {
            tracing::warn!(
                item_id = %item.id,
                media_type = %item.media_type,
                rank,
                shifted,
                error = %e,
                "Insert failed after shifting, partition left with a gap at rank"
            );
            return Err(e);
        }

        tracing::info!(
            item_id = %item.id,
            media_type = %item.media_type,
            rank,
            shifted,
            comparisons = item.comparison_count,
            "Inserted ranked item"
        );

        Ok(item)
    }

    /// Deletes an item and closes the gap it leaves.
    ///
    /// Unknown ids are a no-op and return `None`.
    pub async fn remove(&self, id: Uuid) -> AppResult<Option<RankedItem>> {
        let Some(removed) = self.store.remove(id).await? else {
            tracing::debug!(item_id = %id, "Delete requested for unknown item, nothing to shift");
            return Ok(None);
        };

        let partition = self.store.list_partition(removed.media_type).await?;
        let mut shifted = 0;
        for existing in partition
            .iter()
            .filter(|existing| existing.id != removed.id && existing.rank > removed.rank)
        {
            if self.store.set_rank(existing.id, existing.rank - 1).await? {
                shifted += 1;
            }
        }

        tracing::info!(
            item_id = %removed.id,
            media_type = %removed.media_type,
            rank = removed.rank,
            shifted,
            "Removed ranked item"
        );

        Ok(Some(removed))
    }

    /// Renumbers a contiguous block of the partition in a new order.
    ///
    /// `ordered_ids` must be exactly the items currently holding ranks
    /// `starting_rank..starting_rank + ordered_ids.len()`; they receive those
    /// ranks in the given order. Items outside the block keep their ranks.
    /// Returns the partition after the move.
    pub async fn reorder(
        &self,
        media_type: MediaType,
        ordered_ids: &[Uuid],
        starting_rank: u32,
    ) -> AppResult<Vec<RankedItem>> {
        if starting_rank == 0 {
            return Err(AppError::InvalidInput(
                "Starting rank must be at least 1".to_string(),
            ));
        }

        let partition = self.store.list_partition(media_type).await?;
        if ordered_ids.is_empty() {
            return Ok(partition);
        }

        let submitted: HashSet<Uuid> = ordered_ids.iter().copied().collect();
        if submitted.len() != ordered_ids.len() {
            return Err(AppError::InvalidInput(
                "Reorder contains duplicate ids".to_string(),
            ));
        }

        let end_rank = starting_rank as usize + ordered_ids.len();
        let block: HashSet<Uuid> = partition
            .iter()
            .filter(|item| item.rank >= starting_rank && (item.rank as usize) < end_rank)
            .map(|item| item.id)
            .collect();
        if block != submitted {
            return Err(AppError::InvalidInput(format!(
                "Reorder ids must be exactly the {} items ranked {}..{} in the {} list",
                ordered_ids.len(),
                starting_rank,
                end_rank - 1,
                media_type
            )));
        }

        let mut rank = starting_rank;
        for id in ordered_ids {
            if !self.store.set_rank(*id, rank).await? {
                tracing::debug!(item_id = %id, "Item vanished during reorder, skipping");
            }
            rank += 1;
        }

        tracing::info!(
            media_type = %media_type,
            starting_rank,
            moved = ordered_ids.len(),
            "Reordered ranked items"
        );

        self.store.list_partition(media_type).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryRankStore;
    use crate::models::{NewRankedItem, Tier};

    fn movie(catalog_id: &str, rank: u32) -> RankedItem {
        NewRankedItem::new(
            catalog_id.to_string(),
            format!("Movie {}", catalog_id),
            MediaType::Movie,
            Tier::Good,
        )
        .into_ranked(rank, 0)
    }

    fn maintainer_with(items: Vec<RankedItem>) -> (RankMaintainer, Arc<InMemoryRankStore>) {
        let store = Arc::new(InMemoryRankStore::with_items(items));
        (RankMaintainer::new(store.clone()), store)
    }

    async fn ranks_by_catalog(store: &InMemoryRankStore) -> Vec<(String, u32)> {
        store
            .list_partition(MediaType::Movie)
            .await
            .unwrap()
            .into_iter()
            .map(|item| (item.catalog_id, item.rank))
            .collect()
    }

    fn expected(order: &[&str]) -> Vec<(String, u32)> {
        order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.to_string(), i as u32 + 1))
            .collect()
    }

    #[tokio::test]
    async fn test_insert_in_middle_shifts_lower_ranks() {
        let (maintainer, store) = maintainer_with(vec![movie("a", 1), movie("b", 2), movie("c", 3)]);

        let inserted = maintainer.insert_at(movie("new", 0), 2).await.unwrap();

        assert_eq!(inserted.rank, 2);
        assert_eq!(ranks_by_catalog(&store).await, expected(&["a", "new", "b", "c"]));
    }

    #[tokio::test]
    async fn test_insert_at_end_and_into_empty_partition() {
        let (maintainer, store) = maintainer_with(Vec::new());

        maintainer.insert_at(movie("a", 0), 1).await.unwrap();
        maintainer.insert_at(movie("b", 0), 2).await.unwrap();

        assert_eq!(ranks_by_catalog(&store).await, expected(&["a", "b"]));
    }

    #[tokio::test]
    async fn test_insert_clamps_out_of_range_rank() {
        let (maintainer, store) = maintainer_with(vec![movie("a", 1)]);

        let tail = maintainer.insert_at(movie("b", 0), 10).await.unwrap();
        let head = maintainer.insert_at(movie("c", 0), 0).await.unwrap();

        assert_eq!(tail.rank, 2);
        assert_eq!(head.rank, 1);
        assert_eq!(ranks_by_catalog(&store).await, expected(&["c", "a", "b"]));
    }

    #[tokio::test]
    async fn test_insert_duplicate_does_not_shift() {
        let (maintainer, store) = maintainer_with(vec![movie("a", 1), movie("b", 2)]);

        let result = maintainer.insert_at(movie("a", 0), 1).await;

        assert!(matches!(result, Err(AppError::DuplicateItem { .. })));
        assert_eq!(ranks_by_catalog(&store).await, expected(&["a", "b"]));
    }

    #[tokio::test]
    async fn test_remove_compacts_partition() {
        let items = vec![movie("a", 1), movie("b", 2), movie("c", 3), movie("d", 4)];
        let target = items[1].id;
        let (maintainer, store) = maintainer_with(items);

        let removed = maintainer.remove(target).await.unwrap();

        assert_eq!(removed.map(|item| item.catalog_id), Some("b".to_string()));
        assert_eq!(ranks_by_catalog(&store).await, expected(&["a", "c", "d"]));
    }

    #[tokio::test]
    async fn test_remove_unknown_id_is_noop() {
        let (maintainer, store) = maintainer_with(vec![movie("a", 1), movie("b", 2)]);

        let removed = maintainer.remove(Uuid::new_v4()).await.unwrap();

        assert!(removed.is_none());
        assert_eq!(ranks_by_catalog(&store).await, expected(&["a", "b"]));
    }

    #[tokio::test]
    async fn test_remove_leaves_other_partition_untouched() {
        let mut show = movie("s", 1);
        show.media_type = MediaType::Show;
        let show_id = show.id;
        let items = vec![movie("a", 1), movie("b", 2), show];
        let target = items[0].id;
        let (maintainer, store) = maintainer_with(items);

        maintainer.remove(target).await.unwrap();

        assert_eq!(store.get(show_id).await.unwrap().unwrap().rank, 1);
        assert_eq!(ranks_by_catalog(&store).await, expected(&["b"]));
    }

    #[tokio::test]
    async fn test_reorder_subrange_keeps_pinned_top() {
        let items: Vec<RankedItem> = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .enumerate()
            .map(|(i, id)| movie(id, i as u32 + 1))
            .collect();
        let ids: Vec<Uuid> = items.iter().map(|item| item.id).collect();
        let (maintainer, store) = maintainer_with(items);

        // Drag "f" to the top of the unpinned block 4..=6
        let new_order = vec![ids[5], ids[3], ids[4]];
        maintainer.reorder(MediaType::Movie, &new_order, 4).await.unwrap();

        assert_eq!(
            ranks_by_catalog(&store).await,
            expected(&["a", "b", "c", "f", "d", "e"])
        );
    }

    #[tokio::test]
    async fn test_reorder_rejects_ids_outside_block() {
        let items = vec![movie("a", 1), movie("b", 2), movie("c", 3)];
        let ids: Vec<Uuid> = items.iter().map(|item| item.id).collect();
        let (maintainer, store) = maintainer_with(items);

        let result = maintainer.reorder(MediaType::Movie, &[ids[0], ids[2]], 2).await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert_eq!(ranks_by_catalog(&store).await, expected(&["a", "b", "c"]));
    }

    #[tokio::test]
    async fn test_reorder_rejects_zero_start_and_duplicates() {
        let items = vec![movie("a", 1), movie("b", 2)];
        let ids: Vec<Uuid> = items.iter().map(|item| item.id).collect();
        let (maintainer, _store) = maintainer_with(items);

        assert!(maintainer.reorder(MediaType::Movie, &ids, 0).await.is_err());
        assert!(maintainer
            .reorder(MediaType::Movie, &[ids[0], ids[0]], 1)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_density_holds_across_mixed_operations() {
        let (maintainer, store) = maintainer_with(Vec::new());
        let mut ids = Vec::new();

        for (n, target) in [1u32, 1, 3, 2, 5, 4, 1].iter().enumerate() {
            let item = maintainer
                .insert_at(movie(&format!("m{}", n), 0), *target)
                .await
                .unwrap();
            ids.push(item.id);
        }
        maintainer.remove(ids[2]).await.unwrap();
        maintainer.remove(ids[2]).await.unwrap();
        maintainer.remove(ids[5]).await.unwrap();

        let partition = store.list_partition(MediaType::Movie).await.unwrap();
        let block: Vec<Uuid> = partition.iter().skip(1).rev().map(|item| item.id).collect();
        maintainer.reorder(MediaType::Movie, &block, 2).await.unwrap();

        let ranks: Vec<u32> = store
            .list_partition(MediaType::Movie)
            .await
            .unwrap()
            .iter()
            .map(|item| item.rank)
            .collect();
        assert_eq!(ranks, (1..=5).collect::<Vec<u32>>());
    }

    /// Wraps the in-memory store to inject mid-operation faults
    struct FaultyStore {
        inner: InMemoryRankStore,
        vanish_on_shift: Option<Uuid>,
        fail_insert: bool,
    }

    impl FaultyStore {
        fn vanishing(items: Vec<RankedItem>, vanish: Uuid) -> Self {
            Self {
                inner: InMemoryRankStore::with_items(items),
                vanish_on_shift: Some(vanish),
                fail_insert: false,
            }
        }

        fn rejecting_inserts(items: Vec<RankedItem>) -> Self {
            Self {
                inner: InMemoryRankStore::with_items(items),
                vanish_on_shift: None,
                fail_insert: true,
            }
        }
    }

    #[async_trait::async_trait]
    impl RankStore for FaultyStore {
        async fn list_partition(&self, media_type: MediaType) -> AppResult<Vec<RankedItem>> {
            self.inner.list_partition(media_type).await
        }

        async fn list_all(&self) -> AppResult<Vec<RankedItem>> {
            self.inner.list_all().await
        }

        async fn get(&self, id: Uuid) -> AppResult<Option<RankedItem>> {
            self.inner.get(id).await
        }

        async fn find_by_catalog_id(
            &self,
            catalog_id: &str,
            media_type: MediaType,
        ) -> AppResult<Option<RankedItem>> {
            self.inner.find_by_catalog_id(catalog_id, media_type).await
        }

        async fn insert(&self, item: RankedItem) -> AppResult<()> {
            if self.fail_insert {
                return Err(AppError::Internal("connection reset".to_string()));
            }
            self.inner.insert(item).await
        }

        async fn remove(&self, id: Uuid) -> AppResult<Option<RankedItem>> {
            self.inner.remove(id).await
        }

        async fn set_rank(&self, id: Uuid, rank: u32) -> AppResult<bool> {
            if self.vanish_on_shift == Some(id) {
                self.inner.remove(id).await?;
            }
            self.inner.set_rank(id, rank).await
        }

        async fn set_tier(&self, id: Uuid, tier: crate::models::Tier) -> AppResult<bool> {
            self.inner.set_tier(id, tier).await
        }

        async fn set_review(&self, id: Uuid, review: Option<String>) -> AppResult<bool> {
            self.inner.set_review(id, review).await
        }

        async fn set_metadata(
            &self,
            id: Uuid,
            metadata: &crate::models::TitleMetadata,
        ) -> AppResult<bool> {
            self.inner.set_metadata(id, metadata).await
        }

        fn name(&self) -> &'static str {
            "faulty"
        }
    }

    fn four_movies() -> Vec<RankedItem> {
        ["a", "b", "c", "d"]
            .iter()
            .enumerate()
            .map(|(i, id)| movie(id, i as u32 + 1))
            .collect()
    }

    #[tokio::test]
    async fn test_insert_skips_record_deleted_mid_shift() {
        let items = four_movies();
        let last = items[3].id;
        let store = Arc::new(FaultyStore::vanishing(items, last));
        let maintainer = RankMaintainer::new(store.clone());

        let inserted = maintainer.insert_at(movie("new", 0), 2).await.unwrap();

        assert_eq!(inserted.rank, 2);
        assert_eq!(
            ranks_by_catalog(&store.inner).await,
            expected(&["a", "new", "b", "c"])
        );
        assert!(store.get(last).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_skips_record_deleted_mid_compaction() {
        let items = four_movies();
        let first = items[0].id;
        let last = items[3].id;
        let store = Arc::new(FaultyStore::vanishing(items, last));
        let maintainer = RankMaintainer::new(store.clone());

        let removed = maintainer.remove(first).await.unwrap();

        assert_eq!(removed.map(|item| item.catalog_id), Some("a".to_string()));
        assert_eq!(ranks_by_catalog(&store.inner).await, expected(&["b", "c"]));
    }

    #[tokio::test]
    async fn test_failed_insert_after_shift_surfaces_error() {
        let store = Arc::new(FaultyStore::rejecting_inserts(four_movies()));
        let maintainer = RankMaintainer::new(store.clone());

        let result = maintainer.insert_at(movie("new", 0), 2).await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        let ranks: Vec<u32> = store
            .list_partition(MediaType::Movie)
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.rank)
            .collect();
        assert_eq!(ranks, vec![1, 3, 4, 5]);
    }
}
