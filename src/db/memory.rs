use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::RankStore,
    error::{AppError, AppResult},
    models::{MediaType, RankedItem, Tier, TitleMetadata},
};

/// Process-local rank store
///
/// Backs development runs and every test that exercises the engine without a
/// database.
#[derive(Default)]
pub struct InMemoryRankStore {
    items: RwLock<HashMap<Uuid, RankedItem>>,
}

impl InMemoryRankStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with existing records, bypassing duplicate checks
    pub fn with_items(items: Vec<RankedItem>) -> Self {
        Self {
            items: RwLock::new(items.into_iter().map(|item| (item.id, item)).collect()),
        }
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> AppResult<bool>
    where
        F: FnOnce(&mut RankedItem) + Send,
    {
        let mut items = self.items.write().await;
        match items.get_mut(&id) {
            Some(item) => {
                apply(item);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait::async_trait]
impl RankStore for InMemoryRankStore {
    async fn list_partition(&self, media_type: MediaType) -> AppResult<Vec<RankedItem>> {
        let items = self.items.read().await;
        let mut partition: Vec<RankedItem> = items
            .values()
            .filter(|item| item.media_type == media_type)
            .cloned()
            .collect();
        partition.sort_by_key(|item| item.rank);
        Ok(partition)
    }

    async fn list_all(&self) -> AppResult<Vec<RankedItem>> {
        let items = self.items.read().await;
        let mut all: Vec<RankedItem> = items.values().cloned().collect();
        all.sort_by_key(|item| (item.media_type.as_str(), item.rank));
        Ok(all)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<RankedItem>> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn find_by_catalog_id(
        &self,
        catalog_id: &str,
        media_type: MediaType,
    ) -> AppResult<Option<RankedItem>> {
        let items = self.items.read().await;
        Ok(items
            .values()
            .find(|item| item.catalog_id == catalog_id && item.media_type == media_type)
            .cloned())
    }

    async fn insert(&self, item: RankedItem) -> AppResult<()> {
        let mut items = self.items.write().await;
        let duplicate = items
            .values()
            .any(|existing| {
                existing.catalog_id == item.catalog_id && existing.media_type == item.media_type
            });
        if duplicate {
            return Err(AppError::DuplicateItem {
                catalog_id: item.catalog_id,
                media_type: item.media_type,
            });
        }
        items.insert(item.id, item);
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> AppResult<Option<RankedItem>> {
        Ok(self.items.write().await.remove(&id))
    }

    async fn set_rank(&self, id: Uuid, rank: u32) -> AppResult<bool> {
        self.update(id, |item| item.rank = rank).await
    }

    async fn set_tier(&self, id: Uuid, tier: Tier) -> AppResult<bool> {
        self.update(id, |item| item.tier = tier).await
    }

    async fn set_review(&self, id: Uuid, review: Option<String>) -> AppResult<bool> {
        self.update(id, |item| item.review = review).await
    }

    async fn set_metadata(&self, id: Uuid, metadata: &TitleMetadata) -> AppResult<bool> {
        let genre_names = metadata.genre_names.clone();
        let runtime_minutes = metadata.runtime_minutes;
        self.update(id, |item| {
            item.genre_names = genre_names;
            item.runtime_minutes = runtime_minutes;
        })
        .await
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
