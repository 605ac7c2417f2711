use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::RankStore,
    error::{AppError, AppResult},
    models::{BackfillReport, RankedItem},
    services::providers::MetadataProvider,
};

/// Fills in genres and runtime for ranked items.
///
/// Only `genre_names` and `runtime_minutes` are written; rank, tier and score
/// never change here.
#[derive(Clone)]
pub struct BackfillService {
    store: Arc<dyn RankStore>,
    provider: Arc<dyn MetadataProvider>,
}

impl BackfillService {
    pub fn new(store: Arc<dyn RankStore>, provider: Arc<dyn MetadataProvider>) -> Self {
        Self { store, provider }
    }

    /// Fetches and stores metadata for one item
    pub async fn backfill_item(&self, id: Uuid) -> AppResult<RankedItem> {
        let item = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ranked item {} not found", id)))?;

        let metadata = self
            .provider
            .fetch_metadata(&item.catalog_id, item.media_type)
            .await?;

        if !self.store.set_metadata(id, &metadata).await? {
            return Err(AppError::NotFound(format!(
                "Ranked item {} was removed during backfill",
                id
            )));
        }

        tracing::info!(
            item_id = %id,
            provider = self.provider.name(),
            genres = metadata.genre_names.len(),
            runtime_minutes = metadata.runtime_minutes,
            "Backfilled item metadata"
        );

        Ok(RankedItem {
            genre_names: metadata.genre_names,
            runtime_minutes: metadata.runtime_minutes,
            ..item
        })
    }

    /// Backfills every item still missing genres or runtime.
    ///
    /// A failed lookup is logged and counted; the pass carries on with the
    /// remaining items.
    pub async fn backfill_missing(&self) -> AppResult<BackfillReport> {
        let pending: Vec<RankedItem> = self
            .store
            .list_all()
            .await?
            .into_iter()
            .filter(RankedItem::needs_backfill)
            .collect();

        let mut report = BackfillReport {
            attempted: pending.len(),
            ..BackfillReport::default()
        };

        for item in pending {
            match self
                .provider
                .fetch_metadata(&item.catalog_id, item.media_type)
                .await
            {
                Ok(metadata) => {
                    if self.store.set_metadata(item.id, &metadata).await? {
                        report.updated += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        item_id = %item.id,
                        catalog_id = %item.catalog_id,
                        error = %e,
                        "Metadata backfill failed for item"
                    );
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            provider = self.provider.name(),
            attempted = report.attempted,
            updated = report.updated,
            failed = report.failed,
            "Metadata backfill pass completed"
        );

        Ok(report)
    }
}
