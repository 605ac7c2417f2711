use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{BackfillReport, MediaType, RankedItem, RankedItemView, Tier},
    routes::AppState,
    services::{scoring, BackfillService},
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    media_type: Option<MediaType>,
}

#[derive(Debug, Deserialize)]
pub struct TierUpdate {
    tier: Tier,
}

#[derive(Debug, Deserialize)]
pub struct ReviewUpdate {
    review: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    media_type: MediaType,
    starting_rank: u32,
    ordered_ids: Vec<Uuid>,
}

/// Lists ranked items with their scores, optionally for one media type
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<Vec<RankedItemView>>> {
    let items = match params.media_type {
        Some(media_type) => state.store.list_partition(media_type).await?,
        None => state.store.list_all().await?,
    };
    Ok(Json(scoring::with_scores(items)))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RankedItemView>> {
    let item = find(&state, id).await?;
    Ok(Json(scored(&state, item).await?))
}

/// Deletes an item and closes the gap it leaves. Unknown ids are a no-op.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.maintainer.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Moves an item to another tier without touching its rank
pub async fn update_tier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<TierUpdate>,
) -> AppResult<Json<RankedItemView>> {
    if !state.store.set_tier(id, body.tier).await? {
        return Err(item_not_found(id));
    }
    tracing::info!(item_id = %id, tier = %body.tier, "Tier changed");

    let item = find(&state, id).await?;
    Ok(Json(scored(&state, item).await?))
}

pub async fn update_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<ReviewUpdate>,
) -> AppResult<Json<RankedItemView>> {
    let review = body
        .review
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());

    if !state.store.set_review(id, review).await? {
        return Err(item_not_found(id));
    }

    let item = find(&state, id).await?;
    Ok(Json(scored(&state, item).await?))
}

/// Applies a drag-and-drop reorder and returns the updated partition
pub async fn reorder(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ReorderRequest>,
) -> AppResult<Json<Vec<RankedItemView>>> {
    let partition = state
        .maintainer
        .reorder(body.media_type, &body.ordered_ids, body.starting_rank)
        .await?;
    Ok(Json(scoring::with_scores(partition)))
}

pub async fn backfill_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RankedItemView>> {
    let item = backfill_service(&state)?.backfill_item(id).await?;
    Ok(Json(scored(&state, item).await?))
}

pub async fn backfill_missing(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<BackfillReport>> {
    let report = backfill_service(&state)?.backfill_missing().await?;
    Ok(Json(report))
}

async fn find(state: &AppState, id: Uuid) -> AppResult<RankedItem> {
    state
        .store
        .get(id)
        .await?
        .ok_or_else(|| item_not_found(id))
}

/// Scores an item against the current state of its partition
async fn scored(state: &AppState, item: RankedItem) -> AppResult<RankedItemView> {
    let partition = state.store.list_partition(item.media_type).await?;
    let score = scoring::score(&item, &partition);
    Ok(RankedItemView { item, score })
}

fn backfill_service(state: &AppState) -> AppResult<&BackfillService> {
    state.backfill.as_ref().ok_or_else(|| {
        AppError::Unavailable("Metadata backfill is not configured".to_string())
    })
}

fn item_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Ranked item {} not found", id))
}
