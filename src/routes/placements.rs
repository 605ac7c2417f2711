use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{ComparisonOutcome, NewRankedItem, PlacementProgress},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct Decision {
    outcome: ComparisonOutcome,
}

/// Starts placing a title; returns the first comparison or the placed item
pub async fn start(
    State(state): State<Arc<AppState>>,
    Json(candidate): Json<NewRankedItem>,
) -> AppResult<(StatusCode, Json<PlacementProgress>)> {
    let progress = state.placements.start(candidate).await?;
    let status = match progress {
        PlacementProgress::Placed { .. } => StatusCode::CREATED,
        PlacementProgress::Comparing { .. } => StatusCode::OK,
    };
    Ok((status, Json(progress)))
}

pub async fn current(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PlacementProgress>> {
    Ok(Json(state.placements.current(id).await?))
}

/// Records whether the new title is better or worse than the shown opponent
pub async fn decide(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<Decision>,
) -> AppResult<Json<PlacementProgress>> {
    Ok(Json(state.placements.decide(id, body.outcome).await?))
}

pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.placements.cancel(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
