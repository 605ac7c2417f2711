use std::sync::Arc;

use axum::{extract::State, Json};

use crate::{error::AppResult, models::TasteProfile, routes::AppState, services::taste};

/// Taste profile over every ranked item
pub async fn taste(State(state): State<Arc<AppState>>) -> AppResult<Json<TasteProfile>> {
    let items = state.store.list_all().await?;
    let profile = taste::classify_now(&items);

    tracing::debug!(
        archetype = ?profile.archetype,
        items = items.len(),
        "Taste profile computed"
    );

    Ok(Json(profile))
}
