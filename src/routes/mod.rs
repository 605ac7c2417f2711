use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    db::{InMemoryRankStore, RankStore},
    services::{providers::MetadataProvider, BackfillService, PlacementService, RankMaintainer},
};

pub mod items;
pub mod placements;
pub mod profile;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RankStore>,
    pub maintainer: RankMaintainer,
    pub placements: PlacementService,
    /// Absent when no metadata provider is configured
    pub backfill: Option<BackfillService>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RankStore>,
        metadata_provider: Option<Arc<dyn MetadataProvider>>,
    ) -> Self {
        Self {
            maintainer: RankMaintainer::new(store.clone()),
            placements: PlacementService::new(store.clone()),
            backfill: metadata_provider
                .map(|provider| BackfillService::new(store.clone(), provider)),
            store,
        }
    }

    /// Empty process-local state without metadata backfill
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryRankStore::new()), None)
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/items", get(items::list))
        .route("/items/reorder", post(items::reorder))
        .route("/items/backfill", post(items::backfill_missing))
        .route("/items/:id", get(items::get).delete(items::remove))
        .route("/items/:id/tier", patch(items::update_tier))
        .route("/items/:id/review", put(items::update_review))
        .route("/items/:id/backfill", post(items::backfill_item))
        .route("/placements", post(placements::start))
        .route(
            "/placements/:id",
            get(placements::current).delete(placements::cancel),
        )
        .route("/placements/:id/decision", post(placements::decide))
        .route("/profile/taste", get(profile::taste))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Request span carrying the id set by `SetRequestIdLayer`
fn make_span_with_request_id(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}
