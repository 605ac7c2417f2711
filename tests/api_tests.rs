use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use watchrank_api::routes::{create_router, AppState};

fn create_test_server() -> TestServer {
    let state = AppState::in_memory();
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

/// Places a title, answering "worse" to every comparison so it lands last
async fn append(server: &TestServer, catalog_id: &str, media_type: &str, tier: &str) -> Value {
    let mut progress: Value = server
        .post("/api/v1/placements")
        .json(&json!({
            "catalog_id": catalog_id,
            "title": format!("Title {}", catalog_id),
            "media_type": media_type,
            "tier": tier,
        }))
        .await
        .json();

    while progress["status"] == "comparing" {
        let session_id = progress["session_id"].as_str().unwrap().to_string();
        progress = server
            .post(&format!("/api/v1/placements/{}/decision", session_id))
            .json(&json!({ "outcome": "worse" }))
            .await
            .json();
    }

    assert_eq!(progress["status"], "placed");
    progress["item"].clone()
}

async fn list(server: &TestServer, media_type: &str) -> Vec<Value> {
    server
        .get("/api/v1/items")
        .add_query_param("media_type", media_type)
        .await
        .json()
}

fn catalog_ids(items: &[Value]) -> Vec<&str> {
    items
        .iter()
        .map(|item| item["catalog_id"].as_str().unwrap())
        .collect()
}

fn ranks(items: &[Value]) -> Vec<u64> {
    items
        .iter()
        .map(|item| item["rank"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_first_title_is_placed_without_comparisons() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/placements")
        .json(&json!({
            "catalog_id": "603",
            "title": "The Matrix",
            "media_type": "movie",
            "tier": "good",
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let progress: Value = response.json();
    assert_eq!(progress["status"], "placed");
    assert_eq!(progress["item"]["rank"], 1);
    assert_eq!(progress["item"]["comparison_count"], 0);
}

#[tokio::test]
async fn test_placement_by_comparison_over_http() {
    let server = create_test_server();
    for id in ["a", "b", "c"] {
        append(&server, id, "movie", "good").await;
    }

    let response = server
        .post("/api/v1/placements")
        .json(&json!({
            "catalog_id": "new",
            "title": "Newcomer",
            "media_type": "movie",
            "tier": "good",
        }))
        .await;
    response.assert_status_ok();
    let progress: Value = response.json();
    assert_eq!(progress["status"], "comparing");
    assert_eq!(progress["opponent"]["catalog_id"], "b");
    assert_eq!(progress["comparison_number"], 1);
    let session_id = progress["session_id"].as_str().unwrap().to_string();

    let progress: Value = server
        .post(&format!("/api/v1/placements/{}/decision", session_id))
        .json(&json!({ "outcome": "better" }))
        .await
        .json();
    assert_eq!(progress["status"], "comparing");
    assert_eq!(progress["opponent"]["catalog_id"], "a");

    let progress: Value = server
        .post(&format!("/api/v1/placements/{}/decision", session_id))
        .json(&json!({ "outcome": "worse" }))
        .await
        .json();
    assert_eq!(progress["status"], "placed");
    assert_eq!(progress["item"]["rank"], 2);
    assert_eq!(progress["item"]["comparison_count"], 2);

    let items = list(&server, "movie").await;
    assert_eq!(catalog_ids(&items), vec!["a", "new", "b", "c"]);
    assert_eq!(ranks(&items), vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_session_state_can_be_read_back() {
    let server = create_test_server();
    append(&server, "a", "movie", "good").await;

    let started: Value = server
        .post("/api/v1/placements")
        .json(&json!({
            "catalog_id": "b",
            "title": "Second",
            "media_type": "movie",
            "tier": "bad",
        }))
        .await
        .json();
    let session_id = started["session_id"].as_str().unwrap().to_string();

    let response = server
        .get(&format!("/api/v1/placements/{}", session_id))
        .await;
    response.assert_status_ok();
    let current: Value = response.json();
    assert_eq!(current["opponent"]["catalog_id"], "a");
    assert_eq!(current["candidate_title"], "Second");
}

#[tokio::test]
async fn test_duplicate_title_is_rejected() {
    let server = create_test_server();
    append(&server, "603", "movie", "good").await;

    let response = server
        .post("/api/v1/placements")
        .json(&json!({
            "catalog_id": "603",
            "title": "The Matrix",
            "media_type": "movie",
            "tier": "medium",
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("603"));
}

#[tokio::test]
async fn test_same_catalog_id_allowed_across_media_types() {
    let server = create_test_server();
    append(&server, "100", "movie", "good").await;
    let show = append(&server, "100", "show", "good").await;

    assert_eq!(show["rank"], 1);
    assert_eq!(list(&server, "show").await.len(), 1);
}

#[tokio::test]
async fn test_missing_title_is_bad_request() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/placements")
        .json(&json!({
            "catalog_id": "603",
            "title": "  ",
            "media_type": "movie",
            "tier": "good",
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancelled_session_leaves_ranking_untouched() {
    let server = create_test_server();
    append(&server, "a", "movie", "good").await;
    append(&server, "b", "movie", "good").await;

    let started: Value = server
        .post("/api/v1/placements")
        .json(&json!({
            "catalog_id": "c",
            "title": "Abandoned",
            "media_type": "movie",
            "tier": "good",
        }))
        .await
        .json();
    let session_id = started["session_id"].as_str().unwrap().to_string();

    server
        .delete(&format!("/api/v1/placements/{}", session_id))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .post(&format!("/api/v1/placements/{}/decision", session_id))
        .json(&json!({ "outcome": "better" }))
        .await
        .assert_status_not_found();

    assert_eq!(catalog_ids(&list(&server, "movie").await), vec!["a", "b"]);
}

#[tokio::test]
async fn test_delete_compacts_ranks() {
    let server = create_test_server();
    let mut items = Vec::new();
    for id in ["a", "b", "c", "d"] {
        items.push(append(&server, id, "movie", "good").await);
    }
    let second = items[1]["id"].as_str().unwrap().to_string();

    server
        .delete(&format!("/api/v1/items/{}", second))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let remaining = list(&server, "movie").await;
    assert_eq!(catalog_ids(&remaining), vec!["a", "c", "d"]);
    assert_eq!(ranks(&remaining), vec![1, 2, 3]);

    server
        .delete(&format!("/api/v1/items/{}", second))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert_eq!(list(&server, "movie").await.len(), 3);
}

#[tokio::test]
async fn test_scores_follow_rank_within_tier() {
    let server = create_test_server();
    for id in ["a", "b", "c", "d"] {
        append(&server, id, "movie", "good").await;
    }

    let scores: Vec<f64> = list(&server, "movie")
        .await
        .iter()
        .map(|item| item["score"].as_f64().unwrap())
        .collect();

    assert_eq!(scores, vec![10.0, 9.0, 8.0, 7.0]);
}

#[tokio::test]
async fn test_reorder_block() {
    let server = create_test_server();
    let mut items = Vec::new();
    for id in ["a", "b", "c", "d"] {
        items.push(append(&server, id, "movie", "good").await);
    }
    let id_of = |index: usize| items[index]["id"].as_str().unwrap().to_string();

    let response = server
        .post("/api/v1/items/reorder")
        .json(&json!({
            "media_type": "movie",
            "starting_rank": 2,
            "ordered_ids": [id_of(2), id_of(1)],
        }))
        .await;
    response.assert_status_ok();
    let partition: Vec<Value> = response.json();
    assert_eq!(catalog_ids(&partition), vec!["a", "c", "b", "d"]);
    assert_eq!(ranks(&partition), vec![1, 2, 3, 4]);

    let response = server
        .post("/api/v1/items/reorder")
        .json(&json!({
            "media_type": "movie",
            "starting_rank": 1,
            "ordered_ids": [id_of(3), id_of(0)],
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tier_change_keeps_rank_and_rescores() {
    let server = create_test_server();
    append(&server, "a", "movie", "good").await;
    let second = append(&server, "b", "movie", "good").await;
    let id = second["id"].as_str().unwrap().to_string();

    let response = server
        .patch(&format!("/api/v1/items/{}/tier", id))
        .json(&json!({ "tier": "bad" }))
        .await;
    response.assert_status_ok();
    let updated: Value = response.json();

    assert_eq!(updated["tier"], "bad");
    assert_eq!(updated["rank"], 2);
    assert_eq!(updated["score"], 3.9);
}

#[tokio::test]
async fn test_review_is_trimmed_and_cleared() {
    let server = create_test_server();
    let item = append(&server, "a", "movie", "good").await;
    let id = item["id"].as_str().unwrap().to_string();

    let updated: Value = server
        .put(&format!("/api/v1/items/{}/review", id))
        .json(&json!({ "review": "  Still holds up.  " }))
        .await
        .json();
    assert_eq!(updated["review"], "Still holds up.");

    let cleared: Value = server
        .put(&format!("/api/v1/items/{}/review", id))
        .json(&json!({ "review": "" }))
        .await
        .json();
    assert!(cleared["review"].is_null());
}

#[tokio::test]
async fn test_unknown_item_is_not_found() {
    let server = create_test_server();
    let missing = uuid::Uuid::new_v4();

    server
        .get(&format!("/api/v1/items/{}", missing))
        .await
        .assert_status_not_found();
    server
        .patch(&format!("/api/v1/items/{}/tier", missing))
        .json(&json!({ "tier": "good" }))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_backfill_without_provider_is_unavailable() {
    let server = create_test_server();

    server
        .post("/api/v1/items/backfill")
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_taste_profile_needs_five_items() {
    let server = create_test_server();
    for id in ["a", "b", "c", "d"] {
        append(&server, id, "movie", "good").await;
    }

    let profile: Value = server.get("/api/v1/profile/taste").await.json();
    assert_eq!(profile["archetype"], "getting_started");
}

#[tokio::test]
async fn test_taste_profile_enthusiast() {
    let server = create_test_server();
    for id in ["a", "b", "c", "d", "e"] {
        append(&server, id, "movie", "good").await;
    }
    append(&server, "f", "movie", "bad").await;

    let response = server.get("/api/v1/profile/taste").await;
    response.assert_status_ok();
    let profile: Value = response.json();
    assert_eq!(profile["archetype"], "enthusiast");
    assert_eq!(profile["dna"]["movie_count"], 6);
}
