//! End-to-end tests for the HTTP API
//!
//! Each test builds the full router over a seeded temporary database and
//! drives it with in-process requests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use review_pulse::config::AppConfig;
use review_pulse::db::Database;
use review_pulse::metrics::MetricsCollector;
use review_pulse::repository::{SqliteBusinessRepository, SqliteReviewRepository};
use review_pulse::routes::build_router;
use review_pulse::service::{AnalyticsService, BusinessService};
use review_pulse::state::AppState;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

fn build_app() -> (TempDir, Arc<Database>, Router) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("api.db");
    let db = Arc::new(Database::new(path.to_str().unwrap()).expect("Failed to open database"));

    let metrics = MetricsCollector::default();
    let business_repo = Arc::new(SqliteBusinessRepository::new(Arc::clone(&db), metrics));
    let review_repo = Arc::new(SqliteReviewRepository::new(Arc::clone(&db), metrics));

    let businesses = Arc::new(BusinessService::new(
        business_repo.clone(),
        review_repo.clone(),
        AppConfig::default().api,
    ));
    let analytics = Arc::new(AnalyticsService::new(review_repo, business_repo));

    let state = AppState::new(businesses, analytics);
    let router = build_router(state, &["*".to_string()]);
    (dir, db, router)
}

fn seed(db: &Database, sql: &str) {
    let conn = db.get_connection().expect("Failed to get connection");
    conn.execute_batch(sql).expect("Failed to seed data");
}

fn seed_sample_dataset(db: &Database) {
    seed(
        db,
        "INSERT INTO businesses (business_id, name, city, state, latitude, longitude, review_count, stars, categories) VALUES
             ('b1', 'Luigi Pizza', 'Philadelphia', 'PA', 39.95, -75.16, 120, 4.5, 'Pizza, Italian'),
             ('b2', 'Corner Deli', 'Philadelphia', 'PA', 39.96, -75.17, 40, 3.5, 'Delis'),
             ('b3', 'Beach Tacos', 'Santa Barbara', 'CA', 34.42, -119.70, 80, 4.0, 'Mexican');
         INSERT INTO reviews (review_id, business_id, stars, date, sentiment_score_prob_diff, sentiment_score_expected) VALUES
             ('r1', 'b1', 4.0, '2023-01-10', 0.8, 0.6),
             ('r2', 'b1', 5.0, '2023-01-20', 0.9, 0.7),
             ('r3', 'b1', 3.0, '2023-02-05', 0.2, 0.1),
             ('r4', 'b2', 2.0, '2023-01-15', -0.4, -0.3);
         INSERT INTO photos (photo_id, business_id, label) VALUES
             ('p1', 'b1', 'food'),
             ('p2', 'b1', 'inside');",
    );
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .expect("Request failed");

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response was not JSON")
    };
    (status, body)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (_dir, _db, router) = build_app();

    let (status, body) = get(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["name"], "review-pulse");
}

#[tokio::test]
async fn test_get_business_by_id() {
    let (_dir, db, router) = build_app();
    seed_sample_dataset(&db);

    let (status, body) = get(&router, "/api/v1/businesses/b1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["business_id"], "b1");
    assert_eq!(body["name"], "Luigi Pizza");
    assert_eq!(body["state"], "PA");
    assert_eq!(body["stars"], 4.5);
}

#[tokio::test]
async fn test_unknown_business_returns_error_envelope() {
    let (_dir, db, router) = build_app();
    seed_sample_dataset(&db);

    let (status, body) = get(&router, "/api/v1/businesses/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["error"]["status"], 404);
    assert!(body["error"]["message"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn test_list_businesses_with_state_filter() {
    let (_dir, db, router) = build_app();
    seed_sample_dataset(&db);

    let (status, body) = get(&router, "/api/v1/businesses?state=pa").await;
    assert_eq!(status, StatusCode::OK);
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 2);
    // Ordered by stars descending
    assert_eq!(results[0]["business_id"], "b1");
    assert_eq!(results[1]["business_id"], "b2");
}

#[tokio::test]
async fn test_list_businesses_rejects_zero_limit() {
    let (_dir, db, router) = build_app();
    seed_sample_dataset(&db);

    let (status, body) = get(&router, "/api/v1/businesses?limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_PARAMETER");
}

#[tokio::test]
async fn test_viewport_returns_businesses_in_bounds() {
    let (_dir, db, router) = build_app();
    seed_sample_dataset(&db);

    let (status, body) = get(
        &router,
        "/api/v1/businesses/viewport?south=39.9&north=40.0&west=-75.3&east=-75.1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_viewport_rejects_inverted_bounds() {
    let (_dir, db, router) = build_app();
    seed_sample_dataset(&db);

    let (status, body) = get(
        &router,
        "/api/v1/businesses/viewport?south=40.0&north=39.9&west=-75.3&east=-75.1",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_PARAMETER");
}

#[tokio::test]
async fn test_search_ranks_exact_match_first() {
    let (_dir, db, router) = build_app();
    seed_sample_dataset(&db);

    let (status, body) = get(&router, "/api/v1/businesses/search?q=luigi%20pizza").await;
    assert_eq!(status, StatusCode::OK);
    let results = body.as_array().unwrap();
    assert!(!results.is_empty());
    assert_eq!(results[0]["business_id"], "b1");
}

#[tokio::test]
async fn test_states_and_cities_endpoints() {
    let (_dir, db, router) = build_app();
    seed_sample_dataset(&db);

    let (status, body) = get(&router, "/api/v1/locations/states").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!(["CA", "PA"]));

    let (status, body) = get(&router, "/api/v1/locations/cities?state=pa").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!(["Philadelphia"]));
}

#[tokio::test]
async fn test_cities_rejects_bad_state_code() {
    let (_dir, db, router) = build_app();
    seed_sample_dataset(&db);

    let (status, body) = get(&router, "/api/v1/locations/cities?state=Pennsylvania").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_PARAMETER");
}

#[tokio::test]
async fn test_business_reviews_newest_first() {
    let (_dir, db, router) = build_app();
    seed_sample_dataset(&db);

    let (status, body) = get(&router, "/api/v1/businesses/b1/reviews").await;
    assert_eq!(status, StatusCode::OK);
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["review_id"], "r3");
    assert_eq!(results[0]["date"], "2023-02-05");
}

#[tokio::test]
async fn test_reviews_for_unknown_business_is_404() {
    let (_dir, db, router) = build_app();
    seed_sample_dataset(&db);

    let (status, body) = get(&router, "/api/v1/businesses/nope/reviews").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_business_photos() {
    let (_dir, db, router) = build_app();
    seed_sample_dataset(&db);

    let (status, body) = get(&router, "/api/v1/businesses/b1/photos").await;
    assert_eq!(status, StatusCode::OK);
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["label"], "food");

    // A known business without photos yields an empty list, not an error
    let (status, body) = get(&router, "/api/v1/businesses/b2/photos").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_ratings_timeline_defaults_to_monthly() {
    let (_dir, db, router) = build_app();
    seed_sample_dataset(&db);

    let (status, body) = get(&router, "/api/v1/analytics/business/b1/ratings-timeline").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["business_id"], "b1");
    assert_eq!(body["business_name"], "Luigi Pizza");
    assert_eq!(body["period"], "month");
    assert_eq!(body["metric"], "rating");

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["period_start"], "2023-01-01");
    assert_eq!(data[0]["avg_rating"], 4.5);
    assert_eq!(data[0]["review_count"], 2);
    assert_eq!(data[1]["period_start"], "2023-02-01");
}

#[tokio::test]
async fn test_ratings_timeline_honors_date_window() {
    let (_dir, db, router) = build_app();
    seed_sample_dataset(&db);

    let (status, body) = get(
        &router,
        "/api/v1/analytics/business/b1/ratings-timeline?start_date=2023-02-01&end_date=2023-02-28",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["start_date"], "2023-02-01");
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["period_start"], "2023-02-01");
}

#[tokio::test]
async fn test_timeline_rejects_invalid_period() {
    let (_dir, db, router) = build_app();
    seed_sample_dataset(&db);

    let (status, body) = get(
        &router,
        "/api/v1/analytics/business/b1/ratings-timeline?period=decade",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_PARAMETER");
}

#[tokio::test]
async fn test_timeline_rejects_malformed_date() {
    let (_dir, db, router) = build_app();
    seed_sample_dataset(&db);

    let (status, body) = get(
        &router,
        "/api/v1/analytics/business/b1/ratings-timeline?start_date=01-10-2023",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_PARAMETER");
}

#[tokio::test]
async fn test_sentiment_timeline() {
    let (_dir, db, router) = build_app();
    seed_sample_dataset(&db);

    let (status, body) = get(
        &router,
        "/api/v1/analytics/business/b1/sentiment-timeline?period=month",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metric"], "sentiment");

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    let january_score = data[0]["avg_sentiment_score"].as_f64().unwrap();
    assert!((january_score - 0.85).abs() < 1e-9);
}

#[tokio::test]
async fn test_city_comparison_defaults_to_rating_metric() {
    let (_dir, db, router) = build_app();
    seed_sample_dataset(&db);

    let (status, body) = get(&router, "/api/v1/analytics/business/b1/comparison/city").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["business_id"], "b1");
    assert_eq!(body["city"], "Philadelphia");
    assert_eq!(body["state"], "PA");
    assert_eq!(body["metric"], "rating");

    let own = body["business_data"].as_array().unwrap();
    let city = body["city_average"].as_array().unwrap();
    assert_eq!(own.len(), 2);
    assert!(own.iter().all(|p| p["business_count"] == 1));
    // January city average includes b2's review
    assert_eq!(city[0]["period_start"], "2023-01-01");
    let january_avg = city[0]["avg_rating"].as_f64().unwrap();
    assert!((january_avg - (4.0 + 5.0 + 2.0) / 3.0).abs() < 1e-9);
    assert_eq!(city[0]["business_count"], 2);
}

#[tokio::test]
async fn test_state_comparison_with_sentiment_metric() {
    let (_dir, db, router) = build_app();
    seed_sample_dataset(&db);

    let (status, body) = get(
        &router,
        "/api/v1/analytics/business/b1/comparison/state?metric=sentiment&period=month",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "PA");
    assert_eq!(body["metric"], "sentiment");
    let own = body["business_data"].as_array().unwrap();
    let state_avg = body["state_average"].as_array().unwrap();
    assert_eq!(own.len(), 2);
    assert!(!state_avg.is_empty());
}

#[tokio::test]
async fn test_comparison_rejects_invalid_metric() {
    let (_dir, db, router) = build_app();
    seed_sample_dataset(&db);

    let (status, body) = get(
        &router,
        "/api/v1/analytics/business/b1/comparison/city?metric=stars",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_PARAMETER");
}

#[tokio::test]
async fn test_city_ratings_timeline_route() {
    let (_dir, db, router) = build_app();
    seed_sample_dataset(&db);

    let (status, body) = get(
        &router,
        "/api/v1/analytics/city/pa/Philadelphia/ratings-timeline",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "Philadelphia");
    assert_eq!(body["state"], "PA");

    let data = body["data"].as_array().unwrap();
    assert_eq!(data[0]["period_start"], "2023-01-01");
    assert_eq!(data[0]["business_count"], 2);
}

#[tokio::test]
async fn test_state_ratings_timeline_route() {
    let (_dir, db, router) = build_app();
    seed_sample_dataset(&db);

    let (status, body) = get(&router, "/api/v1/analytics/state/PA/ratings-timeline?period=year").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "PA");

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["period_start"], "2023-01-01");
    assert_eq!(data[0]["review_count"], 4);
}

#[tokio::test]
async fn test_unknown_city_timeline_is_empty_not_404() {
    let (_dir, db, router) = build_app();
    seed_sample_dataset(&db);

    let (status, body) = get(
        &router,
        "/api/v1/analytics/city/NV/Nowhere/ratings-timeline",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}
