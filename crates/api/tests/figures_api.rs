//! Integration tests for the `/figures` list and detail endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, seed_figure};
use sqlx::PgPool;

const SUMMARY_KEYS: [&str; 8] = [
    "id",
    "name",
    "title",
    "era",
    "birth_year",
    "death_year",
    "introduction",
    "image_intro",
];

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_returns_summary_projection_in_id_order(pool: PgPool) {
    seed_figure(&pool, 3, "Hypatia", "Late Antiquity", "Mathematician").await;
    seed_figure(&pool, 1, "Confucius", "Ancient", "Philosopher").await;
    seed_figure(&pool, 2, "Avicenna", "Golden Age", "Physician").await;

    let response = get(common::build_test_app(pool), "/figures").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 3);

    let ids: Vec<i64> = items.iter().map(|f| f["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    for item in items {
        let object = item.as_object().unwrap();
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        let mut expected = SUMMARY_KEYS.to_vec();
        expected.sort_unstable();
        assert_eq!(keys, expected);
    }
    assert_eq!(items[0]["name"], "Confucius");
    assert_eq!(items[0]["title"], serde_json::Value::Null);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_on_empty_table_is_empty_array(pool: PgPool) {
    let response = get(common::build_test_app(pool), "/figures").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!([]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn detail_returns_full_record(pool: PgPool) {
    seed_figure(&pool, 7, "Ibn Sina", "Islamic Golden Age", "Wrote the Canon").await;

    let response = get(common::build_test_app(pool), "/figures/7").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["id"], 7);
    assert_eq!(json["name"], "Ibn Sina");
    assert_eq!(json["biography"], "Wrote the Canon");
    assert_eq!(json["birth_year"], 1007);
    assert_eq!(json["video_1"], "https://example.test/7.mp4");
    assert_eq!(json["video_2"], serde_json::Value::Null);
    assert_eq!(json.as_object().unwrap().len(), 15);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_figure_returns_404_detail(pool: PgPool) {
    let response = get(common::build_test_app(pool), "/figures/999").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["detail"], "Figure not found");
    assert_eq!(json["code"], "NOT_FOUND");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn non_numeric_id_is_a_json_bad_request(pool: PgPool) {
    let response = get(common::build_test_app(pool), "/figures/abc").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
    assert!(json["detail"].is_string());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn store_failure_returns_500_with_message(pool: PgPool) {
    sqlx::query("DROP TABLE figures").execute(&pool).await.unwrap();

    let response = get(common::build_test_app(pool), "/figures").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["code"], "DATABASE_ERROR");
    assert!(json["detail"].as_str().unwrap().contains("figures"));
}
