use std::sync::Arc;

use axum::http::{Method, StatusCode};
use axum_test::TestServer;
use diesel_async::SimpleAsyncConnection;
use serde_json::{Value, json};
use sqlite_models::connection::{Database, establish_connection};
use telemetry::metrics::Telemetry;
use weight_api::metrics::ServerMetrics;
use weight_api::shutdown::ShutdownCoordinator;
use weight_api::{AppState, Config};

const API_KEY: &str = "test-api-key";
const ESP_TOKEN: &str = "test-esp-token";

async fn build_state(config: Config) -> AppState {
    let db = establish_connection(":memory:".to_string(), sqlite_models::MIGRATIONS)
        .await
        .unwrap();
    let metrics = ServerMetrics::new(None).unwrap();

    AppState {
        telemetry: Telemetry::new(Some(metrics)),
        shutdown: Arc::new(ShutdownCoordinator::new(db.clone())),
        db,
        config: Arc::new(config),
    }
}

async fn build_test_server_with(config: Config) -> (TestServer, Database) {
    let state = build_state(config).await;
    let db = state.db.clone();
    let server = TestServer::new(weight_api::router(state)).unwrap();
    (server, db)
}

async fn build_test_server() -> TestServer {
    build_test_server_with(Config::with_secrets(API_KEY, ESP_TOKEN))
        .await
        .0
}

async fn post_weight(server: &TestServer, weight: Value) -> Value {
    let response = server
        .post("/api/weight")
        .json(&json!({ "esp_token": ESP_TOKEN, "weight": weight }))
        .await;
    response.assert_status_ok();
    response.json()
}

async fn read_data(server: &TestServer) -> Value {
    let response = server
        .get("/api/data")
        .add_query_param("api_key", API_KEY)
        .await;
    response.assert_status_ok();
    response.json()
}

fn weights(body: &Value) -> Vec<f64> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["weight"].as_f64().unwrap())
        .collect()
}

fn assert_error(body: &Value, message: &str) {
    assert_eq!(body, &json!({ "status": "error", "message": message }));
}

#[tokio::test]
async fn test_root_is_ok() {
    let server = build_test_server().await;

    let response = server.get("/").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_record_weight_with_json_body() {
    let server = build_test_server().await;

    let body = post_weight(&server, json!(12.5)).await;

    assert_eq!(body["status"], "success");
    assert_eq!(body["weight"], 12.5);
    assert!(body["id"].is_i64());
}

#[tokio::test]
async fn test_record_weight_with_query_string_get() {
    let server = build_test_server().await;

    let response = server
        .get("/api/weight")
        .add_query_param("api_key", API_KEY)
        .add_query_param("weight", "3.75")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["weight"], 3.75);
}

#[tokio::test]
async fn test_record_weight_with_form_body() {
    let server = build_test_server().await;

    let response = server
        .post("/api/weight")
        .form(&[("esp_token", ESP_TOKEN), ("weight", "8")])
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["weight"], 8.0);
}

#[tokio::test]
async fn test_body_takes_precedence_over_query() {
    let server = build_test_server().await;

    let response = server
        .post("/api/weight")
        .add_query_param("weight", "1")
        .json(&json!({ "api_key": API_KEY, "weight": "2" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["weight"], 2.0);
}

#[tokio::test]
async fn test_write_then_read_round_trip() {
    let server = build_test_server().await;

    let first = post_weight(&server, json!("10.125")).await;
    let second = post_weight(&server, json!(0.5)).await;
    assert!(second["id"].as_i64().unwrap() > first["id"].as_i64().unwrap());

    let body = read_data(&server).await;

    assert_eq!(body["status"], "success");
    assert_eq!(body["count"], 2);
    let newest = &body["data"][0];
    assert_eq!(newest["id"], second["id"]);
    assert_eq!(newest["weight"], 0.5);
    let created_at = newest["created_at"].as_str().unwrap();
    assert_eq!(created_at.len(), "YYYY-MM-DD HH:MM:SS".len());
    assert_eq!(&created_at[4..5], "-");
    assert_eq!(&created_at[10..11], " ");
    assert_eq!(body["data"][1]["weight"], 10.125);
}

#[tokio::test]
async fn test_read_orders_newest_first() {
    let server = build_test_server().await;
    for weight in [1, 2, 3] {
        post_weight(&server, json!(weight)).await;
    }

    let body = read_data(&server).await;

    assert_eq!(weights(&body), vec![3.0, 2.0, 1.0]);
}

#[tokio::test]
async fn test_read_is_capped_at_one_hundred() {
    let server = build_test_server().await;
    for weight in 1..=150 {
        post_weight(&server, json!(weight)).await;
    }

    let body = read_data(&server).await;

    assert_eq!(body["count"], weight_api::RECENT_LIMIT);
    let expected: Vec<f64> = (51..=150).rev().map(f64::from).collect();
    assert_eq!(weights(&body), expected);
}

#[tokio::test]
async fn test_reads_are_idempotent() {
    let server = build_test_server().await;
    post_weight(&server, json!(4)).await;
    post_weight(&server, json!(5)).await;

    let first = read_data(&server).await;
    let second = read_data(&server).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_read_empty_store() {
    let server = build_test_server().await;

    let body = read_data(&server).await;

    assert_eq!(body, json!({ "status": "success", "count": 0, "data": [] }));
}

#[tokio::test]
async fn test_weight_boundaries() {
    let server = build_test_server().await;

    let zero = post_weight(&server, json!("0")).await;
    assert_eq!(zero["weight"], 0.0);

    let lenient = post_weight(&server, json!("5abc")).await;
    assert_eq!(lenient["weight"], 5.0);

    for rejected in ["-0.001", "abc", "", "Infinity"] {
        let response = server
            .post("/api/weight")
            .json(&json!({ "esp_token": ESP_TOKEN, "weight": rejected }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_error(&response.json(), "invalid weight");
    }

    // Nothing was stored for the rejected inputs
    assert_eq!(read_data(&server).await["count"], 2);
}

#[tokio::test]
async fn test_missing_weight_is_rejected() {
    let server = build_test_server().await;

    let response = server
        .post("/api/weight")
        .json(&json!({ "api_key": API_KEY }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_error(&response.json(), "invalid weight");
}

#[tokio::test]
async fn test_strict_weight_rejects_trailing_garbage() {
    let mut config = Config::with_secrets(API_KEY, ESP_TOKEN);
    config.strict_weight = true;
    let (server, _db) = build_test_server_with(config).await;

    let response = server
        .post("/api/weight")
        .json(&json!({ "esp_token": ESP_TOKEN, "weight": "5abc" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_error(&response.json(), "invalid weight");
}

#[tokio::test]
async fn test_api_key_with_wrong_esp_token_is_authorized() {
    let server = build_test_server().await;

    let response = server
        .post("/api/weight")
        .json(&json!({ "api_key": API_KEY, "esp_token": "wrong", "weight": 1 }))
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_wrong_api_key_is_unauthorized_even_with_valid_esp_token() {
    let server = build_test_server().await;

    let response = server
        .post("/api/weight")
        .json(&json!({ "api_key": "wrong", "esp_token": ESP_TOKEN, "weight": 1 }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_error(&response.json(), "unauthorized");
}

#[tokio::test]
async fn test_no_credentials_is_unauthorized() {
    let server = build_test_server().await;

    let write = server
        .post("/api/weight")
        .json(&json!({ "weight": 1 }))
        .await;
    write.assert_status(StatusCode::UNAUTHORIZED);
    assert_error(&write.json(), "unauthorized");

    let read = server.get("/api/data").await;
    read.assert_status(StatusCode::UNAUTHORIZED);
    assert_error(&read.json(), "unauthorized");
}

#[tokio::test]
async fn test_unauthorized_precedes_weight_validation() {
    let server = build_test_server().await;

    let response = server
        .post("/api/weight")
        .json(&json!({ "esp_token": "wrong", "weight": "abc" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_read_with_esp_token() {
    let server = build_test_server().await;

    let response = server
        .get("/api/data")
        .add_query_param("esp_token", ESP_TOKEN)
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_delete_weight_is_method_not_allowed() {
    let server = build_test_server().await;

    for request in [
        server.delete("/api/weight"),
        server
            .delete("/api/weight")
            .add_query_param("api_key", API_KEY)
            .add_query_param("weight", "1"),
        server.method(Method::PUT, "/api/weight"),
    ] {
        let response = request.await;
        response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
        assert_error(&response.json(), "method not allowed");
    }

    assert_eq!(read_data(&server).await["count"], 0);
}

#[tokio::test]
async fn test_head_weight_is_rejected_without_storing() {
    let server = build_test_server().await;

    let response = server
        .method(Method::HEAD, "/api/weight")
        .add_query_param("api_key", API_KEY)
        .add_query_param("weight", "7")
        .await;

    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(read_data(&server).await["count"], 0);
}

#[tokio::test]
async fn test_head_data_is_served() {
    let server = build_test_server().await;

    let response = server
        .method(Method::HEAD, "/api/data")
        .add_query_param("api_key", API_KEY)
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_post_data_is_method_not_allowed() {
    let server = build_test_server().await;

    let response = server
        .post("/api/data")
        .add_query_param("api_key", API_KEY)
        .await;

    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    assert_error(&response.json(), "method not allowed");
}

#[tokio::test]
async fn test_malformed_json_body_is_rejected() {
    let server = build_test_server().await;

    let response = server
        .post("/api/weight")
        .text("{not json")
        .content_type("application/json")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_error(&response.json(), "invalid request body");
}

#[tokio::test]
async fn test_out_of_range_json_number_is_an_invalid_body() {
    let server = build_test_server().await;

    let response = server
        .post("/api/weight")
        .text(r#"{"api_key": "wrong", "weight": 1e400}"#)
        .content_type("application/json")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_error(&response.json(), "invalid request body");
}

#[tokio::test]
async fn test_storage_fault_is_reported_without_detail() {
    let (server, db) =
        build_test_server_with(Config::with_secrets(API_KEY, ESP_TOKEN)).await;
    db.acquire()
        .await
        .batch_execute("DROP TABLE readings")
        .await
        .unwrap();

    let write = server
        .post("/api/weight")
        .json(&json!({ "api_key": API_KEY, "weight": 1 }))
        .await;
    write.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_error(&write.json(), "db insert failed");

    let read = server
        .get("/api/data")
        .add_query_param("api_key", API_KEY)
        .await;
    read.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_error(&read.json(), "db read failed");
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let server = build_test_server().await;

    let response = server.get("/api/nope").await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_error(&response.json(), "not found");
}

#[tokio::test]
async fn test_health_reports_sqlite() {
    let server = build_test_server().await;

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["components"]["sqlite"]["status"], "healthy");
}

#[tokio::test]
async fn test_health_is_unavailable_during_shutdown() {
    let state = build_state(Config::with_secrets(API_KEY, ESP_TOKEN)).await;
    let shutdown = state.shutdown.clone();
    let server = TestServer::new(weight_api::router(state)).unwrap();

    shutdown.shutdown().await;
    let response = server.get("/health").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["status"], "unhealthy");
}

#[tokio::test]
async fn test_metrics_count_readings_and_errors() {
    let server = build_test_server().await;
    post_weight(&server, json!(1)).await;
    server.get("/api/data").await;

    let response = server.get("/metrics").await;

    response.assert_status_ok();
    let text = response.text();
    assert!(text.contains("readings_recorded 1"));
    assert!(text.contains(
        r#"request_errors{error_code="unauthorized",handler="recent_readings"} 1"#
    ));
    assert!(text.ends_with("# EOF\n"));
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let server = build_test_server().await;

    let response = server.get("/api-docs/openapi.json").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["paths"]["/api/weight"].is_object());
    assert!(body["paths"]["/api/data"].is_object());
}
