//! Visit tracking and history read endpoints.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Local;
use tower::ServiceExt;

use drawing_gateway::history::DAY_FORMAT;

mod common;
use common::{GatewayOptions, Reply};

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn visit(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/visit")
        .header("content-type", "application/json")
        .header("user-agent", "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/126.0 Safari/537.36")
        .header("referer", "https://example.com/")
        .header("x-real-ip", "198.51.100.4")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_visit_is_recorded_and_readable() {
    let mock = common::start_mock_analysis(Reply::ok(1.0)).await;
    let gw = common::gateway(GatewayOptions::new(mock.base_url()));

    let response = gw.router.clone().oneshot(visit(r#"{"page":"/draw"}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let accepted = common::json_body(response).await;
    let trace_id = accepted["trace_id"].as_str().unwrap().to_string();
    assert!(!trace_id.is_empty());

    gw.history.flush().await;

    let dates = common::json_body(gw.router.clone().oneshot(get("/visits/dates")).await.unwrap()).await;
    let today = Local::now().format(DAY_FORMAT).to_string();
    assert_eq!(dates, serde_json::json!([today]));

    let response = gw.router.clone().oneshot(get(&format!("/visits/{}", today))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let records = common::json_body(response).await;
    let record = &records[0];
    assert_eq!(record["traceID"], trace_id);
    assert_eq!(record["ip"], "198.51.100.4");
    assert_eq!(record["browser"], "Chrome");
    assert_eq!(record["os"], "Windows");
    assert_eq!(record["page"], "/draw");
    assert_eq!(record["referer"], "https://example.com/");
}

#[tokio::test]
async fn test_visit_without_body() {
    let mock = common::start_mock_analysis(Reply::ok(1.0)).await;
    let gw = common::gateway(GatewayOptions::new(mock.base_url()));

    let response = gw.router.clone().oneshot(visit("")).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = gw.router.clone().oneshot(visit("[broken")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_day_endpoints_validate_dates() {
    let mock = common::start_mock_analysis(Reply::ok(1.0)).await;
    let gw = common::gateway(GatewayOptions::new(mock.base_url()));

    let response = gw.router.clone().oneshot(get("/history/17-10-2026")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("YYYY-MM-DD"));

    let response = gw.router.clone().oneshot(get("/visits/2001-01-01")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::json_body(response).await, serde_json::json!([]));

    let response = gw.router.clone().oneshot(get("/history/dates")).await.unwrap();
    assert_eq!(common::json_body(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn test_health_lists_providers() {
    let mock = common::start_mock_analysis(Reply::ok(1.0)).await;
    let gw = common::gateway(GatewayOptions::new(mock.base_url()));

    let response = gw.router.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["providers"], serde_json::json!(["analysis", "reward"]));
}

#[tokio::test]
async fn test_cors_preflight_for_configured_origin() {
    let mock = common::start_mock_analysis(Reply::ok(1.0)).await;
    let gw = common::gateway(GatewayOptions::new(mock.base_url()));
    let origin = gw.config.security.allowed_origins[0].clone();

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/v1/analyze")
        .header("origin", origin.as_str())
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = gw.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["access-control-allow-origin"], origin.as_str());
}
