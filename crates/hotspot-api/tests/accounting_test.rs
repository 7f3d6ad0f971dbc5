//! HTTP tests for accounting ingestion, the WebSocket endpoint and health.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use hotspot_core::types::SessionId;
use hotspot_entity::user::OperatorRole;

use helpers::TestApp;

#[tokio::test]
async fn test_accounting_start_and_stop() {
    let app = TestApp::new();
    let token = app.token(OperatorRole::Accounting);

    let started = app
        .request(
            "POST",
            "/api/v1/sessions/accounting",
            Some(&token),
            Some(json!({
                "status": "start",
                "sessionId": "81000100",
                "username": "255712000111_GG42",
                "nasIdentifier": "10.0.0.1",
                "framedIp": "10.5.0.20"
            })),
        )
        .await;
    assert_eq!(started.status, StatusCode::OK);
    assert_eq!(started.body["action"], "created");
    assert_eq!(app.state.registry.active_count(), 1);

    let stopped = app
        .request(
            "POST",
            "/api/v1/sessions/accounting",
            Some(&token),
            Some(json!({
                "status": "stop",
                "sessionId": "81000100",
                "nasIdentifier": "10.0.0.1"
            })),
        )
        .await;
    assert_eq!(stopped.body["action"], "removed");
    assert!(app.state.registry.get(&SessionId::new("81000100")).is_err());
}

#[tokio::test]
async fn test_accounting_requires_service_role() {
    let app = TestApp::new();
    let token = app.token(OperatorRole::Admin);
    let response = app
        .request(
            "POST",
            "/api/v1/sessions/accounting",
            Some(&token),
            Some(json!({
                "status": "start",
                "sessionId": "81000101",
                "nasIdentifier": "10.0.0.1"
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_accounting_validates_body() {
    let app = TestApp::new();
    let token = app.token(OperatorRole::Accounting);
    let response = app
        .request(
            "POST",
            "/api/v1/sessions/accounting",
            Some(&token),
            Some(json!({
                "status": "start",
                "sessionId": "",
                "nasIdentifier": "10.0.0.1"
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ws_upgrade_without_token() {
    let app = TestApp::new();
    let response = app.request("GET", "/api/v1/ws", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ws_rejects_invalid_query_token() {
    let app = TestApp::new();
    let response = app
        .request("GET", "/api/v1/ws?token=not-a-jwt", None, None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_reports_counts() {
    let app = TestApp::new();
    app.add_session("81000102", "10.0.0.1");

    let response = app.request("GET", "/api/v1/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["sessions"]["active"], 1);
}
