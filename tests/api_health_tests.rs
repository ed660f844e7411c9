//! 健康检查 API 集成测试

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

mod common;
use common::create_test_app;

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let (status, json) = app.request("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert!(json["uptime_secs"].is_number());
}

#[tokio::test]
async fn test_readiness_endpoint_with_memory_store() {
    let app = create_test_app();

    let (status, json) = app.request("GET", "/ready", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ready"], true);
    assert_eq!(json["checks"][0]["name"], "store");
    assert_eq!(json["checks"][0]["message"], "in-memory");
}

#[tokio::test]
async fn test_request_id_headers() {
    let app = create_test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-trace-id", "trace-abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-trace-id"], "trace-abc-123");
    assert!(response.headers().contains_key("x-request-id"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(!bytes.is_empty());
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = create_test_app();

    let (status, _) = app.request("GET", "/api/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // 认证路由组的前缀下同样不经过令牌校验
    let (status, _) = app
        .request("GET", "/api/user-manager/nope", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.request("POST", "/api/auth/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
