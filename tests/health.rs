use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use meal_order_api::routes::health::health_check;
use tower::ServiceExt;

mod support;

#[tokio::test]
async fn health_check_returns_ok() {
    let response = health_check().await;
    assert_eq!(response.0.message, "Health check");
    assert!(response.0.success);
    assert!(response.0.data.is_some());
}

#[tokio::test]
async fn health_route_and_fallback() {
    use std::sync::Arc;

    use meal_order_api::{routes::create_app, store::MemoryStore};
    use support::{FakeGateway, app_state};

    let state = app_state(Arc::new(MemoryStore::new()), Arc::new(FakeGateway::unavailable()));

    let response = create_app(state.clone())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["data"]["status"], "ok");

    let response = create_app(state.clone())
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Protected routes need a bearer token.
    let response = create_app(state)
        .oneshot(Request::get("/api/orders").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
