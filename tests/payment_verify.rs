mod support;

use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use meal_order_api::{
    error::AppError,
    gateway::TransactionStatus,
    models::PaymentStatus,
    routes::create_app,
    services::payment_service::verify_payment,
    store::{MemoryStore, PersistenceGateway},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use support::{FakeGateway, FakeReply, app_state, pending_order, transaction};

async fn post_verify(app: axum::Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/payment/verify")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn amount_mismatch_is_rejected_and_order_untouched() {
    let store = Arc::new(MemoryStore::new());
    let order = pending_order(Uuid::new_v4(), "TLR250101AB12", 10000);
    store.save_order(&order).await.unwrap();
    let gateway = Arc::new(FakeGateway::success("TLR250101AB12", 10000));
    let app = create_app(app_state(store.clone(), gateway.clone()));

    let (status, body) = post_verify(
        app,
        json!({ "reference": "TLR250101AB12", "expectedAmount": 9000 }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["verified"], false);
    assert_eq!(body["error"], "Montant du paiement incorrect");

    let stored = store.orders().await;
    assert_eq!(stored[0].payment_status, PaymentStatus::EnAttente);
    assert_eq!(store.order_writes().await, 1);
}

#[tokio::test]
async fn verified_payment_shape() {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(FakeGateway::success("TLR250101AB12", 10000));
    let app = create_app(app_state(store, gateway));

    let (status, body) = post_verify(
        app,
        json!({ "reference": "TLR250101AB12", "expectedAmount": 10000 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["verified"], true);
    assert_eq!(body["data"]["reference"], "TLR250101AB12");
    assert_eq!(body["data"]["amount"], 10000);
    assert_eq!(body["data"]["currency"], "NGN");
    assert_eq!(body["data"]["customerEmail"], "client@example.com");
    assert!(body["data"]["paidAt"].is_string());
}

#[tokio::test]
async fn expected_amount_is_optional() {
    let gateway = FakeGateway::success("TLR250101AB12", 10000);
    let verified = verify_payment(&gateway, "TLR250101AB12", None).await.unwrap();
    assert_eq!(verified.amount, 10000);
}

#[tokio::test]
async fn missing_reference_never_reaches_the_gateway() {
    let gateway = Arc::new(FakeGateway::success("TLR250101AB12", 10000));
    let app = create_app(app_state(Arc::new(MemoryStore::new()), gateway.clone()));

    let (status, body) = post_verify(app, json!({ "expectedAmount": 10000 })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("Référence"));
    assert_eq!(gateway.calls(), 0);

    let blank = verify_payment(gateway.as_ref(), "   ", None).await;
    assert!(matches!(blank, Err(AppError::BadRequest(_))));
}

#[tokio::test]
async fn undecodable_body_gets_a_structured_bad_request() {
    let gateway = Arc::new(FakeGateway::success("TLR250101AB12", 10000));
    let app = create_app(app_state(Arc::new(MemoryStore::new()), gateway.clone()));

    let (status, body) = post_verify(app.clone(), json!({ "reference": 5 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().starts_with("Bad Request"));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/payment/verify")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
    assert_eq!(gateway.calls(), 0);
}

#[tokio::test]
async fn gateway_outage_is_a_bad_gateway() {
    let gateway = Arc::new(FakeGateway::unavailable());
    let app = create_app(app_state(Arc::new(MemoryStore::new()), gateway));

    let (status, body) = post_verify(app, json!({ "reference": "TLR250101AB12" })).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
    assert_eq!(body["verified"], false);
}

#[tokio::test]
async fn unknown_transaction_is_not_found() {
    let gateway = Arc::new(FakeGateway::new(FakeReply::NotFound));
    let app = create_app(app_state(Arc::new(MemoryStore::new()), gateway));

    let (status, body) = post_verify(app, json!({ "reference": "TLR250101ZZ99" })).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("TLR250101ZZ99"));
}

#[tokio::test]
async fn unsuccessful_transaction_is_not_verified() {
    let gateway = FakeGateway::new(FakeReply::Transaction(transaction(
        "TLR250101AB12",
        10000,
        TransactionStatus::Abandoned,
    )));

    let err = verify_payment(&gateway, "TLR250101AB12", Some(10000))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::PaymentNotSuccessful(ref s) if s == "abandoned"));
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}
