use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    routing::get,
};

use crate::{response::ErrorResponse, state::AppState};

pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod payment;
pub mod planning;
pub mod shopping;
pub mod webhooks;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/planning", planning::router())
        .nest("/shopping-list", shopping::router())
        .nest("/orders", orders::router())
}

/// Routes whose paths are fixed by the payment gateway and its clients.
pub fn create_payment_router() -> Router<AppState> {
    Router::new()
        .nest("/payment", payment::router())
        .nest("/webhooks", webhooks::router())
}

/// Every route of the service, state bound, without the tower layers.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router())
        .merge(create_payment_router())
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .with_state(state)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ErrorResponse>) {
    let body = ErrorResponse {
        success: false,
        verified: None,
        error: format!("No route for {}", uri.path()),
    };
    (StatusCode::NOT_FOUND, Json(body))
}
