use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
};

use crate::{
    dto::payment::WebhookAck,
    error::{AppError, AppResult},
    gateway::signature::SIGNATURE_HEADER,
    response::{ApiResponse, ErrorResponse},
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/paystack", post(paystack_webhook))
}

#[utoipa::path(
    post,
    path = "/webhooks/paystack",
    request_body(content = String, description = "Raw gateway event, signed with HMAC-SHA512", content_type = "application/json"),
    params(("x-paystack-signature" = String, Header, description = "Hex HMAC-SHA512 of the raw body")),
    responses(
        (status = 200, description = "Event received", body = ApiResponse<WebhookAck>),
        (status = 401, description = "Signature missing or invalid", body = ErrorResponse),
    ),
    tag = "Payment"
)]
pub async fn paystack_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<ApiResponse<WebhookAck>>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let outcome = payment_service::handle_webhook(
        state.store.as_ref(),
        state.gateway.as_ref(),
        &state.webhook_secret,
        signature,
        &body,
    )
    .await;

    match outcome {
        Ok(outcome) => {
            tracing::info!(outcome = outcome.label(), "webhook processed");
        }
        Err(AppError::Unauthorized) => return Err(AppError::Unauthorized),
        // The gateway retries on non-2xx; a failure on our side is logged instead.
        Err(err) => {
            tracing::error!(error = %err, "webhook processing failed");
        }
    }

    Ok(Json(ApiResponse::success(
        "Webhook received",
        WebhookAck { received: true },
        None,
    )))
}
