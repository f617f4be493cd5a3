use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::payment::{VerifyPaymentRequest, VerifyPaymentResponse},
    error::AppResult,
    middleware::json::AppJson,
    response::ErrorResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/verify", post(verify_payment))
}

#[utoipa::path(
    post,
    path = "/payment/verify",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Transaction confirmed by the gateway", body = VerifyPaymentResponse),
        (status = 400, description = "Missing reference, payment not successful or amount mismatch", body = ErrorResponse),
        (status = 404, description = "Unknown transaction", body = ErrorResponse),
        (status = 502, description = "Payment gateway unavailable", body = ErrorResponse),
    ),
    tag = "Payment"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyPaymentRequest>,
) -> AppResult<Json<VerifyPaymentResponse>> {
    let reference = payload.reference.unwrap_or_default();
    let data = payment_service::verify_payment(
        state.gateway.as_ref(),
        &reference,
        payload.expected_amount,
    )
    .await?;

    Ok(Json(VerifyPaymentResponse {
        success: true,
        verified: true,
        data,
    }))
}
