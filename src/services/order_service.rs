use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{CheckoutRequest, CheckoutResponse, OrderList},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{DeliveryInfo, Order, OrderStatus, PaymentStatus},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{
        payment_service,
        shopping_service::{self, prepare_session, upcoming_meals},
    },
    state::AppState,
    store::{OrderFilter, audit_best_effort},
};

const MAX_NUMBER_ATTEMPTS: usize = 5;
const REFERENCE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let filter = OrderFilter {
        status: query.status,
        newest_first: matches!(sort_order, SortOrder::Desc),
        limit: limit as u64,
        offset: offset as u64,
    };
    let (orders, total) = state.store.list_orders(user.user_id, filter).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Order>> {
    let order = state
        .store
        .find_order(user.user_id, id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success("OK", order, Some(Meta::empty())))
}

/// Turns the user's upcoming planning into an unpaid order.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    validate_delivery(&payload.delivery_info)?;

    let prepared = prepare_session(
        state.store.as_ref(),
        user.user_id,
        shopping_service::today(),
        &payload.edits,
    )
    .await?;

    let amount = prepared.session.total()?;
    if amount <= 0 {
        return Err(AppError::BadRequest("Shopping list is empty".into()));
    }
    let items = upcoming_meals(&prepared.entries, prepared.today);

    let now = Utc::now();
    let mut order = Order {
        id: Uuid::new_v4(),
        user_id: user.user_id,
        order_number: String::new(),
        payment_reference: String::new(),
        payment_status: PaymentStatus::EnAttente,
        status: OrderStatus::Brouillon,
        amount,
        items,
        delivery_info: payload.delivery_info,
        paid_at: None,
        created_at: now,
        updated_at: now,
    };

    let mut attempt = 0;
    loop {
        attempt += 1;
        order.order_number = build_order_number(&state.order_prefix, now);
        order.payment_reference = build_payment_reference(&state.order_prefix, now);
        match state.store.save_order(&order).await {
            Ok(()) => break,
            Err(AppError::Conflict(reason)) if attempt < MAX_NUMBER_ATTEMPTS => {
                tracing::debug!(attempt, reason = %reason, "order number collision, retrying");
            }
            Err(err) => return Err(err),
        }
    }

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        reference = %order.payment_reference,
        amount = order.amount,
        "order created"
    );
    audit_best_effort(
        state.store.as_ref(),
        Some(user.user_id),
        audit::ORDER_CREATED,
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "reference": order.payment_reference })),
    )
    .await;

    // A webhook may already have settled this reference.
    let order = payment_service::reconcile_payment_logs(state.store.as_ref(), order).await?;

    Ok(ApiResponse::success(
        "Checkout success",
        CheckoutResponse {
            order,
            shopping_list: prepared.session.into_lines(),
        },
        Some(Meta::empty()),
    ))
}

/// Client-driven payment confirmation for one of the user's orders.
pub async fn confirm_payment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = state
        .store
        .find_order(user.user_id, id)
        .await?
        .ok_or(AppError::NotFound)?;

    let order =
        payment_service::confirm_order_payment(state.store.as_ref(), state.gateway.as_ref(), order)
            .await?;

    Ok(ApiResponse::success(
        "Payment recorded",
        order,
        Some(Meta::empty()),
    ))
}

fn validate_delivery(info: &DeliveryInfo) -> AppResult<()> {
    let missing = [
        ("full_name", &info.full_name),
        ("phone", &info.phone),
        ("address", &info.address),
        ("city", &info.city),
    ]
    .into_iter()
    .find(|(_, value)| value.trim().is_empty());

    match missing {
        Some((field, _)) => Err(AppError::BadRequest(format!("{field} is required"))),
        None => Ok(()),
    }
}

/// `PPPyymmddNNNN`: prefix, date, four random digits.
pub fn build_order_number(prefix: &str, at: DateTime<Utc>) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("{}{}{:04}", prefix, at.format("%y%m%d"), suffix)
}

/// `PPPyymmddXXXX`: prefix, date, four random uppercase alphanumerics.
pub fn build_payment_reference(prefix: &str, at: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..4)
        .map(|_| REFERENCE_CHARSET[rng.gen_range(0..REFERENCE_CHARSET.len())] as char)
        .collect();
    format!("{}{}{}", prefix, at.format("%y%m%d"), suffix)
}
