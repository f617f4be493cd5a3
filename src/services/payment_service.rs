//! Payment reconciliation.
//!
//! Two independent channels can settle an order: the client-driven
//! verification call and the gateway's signed webhook. Both funnel into
//! [`PersistenceGateway::update_order_payment_status`], a compare-and-swap on
//! the stored payment status, so whichever lands first on an `en_attente`
//! order wins and the other becomes a no-op.
//!
//! A `paye` order is never changed. An `echoue` order only moves to `paye`
//! after a fresh server-side verification with the gateway confirms the
//! charge for the full order amount.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    audit,
    dto::payment::VerifiedPayment,
    error::{AppError, AppResult},
    gateway::{PaymentGateway, TransactionStatus, paystack::parse_timestamp, signature},
    models::{Order, PaymentLogEntry, PaymentStatus},
    store::{PaymentTransition, PersistenceGateway, TransitionOutcome, audit_best_effort},
};

/// Asks the gateway about `reference`. Never touches an order.
pub async fn verify_payment(
    gateway: &dyn PaymentGateway,
    reference: &str,
    expected_amount: Option<i64>,
) -> AppResult<VerifiedPayment> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(AppError::BadRequest(
            "Référence de paiement manquante".to_string(),
        ));
    }
    if let Some(expected) = expected_amount {
        if expected <= 0 {
            return Err(AppError::BadRequest(
                "expected amount must be greater than 0".to_string(),
            ));
        }
    }

    let tx = gateway.verify_transaction(reference).await?;

    if tx.status != TransactionStatus::Success {
        tracing::info!(reference = %reference, status = tx.status.as_str(), "payment not successful");
        return Err(AppError::PaymentNotSuccessful(tx.status.as_str().to_string()));
    }

    if let Some(expected) = expected_amount {
        if expected != tx.amount {
            tracing::warn!(
                reference = %reference,
                expected,
                actual = tx.amount,
                "payment amount mismatch"
            );
            return Err(AppError::AmountMismatch {
                expected,
                actual: tx.amount,
            });
        }
    }

    Ok(VerifiedPayment {
        reference: tx.reference,
        amount: tx.amount,
        currency: tx.currency,
        paid_at: tx.paid_at,
        customer_email: tx.customer_email,
    })
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
struct RawCustomer {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct RawCharge {
    reference: String,
    #[serde(default)]
    amount: i64,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    paid_at: Option<String>,
    #[serde(default)]
    customer: Option<RawCustomer>,
    #[serde(default)]
    metadata: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Charge details carried by a webhook event.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeData {
    pub reference: String,
    pub amount: i64,
    pub status: Option<String>,
    pub currency: Option<String>,
    pub channel: Option<String>,
    pub customer_email: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub metadata: serde_json::Value,
}

impl From<RawCharge> for ChargeData {
    fn from(raw: RawCharge) -> Self {
        Self {
            reference: raw.reference,
            amount: raw.amount,
            status: raw.status,
            currency: raw.currency,
            channel: raw.channel,
            customer_email: raw.customer.and_then(|c| c.email),
            paid_at: raw.paid_at.as_deref().and_then(parse_timestamp),
            metadata: raw.metadata,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    ChargeSuccess(ChargeData),
    ChargeFailed(ChargeData),
    Unhandled(String),
}

impl WebhookEvent {
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        let raw: RawEvent = serde_json::from_slice(body)?;
        Ok(match raw.event.as_str() {
            "charge.success" => {
                WebhookEvent::ChargeSuccess(serde_json::from_value::<RawCharge>(raw.data)?.into())
            }
            "charge.failed" => {
                WebhookEvent::ChargeFailed(serde_json::from_value::<RawCharge>(raw.data)?.into())
            }
            _ => WebhookEvent::Unhandled(raw.event),
        })
    }
}

/// What a webhook delivery did. Every variant is acknowledged with 2xx.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    Confirmed(Order),
    Recovered(Order),
    Failed(Order),
    /// The order was already in a terminal state; nothing was written.
    AlreadySettled(PaymentStatus),
    /// Success for a reference with no order yet, stored for later.
    Logged(Uuid),
    /// Failure for a reference with no order; nothing to do.
    Dropped,
    Ignored(String),
    Malformed,
}

impl WebhookOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            WebhookOutcome::Confirmed(_) => "confirmed",
            WebhookOutcome::Recovered(_) => "recovered",
            WebhookOutcome::Failed(_) => "failed",
            WebhookOutcome::AlreadySettled(_) => "already_settled",
            WebhookOutcome::Logged(_) => "logged",
            WebhookOutcome::Dropped => "dropped",
            WebhookOutcome::Ignored(_) => "ignored",
            WebhookOutcome::Malformed => "malformed",
        }
    }
}

/// Signature check, then parse, then apply. Only a bad signature is an
/// error; a body that fails to parse is reported as `Malformed`.
pub async fn handle_webhook(
    store: &dyn PersistenceGateway,
    gateway: &dyn PaymentGateway,
    secret: &str,
    signature_header: Option<&str>,
    body: &[u8],
) -> AppResult<WebhookOutcome> {
    if !signature::verify_signature(secret, body, signature_header) {
        tracing::warn!(
            has_signature = signature_header.is_some(),
            "webhook signature rejected"
        );
        return Err(AppError::Unauthorized);
    }

    let event = match WebhookEvent::parse(body) {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(error = %err, bytes = body.len(), "webhook body could not be parsed");
            return Ok(WebhookOutcome::Malformed);
        }
    };

    apply_event(store, gateway, event).await
}

pub async fn apply_event(
    store: &dyn PersistenceGateway,
    gateway: &dyn PaymentGateway,
    event: WebhookEvent,
) -> AppResult<WebhookOutcome> {
    match event {
        WebhookEvent::ChargeSuccess(charge) => apply_charge_success(store, gateway, charge).await,
        WebhookEvent::ChargeFailed(charge) => apply_charge_failed(store, charge).await,
        WebhookEvent::Unhandled(name) => {
            tracing::debug!(event = %name, "webhook event ignored");
            Ok(WebhookOutcome::Ignored(name))
        }
    }
}

async fn apply_charge_success(
    store: &dyn PersistenceGateway,
    gateway: &dyn PaymentGateway,
    charge: ChargeData,
) -> AppResult<WebhookOutcome> {
    let Some(order) = store.find_order_by_reference(&charge.reference).await? else {
        let entry = PaymentLogEntry {
            id: Uuid::new_v4(),
            reference: charge.reference.clone(),
            amount: charge.amount,
            channel: charge.channel.clone(),
            customer_email: charge.customer_email.clone(),
            status: charge.status.clone().unwrap_or_else(|| "success".to_string()),
            metadata: charge.metadata.clone(),
            paid_at: charge.paid_at,
            processed: false,
            created_at: Utc::now(),
        };
        store.insert_payment_log(&entry).await?;
        tracing::info!(
            reference = %charge.reference,
            amount = charge.amount,
            "charge settled before order creation, logged for reconciliation"
        );
        audit_best_effort(
            store,
            None,
            audit::PAYMENT_LOGGED,
            Some("payment_logs"),
            Some(serde_json::json!({ "reference": charge.reference, "log_id": entry.id })),
        )
        .await;

        // Checkout may have saved the order and drained the log table
        // between the lookup above and the insert.
        if let Some(order) = store.find_order_by_reference(&charge.reference).await? {
            let order = reconcile_payment_logs(store, order).await?;
            if order.payment_status == PaymentStatus::Paye {
                tracing::info!(
                    reference = %charge.reference,
                    order_id = %order.id,
                    "order appeared while logging charge, reconciled"
                );
                return Ok(WebhookOutcome::Confirmed(order));
            }
        }
        return Ok(WebhookOutcome::Logged(entry.id));
    };

    if charge.amount != order.amount {
        tracing::warn!(
            reference = %charge.reference,
            order_amount = order.amount,
            charged = charge.amount,
            "webhook amount differs from order amount"
        );
    }

    let paid_at = charge.paid_at.unwrap_or_else(Utc::now);
    match order.payment_status {
        PaymentStatus::Paye => {
            tracing::debug!(reference = %charge.reference, "duplicate charge.success");
            Ok(WebhookOutcome::AlreadySettled(PaymentStatus::Paye))
        }
        PaymentStatus::EnAttente => {
            match store
                .update_order_payment_status(order.id, PaymentTransition::confirm(paid_at))
                .await?
            {
                TransitionOutcome::Applied(order) => {
                    record_settlement(store, &order, audit::PAYMENT_CONFIRMED, "webhook").await;
                    Ok(WebhookOutcome::Confirmed(order))
                }
                TransitionOutcome::Unchanged(current) if current.payment_status == PaymentStatus::Echoue => {
                    recover_failed_order(store, gateway, current).await
                }
                TransitionOutcome::Unchanged(current) => {
                    Ok(WebhookOutcome::AlreadySettled(current.payment_status))
                }
                TransitionOutcome::Missing => Ok(WebhookOutcome::Dropped),
            }
        }
        PaymentStatus::Echoue => recover_failed_order(store, gateway, order).await,
    }
}

/// A failed order only becomes paid when the gateway itself confirms the
/// full amount. Gateway trouble leaves the order failed.
async fn recover_failed_order(
    store: &dyn PersistenceGateway,
    gateway: &dyn PaymentGateway,
    order: Order,
) -> AppResult<WebhookOutcome> {
    let verified = match verify_payment(gateway, &order.payment_reference, Some(order.amount)).await {
        Ok(verified) => verified,
        Err(err) => {
            tracing::warn!(
                reference = %order.payment_reference,
                error = %err,
                "success after failure not confirmed by gateway"
            );
            return Ok(WebhookOutcome::AlreadySettled(PaymentStatus::Echoue));
        }
    };

    let paid_at = verified.paid_at.unwrap_or_else(Utc::now);
    match store
        .update_order_payment_status(order.id, PaymentTransition::recover(paid_at))
        .await?
    {
        TransitionOutcome::Applied(order) => {
            record_settlement(store, &order, audit::PAYMENT_CONFIRMED, "gateway_recheck").await;
            Ok(WebhookOutcome::Recovered(order))
        }
        TransitionOutcome::Unchanged(current) => Ok(WebhookOutcome::AlreadySettled(current.payment_status)),
        TransitionOutcome::Missing => Ok(WebhookOutcome::Dropped),
    }
}

async fn apply_charge_failed(
    store: &dyn PersistenceGateway,
    charge: ChargeData,
) -> AppResult<WebhookOutcome> {
    let Some(order) = store.find_order_by_reference(&charge.reference).await? else {
        tracing::debug!(reference = %charge.reference, "charge.failed for unknown order dropped");
        return Ok(WebhookOutcome::Dropped);
    };

    if order.payment_status.is_terminal() {
        return Ok(WebhookOutcome::AlreadySettled(order.payment_status));
    }

    match store
        .update_order_payment_status(order.id, PaymentTransition::fail())
        .await?
    {
        TransitionOutcome::Applied(order) => {
            record_settlement(store, &order, audit::PAYMENT_FAILED, "webhook").await;
            Ok(WebhookOutcome::Failed(order))
        }
        TransitionOutcome::Unchanged(current) => Ok(WebhookOutcome::AlreadySettled(current.payment_status)),
        TransitionOutcome::Missing => Ok(WebhookOutcome::Dropped),
    }
}

/// Client-side confirmation: verifies with the gateway against the order's
/// own amount, then applies the same conditional transition the webhook uses.
pub async fn confirm_order_payment(
    store: &dyn PersistenceGateway,
    gateway: &dyn PaymentGateway,
    order: Order,
) -> AppResult<Order> {
    if order.payment_status == PaymentStatus::Paye {
        return Ok(order);
    }

    let verified = verify_payment(gateway, &order.payment_reference, Some(order.amount)).await?;
    let paid_at = verified.paid_at.unwrap_or_else(Utc::now);
    let transition = match order.payment_status {
        PaymentStatus::Echoue => PaymentTransition::recover(paid_at),
        _ => PaymentTransition::confirm(paid_at),
    };

    match store.update_order_payment_status(order.id, transition).await? {
        TransitionOutcome::Applied(order) => {
            record_settlement(store, &order, audit::PAYMENT_CONFIRMED, "client_verify").await;
            Ok(order)
        }
        TransitionOutcome::Unchanged(current) => {
            tracing::debug!(
                reference = %current.payment_reference,
                status = current.payment_status.as_str(),
                "client confirmation redundant"
            );
            Ok(current)
        }
        TransitionOutcome::Missing => Err(AppError::NotFound),
    }
}

/// Applies charges that were logged before `order` existed and marks those
/// logs processed. Returns the order as it stands afterwards.
pub async fn reconcile_payment_logs(store: &dyn PersistenceGateway, order: Order) -> AppResult<Order> {
    let logs = store
        .find_unprocessed_payment_logs(&order.payment_reference)
        .await?;
    let mut current = order;

    for log in logs {
        if log.amount != current.amount {
            tracing::warn!(
                reference = %log.reference,
                order_amount = current.amount,
                charged = log.amount,
                "logged charge amount differs from order amount"
            );
        }

        if current.payment_status == PaymentStatus::EnAttente {
            let paid_at = log.paid_at.unwrap_or(log.created_at);
            match store
                .update_order_payment_status(current.id, PaymentTransition::confirm(paid_at))
                .await?
            {
                TransitionOutcome::Applied(order) => {
                    record_settlement(store, &order, audit::PAYMENT_RECONCILED, "payment_log").await;
                    current = order;
                }
                TransitionOutcome::Unchanged(order) => current = order,
                TransitionOutcome::Missing => return Err(AppError::NotFound),
            }
        }

        store.mark_payment_log_processed(log.id).await?;
    }

    Ok(current)
}

async fn record_settlement(store: &dyn PersistenceGateway, order: &Order, action: &str, channel: &str) {
    tracing::info!(
        order_id = %order.id,
        reference = %order.payment_reference,
        status = order.payment_status.as_str(),
        channel = channel,
        "payment status updated"
    );
    audit_best_effort(
        store,
        Some(order.user_id),
        action,
        Some("orders"),
        Some(serde_json::json!({
            "order_id": order.id,
            "reference": order.payment_reference,
            "channel": channel,
        })),
    )
    .await;
}
