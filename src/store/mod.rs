//! Persistence gateway. Services only talk to storage through
//! [`PersistenceGateway`]; the payment transition is a compare-and-swap on
//! the stored payment status so concurrent writers cannot both win.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Menu, Order, OrderStatus, PaymentLogEntry, PaymentStatus, PlanningEntry, Recipe},
};

pub mod memory;
pub mod sea_orm_store;

pub use memory::MemoryStore;
pub use sea_orm_store::SeaOrmStore;

/// Conditional payment status change: applied only while the stored status
/// still equals `from`.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentTransition {
    pub from: PaymentStatus,
    pub to: PaymentStatus,
    pub order_status: Option<OrderStatus>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl PaymentTransition {
    pub fn confirm(paid_at: DateTime<Utc>) -> Self {
        Self {
            from: PaymentStatus::EnAttente,
            to: PaymentStatus::Paye,
            order_status: Some(OrderStatus::Confirmee),
            paid_at: Some(paid_at),
        }
    }

    pub fn fail() -> Self {
        Self {
            from: PaymentStatus::EnAttente,
            to: PaymentStatus::Echoue,
            order_status: None,
            paid_at: None,
        }
    }

    /// Failed order later proven paid by a fresh gateway verification.
    pub fn recover(paid_at: DateTime<Utc>) -> Self {
        Self {
            from: PaymentStatus::Echoue,
            ..Self::confirm(paid_at)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Applied(Order),
    /// The stored status no longer matched `from`; carries the current order.
    Unchanged(Order),
    Missing,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub newest_first: bool,
    pub limit: u64,
    pub offset: u64,
}

#[async_trait]
pub trait PersistenceGateway: Send + Sync + 'static {
    async fn find_order_by_reference(&self, reference: &str) -> AppResult<Option<Order>>;

    async fn find_order(&self, user_id: Uuid, order_id: Uuid) -> AppResult<Option<Order>>;

    async fn list_orders(&self, user_id: Uuid, filter: OrderFilter) -> AppResult<(Vec<Order>, i64)>;

    /// Inserts a new order. A duplicate reference or order number yields
    /// `AppError::Conflict`.
    async fn save_order(&self, order: &Order) -> AppResult<()>;

    async fn update_order_payment_status(
        &self,
        order_id: Uuid,
        transition: PaymentTransition,
    ) -> AppResult<TransitionOutcome>;

    async fn insert_payment_log(&self, entry: &PaymentLogEntry) -> AppResult<()>;

    async fn find_unprocessed_payment_logs(&self, reference: &str) -> AppResult<Vec<PaymentLogEntry>>;

    /// Returns false when the log was already processed.
    async fn mark_payment_log_processed(&self, log_id: Uuid) -> AppResult<bool>;

    async fn load_planning_entries(&self, user_id: Uuid) -> AppResult<Vec<PlanningEntry>>;

    async fn add_planning_entries(&self, entries: &[PlanningEntry]) -> AppResult<()>;

    async fn remove_planning_entry(&self, user_id: Uuid, entry_id: Uuid) -> AppResult<bool>;

    async fn family_size(&self, user_id: Uuid) -> AppResult<u32>;

    async fn set_family_size(&self, user_id: Uuid, family_size: u32) -> AppResult<()>;

    /// Predefined recipes plus the user's own custom ones.
    async fn list_recipes(&self, user_id: Uuid) -> AppResult<Vec<Recipe>>;

    async fn find_menu(&self, menu_id: Uuid) -> AppResult<Option<Menu>>;

    async fn log_audit(
        &self,
        user_id: Option<Uuid>,
        action: &str,
        resource: Option<&str>,
        metadata: Option<Value>,
    ) -> AppResult<()>;
}

/// Best-effort audit write; failures are logged and swallowed.
pub async fn audit_best_effort(
    store: &dyn PersistenceGateway,
    user_id: Option<Uuid>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) {
    if let Err(err) = store.log_audit(user_id, action, resource, metadata).await {
        tracing::warn!(error = %err, action = action, "audit log failed");
    }
}
