use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Menu, Order, PaymentLogEntry, PlanningEntry, Recipe},
};

use super::{OrderFilter, PaymentTransition, PersistenceGateway, TransitionOutcome};

#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub user_id: Option<Uuid>,
    pub action: String,
    pub resource: Option<String>,
    pub metadata: Option<Value>,
}

#[derive(Default)]
struct Tables {
    orders: Vec<Order>,
    payment_logs: Vec<PaymentLogEntry>,
    planning: Vec<PlanningEntry>,
    family_sizes: HashMap<Uuid, u32>,
    recipes: Vec<Recipe>,
    menus: Vec<Menu>,
    audit: Vec<AuditRecord>,
    order_writes: u64,
}

/// Single-process store. Every operation runs under one lock, which gives the
/// payment transition the same compare-and-swap behaviour as the SQL store.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_recipe(&self, recipe: Recipe) {
        self.tables.lock().await.recipes.push(recipe);
    }

    pub async fn insert_menu(&self, menu: Menu) {
        self.tables.lock().await.menus.push(menu);
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.tables.lock().await.orders.clone()
    }

    pub async fn payment_logs(&self) -> Vec<PaymentLogEntry> {
        self.tables.lock().await.payment_logs.clone()
    }

    pub async fn audit_records(&self) -> Vec<AuditRecord> {
        self.tables.lock().await.audit.clone()
    }

    /// Number of inserts and applied payment transitions on orders.
    pub async fn order_writes(&self) -> u64 {
        self.tables.lock().await.order_writes
    }
}

#[async_trait]
impl PersistenceGateway for MemoryStore {
    async fn find_order_by_reference(&self, reference: &str) -> AppResult<Option<Order>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .orders
            .iter()
            .find(|o| o.payment_reference == reference)
            .cloned())
    }

    async fn find_order(&self, user_id: Uuid, order_id: Uuid) -> AppResult<Option<Order>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .orders
            .iter()
            .find(|o| o.id == order_id && o.user_id == user_id)
            .cloned())
    }

    async fn list_orders(&self, user_id: Uuid, filter: OrderFilter) -> AppResult<(Vec<Order>, i64)> {
        let tables = self.tables.lock().await;
        let mut orders: Vec<Order> = tables
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .filter(|o| filter.status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at);
        if filter.newest_first {
            orders.reverse();
        }
        let total = orders.len() as i64;
        let page = orders
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn save_order(&self, order: &Order) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        let duplicate = tables.orders.iter().any(|o| {
            o.payment_reference == order.payment_reference || o.order_number == order.order_number
        });
        if duplicate {
            return Err(AppError::Conflict(format!(
                "order {} already exists",
                order.order_number
            )));
        }
        tables.orders.push(order.clone());
        tables.order_writes += 1;
        Ok(())
    }

    async fn update_order_payment_status(
        &self,
        order_id: Uuid,
        transition: PaymentTransition,
    ) -> AppResult<TransitionOutcome> {
        let mut tables = self.tables.lock().await;
        let Some(order) = tables.orders.iter_mut().find(|o| o.id == order_id) else {
            return Ok(TransitionOutcome::Missing);
        };
        if order.payment_status != transition.from {
            return Ok(TransitionOutcome::Unchanged(order.clone()));
        }
        order.payment_status = transition.to;
        if let Some(status) = transition.order_status {
            order.status = status;
        }
        if transition.paid_at.is_some() {
            order.paid_at = transition.paid_at;
        }
        order.updated_at = Utc::now();
        let updated = order.clone();
        tables.order_writes += 1;
        Ok(TransitionOutcome::Applied(updated))
    }

    async fn insert_payment_log(&self, entry: &PaymentLogEntry) -> AppResult<()> {
        self.tables.lock().await.payment_logs.push(entry.clone());
        Ok(())
    }

    async fn find_unprocessed_payment_logs(&self, reference: &str) -> AppResult<Vec<PaymentLogEntry>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .payment_logs
            .iter()
            .filter(|l| l.reference == reference && !l.processed)
            .cloned()
            .collect())
    }

    async fn mark_payment_log_processed(&self, log_id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        match tables
            .payment_logs
            .iter_mut()
            .find(|l| l.id == log_id && !l.processed)
        {
            Some(log) => {
                log.processed = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn load_planning_entries(&self, user_id: Uuid) -> AppResult<Vec<PlanningEntry>> {
        let tables = self.tables.lock().await;
        let mut entries: Vec<PlanningEntry> = tables
            .planning
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| (a.date_key, a.created_at).cmp(&(b.date_key, b.created_at)));
        Ok(entries)
    }

    async fn add_planning_entries(&self, entries: &[PlanningEntry]) -> AppResult<()> {
        self.tables
            .lock()
            .await
            .planning
            .extend(entries.iter().cloned());
        Ok(())
    }

    async fn remove_planning_entry(&self, user_id: Uuid, entry_id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.planning.len();
        tables
            .planning
            .retain(|e| !(e.id == entry_id && e.user_id == user_id));
        Ok(tables.planning.len() != before)
    }

    async fn family_size(&self, user_id: Uuid) -> AppResult<u32> {
        let tables = self.tables.lock().await;
        Ok(tables.family_sizes.get(&user_id).copied().unwrap_or(1))
    }

    async fn set_family_size(&self, user_id: Uuid, family_size: u32) -> AppResult<()> {
        self.tables
            .lock()
            .await
            .family_sizes
            .insert(user_id, family_size);
        Ok(())
    }

    async fn list_recipes(&self, user_id: Uuid) -> AppResult<Vec<Recipe>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .recipes
            .iter()
            .filter(|r| !r.is_custom || r.is_validated || r.owner_id == Some(user_id))
            .cloned()
            .collect())
    }

    async fn find_menu(&self, menu_id: Uuid) -> AppResult<Option<Menu>> {
        let tables = self.tables.lock().await;
        Ok(tables.menus.iter().find(|m| m.id == menu_id).cloned())
    }

    async fn log_audit(
        &self,
        user_id: Option<Uuid>,
        action: &str,
        resource: Option<&str>,
        metadata: Option<Value>,
    ) -> AppResult<()> {
        self.tables.lock().await.audit.push(AuditRecord {
            user_id,
            action: action.to_string(),
            resource: resource.map(str::to_string),
            metadata,
        });
        Ok(())
    }
}
