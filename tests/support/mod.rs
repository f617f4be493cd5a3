#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use meal_order_api::{
    gateway::{GatewayError, GatewayTransaction, PaymentGateway, TransactionStatus},
    models::{
        DeliveryInfo, Ingredient, Meal, MealSlot, Order, OrderStatus, Origin, PaymentStatus,
        PlanningEntry, Recipe, RecipeCategory, RecipeIngredient,
    },
    state::AppState,
    store::MemoryStore,
};
use uuid::Uuid;

pub const WEBHOOK_SECRET: &str = "sk_test_webhook";

#[derive(Debug, Clone)]
pub enum FakeReply {
    Transaction(GatewayTransaction),
    NotFound,
    Unavailable,
}

/// Scripted gateway that counts how often it was asked.
pub struct FakeGateway {
    reply: Mutex<FakeReply>,
    calls: AtomicUsize,
}

impl FakeGateway {
    pub fn new(reply: FakeReply) -> Self {
        Self {
            reply: Mutex::new(reply),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn success(reference: &str, amount: i64) -> Self {
        Self::new(FakeReply::Transaction(transaction(
            reference,
            amount,
            TransactionStatus::Success,
        )))
    }

    pub fn unavailable() -> Self {
        Self::new(FakeReply::Unavailable)
    }

    pub fn set_reply(&self, reply: FakeReply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn verify_transaction(&self, reference: &str) -> Result<GatewayTransaction, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reply.lock().unwrap().clone() {
            FakeReply::Transaction(tx) => Ok(tx),
            FakeReply::NotFound => Err(GatewayError::NotFound(reference.to_string())),
            FakeReply::Unavailable => Err(GatewayError::Unavailable("timed out".into())),
        }
    }
}

pub fn transaction(reference: &str, amount: i64, status: TransactionStatus) -> GatewayTransaction {
    GatewayTransaction {
        reference: reference.to_string(),
        status,
        amount,
        currency: "NGN".to_string(),
        paid_at: Some(Utc::now()),
        channel: Some("card".to_string()),
        customer_email: Some("client@example.com".to_string()),
        metadata: serde_json::json!({}),
    }
}

pub fn app_state(store: Arc<MemoryStore>, gateway: Arc<FakeGateway>) -> AppState {
    AppState::new(store, gateway, WEBHOOK_SECRET, "TLR")
}

pub fn ingredient(name: &str, unit: &str, quantity: f64, price_per_unit: f64) -> RecipeIngredient {
    RecipeIngredient {
        ingredient: Ingredient {
            name: name.to_string(),
            unit: unit.to_string(),
            quantity_per_serving: quantity,
            price_per_unit,
        },
        quantity,
    }
}

pub fn recipe(name: &str, base_price: i64, ingredients: Vec<RecipeIngredient>) -> Recipe {
    Recipe {
        id: Uuid::new_v4(),
        name: name.to_string(),
        category: RecipeCategory::Principal,
        ingredients,
        base_price,
        origin: Origin {
            continent: "Afrique".to_string(),
            country: "Côte d'Ivoire".to_string(),
        },
        is_custom: false,
        is_validated: true,
        owner_id: None,
    }
}

pub fn poulet() -> Recipe {
    recipe(
        "Poulet",
        2000,
        vec![
            ingredient("poulet", "kg", 0.5, 3000.0),
            ingredient("oignon", "piece", 1.0, 100.0),
        ],
    )
}

pub fn entry(user_id: Uuid, date_key: NaiveDate, meal: Meal) -> PlanningEntry {
    PlanningEntry {
        id: Uuid::new_v4(),
        user_id,
        date_key,
        meal_slot: MealSlot::Lunch,
        meal,
        created_at: Utc::now(),
    }
}

pub fn delivery() -> DeliveryInfo {
    DeliveryInfo {
        full_name: "Awa Koné".to_string(),
        phone: "+2250700000000".to_string(),
        address: "Rue des Jardins 12".to_string(),
        city: "Abidjan".to_string(),
        notes: None,
    }
}

pub fn pending_order(user_id: Uuid, reference: &str, amount: i64) -> Order {
    let now = Utc::now();
    Order {
        id: Uuid::new_v4(),
        user_id,
        order_number: format!("N{reference}"),
        payment_reference: reference.to_string(),
        payment_status: PaymentStatus::EnAttente,
        status: OrderStatus::Brouillon,
        amount,
        items: Vec::new(),
        delivery_info: delivery(),
        paid_at: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn charge_event(event: &str, reference: &str, amount: i64) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "event": event,
        "data": {
            "reference": reference,
            "amount": amount,
            "status": if event == "charge.success" { "success" } else { "failed" },
            "currency": "NGN",
            "channel": "card",
            "paid_at": "2025-01-01T10:00:00.000Z",
            "customer": { "email": "client@example.com" },
            "metadata": { "order": reference }
        }
    }))
    .unwrap()
}
