use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::pricing::QualityTier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Ingredient {
    pub name: String,
    pub unit: String,
    pub quantity_per_serving: f64,
    pub price_per_unit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecipeIngredient {
    pub ingredient: Ingredient,
    pub quantity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecipeCategory {
    Entree,
    Principal,
    Accompagnement,
    Dessert,
    Boisson,
}

impl RecipeCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            RecipeCategory::Entree => "entree",
            RecipeCategory::Principal => "principal",
            RecipeCategory::Accompagnement => "accompagnement",
            RecipeCategory::Dessert => "dessert",
            RecipeCategory::Boisson => "boisson",
        }
    }
}

impl FromStr for RecipeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entree" => Ok(RecipeCategory::Entree),
            "principal" => Ok(RecipeCategory::Principal),
            "accompagnement" => Ok(RecipeCategory::Accompagnement),
            "dessert" => Ok(RecipeCategory::Dessert),
            "boisson" => Ok(RecipeCategory::Boisson),
            other => Err(format!("unknown recipe category {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Origin {
    pub continent: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Recipe {
    pub id: Uuid,
    pub name: String,
    pub category: RecipeCategory,
    pub ingredients: Vec<RecipeIngredient>,
    pub base_price: i64,
    pub origin: Origin,
    pub is_custom: bool,
    pub is_validated: bool,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Snack,
    Dinner,
}

impl MealSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Snack => "snack",
            MealSlot::Dinner => "dinner",
        }
    }
}

impl FromStr for MealSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "breakfast" => Ok(MealSlot::Breakfast),
            "lunch" => Ok(MealSlot::Lunch),
            "snack" => Ok(MealSlot::Snack),
            "dinner" => Ok(MealSlot::Dinner),
            other => Err(format!("unknown meal slot {other}")),
        }
    }
}

/// What a menu line stands for: a slot of the day or a course category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MenuCourse {
    Slot(MealSlot),
    Category(RecipeCategory),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MenuEntry {
    pub course: MenuCourse,
    pub recipe_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Menu {
    pub id: Uuid,
    pub name: String,
    pub entries: Vec<MenuEntry>,
}

/// Ingredient line frozen into a meal at planning time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MealIngredient {
    pub name: String,
    pub unit: String,
    pub quantity: f64,
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Meal {
    pub id: Uuid,
    pub name: String,
    pub category: RecipeCategory,
    pub unit_price: i64,
    pub person_count: u32,
    pub quality: QualityTier,
    pub ingredients: Vec<MealIngredient>,
    pub source_ref: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlanningEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date_key: NaiveDate,
    pub meal_slot: MealSlot,
    pub meal: Meal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    EnAttente,
    Paye,
    Echoue,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::EnAttente => "en_attente",
            PaymentStatus::Paye => "paye",
            PaymentStatus::Echoue => "echoue",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, PaymentStatus::EnAttente)
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en_attente" => Ok(PaymentStatus::EnAttente),
            "paye" => Ok(PaymentStatus::Paye),
            "echoue" => Ok(PaymentStatus::Echoue),
            other => Err(format!("unknown payment status {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Brouillon,
    Confirmee,
    EnPreparation,
    EnLivraison,
    Livree,
    Annulee,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Brouillon => "brouillon",
            OrderStatus::Confirmee => "confirmee",
            OrderStatus::EnPreparation => "en_preparation",
            OrderStatus::EnLivraison => "en_livraison",
            OrderStatus::Livree => "livree",
            OrderStatus::Annulee => "annulee",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "brouillon" => Ok(OrderStatus::Brouillon),
            "confirmee" => Ok(OrderStatus::Confirmee),
            "en_preparation" => Ok(OrderStatus::EnPreparation),
            "en_livraison" => Ok(OrderStatus::EnLivraison),
            "livree" => Ok(OrderStatus::Livree),
            "annulee" => Ok(OrderStatus::Annulee),
            other => Err(format!("unknown order status {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeliveryInfo {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_number: String,
    pub payment_reference: String,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub amount: i64,
    pub items: Vec<Meal>,
    pub delivery_info: DeliveryInfo,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Settled charge that arrived before its order was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentLogEntry {
    pub id: Uuid,
    pub reference: String,
    pub amount: i64,
    pub channel: Option<String>,
    pub customer_email: Option<String>,
    pub status: String,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    pub paid_at: Option<DateTime<Utc>>,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
}
