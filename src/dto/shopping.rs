use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::services::shopping_service::ConsolidatedIngredient;

/// One user edit replayed on top of a freshly consolidated list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SessionEdit {
    SetQuantity {
        name: String,
        unit: String,
        quantity: f64,
    },
    Exclude {
        name: String,
        unit: String,
    },
    Restore {
        name: String,
        unit: String,
    },
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ShoppingListRequest {
    #[serde(default)]
    pub edits: Vec<SessionEdit>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShoppingList {
    pub today: NaiveDate,
    pub family_size: u32,
    pub items: Vec<ConsolidatedIngredient>,
    pub total: i64,
}
