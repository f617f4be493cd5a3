use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    models::{MealSlot, PlanningEntry},
    pricing::QualityTier,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddMealRequest {
    pub date_key: NaiveDate,
    pub meal_slot: MealSlot,
    pub recipe_id: Uuid,
    pub person_count: i32,
    #[serde(default)]
    pub quality: QualityTier,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddMenuRequest {
    pub date_key: NaiveDate,
    pub menu_id: Uuid,
    pub person_count: i32,
    #[serde(default)]
    pub quality: QualityTier,
    /// Slot used for menu lines that name a course category instead of a slot.
    pub default_slot: MealSlot,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PlanningQuery {
    pub from: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlanningList {
    pub items: Vec<PlanningEntry>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FamilySize {
    pub family_size: i32,
}
