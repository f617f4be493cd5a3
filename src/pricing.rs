use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Largest number of servings one planned meal can be scaled to.
pub const MAX_PERSON_COUNT: u32 = 100;

/// Largest household a shopping list can be scaled to.
pub const MAX_FAMILY_SIZE: u32 = 50;

/// Ingredient grade chosen for a meal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    #[default]
    Standard,
    Premium,
    Bio,
}

impl QualityTier {
    pub fn multiplier(self) -> f64 {
        match self {
            QualityTier::Standard => 1.0,
            QualityTier::Premium => 1.5,
            QualityTier::Bio => 2.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QualityTier::Standard => "standard",
            QualityTier::Premium => "premium",
            QualityTier::Bio => "bio",
        }
    }
}

/// Rounds to the nearest whole currency unit, halves away from zero.
pub fn round_currency(value: f64) -> i64 {
    value.round() as i64
}

/// Price of one planned line: base price scaled by quantity, quality tier
/// and household size.
pub fn unit_line_price(base_price: i64, quantity: f64, quality: QualityTier, family_size: u32) -> i64 {
    round_currency(base_price as f64 * quantity * quality.multiplier() * family_size as f64)
}

/// Price per unit of quantity, zero when the quantity is zero.
pub fn price_per_unit(price: i64, quantity: f64) -> f64 {
    if quantity == 0.0 {
        0.0
    } else {
        price as f64 / quantity
    }
}
