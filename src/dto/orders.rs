use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::shopping::SessionEdit,
    models::{DeliveryInfo, Order},
    services::shopping_service::ConsolidatedIngredient,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub delivery_info: DeliveryInfo,
    /// Shopping list edits made before checkout.
    #[serde(default)]
    pub edits: Vec<SessionEdit>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub order: Order,
    pub shopping_list: Vec<ConsolidatedIngredient>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
