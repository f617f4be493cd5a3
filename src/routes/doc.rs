use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        orders::{CheckoutRequest, CheckoutResponse, OrderList},
        payment::{VerifiedPayment, VerifyPaymentRequest, VerifyPaymentResponse, WebhookAck},
        planning::{AddMealRequest, AddMenuRequest, FamilySize, PlanningList},
        shopping::{SessionEdit, ShoppingList, ShoppingListRequest},
    },
    models::{DeliveryInfo, Meal, MealIngredient, MealSlot, Order, OrderStatus, PaymentStatus, PlanningEntry},
    pricing::QualityTier,
    response::{ApiResponse, ErrorResponse, Meta},
    routes::{health, orders, params, payment, planning, shopping, webhooks},
    services::shopping_service::ConsolidatedIngredient,
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        planning::list_planning,
        planning::add_meal,
        planning::add_menu,
        planning::remove_entry,
        planning::get_family_size,
        planning::set_family_size,
        shopping::shopping_list,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::confirm_payment,
        payment::verify_payment,
        webhooks::paystack_webhook
    ),
    components(
        schemas(
            Meal,
            MealIngredient,
            MealSlot,
            QualityTier,
            PlanningEntry,
            DeliveryInfo,
            Order,
            OrderStatus,
            PaymentStatus,
            ConsolidatedIngredient,
            SessionEdit,
            AddMealRequest,
            AddMenuRequest,
            FamilySize,
            PlanningList,
            ShoppingListRequest,
            ShoppingList,
            CheckoutRequest,
            CheckoutResponse,
            OrderList,
            VerifyPaymentRequest,
            VerifyPaymentResponse,
            VerifiedPayment,
            WebhookAck,
            params::Pagination,
            params::OrderListQuery,
            Meta,
            ErrorResponse,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<PlanningList>,
            ApiResponse<ShoppingList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Planning", description = "Meal planning endpoints"),
        (name = "Shopping", description = "Shopping list endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Payment", description = "Payment verification and gateway webhooks"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
