pub mod meal_service;
pub mod order_service;
pub mod payment_service;
pub mod planning_service;
pub mod shopping_service;
