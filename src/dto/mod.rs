pub mod auth;
pub mod orders;
pub mod payment;
pub mod planning;
pub mod shopping;
