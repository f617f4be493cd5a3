//! Payment gateway adapter: server-to-gateway verification and webhook
//! signature checks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod paystack;
pub mod signature;

pub use paystack::PaystackClient;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transaction {0} not found")]
    NotFound(String),

    #[error("gateway unavailable: {0}")]
    Unavailable(String),

    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),

    #[error("gateway misconfigured: {0}")]
    Misconfigured(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Success,
    Failed,
    Abandoned,
    Pending,
    #[serde(other)]
    Unknown,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Success => "success",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Abandoned => "abandoned",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Unknown => "unknown",
        }
    }
}

/// Transaction as reported by the gateway's verify endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayTransaction {
    pub reference: String,
    pub status: TransactionStatus,
    pub amount: i64,
    pub currency: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub channel: Option<String>,
    pub customer_email: Option<String>,
    pub metadata: serde_json::Value,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    /// Looks a transaction up by reference. Must be bounded in time; a
    /// timeout is reported as `GatewayError::Unavailable`.
    async fn verify_transaction(&self, reference: &str) -> Result<GatewayTransaction, GatewayError>;
}
