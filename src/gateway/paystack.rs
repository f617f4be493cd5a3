use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::PaystackConfig;

use super::{GatewayError, GatewayTransaction, PaymentGateway, TransactionStatus};

/// Client for the Paystack transaction API. Authorization: bearer secret key.
#[derive(Clone)]
pub struct PaystackClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct VerifyEnvelope {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<VerifyData>,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: TransactionStatus,
    amount: i64,
    reference: String,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    paid_at: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    customer: Option<Customer>,
    #[serde(default)]
    metadata: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct Customer {
    #[serde(default)]
    email: Option<String>,
}

impl PaystackClient {
    pub fn new(config: &PaystackConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Misconfigured(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            secret_key: config.secret_key.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn verify_transaction(&self, reference: &str) -> Result<GatewayTransaction, GatewayError> {
        if self.secret_key.is_empty() {
            return Err(GatewayError::Misconfigured("PAYSTACK_SECRET_KEY is empty".into()));
        }

        let url = format!("{}/transaction/verify/{}", self.base_url, reference);
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Unavailable(format!("timeout: {e}"))
                } else {
                    GatewayError::Unavailable(e.to_string())
                }
            })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;

        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(reference.to_string()));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GatewayError::Misconfigured(format!(
                "gateway rejected credentials status={status}"
            )));
        }
        if status.is_server_error() {
            return Err(GatewayError::Unavailable(format!("status={status}")));
        }

        let envelope = serde_json::from_str::<VerifyEnvelope>(&body)
            .map_err(|e| GatewayError::InvalidResponse(format!("{e}; status={status}")))?;

        if !envelope.status {
            tracing::debug!(
                reference = %reference,
                message = envelope.message.as_deref().unwrap_or("-"),
                "gateway reported unknown transaction"
            );
            return Err(GatewayError::NotFound(reference.to_string()));
        }

        let data = envelope
            .data
            .ok_or_else(|| GatewayError::InvalidResponse("missing data".into()))?;

        Ok(GatewayTransaction {
            reference: data.reference,
            status: data.status,
            amount: data.amount,
            currency: data.currency.unwrap_or_else(|| "NGN".to_string()),
            paid_at: data.paid_at.as_deref().and_then(parse_timestamp),
            channel: data.channel,
            customer_email: data.customer.and_then(|c| c.email),
            metadata: data.metadata,
        })
    }
}

/// Lenient RFC 3339 parse; gateway timestamps are informational only.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
