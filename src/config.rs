use std::{env, time::Duration};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub paystack: PaystackConfig,
    pub order_prefix: String,
}

#[derive(Debug, Clone)]
pub struct PaystackConfig {
    pub secret_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let order_prefix = env::var("ORDER_PREFIX")
            .ok()
            .filter(|p| p.len() == 3 && p.chars().all(|c| c.is_ascii_alphabetic()))
            .map(|p| p.to_ascii_uppercase())
            .unwrap_or_else(|| "TLR".to_string());
        Ok(Self {
            port,
            database_url,
            host,
            paystack: PaystackConfig::from_env()?,
            order_prefix,
        })
    }
}

impl PaystackConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let secret_key = env::var("PAYSTACK_SECRET_KEY")
            .map_err(|_| anyhow::anyhow!("PAYSTACK_SECRET_KEY is not set"))?;
        let base_url = env::var("PAYSTACK_BASE_URL")
            .unwrap_or_else(|_| "https://api.paystack.co".to_string());
        let timeout = env::var("PAYSTACK_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse::<u64>().ok())
            .filter(|t| *t > 0)
            .unwrap_or(10);
        Ok(Self {
            secret_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout),
        })
    }
}
