use std::sync::Arc;

use crate::{gateway::PaymentGateway, store::PersistenceGateway};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PersistenceGateway>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub webhook_secret: Arc<str>,
    pub order_prefix: Arc<str>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn PersistenceGateway>,
        gateway: Arc<dyn PaymentGateway>,
        webhook_secret: impl Into<Arc<str>>,
        order_prefix: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            store,
            gateway,
            webhook_secret: webhook_secret.into(),
            order_prefix: order_prefix.into(),
        }
    }
}
