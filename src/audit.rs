use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

pub const ORDER_CREATED: &str = "order_created";
pub const PAYMENT_CONFIRMED: &str = "payment_confirmed";
pub const PAYMENT_FAILED: &str = "payment_failed";
pub const PAYMENT_LOGGED: &str = "payment_logged";
pub const PAYMENT_RECONCILED: &str = "payment_reconciled";

pub async fn log_audit(
    pool: &DbPool,
    user_id: Option<Uuid>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) -> AppResult<()> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(action)
    .bind(resource)
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(())
}
