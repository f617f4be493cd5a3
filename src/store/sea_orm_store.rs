use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
    sea_query::Expr,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    audit,
    db::{DbPool, OrmConn},
    entity::{
        menus::{Entity as Menus, Model as MenuModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        payment_logs::{
            ActiveModel as PaymentLogActive, Column as PaymentLogCol, Entity as PaymentLogs,
            Model as PaymentLogModel,
        },
        planning_entries::{
            ActiveModel as PlanningActive, Column as PlanningCol, Entity as PlanningEntries,
            Model as PlanningModel,
        },
        recipes::{Column as RecipeCol, Entity as Recipes, Model as RecipeModel},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    models::{Menu, Order, Origin, PaymentLogEntry, PlanningEntry, Recipe},
};

use super::{OrderFilter, PaymentTransition, PersistenceGateway, TransitionOutcome};

/// Postgres-backed store: SeaORM for entities, the raw pool for audit rows.
#[derive(Clone)]
pub struct SeaOrmStore {
    orm: OrmConn,
    pool: DbPool,
}

impl SeaOrmStore {
    pub fn new(orm: OrmConn, pool: DbPool) -> Self {
        Self { orm, pool }
    }

    async fn order_by_id(&self, order_id: Uuid) -> AppResult<Option<Order>> {
        Orders::find_by_id(order_id)
            .one(&self.orm)
            .await?
            .map(order_from_entity)
            .transpose()
    }
}

#[async_trait]
impl PersistenceGateway for SeaOrmStore {
    async fn find_order_by_reference(&self, reference: &str) -> AppResult<Option<Order>> {
        Orders::find()
            .filter(OrderCol::PaymentReference.eq(reference))
            .one(&self.orm)
            .await?
            .map(order_from_entity)
            .transpose()
    }

    async fn find_order(&self, user_id: Uuid, order_id: Uuid) -> AppResult<Option<Order>> {
        Orders::find()
            .filter(
                Condition::all()
                    .add(OrderCol::UserId.eq(user_id))
                    .add(OrderCol::Id.eq(order_id)),
            )
            .one(&self.orm)
            .await?
            .map(order_from_entity)
            .transpose()
    }

    async fn list_orders(&self, user_id: Uuid, filter: OrderFilter) -> AppResult<(Vec<Order>, i64)> {
        let mut condition = Condition::all().add(OrderCol::UserId.eq(user_id));
        if let Some(status) = filter.status {
            condition = condition.add(OrderCol::Status.eq(status.as_str()));
        }

        let mut finder = Orders::find().filter(condition);
        finder = if filter.newest_first {
            finder.order_by_desc(OrderCol::CreatedAt)
        } else {
            finder.order_by_asc(OrderCol::CreatedAt)
        };

        let total = finder.clone().count(&self.orm).await? as i64;

        let orders = finder
            .limit(filter.limit)
            .offset(filter.offset)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(order_from_entity)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((orders, total))
    }

    async fn save_order(&self, order: &Order) -> AppResult<()> {
        let active = OrderActive {
            id: Set(order.id),
            user_id: Set(order.user_id),
            order_number: Set(order.order_number.clone()),
            payment_reference: Set(order.payment_reference.clone()),
            payment_status: Set(order.payment_status.as_str().to_string()),
            status: Set(order.status.as_str().to_string()),
            amount: Set(order.amount),
            items: Set(to_json(&order.items)?),
            delivery_info: Set(to_json(&order.delivery_info)?),
            paid_at: Set(order.paid_at.map(|dt| dt.fixed_offset())),
            created_at: Set(order.created_at.fixed_offset()),
            updated_at: Set(order.updated_at.fixed_offset()),
        };

        match active.insert(&self.orm).await {
            Ok(_) => Ok(()),
            Err(err) => Err(map_unique_violation(err, &order.order_number)),
        }
    }

    async fn update_order_payment_status(
        &self,
        order_id: Uuid,
        transition: PaymentTransition,
    ) -> AppResult<TransitionOutcome> {
        let mut update = Orders::update_many()
            .col_expr(OrderCol::PaymentStatus, Expr::value(transition.to.as_str()))
            .col_expr(OrderCol::UpdatedAt, Expr::value(Utc::now().fixed_offset()));
        if let Some(status) = transition.order_status {
            update = update.col_expr(OrderCol::Status, Expr::value(status.as_str()));
        }
        if let Some(paid_at) = transition.paid_at {
            update = update.col_expr(OrderCol::PaidAt, Expr::value(paid_at.fixed_offset()));
        }

        // Compare-and-swap: only the writer that still sees `from` wins.
        let result = update
            .filter(OrderCol::Id.eq(order_id))
            .filter(OrderCol::PaymentStatus.eq(transition.from.as_str()))
            .exec(&self.orm)
            .await?;

        let current = self.order_by_id(order_id).await?;
        Ok(match (result.rows_affected, current) {
            (_, None) => TransitionOutcome::Missing,
            (0, Some(order)) => TransitionOutcome::Unchanged(order),
            (_, Some(order)) => TransitionOutcome::Applied(order),
        })
    }

    async fn insert_payment_log(&self, entry: &PaymentLogEntry) -> AppResult<()> {
        PaymentLogActive {
            id: Set(entry.id),
            reference: Set(entry.reference.clone()),
            amount: Set(entry.amount),
            channel: Set(entry.channel.clone()),
            customer_email: Set(entry.customer_email.clone()),
            status: Set(entry.status.clone()),
            metadata: Set(entry.metadata.clone()),
            paid_at: Set(entry.paid_at.map(|dt| dt.fixed_offset())),
            processed: Set(entry.processed),
            created_at: Set(entry.created_at.fixed_offset()),
        }
        .insert(&self.orm)
        .await?;
        Ok(())
    }

    async fn find_unprocessed_payment_logs(&self, reference: &str) -> AppResult<Vec<PaymentLogEntry>> {
        let logs = PaymentLogs::find()
            .filter(PaymentLogCol::Reference.eq(reference))
            .filter(PaymentLogCol::Processed.eq(false))
            .order_by_asc(PaymentLogCol::CreatedAt)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(payment_log_from_entity)
            .collect();
        Ok(logs)
    }

    async fn mark_payment_log_processed(&self, log_id: Uuid) -> AppResult<bool> {
        let result = PaymentLogs::update_many()
            .col_expr(PaymentLogCol::Processed, Expr::value(true))
            .filter(PaymentLogCol::Id.eq(log_id))
            .filter(PaymentLogCol::Processed.eq(false))
            .exec(&self.orm)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn load_planning_entries(&self, user_id: Uuid) -> AppResult<Vec<PlanningEntry>> {
        PlanningEntries::find()
            .filter(PlanningCol::UserId.eq(user_id))
            .order_by_asc(PlanningCol::DateKey)
            .order_by_asc(PlanningCol::CreatedAt)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(planning_from_entity)
            .collect()
    }

    async fn add_planning_entries(&self, entries: &[PlanningEntry]) -> AppResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let txn = self.orm.begin().await?;
        for entry in entries {
            PlanningActive {
                id: Set(entry.id),
                user_id: Set(entry.user_id),
                date_key: Set(entry.date_key),
                meal_slot: Set(entry.meal_slot.as_str().to_string()),
                meal: Set(to_json(&entry.meal)?),
                created_at: Set(entry.created_at.fixed_offset()),
            }
            .insert(&txn)
            .await?;
        }
        txn.commit().await?;
        Ok(())
    }

    async fn remove_planning_entry(&self, user_id: Uuid, entry_id: Uuid) -> AppResult<bool> {
        let result = PlanningEntries::delete_many()
            .filter(PlanningCol::Id.eq(entry_id))
            .filter(PlanningCol::UserId.eq(user_id))
            .exec(&self.orm)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn family_size(&self, user_id: Uuid) -> AppResult<u32> {
        let user = Users::find_by_id(user_id).one(&self.orm).await?;
        Ok(user
            .map(|u| u32::try_from(u.family_size).unwrap_or(1).max(1))
            .unwrap_or(1))
    }

    async fn set_family_size(&self, user_id: Uuid, family_size: u32) -> AppResult<()> {
        let family_size = i32::try_from(family_size)
            .map_err(|_| AppError::BadRequest("family size is too large".into()))?;
        let result = Users::update_many()
            .col_expr(UserCol::FamilySize, Expr::value(family_size))
            .filter(UserCol::Id.eq(user_id))
            .exec(&self.orm)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn list_recipes(&self, user_id: Uuid) -> AppResult<Vec<Recipe>> {
        Recipes::find()
            .filter(
                Condition::any()
                    .add(RecipeCol::IsCustom.eq(false))
                    .add(RecipeCol::IsValidated.eq(true))
                    .add(RecipeCol::OwnerId.eq(user_id)),
            )
            .order_by_asc(RecipeCol::Name)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(recipe_from_entity)
            .collect()
    }

    async fn find_menu(&self, menu_id: Uuid) -> AppResult<Option<Menu>> {
        Menus::find_by_id(menu_id)
            .one(&self.orm)
            .await?
            .map(menu_from_entity)
            .transpose()
    }

    async fn log_audit(
        &self,
        user_id: Option<Uuid>,
        action: &str,
        resource: Option<&str>,
        metadata: Option<Value>,
    ) -> AppResult<()> {
        audit::log_audit(&self.pool, user_id, action, resource, metadata).await
    }
}

fn map_unique_violation(err: DbErr, order_number: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict(format!("order {order_number} already exists"))
        }
        _ => AppError::OrmError(err),
    }
}

fn to_json<T: Serialize>(value: &T) -> AppResult<Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.into()))
}

fn from_json<T: DeserializeOwned>(value: Value, column: &str) -> AppResult<T> {
    serde_json::from_value(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid {column} column: {e}")))
}

fn parse_column<T: std::str::FromStr<Err = String>>(raw: &str) -> AppResult<T> {
    raw.parse::<T>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
}

fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    Ok(Order {
        id: model.id,
        user_id: model.user_id,
        order_number: model.order_number,
        payment_reference: model.payment_reference,
        payment_status: parse_column(&model.payment_status)?,
        status: parse_column(&model.status)?,
        amount: model.amount,
        items: from_json(model.items, "orders.items")?,
        delivery_info: from_json(model.delivery_info, "orders.delivery_info")?,
        paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn payment_log_from_entity(model: PaymentLogModel) -> PaymentLogEntry {
    PaymentLogEntry {
        id: model.id,
        reference: model.reference,
        amount: model.amount,
        channel: model.channel,
        customer_email: model.customer_email,
        status: model.status,
        metadata: model.metadata,
        paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
        processed: model.processed,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn planning_from_entity(model: PlanningModel) -> AppResult<PlanningEntry> {
    Ok(PlanningEntry {
        id: model.id,
        user_id: model.user_id,
        date_key: model.date_key,
        meal_slot: parse_column(&model.meal_slot)?,
        meal: from_json(model.meal, "planning_entries.meal")?,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

fn recipe_from_entity(model: RecipeModel) -> AppResult<Recipe> {
    Ok(Recipe {
        id: model.id,
        name: model.name,
        category: parse_column(&model.category)?,
        ingredients: from_json(model.ingredients, "recipes.ingredients")?,
        base_price: model.base_price,
        origin: Origin {
            continent: model.origin_continent,
            country: model.origin_country,
        },
        is_custom: model.is_custom,
        is_validated: model.is_validated,
        owner_id: model.owner_id,
    })
}

fn menu_from_entity(model: MenuModel) -> AppResult<Menu> {
    Ok(Menu {
        id: model.id,
        name: model.name,
        entries: from_json(model.entries, "menus.entries")?,
    })
}

