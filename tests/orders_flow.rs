mod support;

use std::sync::Arc;

use chrono::{Days, Utc};
use meal_order_api::{
    db::{create_pool, orm_from_pool, run_migrations},
    dto::{
        orders::CheckoutRequest,
        planning::{AddMealRequest, AddMenuRequest, FamilySize},
        shopping::SessionEdit,
    },
    entity::users::ActiveModel as UserActive,
    error::AppError,
    gateway::TransactionStatus,
    middleware::auth::AuthUser,
    models::{MealSlot, Menu, MenuCourse, MenuEntry, OrderStatus, PaymentStatus},
    pricing::{MAX_FAMILY_SIZE, MAX_PERSON_COUNT, QualityTier},
    routes::params::OrderListQuery,
    services::{order_service, payment_service, planning_service},
    state::AppState,
    store::{MemoryStore, PersistenceGateway, SeaOrmStore},
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

use support::{FakeGateway, FakeReply, app_state, delivery, entry, poulet, transaction};

fn user() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        role: "user".into(),
    }
}

fn checkout_request(edits: Vec<SessionEdit>) -> CheckoutRequest {
    CheckoutRequest {
        delivery_info: delivery(),
        edits,
    }
}

async fn plan_poulet(state: &AppState, user: &AuthUser, recipe_id: Uuid) -> anyhow::Result<()> {
    planning_service::add_meal(
        state,
        user,
        AddMealRequest {
            date_key: Utc::now().date_naive(),
            meal_slot: MealSlot::Lunch,
            recipe_id,
            person_count: 2,
            quality: QualityTier::Premium,
        },
    )
    .await?;
    Ok(())
}

// Planning -> checkout -> client confirmation, against the in-memory store.
#[tokio::test]
async fn plan_checkout_and_confirm_flow() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(FakeGateway::unavailable());
    let state = app_state(store.clone(), gateway.clone());
    let user = user();

    let recipe = poulet();
    store.insert_recipe(recipe.clone()).await;

    planning_service::set_family_size(&state, &user, FamilySize { family_size: 3 }).await?;
    plan_poulet(&state, &user, recipe.id).await?;

    // Yesterday's meal is not shopped for.
    let yesterday = Utc::now().date_naive().checked_sub_days(Days::new(1)).unwrap();
    let past = meal_order_api::services::meal_service::instantiate_meal(&recipe, 5, QualityTier::Bio)?;
    store.add_planning_entries(&[entry(user.user_id, yesterday, past)]).await?;

    let resp = order_service::checkout(&state, &user, checkout_request(Vec::new())).await?;
    let checkout = resp.data.unwrap();
    let order = checkout.order;

    // (4500 + 300) × family of 3
    assert_eq!(order.amount, 14400);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].unit_price, 6000);
    assert_eq!(order.payment_status, PaymentStatus::EnAttente);
    assert_eq!(order.status, OrderStatus::Brouillon);
    assert!(order.order_number.starts_with("TLR"));
    assert_eq!(order.order_number.len(), 13);
    assert!(order.payment_reference.starts_with("TLR"));
    assert_eq!(order.payment_reference.len(), 13);
    assert_eq!(checkout.shopping_list.len(), 2);

    // Gateway down: confirmation fails and nothing changes.
    let err = order_service::confirm_payment(&state, &user, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UpstreamUnavailable(_)));

    gateway.set_reply(FakeReply::Transaction(transaction(
        &order.payment_reference,
        order.amount,
        TransactionStatus::Success,
    )));
    let confirmed = order_service::confirm_payment(&state, &user, order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(confirmed.payment_status, PaymentStatus::Paye);
    assert_eq!(confirmed.status, OrderStatus::Confirmee);

    let fetched = order_service::get_order(&state, &user, order.id).await?.data.unwrap();
    assert_eq!(fetched, confirmed);

    let list = order_service::list_orders(
        &state,
        &user,
        OrderListQuery {
            page: None,
            per_page: None,
            status: Some(OrderStatus::Confirmee),
            sort_order: None,
        },
    )
    .await?;
    assert_eq!(list.data.unwrap().items.len(), 1);
    assert_eq!(list.meta.unwrap().total, Some(1));

    let actions: Vec<String> = store
        .audit_records()
        .await
        .into_iter()
        .map(|r| r.action)
        .collect();
    assert_eq!(actions, vec!["order_created", "payment_confirmed"]);

    Ok(())
}

#[tokio::test]
async fn checkout_applies_shopping_list_edits() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let state = app_state(store.clone(), Arc::new(FakeGateway::unavailable()));
    let user = user();
    let recipe = poulet();
    store.insert_recipe(recipe.clone()).await;
    plan_poulet(&state, &user, recipe.id).await?;

    let edits = vec![SessionEdit::Exclude {
        name: "oignon".into(),
        unit: "piece".into(),
    }];
    let order = order_service::checkout(&state, &user, checkout_request(edits))
        .await?
        .data
        .unwrap()
        .order;

    assert_eq!(order.amount, 4500);
    Ok(())
}

#[tokio::test]
async fn checkout_rejects_empty_plan_and_missing_delivery() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let state = app_state(store.clone(), Arc::new(FakeGateway::unavailable()));
    let user = user();

    let empty = order_service::checkout(&state, &user, checkout_request(Vec::new())).await;
    assert!(matches!(empty, Err(AppError::BadRequest(_))));

    let recipe = poulet();
    store.insert_recipe(recipe.clone()).await;
    plan_poulet(&state, &user, recipe.id).await?;

    let mut request = checkout_request(Vec::new());
    request.delivery_info.phone = "  ".into();
    let missing = order_service::checkout(&state, &user, request).await;
    assert!(matches!(missing, Err(AppError::BadRequest(ref m)) if m.contains("phone")));

    assert!(store.orders().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn orders_are_scoped_to_their_owner() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let state = app_state(store.clone(), Arc::new(FakeGateway::unavailable()));
    let owner = user();
    let recipe = poulet();
    store.insert_recipe(recipe.clone()).await;
    plan_poulet(&state, &owner, recipe.id).await?;
    let order = order_service::checkout(&state, &owner, checkout_request(Vec::new()))
        .await?
        .data
        .unwrap()
        .order;

    let stranger = user();
    let err = order_service::get_order(&state, &stranger, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    Ok(())
}

#[tokio::test]
async fn menu_planning_skips_unresolved_recipes() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let state = app_state(store.clone(), Arc::new(FakeGateway::unavailable()));
    let user = user();
    store.insert_recipe(poulet()).await;
    let menu = Menu {
        id: Uuid::new_v4(),
        name: "Semaine".into(),
        entries: vec![
            MenuEntry {
                course: MenuCourse::Category(meal_order_api::models::RecipeCategory::Principal),
                recipe_name: "Poulet".into(),
            },
            MenuEntry {
                course: MenuCourse::Slot(MealSlot::Breakfast),
                recipe_name: "Recette supprimée".into(),
            },
        ],
    };
    store.insert_menu(menu.clone()).await;

    let planned = planning_service::add_menu(
        &state,
        &user,
        AddMenuRequest {
            date_key: Utc::now().date_naive(),
            menu_id: menu.id,
            person_count: 2,
            quality: QualityTier::Standard,
            default_slot: MealSlot::Dinner,
        },
    )
    .await?
    .data
    .unwrap();

    assert_eq!(planned.items.len(), 1);
    assert_eq!(planned.items[0].meal_slot, MealSlot::Dinner);
    assert_eq!(planned.items[0].meal.unit_price, 4000);

    let id = planned.items[0].id;
    planning_service::remove_entry(&state, &user, id).await?;
    let again = planning_service::remove_entry(&state, &user, id).await;
    assert!(matches!(again, Err(AppError::NotFound)));
    Ok(())
}

// Same flow against Postgres; skipped when no database is configured.
#[tokio::test]
async fn planning_rejects_oversized_counts() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let state = app_state(store.clone(), Arc::new(FakeGateway::unavailable()));
    let user = user();
    let recipe = poulet();
    store.insert_recipe(recipe.clone()).await;

    for family_size in [0, -3, MAX_FAMILY_SIZE as i32 + 1, i32::MAX] {
        let err = planning_service::set_family_size(&state, &user, FamilySize { family_size })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
    assert_eq!(store.family_size(user.user_id).await?, 1);

    for person_count in [0, MAX_PERSON_COUNT as i32 + 1, 2_000_000_000] {
        let err = planning_service::add_meal(
            &state,
            &user,
            AddMealRequest {
                date_key: Utc::now().date_naive(),
                meal_slot: MealSlot::Dinner,
                recipe_id: recipe.id,
                person_count,
                quality: QualityTier::Standard,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
    assert!(store.load_planning_entries(user.user_id).await?.is_empty());

    planning_service::set_family_size(&state, &user, FamilySize { family_size: MAX_FAMILY_SIZE as i32 }).await?;
    assert_eq!(store.family_size(user.user_id).await?, MAX_FAMILY_SIZE);
    Ok(())
}

#[tokio::test]
async fn checkout_and_webhook_against_postgres() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let pool = create_pool(&database_url).await?;
    let orm = orm_from_pool(pool.clone());
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE audit_logs, payment_logs, orders, planning_entries, menus, recipes, users CASCADE",
    ))
    .await?;

    let user_row = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set("user@example.com".to_string()),
        role: Set("user".into()),
        family_size: Set(1),
        created_at: NotSet,
    }
    .insert(&orm)
    .await?;
    let user = AuthUser {
        user_id: user_row.id,
        role: "user".into(),
    };

    let recipe = poulet();
    meal_order_api::entity::recipes::ActiveModel {
        id: Set(recipe.id),
        name: Set(recipe.name.clone()),
        category: Set(recipe.category.as_str().to_string()),
        ingredients: Set(serde_json::to_value(&recipe.ingredients)?),
        base_price: Set(recipe.base_price),
        origin_continent: Set(recipe.origin.continent.clone()),
        origin_country: Set(recipe.origin.country.clone()),
        is_custom: Set(false),
        is_validated: Set(true),
        owner_id: Set(None),
        created_at: NotSet,
    }
    .insert(&orm)
    .await?;

    let gateway = Arc::new(FakeGateway::unavailable());
    let store = Arc::new(SeaOrmStore::new(orm, pool));
    let state = AppState::new(store.clone(), gateway.clone(), support::WEBHOOK_SECRET, "TLR");

    plan_poulet(&state, &user, recipe.id).await?;
    let order = order_service::checkout(&state, &user, checkout_request(Vec::new()))
        .await?
        .data
        .unwrap()
        .order;
    assert_eq!(order.amount, 4800);

    let body = support::charge_event("charge.success", &order.payment_reference, order.amount);
    let signature = meal_order_api::gateway::signature::sign_hmac_sha512_hex(support::WEBHOOK_SECRET, &body);
    for _ in 0..2 {
        payment_service::handle_webhook(
            store.as_ref(),
            gateway.as_ref(),
            support::WEBHOOK_SECRET,
            Some(&signature),
            &body,
        )
        .await?;
    }

    let stored = store
        .find_order_by_reference(&order.payment_reference)
        .await?
        .unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Paye);
    assert_eq!(stored.status, OrderStatus::Confirmee);

    Ok(())
}
