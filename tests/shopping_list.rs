mod support;

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use meal_order_api::{
    dto::shopping::SessionEdit,
    error::AppError,
    models::{Meal, MealIngredient, RecipeCategory},
    pricing::QualityTier,
    services::shopping_service::{IngredientKey, ShoppingSession, consolidate, prepare_session},
    store::{MemoryStore, PersistenceGateway},
};
use uuid::Uuid;

use support::entry;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

fn meal(lines: &[(&str, &str, f64, i64)]) -> Meal {
    Meal {
        id: Uuid::new_v4(),
        name: "Plat".to_string(),
        category: RecipeCategory::Principal,
        unit_price: lines.iter().map(|l| l.3).sum(),
        person_count: 1,
        quality: QualityTier::Standard,
        ingredients: lines
            .iter()
            .map(|(name, unit, quantity, price)| MealIngredient {
                name: name.to_string(),
                unit: unit.to_string(),
                quantity: *quantity,
                price: *price,
            })
            .collect(),
        source_ref: None,
    }
}

#[test]
fn consolidation_is_repeatable() {
    let user = Uuid::new_v4();
    let entries = vec![
        entry(user, today(), meal(&[("riz", "kg", 0.5, 400), ("oignon", "piece", 2.0, 200)])),
        entry(user, today().checked_add_days(Days::new(2)).unwrap(), meal(&[("riz", "kg", 1.0, 800)])),
    ];

    let first = consolidate(&entries, today(), 4).unwrap();
    let second = consolidate(&entries, today(), 4).unwrap();
    assert_eq!(first, second);
}

#[test]
fn past_entries_are_left_out_and_today_is_kept() {
    let user = Uuid::new_v4();
    let yesterday = today().checked_sub_days(Days::new(1)).unwrap();
    let entries = vec![
        entry(user, yesterday, meal(&[("mangue", "piece", 3.0, 900)])),
        entry(user, today(), meal(&[("riz", "kg", 1.0, 800)])),
    ];

    let lines = consolidate(&entries, today(), 1).unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].name, "riz");
}

#[test]
fn same_ingredient_sums_like_separate_lines() {
    let user = Uuid::new_v4();
    let a = entry(user, today(), meal(&[("riz", "kg", 0.5, 333)]));
    let b = entry(user, today(), meal(&[("riz", "kg", 0.25, 167)]));

    let merged = consolidate(&[a.clone(), b.clone()], today(), 3).unwrap();
    let only_a = consolidate(&[a], today(), 3).unwrap();
    let only_b = consolidate(&[b], today(), 3).unwrap();

    assert_eq!(merged.len(), 1);
    assert_eq!(
        merged[0].total_price,
        only_a[0].total_price + only_b[0].total_price
    );
    assert_eq!(merged[0].quantity, only_a[0].quantity + only_b[0].quantity);
}

#[test]
fn same_name_with_different_units_stays_separate() {
    let user = Uuid::new_v4();
    let entries = vec![entry(
        user,
        today(),
        meal(&[("lait", "l", 1.0, 1000), ("lait", "boite", 2.0, 1200)]),
    )];

    let lines = consolidate(&entries, today(), 1).unwrap();
    assert_eq!(lines.len(), 2);
}

#[test]
fn quantity_override_only_touches_its_line() {
    let user = Uuid::new_v4();
    let entries = vec![entry(
        user,
        today(),
        meal(&[("riz", "kg", 2.0, 1600), ("oignon", "piece", 4.0, 400)]),
    )];
    let mut session = ShoppingSession::new(consolidate(&entries, today(), 1).unwrap());
    let onion = IngredientKey::new("oignon", "piece");
    let before = session.get(&onion).unwrap().clone();

    let line = session
        .set_quantity(&IngredientKey::new("riz", "kg"), 3.0)
        .unwrap();
    assert_eq!(line.total_price, 2400);

    assert_eq!(session.get(&onion).unwrap(), &before);
    assert_eq!(session.total().unwrap(), 2800);
}

#[test]
fn exclude_then_restore_round_trips() {
    let user = Uuid::new_v4();
    let entries = vec![entry(
        user,
        today(),
        meal(&[("riz", "kg", 2.0, 1600), ("oignon", "piece", 4.0, 400)]),
    )];
    let mut session = ShoppingSession::new(consolidate(&entries, today(), 2).unwrap());
    let rice = IngredientKey::new("riz", "kg");
    let before = session.get(&rice).unwrap().clone();

    session.exclude(&rice).unwrap();
    assert_eq!(session.total().unwrap(), 800);

    session.restore(&rice).unwrap();
    assert_eq!(session.get(&rice).unwrap(), &before);
    assert_eq!(session.total().unwrap(), 4000);
}

#[test]
fn invalid_edits_are_rejected() {
    let user = Uuid::new_v4();
    let entries = vec![entry(user, today(), meal(&[("riz", "kg", 1.0, 800)]))];
    let mut session = ShoppingSession::new(consolidate(&entries, today(), 1).unwrap());

    let unknown = session.exclude(&IngredientKey::new("sel", "g"));
    assert!(matches!(unknown, Err(AppError::BadRequest(_))));

    let zero = session.set_quantity(&IngredientKey::new("riz", "kg"), 0.0);
    assert!(matches!(zero, Err(AppError::BadRequest(_))));
    assert_eq!(session.total().unwrap(), 800);
}

#[tokio::test]
async fn prepared_session_uses_stored_family_size_and_replays_edits() {
    let store = Arc::new(MemoryStore::new());
    let user = Uuid::new_v4();
    store.set_family_size(user, 2).await.unwrap();
    store
        .add_planning_entries(&[entry(
            user,
            today(),
            meal(&[("riz", "kg", 1.0, 800), ("oignon", "piece", 2.0, 200)]),
        )])
        .await
        .unwrap();

    let edits = vec![SessionEdit::Exclude {
        name: "oignon".into(),
        unit: "piece".into(),
    }];
    let prepared = prepare_session(store.as_ref(), user, today(), &edits)
        .await
        .unwrap();

    assert_eq!(prepared.family_size, 2);
    assert_eq!(prepared.session.total().unwrap(), 1600);
    assert_eq!(prepared.session.lines().len(), 2);
}

#[test]
fn oversized_amounts_are_rejected_instead_of_wrapping() {
    let user = Uuid::new_v4();
    let pricey = vec![entry(user, today(), meal(&[("safran", "kg", 1.0, 5_000_000_000_000)]))];
    let err = consolidate(&pricey, today(), 2_000_000_000).unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Each line fits on its own, their sum does not.
    let entries = vec![
        entry(user, today(), meal(&[("safran", "kg", 1.0, 5_000_000_000_000_000_000)])),
        entry(user, today(), meal(&[("vanille", "kg", 1.0, 5_000_000_000_000_000_000)])),
    ];
    let session = ShoppingSession::new(consolidate(&entries, today(), 1).unwrap());
    assert_eq!(session.lines().len(), 2);
    let err = session.total().unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}
