use chrono::Utc;
use uuid::Uuid;

use crate::{
    dto::planning::{AddMealRequest, AddMenuRequest, FamilySize, PlanningList, PlanningQuery},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Meal, MealSlot, MenuCourse, PlanningEntry},
    response::{ApiResponse, Meta},
    pricing::MAX_FAMILY_SIZE,
    services::meal_service::{ensure_person_count, instantiate_meal, instantiate_menu_with_quality},
    state::AppState,
};

fn person_count(raw: i32) -> AppResult<u32> {
    let count = u32::try_from(raw).unwrap_or(0);
    ensure_person_count(count)?;
    Ok(count)
}

fn new_entry(user: &AuthUser, date_key: chrono::NaiveDate, meal_slot: MealSlot, meal: Meal) -> PlanningEntry {
    PlanningEntry {
        id: Uuid::new_v4(),
        user_id: user.user_id,
        date_key,
        meal_slot,
        meal,
        created_at: Utc::now(),
    }
}

pub async fn list_entries(
    state: &AppState,
    user: &AuthUser,
    query: PlanningQuery,
) -> AppResult<ApiResponse<PlanningList>> {
    let items: Vec<PlanningEntry> = state
        .store
        .load_planning_entries(user.user_id)
        .await?
        .into_iter()
        .filter(|e| query.from.is_none_or(|from| e.date_key >= from))
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "OK",
        PlanningList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn add_meal(
    state: &AppState,
    user: &AuthUser,
    payload: AddMealRequest,
) -> AppResult<ApiResponse<PlanningEntry>> {
    let person_count = person_count(payload.person_count)?;
    let recipes = state.store.list_recipes(user.user_id).await?;
    let recipe = recipes
        .iter()
        .find(|r| r.id == payload.recipe_id)
        .ok_or(AppError::NotFound)?;

    let meal = instantiate_meal(recipe, person_count, payload.quality)?;
    let entry = new_entry(user, payload.date_key, payload.meal_slot, meal);
    state
        .store
        .add_planning_entries(std::slice::from_ref(&entry))
        .await?;

    tracing::info!(
        user_id = %user.user_id,
        date = %entry.date_key,
        slot = entry.meal_slot.as_str(),
        recipe = %recipe.name,
        "meal planned"
    );

    Ok(ApiResponse::success("Meal planned", entry, Some(Meta::empty())))
}

pub async fn add_menu(
    state: &AppState,
    user: &AuthUser,
    payload: AddMenuRequest,
) -> AppResult<ApiResponse<PlanningList>> {
    let person_count = person_count(payload.person_count)?;
    let menu = state
        .store
        .find_menu(payload.menu_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let recipes = state.store.list_recipes(user.user_id).await?;

    let meals = instantiate_menu_with_quality(&menu, &recipes, person_count, payload.quality)?;
    if meals.len() < menu.entries.len() {
        tracing::warn!(
            menu = %menu.name,
            resolved = meals.len(),
            expected = menu.entries.len(),
            "some menu recipes could not be resolved"
        );
    }

    let items: Vec<PlanningEntry> = meals
        .into_iter()
        .map(|m| {
            let slot = match m.course {
                MenuCourse::Slot(slot) => slot,
                MenuCourse::Category(_) => payload.default_slot,
            };
            new_entry(user, payload.date_key, slot, m.meal)
        })
        .collect();

    state.store.add_planning_entries(&items).await?;

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Menu planned",
        PlanningList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn remove_entry(
    state: &AppState,
    user: &AuthUser,
    entry_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if !state
        .store
        .remove_planning_entry(user.user_id, entry_id)
        .await?
    {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Removed from planning",
        serde_json::json!({ "id": entry_id }),
        Some(Meta::empty()),
    ))
}

pub async fn get_family_size(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<FamilySize>> {
    let family_size = state.store.family_size(user.user_id).await?;
    Ok(ApiResponse::success(
        "OK",
        FamilySize {
            family_size: family_size as i32,
        },
        None,
    ))
}

pub async fn set_family_size(
    state: &AppState,
    user: &AuthUser,
    payload: FamilySize,
) -> AppResult<ApiResponse<FamilySize>> {
    let family_size = u32::try_from(payload.family_size)
        .ok()
        .filter(|size| (1..=MAX_FAMILY_SIZE).contains(size))
        .ok_or_else(|| {
            AppError::BadRequest(format!("family size must be between 1 and {MAX_FAMILY_SIZE}"))
        })?;
    state.store.set_family_size(user.user_id, family_size).await?;
    Ok(ApiResponse::success("Family size updated", payload, None))
}
