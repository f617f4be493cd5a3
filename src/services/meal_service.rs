use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Meal, MealIngredient, Menu, MenuCourse, Recipe},
    pricing::{MAX_PERSON_COUNT, QualityTier, round_currency, unit_line_price},
};

/// A meal produced from one menu line.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MenuMeal {
    pub course: MenuCourse,
    pub meal: Meal,
}

pub(crate) fn ensure_person_count(person_count: u32) -> AppResult<()> {
    if !(1..=MAX_PERSON_COUNT).contains(&person_count) {
        return Err(AppError::BadRequest(format!(
            "person count must be between 1 and {MAX_PERSON_COUNT}"
        )));
    }
    Ok(())
}

/// Snapshots `recipe` for `person_count` people at `quality`.
///
/// Ingredient quantities and prices are scaled by
/// `person_count × quality multiplier`. Family size is applied later, when
/// the shopping list is consolidated.
pub fn instantiate_meal(recipe: &Recipe, person_count: u32, quality: QualityTier) -> AppResult<Meal> {
    ensure_person_count(person_count)?;
    let scale = person_count as f64 * quality.multiplier();

    let ingredients = recipe
        .ingredients
        .iter()
        .map(|line| MealIngredient {
            name: line.ingredient.name.clone(),
            unit: line.ingredient.unit.clone(),
            quantity: line.quantity * scale,
            price: round_currency(line.ingredient.price_per_unit * line.quantity * scale),
        })
        .collect();

    Ok(Meal {
        id: Uuid::new_v4(),
        name: recipe.name.clone(),
        category: recipe.category,
        unit_price: unit_line_price(recipe.base_price, person_count as f64, quality, 1),
        person_count,
        quality,
        ingredients,
        source_ref: Some(recipe.id),
    })
}

/// Name lookup, trimmed and case-insensitive. Predefined recipes win over
/// custom ones with the same name.
pub fn find_recipe_by_name<'a>(recipes: &'a [Recipe], name: &str) -> Option<&'a Recipe> {
    let wanted = name.trim();
    recipes
        .iter()
        .filter(|r| r.name.trim().eq_ignore_ascii_case(wanted))
        .min_by_key(|r| r.is_custom)
}

pub fn instantiate_menu(menu: &Menu, recipes: &[Recipe], person_count: u32) -> AppResult<Vec<MenuMeal>> {
    instantiate_menu_with_quality(menu, recipes, person_count, QualityTier::Standard)
}

/// Builds one meal per menu line. Lines whose recipe name resolves to
/// nothing are skipped.
pub fn instantiate_menu_with_quality(
    menu: &Menu,
    recipes: &[Recipe],
    person_count: u32,
    quality: QualityTier,
) -> AppResult<Vec<MenuMeal>> {
    ensure_person_count(person_count)?;

    let mut meals = Vec::with_capacity(menu.entries.len());
    for entry in &menu.entries {
        let Some(recipe) = find_recipe_by_name(recipes, &entry.recipe_name) else {
            tracing::debug!(
                menu = %menu.name,
                recipe = %entry.recipe_name,
                "menu recipe not found, skipping"
            );
            continue;
        };
        meals.push(MenuMeal {
            course: entry.course,
            meal: instantiate_meal(recipe, person_count, quality)?,
        });
    }
    Ok(meals)
}
