//! Shopping list consolidation.
//!
//! Planned meals from today onwards are folded into one line per
//! `(ingredient name, unit)`, scaled by the household's current family size.
//! Prices are whole currency units so the totals do not depend on the order
//! in which entries are summed. User edits live in a [`ShoppingSession`] and
//! are never written back to the planning entries.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::shopping::{SessionEdit, ShoppingList, ShoppingListRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Meal, PlanningEntry},
    pricing::{price_per_unit, round_currency},
    response::{ApiResponse, Meta},
    state::AppState,
    store::PersistenceGateway,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct IngredientKey {
    pub name: String,
    pub unit: String,
}

impl IngredientKey {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ConsolidatedIngredient {
    pub name: String,
    pub unit: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total_price: i64,
    pub excluded: bool,
}

impl ConsolidatedIngredient {
    pub fn key(&self) -> IngredientKey {
        IngredientKey::new(self.name.clone(), self.unit.clone())
    }
}

/// True when an entry still belongs on the shopping list; today counts.
pub fn is_upcoming(entry: &PlanningEntry, today: NaiveDate) -> bool {
    entry.date_key >= today
}

fn amount_too_large() -> AppError {
    AppError::BadRequest("shopping list amount is too large".to_string())
}

/// Aggregates the ingredient snapshots of every upcoming entry.
///
/// Lines appear in order of first appearance. Each snapshot line
/// contributes `quantity × family_size` and `price × family_size`.
/// Fails instead of wrapping when a price no longer fits in an `i64`.
pub fn consolidate(
    entries: &[PlanningEntry],
    today: NaiveDate,
    family_size: u32,
) -> AppResult<Vec<ConsolidatedIngredient>> {
    let factor = i64::from(family_size);
    let mut lines: Vec<ConsolidatedIngredient> = Vec::new();
    let mut index: HashMap<IngredientKey, usize> = HashMap::new();

    for entry in entries.iter().filter(|e| is_upcoming(e, today)) {
        for ingredient in &entry.meal.ingredients {
            let key = IngredientKey::new(ingredient.name.clone(), ingredient.unit.clone());
            let quantity = ingredient.quantity * family_size as f64;
            let price = ingredient.price.checked_mul(factor).ok_or_else(amount_too_large)?;

            match index.get(&key) {
                Some(&pos) => {
                    let line = &mut lines[pos];
                    line.quantity += quantity;
                    line.total_price = line
                        .total_price
                        .checked_add(price)
                        .ok_or_else(amount_too_large)?;
                }
                None => {
                    index.insert(key, lines.len());
                    lines.push(ConsolidatedIngredient {
                        name: ingredient.name.clone(),
                        unit: ingredient.unit.clone(),
                        quantity,
                        unit_price: 0.0,
                        total_price: price,
                        excluded: false,
                    });
                }
            }
        }
    }

    for line in &mut lines {
        line.unit_price = price_per_unit(line.total_price, line.quantity);
    }
    Ok(lines)
}

/// Meals that are still to come, in planning order.
pub fn upcoming_meals(entries: &[PlanningEntry], today: NaiveDate) -> Vec<Meal> {
    entries
        .iter()
        .filter(|e| is_upcoming(e, today))
        .map(|e| e.meal.clone())
        .collect()
}

/// Editable view over one consolidation. Scoped to a single request; a new
/// session always starts from the derived values.
#[derive(Debug, Clone)]
pub struct ShoppingSession {
    lines: Vec<ConsolidatedIngredient>,
    index: HashMap<IngredientKey, usize>,
}

impl ShoppingSession {
    pub fn new(lines: Vec<ConsolidatedIngredient>) -> Self {
        let index = lines
            .iter()
            .enumerate()
            .map(|(pos, line)| (line.key(), pos))
            .collect();
        Self { lines, index }
    }

    pub fn lines(&self) -> &[ConsolidatedIngredient] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<ConsolidatedIngredient> {
        self.lines
    }

    pub fn get(&self, key: &IngredientKey) -> Option<&ConsolidatedIngredient> {
        self.index.get(key).map(|&pos| &self.lines[pos])
    }

    /// Sum of the lines that are not excluded.
    pub fn total(&self) -> AppResult<i64> {
        self.lines
            .iter()
            .filter(|l| !l.excluded)
            .try_fold(0i64, |acc, l| acc.checked_add(l.total_price))
            .ok_or_else(amount_too_large)
    }

    fn line_mut(&mut self, key: &IngredientKey) -> AppResult<&mut ConsolidatedIngredient> {
        match self.index.get(key) {
            Some(&pos) => Ok(&mut self.lines[pos]),
            None => Err(AppError::BadRequest(format!(
                "unknown shopping list item {} ({})",
                key.name, key.unit
            ))),
        }
    }

    /// Overrides one line's quantity; its price follows the line's unit
    /// price. Other lines are untouched.
    pub fn set_quantity(&mut self, key: &IngredientKey, quantity: f64) -> AppResult<&ConsolidatedIngredient> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(AppError::BadRequest(
                "quantity must be greater than 0".to_string(),
            ));
        }
        let line = self.line_mut(key)?;
        line.quantity = quantity;
        line.total_price = round_currency(line.unit_price * quantity);
        Ok(&*line)
    }

    /// Drops a line from the total while keeping it visible.
    pub fn exclude(&mut self, key: &IngredientKey) -> AppResult<&ConsolidatedIngredient> {
        let line = self.line_mut(key)?;
        line.excluded = true;
        Ok(&*line)
    }

    pub fn restore(&mut self, key: &IngredientKey) -> AppResult<&ConsolidatedIngredient> {
        let line = self.line_mut(key)?;
        line.excluded = false;
        Ok(&*line)
    }

    pub fn apply(&mut self, edit: &SessionEdit) -> AppResult<()> {
        match edit {
            SessionEdit::SetQuantity {
                name,
                unit,
                quantity,
            } => self.set_quantity(&IngredientKey::new(name.clone(), unit.clone()), *quantity)?,
            SessionEdit::Exclude { name, unit } => {
                self.exclude(&IngredientKey::new(name.clone(), unit.clone()))?
            }
            SessionEdit::Restore { name, unit } => {
                self.restore(&IngredientKey::new(name.clone(), unit.clone()))?
            }
        };
        Ok(())
    }
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// A session built from the user's stored planning with `edits` replayed.
pub struct PreparedSession {
    pub today: NaiveDate,
    pub family_size: u32,
    pub entries: Vec<PlanningEntry>,
    pub session: ShoppingSession,
}

pub async fn prepare_session(
    store: &dyn PersistenceGateway,
    user_id: Uuid,
    today: NaiveDate,
    edits: &[SessionEdit],
) -> AppResult<PreparedSession> {
    let entries = store.load_planning_entries(user_id).await?;
    let family_size = store.family_size(user_id).await?.max(1);

    let mut session = ShoppingSession::new(consolidate(&entries, today, family_size)?);
    for edit in edits {
        session.apply(edit)?;
    }

    tracing::debug!(
        user_id = %user_id,
        entries = entries.len(),
        lines = session.lines().len(),
        family_size,
        "shopping list consolidated"
    );

    Ok(PreparedSession {
        today,
        family_size,
        entries,
        session,
    })
}

pub async fn shopping_list(
    state: &AppState,
    user: &AuthUser,
    payload: ShoppingListRequest,
) -> AppResult<ApiResponse<ShoppingList>> {
    let prepared = prepare_session(state.store.as_ref(), user.user_id, today(), &payload.edits).await?;
    let total = prepared.session.total()?;
    let items = prepared.session.into_lines();
    let count = items.len() as i64;

    Ok(ApiResponse::success(
        "OK",
        ShoppingList {
            today: prepared.today,
            family_size: prepared.family_size,
            items,
            total,
        },
        Some(Meta::new(1, count, count)),
    ))
}
