//! Ingredient MCP Tools
//!
//! Entry, lookup, scaling, scoring and removal of stored ingredients.

use std::collections::HashMap;

use serde::Serialize;

use crate::db::Database;
use crate::models::{Ingredient, InsertOutcome, NutrientReading, Nutrients, StoredIngredient};
use crate::nutrition::{scale, score_nutrients_with, ReferenceTable, ScoreBreakdown};

/// Response for create_ingredient
#[derive(Debug, Serialize)]
pub struct CreateIngredientResponse {
    pub id: i64,
    pub created: bool,
    pub name: String,
    pub serving: String,
    pub price_per_serving: f64,
}

/// Stored ingredient with its derived figures
#[derive(Debug, Serialize)]
pub struct IngredientDetail {
    #[serde(flatten)]
    pub stored: StoredIngredient,
    pub serving: String,
    pub price_per_serving: f64,
    pub readings: Vec<NutrientReading>,
    pub recipe_usage_count: i64,
}

/// Ingredient summary for search results
#[derive(Debug, Serialize)]
pub struct IngredientSummary {
    pub id: i64,
    pub name: String,
    pub serving: String,
    pub price_per_serving: f64,
    pub calories: f64,
}

/// Response for search_ingredients
#[derive(Debug, Serialize)]
pub struct SearchIngredientsResponse {
    pub ingredients: Vec<IngredientSummary>,
    pub count: usize,
}

/// Response for scale_ingredient
#[derive(Debug, Serialize)]
pub struct ScaleIngredientResponse {
    pub id: i64,
    pub factor: f64,
    pub ingredient: Ingredient,
    pub readings: Vec<NutrientReading>,
}

/// Response for score_ingredient
#[derive(Debug, Serialize)]
pub struct ScoreIngredientResponse {
    pub id: i64,
    pub name: String,
    pub factor: f64,
    #[serde(flatten)]
    pub score: ScoreBreakdown,
}

/// Response for delete blocked
#[derive(Debug, Serialize)]
pub struct IngredientDeleteBlockedResponse {
    pub error: String,
    pub recipe_usage_count: i64,
}

/// Response for successful delete
#[derive(Debug, Serialize)]
pub struct IngredientDeleteSuccessResponse {
    pub success: bool,
    pub deleted_id: i64,
}

fn load(db: &Database, id: i64) -> Result<StoredIngredient, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    StoredIngredient::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get ingredient: {}", e))?
        .ok_or_else(|| format!("Ingredient not found with id: {}", id))
}

fn check_amount(what: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(format!("{} must be a non-negative number, got {}", what, value))
    }
}

/// Build a nutrient set from `{"protein": 12, ...}`; unlisted fields are 0
pub fn nutrients_from_map(values: &HashMap<String, f64>) -> Result<Nutrients, String> {
    let mut nutrients = Nutrients::zero();
    for (key, &value) in values {
        let slot = nutrients
            .get_mut(key)
            .ok_or_else(|| format!("Unknown nutrient: {}", key))?;
        *slot = value;
    }
    Ok(nutrients)
}

/// Store a hand-entered ingredient.
///
/// A name already stored (ignoring case) returns the existing id with
/// `created: false`.
pub fn create_ingredient(
    db: &Database,
    mut ingredient: Ingredient,
) -> Result<CreateIngredientResponse, String> {
    ingredient.name = ingredient.name.trim().to_string();
    if ingredient.name.is_empty() {
        return Err("Ingredient name cannot be empty".to_string());
    }

    check_amount("serving_size", ingredient.serving_size)?;
    check_amount("servings_per_container", ingredient.servings_per_container)?;
    for (what, price) in [
        ("local price", &ingredient.local_price),
        ("national price", &ingredient.national_price),
    ] {
        check_amount(what, price.regular)?;
        check_amount(what, price.promo)?;
    }
    for (field, value) in ingredient.nutrients.iter() {
        check_amount(field.key, value)?;
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let outcome = StoredIngredient::insert(&conn, &ingredient)
        .map_err(|e| format!("Failed to create ingredient: {}", e))?;

    if let InsertOutcome::Created(id) = outcome {
        tracing::info!(id, name = %ingredient.name, "created ingredient");
    }

    Ok(CreateIngredientResponse {
        id: outcome.id(),
        created: matches!(outcome, InsertOutcome::Created(_)),
        serving: ingredient.serving_label(),
        price_per_serving: ingredient.price_per_serving(),
        name: ingredient.name,
    })
}

/// Get an ingredient with readings, serving price and usage
pub fn get_ingredient(
    db: &Database,
    table: &ReferenceTable,
    id: i64,
) -> Result<Option<IngredientDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let stored = StoredIngredient::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get ingredient: {}", e))?;

    match stored {
        Some(stored) => {
            let recipe_usage_count = StoredIngredient::get_recipe_usage_count(&conn, id)
                .map_err(|e| format!("Failed to check recipe usage: {}", e))?;

            Ok(Some(IngredientDetail {
                serving: stored.ingredient.serving_label(),
                price_per_serving: stored.ingredient.price_per_serving(),
                readings: stored.ingredient.readings_with(table),
                recipe_usage_count,
                stored,
            }))
        }
        None => Ok(None),
    }
}

/// Search stored ingredients by name (limit 1-100).
///
/// A blank query lists every ingredient by name, starting at `offset`.
pub fn search_ingredients(
    db: &Database,
    query: &str,
    limit: i64,
    offset: i64,
) -> Result<SearchIngredientsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let limit = limit.min(100).max(1);
    let query = query.trim();
    let items = if query.is_empty() {
        StoredIngredient::list(&conn, limit, offset.max(0))
    } else {
        StoredIngredient::search(&conn, query, limit)
    }
    .map_err(|e| format!("Failed to search ingredients: {}", e))?;

    let ingredients: Vec<IngredientSummary> = items
        .into_iter()
        .map(|item| IngredientSummary {
            id: item.id,
            serving: item.ingredient.serving_label(),
            price_per_serving: item.ingredient.price_per_serving(),
            calories: item.ingredient.nutrients.calories,
            name: item.ingredient.name,
        })
        .collect();

    Ok(SearchIngredientsResponse {
        count: ingredients.len(),
        ingredients,
    })
}

/// Nutrients of `factor` servings of an ingredient
pub fn scale_ingredient(
    db: &Database,
    table: &ReferenceTable,
    id: i64,
    factor: f64,
) -> Result<ScaleIngredientResponse, String> {
    if !factor.is_finite() || factor < 0.0 {
        return Err(format!("factor must be a non-negative number, got {}", factor));
    }

    let stored = load(db, id)?;
    let scaled = scale(&stored.ingredient, factor);

    Ok(ScaleIngredientResponse {
        id,
        factor,
        readings: scaled.readings_with(table),
        ingredient: scaled,
    })
}

/// Score `factor` servings of an ingredient against the reference table
pub fn score_ingredient(
    db: &Database,
    table: &ReferenceTable,
    id: i64,
    factor: f64,
) -> Result<ScoreIngredientResponse, String> {
    if !factor.is_finite() || factor < 0.0 {
        return Err(format!("factor must be a non-negative number, got {}", factor));
    }

    let stored = load(db, id)?;
    let nutrients = stored.ingredient.nutrients.scale(factor);

    Ok(ScoreIngredientResponse {
        id,
        name: stored.ingredient.name,
        factor,
        score: score_nutrients_with(table, &nutrients),
    })
}

/// Delete an ingredient (blocked while any recipe uses it)
pub fn delete_ingredient(
    db: &Database,
    id: i64,
) -> Result<Result<IngredientDeleteSuccessResponse, IngredientDeleteBlockedResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let item = StoredIngredient::get_by_id(&conn, id)
        .map_err(|e| format!("Database error: {}", e))?;
    if item.is_none() {
        return Err(format!("Ingredient not found with id: {}", id));
    }

    let recipe_usage_count = StoredIngredient::get_recipe_usage_count(&conn, id)
        .map_err(|e| format!("Failed to check recipe usage: {}", e))?;

    if recipe_usage_count > 0 {
        return Ok(Err(IngredientDeleteBlockedResponse {
            error: format!(
                "Cannot delete ingredient: used in {} recipe(s)",
                recipe_usage_count
            ),
            recipe_usage_count,
        }));
    }

    StoredIngredient::delete(&conn, id)
        .map_err(|e| format!("Failed to delete ingredient: {}", e))?;

    Ok(Ok(IngredientDeleteSuccessResponse {
        success: true,
        deleted_id: id,
    }))
}
