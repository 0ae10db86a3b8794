//! Recipe costing
//!
//! Aggregates scaled ingredients into totals, per-portion values, cost and a
//! nutrition grade. Pure: storage feeds it and caches the result.

use serde::{Deserialize, Serialize};

use crate::nutrition::reference::ReferenceTable;
use crate::nutrition::scaling::scale;
use crate::nutrition::scoring::{score_nutrients_with, ScoreBreakdown};
use super::ingredient::Ingredient;
use super::nutrients::Nutrients;

/// One ingredient used in a recipe, with its serving multiplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeItem {
    pub ingredient: Ingredient,
    pub multiplier: f64,
}

/// Aggregated nutrition and cost of a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub num_ingredients: usize,
    pub total_portions: f64,
    pub nutrients: Nutrients,
    pub nutrients_per_portion: Nutrients,
    pub cost_cook: f64,
    pub cost_per_serving: f64,
    pub score: ScoreBreakdown,
}

/// Summarize against the standard reference table
pub fn summarize_recipe(items: &[RecipeItem], total_portions: f64) -> RecipeSummary {
    summarize_recipe_with(ReferenceTable::standard(), items, total_portions)
}

pub fn summarize_recipe_with(
    table: &ReferenceTable,
    items: &[RecipeItem],
    total_portions: f64,
) -> RecipeSummary {
    let nutrients: Nutrients = items
        .iter()
        .map(|item| scale(&item.ingredient, item.multiplier).nutrients)
        .sum();

    let cost_cook: f64 = items
        .iter()
        .map(|item| item.ingredient.price_per_serving() * item.multiplier)
        .sum();

    // Non-positive portion counts mean "the whole pot is one portion"
    let (cost_per_serving, nutrients_per_portion) = if total_portions > 0.0 {
        (cost_cook / total_portions, nutrients.scale(1.0 / total_portions))
    } else {
        (cost_cook, nutrients)
    };

    let score = score_nutrients_with(table, &nutrients_per_portion);
    tracing::debug!(
        items = items.len(),
        total_portions,
        cost_cook,
        total_score = score.total_score,
        "summarized recipe"
    );

    RecipeSummary {
        num_ingredients: items.len(),
        total_portions,
        nutrients,
        nutrients_per_portion,
        cost_cook,
        cost_per_serving,
        score,
    }
}
