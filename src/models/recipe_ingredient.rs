//! Recipe Ingredient model
//!
//! Links an ingredient into a recipe with a serving multiplier.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use crate::nutrition::reference::ReferenceTable;
use super::ingredient::StoredIngredient;
use super::recipe::Recipe;
use super::recipe_summary::{summarize_recipe_with, RecipeItem, RecipeSummary};

/// A recipe ingredient linking an ingredient to a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub id: i64,
    pub recipe_id: i64,
    pub ingredient_id: i64,
    /// Servings of the ingredient used
    pub quantity: f64,
    pub created_at: String,
}

/// Recipe ingredient with ingredient details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredientDetail {
    pub id: i64,
    pub ingredient_id: i64,
    pub ingredient_name: String,
    pub quantity: f64,
    pub serving: String,
    pub price_per_serving: f64,
    pub line_cost: f64,
}

/// Data for adding an ingredient to a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredientCreate {
    pub ingredient_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
}

fn default_quantity() -> f64 {
    1.0
}

impl RecipeIngredient {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            recipe_id: row.get("recipe_id")?,
            ingredient_id: row.get("ingredient_id")?,
            quantity: row.get("quantity")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Add an ingredient to a recipe.
    ///
    /// Adding the same ingredient twice accumulates its quantity.
    pub fn create(conn: &Connection, recipe_id: i64, data: &RecipeIngredientCreate) -> DbResult<()> {
        StoredIngredient::require(conn, data.ingredient_id)?;

        conn.execute(
            r#"
            INSERT INTO recipe_ingredients (recipe_id, ingredient_id, quantity)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(recipe_id, ingredient_id)
            DO UPDATE SET quantity = quantity + excluded.quantity
            "#,
            params![recipe_id, data.ingredient_id, data.quantity],
        )?;
        Ok(())
    }

    /// Get all links for a recipe
    pub fn get_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM recipe_ingredients WHERE recipe_id = ?1 ORDER BY id"
        )?;

        let links = stmt
            .query_map([recipe_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }

    /// Get links with ingredient names and costs for a recipe
    pub fn get_details_for_recipe(
        conn: &Connection,
        recipe_id: i64,
    ) -> DbResult<Vec<RecipeIngredientDetail>> {
        let mut details = Vec::new();
        for link in Self::get_for_recipe(conn, recipe_id)? {
            let stored = StoredIngredient::require(conn, link.ingredient_id)?;
            let price_per_serving = stored.ingredient.price_per_serving();
            details.push(RecipeIngredientDetail {
                id: link.id,
                ingredient_id: link.ingredient_id,
                ingredient_name: stored.ingredient.name.clone(),
                quantity: link.quantity,
                serving: stored.ingredient.serving_label(),
                price_per_serving,
                line_cost: price_per_serving * link.quantity,
            });
        }
        Ok(details)
    }

    /// Load a recipe's ingredients as costing items
    pub fn load_items(conn: &Connection, recipe_id: i64) -> DbResult<Vec<RecipeItem>> {
        Self::get_for_recipe(conn, recipe_id)?
            .into_iter()
            .map(|link| -> DbResult<RecipeItem> {
                let stored = StoredIngredient::require(conn, link.ingredient_id)?;
                Ok(RecipeItem {
                    ingredient: stored.ingredient,
                    multiplier: link.quantity,
                })
            })
            .collect()
    }
}

/// Summarize a stored recipe from its current ingredients
pub fn calculate_recipe_summary(
    conn: &Connection,
    table: &ReferenceTable,
    recipe_id: i64,
) -> DbResult<RecipeSummary> {
    let recipe = Recipe::require(conn, recipe_id)?;
    let items = RecipeIngredient::load_items(conn, recipe_id)?;
    Ok(summarize_recipe_with(table, &items, recipe.total_portions))
}

/// Recalculate and update cached costing and grade for a recipe
pub fn recalculate_recipe_costing(
    conn: &Connection,
    table: &ReferenceTable,
    recipe_id: i64,
) -> DbResult<RecipeSummary> {
    let summary = calculate_recipe_summary(conn, table, recipe_id)?;
    Recipe::update_cached_costing(conn, recipe_id, &summary)?;
    Ok(summary)
}
