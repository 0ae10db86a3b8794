//! Recipe model
//!
//! Represents a recipe with cached costing and nutrition grade.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::nutrition::reference::ReferenceTable;
use super::ingredient::InsertOutcome;
use super::recipe_ingredient::{
    recalculate_recipe_costing, RecipeIngredient, RecipeIngredientCreate, RecipeIngredientDetail,
};
use super::recipe_summary::RecipeSummary;

/// A recipe with cached costing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub instructions: String,
    pub total_portions: f64,
    pub num_ingredients: i64,
    pub ingredient_cost_sum: f64,
    pub cost_cook: f64,
    pub cost_per_serving: f64,
    pub nutrition_score: i32,
    pub nutrition_grade: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCreate {
    pub name: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default = "default_portions")]
    pub total_portions: f64,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredientCreate>,
}

fn default_portions() -> f64 {
    1.0
}

/// Recipe with its ingredient lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<RecipeIngredientDetail>,
}

impl Recipe {
    /// Create a Recipe from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            instructions: row.get("instructions")?,
            total_portions: row.get("total_portions")?,
            num_ingredients: row.get("num_ingredients")?,
            ingredient_cost_sum: row.get("ingredient_cost_sum")?,
            cost_cook: row.get("cost_cook")?,
            cost_per_serving: row.get("cost_per_serving")?,
            nutrition_score: row.get("nutrition_score")?,
            nutrition_grade: row.get("nutrition_grade")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Find a recipe ID by name, ignoring case
    pub fn find_id_by_name(conn: &Connection, name: &str) -> DbResult<Option<i64>> {
        let result = conn.query_row(
            "SELECT id FROM recipes WHERE LOWER(name) = LOWER(?1) ORDER BY id LIMIT 1",
            [name],
            |row| row.get(0),
        );
        match result {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert a recipe with its ingredients and cache its costing.
    ///
    /// Runs in one transaction: an unknown ingredient leaves nothing behind.
    /// A recipe whose name already exists (ignoring case) is not touched.
    pub fn create(
        conn: &mut Connection,
        table: &ReferenceTable,
        data: &RecipeCreate,
    ) -> DbResult<InsertOutcome> {
        let tx = conn.transaction()?;

        if let Some(existing) = Self::find_id_by_name(&tx, &data.name)? {
            tracing::warn!(name = %data.name, id = existing, "recipe already exists, reusing");
            return Ok(InsertOutcome::Existing(existing));
        }

        tx.execute(
            r#"
            INSERT INTO recipes (name, instructions, total_portions)
            VALUES (?1, ?2, ?3)
            "#,
            params![data.name, data.instructions, data.total_portions],
        )?;
        let id = tx.last_insert_rowid();

        for line in &data.ingredients {
            RecipeIngredient::create(&tx, id, line)?;
        }

        let summary = recalculate_recipe_costing(&tx, table, id)?;
        tx.commit()?;

        tracing::info!(
            name = %data.name,
            id,
            ingredients = summary.num_ingredients,
            grade = %summary.score.grade,
            "created recipe"
        );
        Ok(InsertOutcome::Created(id))
    }

    /// Get a recipe by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipes WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(recipe) => Ok(Some(recipe)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a recipe by ID, failing when it does not exist
    pub fn require(conn: &Connection, id: i64) -> DbResult<Self> {
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound { entity: "recipe", id })
    }

    /// Get a recipe with its ingredient lines
    pub fn get_detail(conn: &Connection, id: i64) -> DbResult<Option<RecipeDetail>> {
        let Some(recipe) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };
        let ingredients = RecipeIngredient::get_details_for_recipe(conn, id)?;
        Ok(Some(RecipeDetail { recipe, ingredients }))
    }

    /// Search recipes by name
    pub fn search(conn: &Connection, query: &str, limit: i64) -> DbResult<Vec<Self>> {
        let pattern = format!("%{}%", query);
        let mut stmt = conn.prepare(
            "SELECT * FROM recipes WHERE name LIKE ?1 ORDER BY name ASC LIMIT ?2",
        )?;

        let recipes = stmt
            .query_map(params![pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(recipes)
    }

    /// All recipe names in insertion order
    pub fn list_names(conn: &Connection) -> DbResult<Vec<String>> {
        let mut stmt = conn.prepare("SELECT name FROM recipes ORDER BY id")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// Update cached costing and grade for a recipe
    pub fn update_cached_costing(conn: &Connection, id: i64, summary: &RecipeSummary) -> DbResult<()> {
        conn.execute(
            r#"
            UPDATE recipes SET
                num_ingredients = ?1,
                ingredient_cost_sum = ?2,
                cost_cook = ?3,
                cost_per_serving = ?4,
                nutrition_score = ?5,
                nutrition_grade = ?6,
                updated_at = datetime('now')
            WHERE id = ?7
            "#,
            params![
                summary.num_ingredients as i64,
                summary.cost_cook,
                summary.cost_cook,
                summary.cost_per_serving,
                summary.score.total_score,
                summary.score.grade.as_str(),
                id,
            ],
        )?;
        Ok(())
    }

    /// Count recipes
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete a recipe and its ingredient links.
    /// Returns Ok(false) if not found.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        if Self::get_by_id(conn, id)?.is_none() {
            return Ok(false);
        }

        // Cascades to recipe_ingredients
        let rows = conn.execute("DELETE FROM recipes WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::ingredient::{Ingredient, Pricing, StoredIngredient};
    use crate::models::nutrients::Nutrients;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn add_ingredient(conn: &Connection, name: &str, price: f64, protein: f64) -> i64 {
        let ingredient = Ingredient {
            name: name.into(),
            servings_per_container: 4.0,
            local_price: Pricing {
                regular: price,
                ..Default::default()
            },
            nutrients: Nutrients {
                protein,
                ..Default::default()
            },
            ..Default::default()
        };
        StoredIngredient::insert(conn, &ingredient).unwrap().id()
    }

    fn bowl(ingredients: Vec<RecipeIngredientCreate>) -> RecipeCreate {
        RecipeCreate {
            name: "Rice and Beans".into(),
            instructions: "Simmer.".into(),
            total_portions: 2.0,
            ingredients,
        }
    }

    #[test]
    fn test_create_caches_costing() {
        let mut conn = setup();
        let rice = add_ingredient(&conn, "Rice", 2.0, 4.0);
        let beans = add_ingredient(&conn, "Beans", 4.0, 30.0);
        let table = ReferenceTable::standard();

        let outcome = Recipe::create(
            &mut conn,
            table,
            &bowl(vec![
                RecipeIngredientCreate { ingredient_id: rice, quantity: 2.0 },
                RecipeIngredientCreate { ingredient_id: beans, quantity: 1.0 },
            ]),
        )
        .unwrap();

        let recipe = Recipe::require(&conn, outcome.id()).unwrap();
        assert_eq!(recipe.num_ingredients, 2);
        // 0.50 x 2 + 1.00 x 1
        assert!((recipe.cost_cook - 2.0).abs() < 1e-9);
        assert!((recipe.ingredient_cost_sum - 2.0).abs() < 1e-9);
        assert!((recipe.cost_per_serving - 1.0).abs() < 1e-9);
        assert_eq!(recipe.nutrition_grade, "E");

        let detail = Recipe::get_detail(&conn, recipe.id).unwrap().unwrap();
        assert_eq!(detail.ingredients.len(), 2);
        assert_eq!(detail.ingredients[0].ingredient_name, "Rice");
        assert!((detail.ingredients[0].line_cost - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_create_is_atomic() {
        let mut conn = setup();
        let rice = add_ingredient(&conn, "Rice", 2.0, 4.0);

        let result = Recipe::create(
            &mut conn,
            ReferenceTable::standard(),
            &bowl(vec![
                RecipeIngredientCreate { ingredient_id: rice, quantity: 1.0 },
                RecipeIngredientCreate { ingredient_id: 999, quantity: 1.0 },
            ]),
        );

        assert!(matches!(
            result,
            Err(DbError::NotFound { entity: "ingredient", id: 999 })
        ));
        assert_eq!(Recipe::count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_create_dedupes_by_name() {
        let mut conn = setup();
        let table = ReferenceTable::standard();
        let first = Recipe::create(&mut conn, table, &bowl(vec![])).unwrap();

        let mut again = bowl(vec![]);
        again.name = "rice AND beans".into();
        let second = Recipe::create(&mut conn, table, &again).unwrap();

        assert_eq!(second, InsertOutcome::Existing(first.id()));
        assert_eq!(Recipe::list_names(&conn).unwrap(), vec!["Rice and Beans"]);
    }

    #[test]
    fn test_repeated_ingredient_accumulates() {
        let mut conn = setup();
        let rice = add_ingredient(&conn, "Rice", 2.0, 4.0);
        let outcome = Recipe::create(
            &mut conn,
            ReferenceTable::standard(),
            &bowl(vec![
                RecipeIngredientCreate { ingredient_id: rice, quantity: 1.0 },
                RecipeIngredientCreate { ingredient_id: rice, quantity: 0.5 },
            ]),
        )
        .unwrap();

        let links = RecipeIngredient::get_for_recipe(&conn, outcome.id()).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].quantity, 1.5);
    }

    #[test]
    fn test_recalculate_after_price_change() {
        let mut conn = setup();
        let rice = add_ingredient(&conn, "Rice", 2.0, 4.0);
        let table = ReferenceTable::standard();
        let id = Recipe::create(
            &mut conn,
            table,
            &bowl(vec![RecipeIngredientCreate { ingredient_id: rice, quantity: 1.0 }]),
        )
        .unwrap()
        .id();

        conn.execute("UPDATE ingredients SET local_regular = 8.0 WHERE id = ?1", [rice])
            .unwrap();
        let summary = recalculate_recipe_costing(&conn, table, id).unwrap();
        assert!((summary.cost_cook - 2.0).abs() < 1e-9);
        assert!((Recipe::require(&conn, id).unwrap().cost_cook - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_search_and_delete_cascades() {
        let mut conn = setup();
        let rice = add_ingredient(&conn, "Rice", 2.0, 4.0);
        let id = Recipe::create(
            &mut conn,
            ReferenceTable::standard(),
            &bowl(vec![RecipeIngredientCreate { ingredient_id: rice, quantity: 1.0 }]),
        )
        .unwrap()
        .id();

        assert_eq!(Recipe::search(&conn, "beans", 10).unwrap().len(), 1);
        // Still in use
        assert!(StoredIngredient::delete(&conn, rice).is_err());

        assert!(Recipe::delete(&conn, id).unwrap());
        assert!(!Recipe::delete(&conn, id).unwrap());
        assert!(RecipeIngredient::get_for_recipe(&conn, id).unwrap().is_empty());
        assert_eq!(StoredIngredient::get_recipe_usage_count(&conn, rice).unwrap(), 0);
        assert!(StoredIngredient::delete(&conn, rice).unwrap());
    }
}
