//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;
use crate::models::nutrients::NUTRIENT_FIELDS;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    // Create migrations table if it doesn't exist
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tracing::info!(version = 1, "applied schema migration");
    }

    Ok(())
}

/// One `REAL NOT NULL DEFAULT 0` column per nutrient field
fn nutrient_columns() -> String {
    NUTRIENT_FIELDS
        .iter()
        .map(|f| format!("            {} REAL NOT NULL DEFAULT 0,", f.key))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    let sql = format!(
        r#"
        -- ============================================
        -- INGREDIENTS
        -- Normalized catalog products and custom foods
        -- ============================================
        CREATE TABLE ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            product_id TEXT NOT NULL DEFAULT '',
            name TEXT NOT NULL,
            serving_size REAL NOT NULL DEFAULT 0,
            serving_size_unit TEXT NOT NULL,
            servings_per_container REAL NOT NULL DEFAULT 0,
            package_size TEXT NOT NULL DEFAULT '',

            -- Pricing (local store, then national average)
            local_regular REAL NOT NULL DEFAULT 0,
            local_regular_per_unit_estimate REAL NOT NULL DEFAULT 0,
            local_promo REAL NOT NULL DEFAULT 0,
            local_promo_per_unit_estimate REAL NOT NULL DEFAULT 0,
            national_regular REAL NOT NULL DEFAULT 0,
            national_regular_per_unit_estimate REAL NOT NULL DEFAULT 0,
            national_promo REAL NOT NULL DEFAULT 0,
            national_promo_per_unit_estimate REAL NOT NULL DEFAULT 0,

            -- Nutrients (per serving)
{nutrients}

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_ingredients_name ON ingredients(name);
        CREATE INDEX idx_ingredients_product ON ingredients(product_id);

        -- ============================================
        -- RECIPES
        -- Cached costing and grade, recalculated on demand
        -- ============================================
        CREATE TABLE recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            instructions TEXT NOT NULL DEFAULT '',
            total_portions REAL NOT NULL DEFAULT 1.0,

            num_ingredients INTEGER NOT NULL DEFAULT 0,
            ingredient_cost_sum REAL NOT NULL DEFAULT 0,
            cost_cook REAL NOT NULL DEFAULT 0,
            cost_per_serving REAL NOT NULL DEFAULT 0,
            nutrition_score INTEGER NOT NULL DEFAULT 0,
            nutrition_grade TEXT NOT NULL DEFAULT 'E',

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_recipes_name ON recipes(name);

        -- ============================================
        -- RECIPE INGREDIENTS
        -- Junction table: which ingredients in which recipes
        -- ============================================
        CREATE TABLE recipe_ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            ingredient_id INTEGER NOT NULL REFERENCES ingredients(id) ON DELETE RESTRICT,
            quantity REAL NOT NULL,              -- serving multiplier

            created_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(recipe_id, ingredient_id)
        );

        CREATE INDEX idx_recipe_ingredients_recipe ON recipe_ingredients(recipe_id);
        CREATE INDEX idx_recipe_ingredients_ingredient ON recipe_ingredients(ingredient_id);
        "#,
        nutrients = nutrient_columns()
    );

    conn.execute_batch(&sql)?;
    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(needs_migration(&conn).unwrap_or(true));

        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
        assert!(!needs_migration(&conn).unwrap());
    }

    #[test]
    fn test_every_nutrient_has_a_column() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let mut stmt = conn.prepare("PRAGMA table_info(ingredients)").unwrap();
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        for field in NUTRIENT_FIELDS {
            assert!(columns.iter().any(|c| c == field.key), "missing {}", field.key);
        }
    }

    #[test]
    fn test_ingredient_delete_restricted_while_in_recipe() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO ingredients (name, serving_size_unit) VALUES ('Rice', 'g')",
            [],
        )
        .unwrap();
        conn.execute("INSERT INTO recipes (name) VALUES ('Rice Bowl')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, quantity) VALUES (1, 1, 2.0)",
            [],
        )
        .unwrap();

        assert!(conn.execute("DELETE FROM ingredients WHERE id = 1", []).is_err());

        conn.execute("DELETE FROM recipes WHERE id = 1", []).unwrap();
        let links: i64 = conn
            .query_row("SELECT COUNT(*) FROM recipe_ingredients", [], |r| r.get(0))
            .unwrap();
        assert_eq!(links, 0);
    }
}
