//! Recipe MCP Tools
//!
//! Tools for creating recipes, costing them and searching recipe names.

use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::models::{
    calculate_recipe_summary, recalculate_recipe_costing, InsertOutcome, Recipe, RecipeCreate,
    RecipeDetail, RecipeSummary,
};
use crate::nutrition::ReferenceTable;
use crate::search::{
    fuzzy_search_with, simple_search, smart_search_with, SimilarityMetric, DEFAULT_THRESHOLD,
    RECIPE_CATALOG,
};

/// Response for create_recipe
#[derive(Debug, Serialize)]
pub struct CreateRecipeResponse {
    pub id: i64,
    /// False when a recipe with the same name was already stored
    pub created: bool,
    pub recipe: Recipe,
}

/// How search_recipes matches names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Simple,
    Fuzzy,
    #[default]
    Smart,
}

impl SearchMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Some(SearchMode::Simple),
            "fuzzy" => Some(SearchMode::Fuzzy),
            "smart" => Some(SearchMode::Smart),
            _ => None,
        }
    }
}

/// Where search_recipes took its candidate names from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NameSource {
    Database,
    Catalog,
}

/// One matching recipe name
#[derive(Debug, Serialize)]
pub struct RecipeMatch {
    pub name: String,
    /// Set when the name belongs to a stored recipe
    pub id: Option<i64>,
    /// Set in fuzzy mode
    pub score: Option<f64>,
}

/// Response for search_recipes
#[derive(Debug, Serialize)]
pub struct SearchRecipesResponse {
    pub query: String,
    pub mode: SearchMode,
    pub source: NameSource,
    pub matches: Vec<RecipeMatch>,
    pub count: usize,
}

/// Response for recalculate_recipe
#[derive(Debug, Serialize)]
pub struct RecalculateRecipeResponse {
    pub recipe_id: i64,
    pub summary: RecipeSummary,
}

/// Response for successful delete
#[derive(Debug, Serialize)]
pub struct RecipeDeleteSuccessResponse {
    pub success: bool,
    pub deleted_id: i64,
}

// ============================================================================
// Recipe Tools
// ============================================================================

/// Create a recipe with its ingredient lines and cache its costing
pub fn create_recipe(
    db: &Database,
    table: &ReferenceTable,
    mut data: RecipeCreate,
) -> Result<CreateRecipeResponse, String> {
    // Validate name
    data.name = data.name.trim().to_string();
    if data.name.is_empty() {
        return Err("Recipe name cannot be empty".to_string());
    }

    // Validate portions
    if !(data.total_portions > 0.0) {
        return Err("total_portions must be greater than 0".to_string());
    }

    if let Some(line) = data.ingredients.iter().find(|l| !(l.quantity > 0.0)) {
        return Err(format!(
            "quantity must be greater than 0 (ingredient {})",
            line.ingredient_id
        ));
    }

    let mut conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let outcome = Recipe::create(&mut conn, table, &data)
        .map_err(|e| format!("Failed to create recipe: {}", e))?;

    let recipe = Recipe::require(&conn, outcome.id())
        .map_err(|e| format!("Failed to load recipe: {}", e))?;

    Ok(CreateRecipeResponse {
        id: outcome.id(),
        created: matches!(outcome, InsertOutcome::Created(_)),
        recipe,
    })
}

/// Get a recipe with its ingredient lines
pub fn get_recipe(db: &Database, id: i64) -> Result<Option<RecipeDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Recipe::get_detail(&conn, id).map_err(|e| format!("Failed to get recipe: {}", e))
}

/// Search recipe names.
///
/// Candidates are the stored recipe names, or the built-in catalog of recipe
/// names while nothing is stored. `threshold` only applies to fuzzy mode.
pub fn search_recipes(
    db: &Database,
    query: &str,
    mode: SearchMode,
    metric: SimilarityMetric,
    threshold: Option<f64>,
) -> Result<SearchRecipesResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let stored = Recipe::list_names(&conn)
        .map_err(|e| format!("Failed to list recipes: {}", e))?;

    let (source, names): (NameSource, Vec<String>) = if stored.is_empty() {
        (
            NameSource::Catalog,
            RECIPE_CATALOG.iter().map(|s| s.to_string()).collect(),
        )
    } else {
        (NameSource::Database, stored)
    };

    let scored: Vec<(String, Option<f64>)> = match mode {
        SearchMode::Simple => simple_search(query, &names)
            .into_iter()
            .map(|name| (name, None))
            .collect(),
        SearchMode::Fuzzy => {
            let threshold = threshold.unwrap_or(DEFAULT_THRESHOLD);
            fuzzy_search_with(query, &names, threshold, metric)
                .into_iter()
                .map(|m| (m.name, Some(m.score)))
                .collect()
        }
        SearchMode::Smart => smart_search_with(query, &names, metric)
            .into_iter()
            .map(|name| (name, None))
            .collect(),
    };

    let mut matches = Vec::with_capacity(scored.len());
    for (name, score) in scored {
        let id = match source {
            NameSource::Database => Recipe::find_id_by_name(&conn, &name)
                .map_err(|e| format!("Failed to look up recipe: {}", e))?,
            NameSource::Catalog => None,
        };
        matches.push(RecipeMatch { name, id, score });
    }

    Ok(SearchRecipesResponse {
        query: query.to_string(),
        mode,
        source,
        count: matches.len(),
        matches,
    })
}

/// Recompute a recipe's costing and grade from its current ingredients.
///
/// With `persist` false the summary is returned without touching the cache.
pub fn recalculate_recipe(
    db: &Database,
    table: &ReferenceTable,
    id: i64,
    persist: bool,
) -> Result<RecalculateRecipeResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let summary = if persist {
        recalculate_recipe_costing(&conn, table, id)
    } else {
        calculate_recipe_summary(&conn, table, id)
    }
    .map_err(|e| format!("Failed to recalculate recipe: {}", e))?;

    Ok(RecalculateRecipeResponse {
        recipe_id: id,
        summary,
    })
}

/// Delete a recipe and its ingredient links
pub fn delete_recipe(db: &Database, id: i64) -> Result<RecipeDeleteSuccessResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = Recipe::delete(&conn, id)
        .map_err(|e| format!("Failed to delete recipe: {}", e))?;
    if !deleted {
        return Err(format!("Recipe not found with id: {}", id));
    }

    Ok(RecipeDeleteSuccessResponse {
        success: true,
        deleted_id: id,
    })
}
