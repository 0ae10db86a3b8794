//! NutriBudget MCP Server Implementation
//!
//! Exposes catalog search, the nutrition engine and storage as MCP tools.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::catalog::ProductCatalog;
use crate::db::Database;
use crate::models::{Ingredient, Pricing, RecipeCreate, RecipeIngredientCreate, UNKNOWN_SERVING_UNIT};
use crate::nutrition::ReferenceTable;
use crate::search::SimilarityMetric;
use crate::tools::recipes::SearchMode;
use crate::tools::status::{DataSources, StatusTracker};
use crate::tools::{ingredients, products, recipes};

/// NutriBudget MCP Service
#[derive(Clone)]
pub struct NutriBudgetService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    catalog: Arc<dyn ProductCatalog + Send + Sync>,
    reference: Arc<ReferenceTable>,
    tool_router: ToolRouter<NutriBudgetService>,
}

impl NutriBudgetService {
    pub fn new(
        database_path: PathBuf,
        database: Database,
        catalog: Arc<dyn ProductCatalog + Send + Sync>,
        reference: Arc<ReferenceTable>,
        sources: DataSources,
    ) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path, sources))),
            database,
            catalog,
            reference,
            tool_router: Self::tool_router(),
        }
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Product Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchProductsParams {
    /// Product name to search the grocery catalog for
    pub name: String,
    #[serde(default = "default_product_count")]
    pub count: i64,
}

fn default_product_count() -> i64 { 10 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ImportProductParams {
    /// Catalog search term; also the fallback name for a raw product
    pub name: Option<String>,
    /// Position of the product within the search results
    #[serde(default)]
    pub index: usize,
    /// A raw catalog product record to import instead of searching
    pub raw: Option<serde_json::Value>,
}

// ============================================================================
// Ingredient Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateIngredientParams {
    pub name: String,
    #[serde(default)]
    pub product_id: String,
    /// Amount in one serving, e.g. 0.25 for a quarter cup
    #[serde(default)]
    pub serving_size: f64,
    /// Unit of the serving, e.g. "cup" or "g"
    pub serving_size_unit: Option<String>,
    /// Servings in one package; 0 means prices are per serving
    #[serde(default)]
    pub servings_per_container: f64,
    #[serde(default)]
    pub package_size: String,
    #[serde(default)]
    pub regular_price: f64,
    #[serde(default)]
    pub promo_price: f64,
    /// Nutrient amounts per serving keyed by field, e.g. {"calories": 90, "vitamin_c": 80}
    #[serde(default)]
    pub nutrients: HashMap<String, f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IngredientIdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchIngredientsParams {
    /// Name fragment; blank lists all ingredients
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_search_limit() -> i64 { 20 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ScaleIngredientParams {
    pub id: i64,
    /// Serving multiplier
    pub factor: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ScoreIngredientParams {
    pub id: i64,
    #[serde(default = "default_factor")]
    pub factor: f64,
}

fn default_factor() -> f64 { 1.0 }

// ============================================================================
// Recipe Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RecipeLineParams {
    pub ingredient_id: i64,
    /// Servings of the ingredient
    #[serde(default = "default_factor")]
    pub quantity: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateRecipeParams {
    pub name: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default = "default_factor")]
    pub total_portions: f64,
    #[serde(default)]
    pub ingredients: Vec<RecipeLineParams>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RecipeIdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRecipesParams {
    pub query: String,
    /// simple, fuzzy or smart (default)
    pub mode: Option<String>,
    /// gestalt (default) or levenshtein
    pub metric: Option<String>,
    /// Fuzzy mode only; scores must exceed it (default 0.6)
    pub threshold: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RecalculateRecipeParams {
    pub id: i64,
    /// Store the new costing and grade on the recipe
    #[serde(default = "default_persist")]
    pub persist: bool,
}

fn default_persist() -> bool { true }

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl NutriBudgetService {
    // --- Status ---

    #[tool(description = "Get the current status of the NutriBudget service including build info, database counts, catalog and reference table, and process information")]
    async fn nutribudget_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(&self.database);
        json_result(&status)
    }

    // --- Products ---

    #[tool(description = "Search the grocery catalog and return normalized products with serving, price per serving and nutrition grade")]
    fn search_products(&self, Parameters(p): Parameters<SearchProductsParams>) -> Result<CallToolResult, McpError> {
        let result = products::search_products(self.catalog.as_ref(), &self.reference, &p.name, p.count)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Store a catalog product as an ingredient, either the product at `index` of a search for `name` or a raw product record. Names already stored (ignoring case) are reused.")]
    fn import_product(&self, Parameters(p): Parameters<ImportProductParams>) -> Result<CallToolResult, McpError> {
        let result = products::import_product(
            &self.database,
            self.catalog.as_ref(),
            p.name.as_deref(),
            p.index,
            p.raw.as_ref(),
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Ingredients ---

    #[tool(description = "Store a hand-entered ingredient with its serving, local price and per-serving nutrients. Names already stored (ignoring case) are reused.")]
    fn create_ingredient(&self, Parameters(p): Parameters<CreateIngredientParams>) -> Result<CallToolResult, McpError> {
        let nutrients = ingredients::nutrients_from_map(&p.nutrients)
            .map_err(|e| McpError::invalid_params(e, None))?;
        let data = Ingredient {
            product_id: p.product_id,
            name: p.name,
            serving_size: p.serving_size,
            serving_size_unit: p
                .serving_size_unit
                .unwrap_or_else(|| UNKNOWN_SERVING_UNIT.to_string()),
            servings_per_container: p.servings_per_container,
            package_size: p.package_size,
            local_price: Pricing {
                regular: p.regular_price,
                promo: p.promo_price,
                ..Pricing::default()
            },
            national_price: Pricing::default(),
            nutrients,
        };
        let result = ingredients::create_ingredient(&self.database, data)
            .map_err(|e| McpError::invalid_params(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a stored ingredient with its nutrient readings, price per serving and recipe usage")]
    fn get_ingredient(&self, Parameters(p): Parameters<IngredientIdParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::get_ingredient(&self.database, &self.reference, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(detail) => json_result(&detail),
            None => Ok(CallToolResult::success(vec![Content::text(format!(
                r#"{{"error": "Ingredient not found", "id": {}}}"#,
                p.id
            ))])),
        }
    }

    #[tool(description = "Search stored ingredients by name, or list them all with a blank query")]
    fn search_ingredients(&self, Parameters(p): Parameters<SearchIngredientsParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::search_ingredients(&self.database, &p.query, p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Scale an ingredient's nutrients by a serving multiplier")]
    fn scale_ingredient(&self, Parameters(p): Parameters<ScaleIngredientParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::scale_ingredient(&self.database, &self.reference, p.id, p.factor)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Score an ingredient (optionally scaled by `factor` servings) against the reference intake ranges and grade it A+ to E")]
    fn score_ingredient(&self, Parameters(p): Parameters<ScoreIngredientParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::score_ingredient(&self.database, &self.reference, p.id, p.factor)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Delete an ingredient (only allowed if no recipe uses it)")]
    fn delete_ingredient(&self, Parameters(p): Parameters<IngredientIdParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::delete_ingredient(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Ok(success) => json_result(&success),
            Err(blocked) => json_result(&blocked),
        }
    }

    // --- Recipes ---

    #[tool(description = "Create a recipe from stored ingredients (quantity = servings of each) and cache its cost to cook, cost per serving and nutrition grade")]
    fn create_recipe(&self, Parameters(p): Parameters<CreateRecipeParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeCreate {
            name: p.name,
            instructions: p.instructions,
            total_portions: p.total_portions,
            ingredients: p
                .ingredients
                .into_iter()
                .map(|line| RecipeIngredientCreate {
                    ingredient_id: line.ingredient_id,
                    quantity: line.quantity,
                })
                .collect(),
        };
        let result = recipes::create_recipe(&self.database, &self.reference, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a recipe with its ingredient lines and cached costing")]
    fn get_recipe(&self, Parameters(p): Parameters<RecipeIdParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::get_recipe(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(detail) => json_result(&detail),
            None => Ok(CallToolResult::success(vec![Content::text(format!(
                r#"{{"error": "Recipe not found", "id": {}}}"#,
                p.id
            ))])),
        }
    }

    #[tool(description = "Search recipe names by substring (simple), similarity (fuzzy) or substring falling back to similarity (smart). Uses the built-in recipe list while no recipes are stored.")]
    fn search_recipes(&self, Parameters(p): Parameters<SearchRecipesParams>) -> Result<CallToolResult, McpError> {
        let mode = match p.mode.as_deref() {
            Some(s) => SearchMode::parse(s)
                .ok_or_else(|| McpError::invalid_params(format!("Unknown search mode: {}", s), None))?,
            None => SearchMode::default(),
        };
        let metric = match p.metric.as_deref() {
            Some(s) => SimilarityMetric::parse(s)
                .ok_or_else(|| McpError::invalid_params(format!("Unknown metric: {}", s), None))?,
            None => SimilarityMetric::default(),
        };
        let result = recipes::search_recipes(&self.database, &p.query, mode, metric, p.threshold)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Recompute a recipe's nutrients, costing and grade from its current ingredients")]
    fn recalculate_recipe(&self, Parameters(p): Parameters<RecalculateRecipeParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::recalculate_recipe(&self.database, &self.reference, p.id, p.persist)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Delete a recipe and its ingredient lines")]
    fn delete_recipe(&self, Parameters(p): Parameters<RecipeIdParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::delete_recipe(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for NutriBudgetService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "nutribudget".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("NutriBudget".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "NutriBudget - grocery nutrition scoring and recipe costing. \
                 Products: search_products to browse the catalog, import_product to store one as an ingredient. \
                 Ingredients: create_ingredient for hand-entered foods, get/search/delete_ingredient, scale_ingredient (serving multiplier), \
                 score_ingredient (grade A+ to E against reference intake ranges). \
                 Recipes: create_recipe from stored ingredient ids, get/delete_recipe, \
                 search_recipes (simple, fuzzy or smart), recalculate_recipe. \
                 Status: nutribudget_status."
                    .into(),
            ),
        }
    }
}
