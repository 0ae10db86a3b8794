//! Product MCP Tools
//!
//! Catalog search and import of normalized products as stored ingredients.

use serde::Serialize;
use serde_json::Value;

use crate::catalog::{search_products as catalog_search, ProductCatalog};
use crate::db::Database;
use crate::models::{Ingredient, InsertOutcome, StoredIngredient};
use crate::nutrition::{normalize, score_nutrients_with, Grade, ReferenceTable};

/// A normalized catalog product with its derived figures
#[derive(Debug, Serialize)]
pub struct ProductResult {
    pub index: usize,
    #[serde(flatten)]
    pub ingredient: Ingredient,
    pub serving: String,
    pub price_per_serving: f64,
    pub nutrition_score: i32,
    pub nutrition_grade: Grade,
}

/// Response for search_products
#[derive(Debug, Serialize)]
pub struct SearchProductsResponse {
    pub query: String,
    pub products: Vec<ProductResult>,
    pub count: usize,
}

/// Response for import_product
#[derive(Debug, Serialize)]
pub struct ImportProductResponse {
    pub id: i64,
    /// False when an ingredient with the same name was already stored
    pub created: bool,
    pub name: String,
    pub serving: String,
    pub price_per_serving: f64,
}

fn describe(table: &ReferenceTable, index: usize, ingredient: Ingredient) -> ProductResult {
    let score = score_nutrients_with(table, &ingredient.nutrients);
    ProductResult {
        index,
        serving: ingredient.serving_label(),
        price_per_serving: ingredient.price_per_serving(),
        nutrition_score: score.total_score,
        nutrition_grade: score.grade,
        ingredient,
    }
}

/// Search the catalog and normalize up to `count` products (max 50)
pub fn search_products(
    catalog: &dyn ProductCatalog,
    table: &ReferenceTable,
    name: &str,
    count: i64,
) -> Result<SearchProductsResponse, String> {
    let count = count.min(50);
    let products = catalog_search(catalog, name, count).map_err(|e| e.to_string())?;

    let products: Vec<ProductResult> = products
        .into_iter()
        .enumerate()
        .map(|(index, ingredient)| describe(table, index, ingredient))
        .collect();

    Ok(SearchProductsResponse {
        query: name.trim().to_string(),
        count: products.len(),
        products,
    })
}

/// Store a product as an ingredient.
///
/// With `raw`, that product record is normalized directly (`name` only serves
/// as the fallback name). Otherwise the catalog is searched for `name` and the
/// product at `index` is taken.
pub fn import_product(
    db: &Database,
    catalog: &dyn ProductCatalog,
    name: Option<&str>,
    index: usize,
    raw: Option<&Value>,
) -> Result<ImportProductResponse, String> {
    let name = name.map(str::trim).unwrap_or("");

    let ingredient = match raw {
        Some(raw) => normalize(raw, name),
        None => {
            if name.is_empty() {
                return Err("Either a product name or a raw product is required".to_string());
            }
            let count = i64::try_from(index).unwrap_or(i64::MAX).saturating_add(1);
            let mut products = catalog_search(catalog, name, count).map_err(|e| e.to_string())?;
            if index >= products.len() {
                return Err(format!(
                    "No product at index {} for '{}' ({} found)",
                    index,
                    name,
                    products.len()
                ));
            }
            products.swap_remove(index)
        }
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let outcome = StoredIngredient::insert(&conn, &ingredient)
        .map_err(|e| format!("Failed to store ingredient: {}", e))?;

    Ok(ImportProductResponse {
        id: outcome.id(),
        created: matches!(outcome, InsertOutcome::Created(_)),
        serving: ingredient.serving_label(),
        price_per_serving: ingredient.price_per_serving(),
        name: ingredient.name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::JsonFileCatalog;
    use crate::db::migrations::run_migrations;
    use serde_json::json;

    fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| run_migrations(conn)).unwrap();
        db
    }

    fn catalog() -> JsonFileCatalog {
        JsonFileCatalog::from_value(json!({"data": [
            {
                "productId": "0001",
                "description": "Rolled Oats",
                "items": [{"size": "42 oz", "price": {"regular": 6.0}}],
                "nutritionInformation": [{
                    "servingsPerPackage": {"value": 30},
                    "servingSize": {"quantity": 0.5, "unitOfMeasure": {"abbreviation": "cup"}},
                    "nutrients": [
                        {"displayName": "Protein", "quantity": 5, "unitOfMeasure": {"abbreviation": "g"}},
                        {"displayName": "Dietary Fiber", "quantity": 4, "unitOfMeasure": {"abbreviation": "g"}}
                    ]
                }]
            },
            {"description": "Steel Cut Oats"}
        ]}))
    }

    #[test]
    fn test_search_products_describes_results() {
        let response =
            search_products(&catalog(), ReferenceTable::standard(), " oats ", 5).unwrap();
        assert_eq!(response.query, "oats");
        assert_eq!(response.count, 2);

        let oats = &response.products[0];
        assert_eq!(oats.ingredient.name, "Rolled Oats");
        assert_eq!(oats.serving, "0.5 cup");
        assert!((oats.price_per_serving - 0.2).abs() < 1e-9);
        assert_eq!(response.products[1].index, 1);
    }

    #[test]
    fn test_import_by_index_then_dedupe() {
        let db = setup_db();
        let catalog = catalog();

        let first = import_product(&db, &catalog, Some("oats"), 1, None).unwrap();
        assert!(first.created);
        assert_eq!(first.name, "Steel Cut Oats");

        let again = import_product(&db, &catalog, Some("oats"), 1, None).unwrap();
        assert!(!again.created);
        assert_eq!(again.id, first.id);
    }

    #[test]
    fn test_import_out_of_range() {
        let db = setup_db();
        let err = import_product(&db, &catalog(), Some("oats"), 5, None).unwrap_err();
        assert!(err.contains("No product at index 5"));
    }

    #[test]
    fn test_import_raw_uses_fallback_name() {
        let db = setup_db();
        let raw = json!({"items": [{"price": {"regular": 2.5}}]});
        let response = import_product(&db, &catalog(), Some("mystery jar"), 0, Some(&raw)).unwrap();
        assert!(response.created);
        assert_eq!(response.name, "mystery jar");
        assert_eq!(response.price_per_serving, 2.5);
    }

    #[test]
    fn test_import_requires_name_or_raw() {
        let db = setup_db();
        assert!(import_product(&db, &catalog(), None, 0, None).is_err());
        assert!(import_product(&db, &catalog(), Some("  "), 0, None).is_err());
    }
}
