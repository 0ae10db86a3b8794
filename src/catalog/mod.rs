//! Grocery catalog integration
//!
//! A `ProductCatalog` answers product searches with a raw catalog response
//! (`{"data": [...]}`); `search_products` normalizes the results.

mod json_file;

pub use json_file::JsonFileCatalog;

use serde_json::Value;
use thiserror::Error;

use crate::models::Ingredient;
use crate::nutrition::normalize;

/// Catalog error types
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

/// Source of raw product records
pub trait ProductCatalog {
    /// Search for up to `limit` products matching `term`, returning the raw
    /// response body
    fn search(&self, term: &str, limit: usize) -> Result<Value, CatalogError>;
}

/// Normalize the first `count` products of a raw search response.
///
/// A missing or mistyped `data` array yields no products.
pub fn products_from_response(response: &Value, fallback_name: &str, count: usize) -> Vec<Ingredient> {
    let products = response
        .get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let take = count.min(products.len());
    if take < count {
        tracing::debug!(requested = count, available = products.len(), "clamped result count");
    }

    products[..take]
        .iter()
        .map(|raw| normalize(raw, fallback_name))
        .collect()
}

/// Search the catalog and normalize up to `count` products.
///
/// A blank name or a non-positive count returns nothing without querying the
/// catalog.
pub fn search_products(
    catalog: &dyn ProductCatalog,
    name: &str,
    count: i64,
) -> Result<Vec<Ingredient>, CatalogError> {
    let name = name.trim();
    if name.is_empty() || count <= 0 {
        tracing::debug!(name, count, "skipping catalog search");
        return Ok(Vec::new());
    }

    let count = usize::try_from(count).unwrap_or(usize::MAX);
    let response = catalog.search(name, count)?;
    Ok(products_from_response(&response, name, count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    /// Returns a fixed response and counts queries
    struct FixedCatalog {
        response: Value,
        queries: Cell<usize>,
    }

    impl FixedCatalog {
        fn new(response: Value) -> Self {
            Self {
                response,
                queries: Cell::new(0),
            }
        }
    }

    impl ProductCatalog for FixedCatalog {
        fn search(&self, _term: &str, _limit: usize) -> Result<Value, CatalogError> {
            self.queries.set(self.queries.get() + 1);
            Ok(self.response.clone())
        }
    }

    struct DownCatalog;

    impl ProductCatalog for DownCatalog {
        fn search(&self, _term: &str, _limit: usize) -> Result<Value, CatalogError> {
            Err(CatalogError::Unavailable("offline".into()))
        }
    }

    fn three_products() -> Value {
        json!({"data": [
            {"description": "Bananas"},
            {"description": "Organic Bananas"},
            {}
        ]})
    }

    #[test]
    fn test_count_clamped_to_available() {
        let catalog = FixedCatalog::new(three_products());
        let products = search_products(&catalog, "banana", 10).unwrap();
        assert_eq!(products.len(), 3);
        assert_eq!(products[2].name, "banana");
    }

    #[test]
    fn test_count_limits_results() {
        let catalog = FixedCatalog::new(three_products());
        let products = search_products(&catalog, "banana", 2).unwrap();
        let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Bananas", "Organic Bananas"]);
    }

    #[test]
    fn test_blank_name_skips_catalog() {
        let catalog = FixedCatalog::new(three_products());
        assert!(search_products(&catalog, "   ", 5).unwrap().is_empty());
        assert!(search_products(&catalog, "", 5).unwrap().is_empty());
        assert_eq!(catalog.queries.get(), 0);
    }

    #[test]
    fn test_non_positive_count() {
        let catalog = FixedCatalog::new(three_products());
        assert!(search_products(&catalog, "banana", 0).unwrap().is_empty());
        assert!(search_products(&catalog, "banana", -3).unwrap().is_empty());
        assert_eq!(catalog.queries.get(), 0);
    }

    #[test]
    fn test_malformed_response() {
        for response in [json!({}), json!({"data": "nope"}), json!([1, 2])] {
            let catalog = FixedCatalog::new(response);
            assert!(search_products(&catalog, "banana", 5).unwrap().is_empty());
        }
    }

    #[test]
    fn test_catalog_error_propagates() {
        let err = search_products(&DownCatalog, "banana", 5).unwrap_err();
        assert_eq!(err.to_string(), "Catalog unavailable: offline");
    }
}
