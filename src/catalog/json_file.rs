//! File-backed product catalog
//!
//! Serves searches from saved catalog responses. The file holds either a
//! search response (`{"data": [...]}`) or a bare array of products.

use std::path::Path;

use serde_json::{json, Value};

use super::{CatalogError, ProductCatalog};

/// Catalog over a fixed list of raw products
#[derive(Debug, Clone, Default)]
pub struct JsonFileCatalog {
    products: Vec<Value>,
}

impl JsonFileCatalog {
    /// Build from a parsed response or product array
    pub fn from_value(value: Value) -> Self {
        let products = match value {
            Value::Array(products) => products,
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(products)) => products,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        Self { products }
    }

    /// Load from a JSON file; a missing file gives an empty catalog
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(path = %path.display(), "catalog file not found, starting empty");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let catalog = Self::from_value(serde_json::from_str(&text)?);
        tracing::info!(path = %path.display(), products = catalog.len(), "loaded catalog");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Case-insensitive match against the product's descriptive text
fn matches(product: &Value, term: &str) -> bool {
    ["description", "receiptDescription", "brand"]
        .iter()
        .filter_map(|key| product.get(*key).and_then(Value::as_str))
        .any(|text| text.to_lowercase().contains(term))
}

impl ProductCatalog for JsonFileCatalog {
    fn search(&self, term: &str, limit: usize) -> Result<Value, CatalogError> {
        let term = term.trim().to_lowercase();
        let data: Vec<Value> = self
            .products
            .iter()
            .filter(|p| matches(p, &term))
            .take(limit)
            .cloned()
            .collect();
        Ok(json!({ "data": data }))
    }
}
