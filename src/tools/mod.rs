//! NutriBudget Tools module
//!
//! MCP tool implementations over the catalog, the nutrition engine and storage.

pub mod ingredients;
pub mod products;
pub mod recipes;
pub mod status;
