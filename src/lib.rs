//! NutriBudget Library
//!
//! Grocery nutrition scoring, serving scaling and recipe costing.

pub mod build_info;
pub mod catalog;
pub mod config;
pub mod db;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod search;
pub mod tools;
