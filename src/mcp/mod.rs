//! MCP Server module

pub mod server;

pub use server::NutriBudgetService;
