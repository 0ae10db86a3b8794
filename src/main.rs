//! NutriBudget
//!
//! An MCP server for grocery nutrition scoring and recipe costing.

use std::sync::Arc;

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use nutribudget::build_info;
use nutribudget::catalog::JsonFileCatalog;
use nutribudget::config::AppConfig;
use nutribudget::db::{self, Database};
use nutribudget::mcp::NutriBudgetService;
use nutribudget::nutrition::ReferenceTable;
use nutribudget::tools::status::DataSources;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("nutribudget=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    // Print startup banner to stderr
    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let config = AppConfig::from_env();
    eprintln!("Database path: {}", config.database_path.display());
    eprintln!("Catalog path: {}", config.catalog_path.display());

    // Reference intake ranges
    let reference = match &config.reference_path {
        Some(path) => {
            eprintln!("Reference table: {}", path.display());
            ReferenceTable::from_path(path)?
        }
        None => ReferenceTable::standard().clone(),
    };

    let catalog = JsonFileCatalog::open(&config.catalog_path)?;

    // Ensure data directory exists
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Initialize database
    eprintln!("Initializing database...");
    let database = Database::new(&config.database_path)?;

    // Run migrations
    database.with_conn(|conn| {
        if db::migrations::needs_migration(conn)? {
            eprintln!("Applying schema migrations...");
        }
        db::migrations::run_migrations(conn)?;
        let version = db::migrations::get_schema_version(conn)?;
        eprintln!("Database schema version: {}", version);
        Ok(())
    })?;

    let sources = DataSources {
        catalog_path: config.catalog_path.clone(),
        catalog_products: catalog.len(),
        reference_nutrients: reference.len(),
        inverted_reference_ranges: reference
            .inverted_ranges()
            .into_iter()
            .map(String::from)
            .collect(),
    };

    // Create the NutriBudget service
    let service = NutriBudgetService::new(
        config.database_path,
        database,
        Arc::new(catalog),
        Arc::new(reference),
        sources,
    );

    // Create stdio transport
    let transport = (stdin(), stdout());

    // Start the MCP server
    let server = service.serve(transport).await?;

    // Wait for the server to complete
    server.waiting().await?;

    Ok(())
}
