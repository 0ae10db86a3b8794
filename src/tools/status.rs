//! NutriBudget Status Tool
//!
//! Provides runtime status information about the NutriBudget service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::db::Database;
use crate::models::{Recipe, StoredIngredient};

/// Service status response
#[derive(Debug, Clone, Serialize)]
pub struct NutriBudgetStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,
    pub started_at: String,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub ingredient_count: Option<i64>,
    pub recipe_count: Option<i64>,

    /// Catalog and reference data
    pub catalog_path: String,
    pub catalog_products: usize,
    pub reference_nutrients: usize,
    pub inverted_reference_ranges: Vec<String>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Facts about the loaded catalog and reference table, fixed at startup
#[derive(Debug, Clone, Default)]
pub struct DataSources {
    pub catalog_path: PathBuf,
    pub catalog_products: usize,
    pub reference_nutrients: usize,
    pub inverted_reference_ranges: Vec<String>,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    started_at: String,
    database_path: PathBuf,
    sources: DataSources,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(database_path: PathBuf, sources: DataSources) -> Self {
        Self {
            start_time: Instant::now(),
            started_at: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            database_path,
            sources,
        }
    }

    /// Get the current status
    pub fn get_status(&self, db: &Database) -> NutriBudgetStatus {
        let build_info = BuildInfo::current();

        // Get database size if it exists
        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        // Counts are best effort; status must still answer if the pool is down
        let counts = db
            .with_conn(|conn| Ok((StoredIngredient::count(conn)?, Recipe::count(conn)?)))
            .map_err(|e| tracing::warn!(error = %e, "status counts unavailable"))
            .ok();

        // Get process info
        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        NutriBudgetStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            started_at: self.started_at.clone(),
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            ingredient_count: counts.map(|c| c.0),
            recipe_count: counts.map(|c| c.1),
            catalog_path: self.sources.catalog_path.display().to_string(),
            catalog_products: self.sources.catalog_products,
            reference_nutrients: self.sources.reference_nutrients,
            inverted_reference_ranges: self.sources.inverted_reference_ranges.clone(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
