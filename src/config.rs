//! Runtime configuration
//!
//! Read once at startup from environment variables.

use std::path::{Path, PathBuf};

pub const DATABASE_PATH_VAR: &str = "NUTRIBUDGET_DATABASE_PATH";
pub const CATALOG_PATH_VAR: &str = "NUTRIBUDGET_CATALOG_PATH";
pub const REFERENCE_PATH_VAR: &str = "NUTRIBUDGET_REFERENCE_PATH";

/// Paths the server and CLI work with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_path: PathBuf,
    /// Saved catalog responses; a missing file means an empty catalog
    pub catalog_path: PathBuf,
    /// Alternative reference table; `None` uses the standard one
    pub reference_path: Option<PathBuf>,
}

/// Project root: the executable's directory, lifted out of target/{release,debug}
pub fn project_root() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(parent) = path.parent() {
            if let Some(grandparent) = parent.parent() {
                path = grandparent.to_path_buf();
            }
        }
    }

    path
}

impl AppConfig {
    /// Defaults under `<root>/data`
    pub fn with_root(root: &Path) -> Self {
        let data = root.join("data");
        Self {
            database_path: data.join("nutribudget.db"),
            catalog_path: data.join("catalog.json"),
            reference_path: None,
        }
    }

    /// Build from a variable lookup; empty values count as unset
    pub fn from_lookup<F>(root: &Path, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty()).map(PathBuf::from);
        let defaults = Self::with_root(root);
        Self {
            database_path: var(DATABASE_PATH_VAR).unwrap_or(defaults.database_path),
            catalog_path: var(CATALOG_PATH_VAR).unwrap_or(defaults.catalog_path),
            reference_path: var(REFERENCE_PATH_VAR),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(&project_root(), |name| std::env::var(name).ok())
    }
}
