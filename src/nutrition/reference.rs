//! Nutrient reference ranges
//!
//! Recommended daily intake (RDI) and upper limit (UL) per nutrient. The
//! standard table is built once per process; alternative tables can be loaded
//! from JSON of the form `{"magnesium": [400, 350], ...}`.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading a reference table
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("Invalid reference table JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not read reference table: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid range for {key}: rdi={rdi}, ul={ul}")]
    InvalidRange { key: String, rdi: f64, ul: f64 },
}

/// RDI / UL pair for one nutrient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientRange {
    pub rdi: f64,
    pub ul: f64,
}

impl NutrientRange {
    pub const fn new(rdi: f64, ul: f64) -> Self {
        Self { rdi, ul }
    }

    /// True when the upper limit sits below the recommended intake
    pub fn is_inverted(&self) -> bool {
        self.ul < self.rdi
    }
}

/// Ordered, immutable list of reference ranges keyed by nutrient field
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    entries: Vec<(String, NutrientRange)>,
}

const STANDARD_RANGES: &[(&str, f64, f64)] = &[
    // Vitamins
    ("vitamin_a", 900.0, 3000.0),
    ("vitamin_b1", 1.2, 50.0),
    ("vitamin_b2", 1.3, 50.0),
    ("vitamin_b3", 16.0, 35.0),
    ("vitamin_b5", 5.0, 1000.0),
    ("vitamin_b6", 1.3, 100.0),
    ("vitamin_b7", 30.0, 1000.0),
    ("vitamin_b9", 400.0, 1000.0),
    ("vitamin_b12", 2.4, 1000.0),
    ("vitamin_c", 90.0, 2000.0),
    ("vitamin_d", 20.0, 100.0),
    ("vitamin_e", 15.0, 1000.0),
    ("vitamin_k", 120.0, 1000.0),
    // Minerals
    ("calcium", 1000.0, 2500.0),
    ("phosphorus", 700.0, 4000.0),
    // UL is the supplement limit, lower than the dietary RDI
    ("magnesium", 400.0, 350.0),
    ("sodium", 1500.0, 2300.0),
    ("potassium", 4700.0, 5000.0),
    ("chloride", 2300.0, 3600.0),
    ("sulfur", 1000.0, 2000.0),
    ("iron", 18.0, 45.0),
    ("zinc", 11.0, 40.0),
    ("copper", 0.9, 10.0),
    ("manganese", 2.3, 11.0),
    ("iodine", 150.0, 1100.0),
    ("selenium", 55.0, 400.0),
    ("molybdenum", 45.0, 2000.0),
    ("chromium", 35.0, 1000.0),
    ("fluoride", 4.0, 10.0),
    ("cobalt", 5.0, 100.0),
    // Macronutrient bonuses
    ("fiber", 25.0, 70.0),
    ("protein", 50.0, 200.0),
];

static STANDARD: OnceLock<ReferenceTable> = OnceLock::new();

impl ReferenceTable {
    /// Build a table from validated entries, warning about inverted ranges
    pub fn new<I, K>(entries: I) -> Result<Self, ReferenceError>
    where
        I: IntoIterator<Item = (K, NutrientRange)>,
        K: Into<String>,
    {
        let mut table = Vec::new();
        for (key, range) in entries {
            let key = key.into();
            let valid = |v: f64| v.is_finite() && v >= 0.0;
            if !valid(range.rdi) || !valid(range.ul) {
                return Err(ReferenceError::InvalidRange {
                    key,
                    rdi: range.rdi,
                    ul: range.ul,
                });
            }
            if range.is_inverted() {
                tracing::warn!(
                    nutrient = %key,
                    rdi = range.rdi,
                    ul = range.ul,
                    "reference range has UL below RDI; in-band score is unreachable"
                );
            }
            table.push((key, range));
        }
        Ok(Self { entries: table })
    }

    /// The built-in table, constructed on first use.
    ///
    /// Goes through [`ReferenceTable::new`], so the magnesium inversion is
    /// logged once when the table is first built.
    pub fn standard() -> &'static ReferenceTable {
        STANDARD.get_or_init(|| {
            let ranges = || {
                STANDARD_RANGES
                    .iter()
                    .map(|&(key, rdi, ul)| (key, NutrientRange::new(rdi, ul)))
            };
            Self::new(ranges()).unwrap_or_else(|e| {
                tracing::error!("built-in reference table failed validation: {}", e);
                Self {
                    entries: ranges().map(|(key, range)| (key.to_string(), range)).collect(),
                }
            })
        })
    }

    /// Parse `{"key": [rdi, ul], ...}`.
    ///
    /// Entries are ordered by key since JSON objects carry no order.
    pub fn from_json_str(json: &str) -> Result<Self, ReferenceError> {
        let raw: HashMap<String, (f64, f64)> = serde_json::from_str(json)?;
        let mut entries: Vec<_> = raw
            .into_iter()
            .map(|(key, (rdi, ul))| (key, NutrientRange::new(rdi, ul)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Self::new(entries)
    }

    /// Load a table from a JSON file
    pub fn from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ReferenceError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn get(&self, key: &str) -> Option<NutrientRange> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, range)| *range)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NutrientRange)> + '_ {
        self.entries.iter().map(|(k, r)| (k.as_str(), *r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys whose UL is below their RDI
    pub fn inverted_ranges(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, range)| range.is_inverted())
            .map(|(key, _)| key)
            .collect()
    }
}
