//! Utility to normalize, scale and score a raw catalog product
//!
//! Usage: score_product <raw-product.json> [factor]

use serde::Serialize;

use nutribudget::config::AppConfig;
use nutribudget::models::{Ingredient, NutrientReading};
use nutribudget::nutrition::{normalize, scale, score_nutrients_with, ReferenceTable, ScoreBreakdown};

#[derive(Serialize)]
struct Report {
    factor: f64,
    serving: String,
    price_per_serving: f64,
    ingredient: Ingredient,
    readings: Vec<NutrientReading>,
    score: ScoreBreakdown,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .ok_or("usage: score_product <raw-product.json> [factor]")?;
    let factor: f64 = match args.next() {
        Some(s) => s.parse().map_err(|e| format!("invalid factor '{}': {}", s, e))?,
        None => 1.0,
    };

    let config = AppConfig::from_env();
    let reference = match &config.reference_path {
        Some(p) => ReferenceTable::from_path(p)?,
        None => ReferenceTable::standard().clone(),
    };

    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    let fallback = std::path::Path::new(&path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let ingredient = scale(&normalize(&raw, &fallback), factor);

    let report = Report {
        factor,
        serving: ingredient.serving_label(),
        price_per_serving: ingredient.price_per_serving(),
        readings: ingredient.readings_with(&reference),
        score: score_nutrients_with(&reference, &ingredient.nutrients),
        ingredient,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
