//! Nutrition engine
//!
//! Normalizes raw catalog products, scales nutrients by serving multiplier
//! and scores them against reference intake ranges.

pub mod normalizer;
pub mod raw;
pub mod reference;
pub mod scaling;
pub mod scoring;

pub use normalizer::{normalize, normalize_product, raw_readings};
pub use raw::RawProduct;
pub use reference::{NutrientRange, ReferenceError, ReferenceTable};
pub use scaling::{scale, scale_reading};
pub use scoring::{
    score_ingredient, score_nutrient, score_nutrients, score_nutrients_with, Grade,
    NutrientScore, ScoreBreakdown,
};
