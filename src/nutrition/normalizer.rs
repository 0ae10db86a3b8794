//! Ingredient normalizer
//!
//! Converts a raw catalog product into the canonical `Ingredient`. Never
//! fails: missing or mistyped fields resolve to documented defaults.

use serde_json::Value;

use crate::models::{Ingredient, NutrientReading, Nutrients, Pricing, UNKNOWN_SERVING_UNIT};
use super::raw::{RawNutrient, RawPrice, RawProduct};

/// Display name given to a nutrient entry with neither name nor code
pub const UNKNOWN_NUTRIENT: &str = "Unknown";

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.trim().is_empty())
}

fn pricing(raw: &RawPrice) -> Pricing {
    Pricing {
        regular: raw.regular.get(),
        regular_per_unit_estimate: raw.regular_per_unit_estimate.get(),
        promo: raw.promo.get(),
        promo_per_unit_estimate: raw.promo_per_unit_estimate.get(),
    }
}

fn reading(raw: &RawNutrient) -> NutrientReading {
    let display_name = non_empty(&raw.display_name)
        .or_else(|| non_empty(&raw.code))
        .unwrap_or(UNKNOWN_NUTRIENT);

    NutrientReading {
        display_name: display_name.to_string(),
        code: raw.code.clone().unwrap_or_default(),
        description: raw.description.clone().unwrap_or_default(),
        quantity: raw.quantity.get(),
        percent_daily_intake: raw.percent_daily_intake.get(),
        unit_of_measure: raw
            .unit_of_measure
            .as_ref()
            .and_then(|u| u.label())
            .unwrap_or_default()
            .to_string(),
    }
}

/// Nutrient readings of a raw product, in catalog order
pub fn raw_readings(product: &RawProduct) -> Vec<NutrientReading> {
    product
        .nutrition_information
        .first()
        .map(|info| info.nutrients.0.iter().map(reading).collect())
        .unwrap_or_default()
}

/// Normalize a parsed raw product
pub fn normalize_product(product: &RawProduct, fallback_name: &str) -> Ingredient {
    let name = non_empty(&product.description)
        .or_else(|| non_empty(&product.receipt_description))
        .unwrap_or(fallback_name)
        .to_string();

    let info = product.nutrition_information.first();
    let serving = info.and_then(|i| i.serving_size.first());

    let serving_size_unit = serving
        .and_then(|s| s.unit_of_measure.as_ref())
        .and_then(|u| u.label())
        .unwrap_or(UNKNOWN_SERVING_UNIT)
        .to_string();

    let readings = raw_readings(product);
    let item = product.items.0.first();

    let ingredient = Ingredient {
        product_id: product.product_id.clone().unwrap_or_default(),
        name,
        serving_size: serving.map(|s| s.quantity.get()).unwrap_or(0.0),
        serving_size_unit,
        servings_per_container: info.map(|i| i.servings_per_package.value()).unwrap_or(0.0),
        package_size: item
            .and_then(|i| i.size.clone())
            .unwrap_or_default()
            .trim()
            .to_string(),
        local_price: item.map(|i| pricing(&i.price)).unwrap_or_default(),
        national_price: item.map(|i| pricing(&i.national_price)).unwrap_or_default(),
        nutrients: Nutrients::from_readings(&readings),
    };

    tracing::debug!(
        name = %ingredient.name,
        readings = readings.len(),
        has_nutrition = info.is_some(),
        "normalized product"
    );
    ingredient
}

/// Normalize an untyped raw catalog record.
///
/// `fallback_name` is used when the record has neither a description nor a
/// receipt description.
pub fn normalize(raw: &Value, fallback_name: &str) -> Ingredient {
    normalize_product(&RawProduct::from_value(raw), fallback_name)
}
