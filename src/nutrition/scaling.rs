//! Serving-size scaling
//!
//! Multiplies the nutrient dimension of an ingredient; everything else is
//! carried over unchanged.

use crate::models::{Ingredient, NutrientReading};

/// Scale an ingredient's nutrients by `factor`.
///
/// Non-zero values are multiplied, zero values stay exactly 0.0. No bound is
/// placed on `factor`.
pub fn scale(ingredient: &Ingredient, factor: f64) -> Ingredient {
    Ingredient {
        nutrients: ingredient.nutrients.scale(factor),
        ..ingredient.clone()
    }
}

/// Scale one reading's quantity and percent daily intake
pub fn scale_reading(reading: &NutrientReading, factor: f64) -> NutrientReading {
    let apply = |v: f64| if v != 0.0 { v * factor } else { 0.0 };
    NutrientReading {
        quantity: apply(reading.quantity),
        percent_daily_intake: apply(reading.percent_daily_intake),
        ..reading.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Nutrients, Pricing, NUTRIENT_FIELDS};

    fn sample() -> Ingredient {
        Ingredient {
            product_id: "0001111041700".into(),
            name: "Whole Milk".into(),
            serving_size: 1.0,
            serving_size_unit: "cup".into(),
            servings_per_container: 16.0,
            local_price: Pricing {
                regular: 4.29,
                promo: 3.99,
                ..Default::default()
            },
            nutrients: Nutrients {
                calories: 150.0,
                protein: 8.0,
                fats: 8.0,
                calcium: 300.0,
                vitamin_d: 2.9,
                sodium: 0.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn assert_close(a: &Nutrients, b: &Nutrients) {
        for field in NUTRIENT_FIELDS {
            let (x, y) = (a.get(field.key).unwrap(), b.get(field.key).unwrap());
            assert!((x - y).abs() < 1e-9, "{}: {} != {}", field.key, x, y);
        }
    }

    #[test]
    fn test_identity() {
        let milk = sample();
        assert_eq!(scale(&milk, 1.0), milk);
    }

    #[test]
    fn test_zero_factor_zeroes_nutrients_only() {
        let milk = sample();
        let scaled = scale(&milk, 0.0);
        assert!(scaled.nutrients.is_zero());
        assert_eq!(scaled.name, milk.name);
        assert_eq!(scaled.local_price, milk.local_price);
        assert_eq!(scaled.serving_size, milk.serving_size);
        assert_eq!(scaled.servings_per_container, milk.servings_per_container);
    }

    #[test]
    fn test_fractional_and_large_factors() {
        let milk = sample();
        assert_eq!(scale(&milk, 0.5).nutrients.calories, 75.0);
        assert_eq!(scale(&milk, 3.0).nutrients.calcium, 900.0);
        assert_eq!(scale(&milk, 3.0).nutrients.sodium, 0.0);
    }

    #[test]
    fn test_composition() {
        let milk = sample();
        for (a, b) in [(0.5, 3.0), (1.25, 0.8), (7.0, 0.1)] {
            let twice = scale(&scale(&milk, a), b);
            let once = scale(&milk, a * b);
            assert_close(&twice.nutrients, &once.nutrients);
        }
    }

    #[test]
    fn test_scale_reading() {
        let reading = NutrientReading {
            display_name: "Calcium".into(),
            quantity: 300.0,
            percent_daily_intake: 30.0,
            unit_of_measure: "mg".into(),
            ..Default::default()
        };
        let doubled = scale_reading(&reading, 2.0);
        assert_eq!(doubled.quantity, 600.0);
        assert_eq!(doubled.percent_daily_intake, 60.0);
        assert_eq!(doubled.unit_of_measure, "mg");

        let empty = NutrientReading::new("Iron", 0.0);
        assert_eq!(scale_reading(&empty, 5.0).quantity, 0.0);
    }
}
