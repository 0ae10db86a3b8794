//! Nutrient reading model
//!
//! One measured nutrient on a catalog product, as printed on its label.

use serde::{Deserialize, Serialize};

use super::nutrients::{Nutrients, NUTRIENT_FIELDS};

/// A single nutrient measurement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientReading {
    pub display_name: String,
    pub code: String,
    pub description: String,
    pub quantity: f64,
    pub percent_daily_intake: f64,
    pub unit_of_measure: String,
}

impl NutrientReading {
    /// Reading with just a label and a quantity
    pub fn new(display_name: impl Into<String>, quantity: f64) -> Self {
        Self {
            display_name: display_name.into(),
            quantity,
            ..Default::default()
        }
    }
}

/// Quantity of the first reading whose display name matches `query`
/// case-insensitively; 0.0 when there is none.
pub fn find_nutrient(readings: &[NutrientReading], query: &str) -> f64 {
    let query = query.to_lowercase();
    readings
        .iter()
        .find(|r| r.display_name.to_lowercase() == query)
        .map(|r| r.quantity)
        .unwrap_or(0.0)
}

fn has_reading(readings: &[NutrientReading], query: &str) -> bool {
    let query = query.to_lowercase();
    readings.iter().any(|r| r.display_name.to_lowercase() == query)
}

impl Nutrients {
    /// Fold a list of catalog readings into named fields.
    ///
    /// Each field takes the first of its labels that has a reading. Readings
    /// whose label matches no field are dropped.
    pub fn from_readings(readings: &[NutrientReading]) -> Self {
        let mut nutrients = Nutrients::zero();
        for field in NUTRIENT_FIELDS {
            let label = field.labels.iter().find(|l| has_reading(readings, l));
            if let Some(label) = label {
                if let Some(slot) = nutrients.get_mut(field.key) {
                    *slot = find_nutrient(readings, label);
                }
            }
        }
        nutrients
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_nutrient_case_insensitive() {
        for label in ["protein", "PROTEIN", "Protein"] {
            let readings = vec![NutrientReading::new(label, 16.9)];
            assert_eq!(find_nutrient(&readings, "Protein"), 16.9);
        }
    }

    #[test]
    fn test_find_nutrient_missing_is_zero() {
        let readings = vec![NutrientReading::new("Iron", 4.7)];
        assert_eq!(find_nutrient(&readings, "Protein"), 0.0);
        assert_eq!(find_nutrient(&[], "Protein"), 0.0);
    }

    #[test]
    fn test_find_nutrient_exact_not_substring() {
        let readings = vec![NutrientReading::new("Saturated Fat", 2.0)];
        assert_eq!(find_nutrient(&readings, "Fat"), 0.0);
    }

    #[test]
    fn test_find_nutrient_first_match_wins() {
        let readings = vec![
            NutrientReading::new("Sugar", 1.0),
            NutrientReading::new("sugar", 9.0),
        ];
        assert_eq!(find_nutrient(&readings, "SUGAR"), 1.0);
    }

    #[test]
    fn test_from_readings_uses_aliases() {
        let readings = vec![
            NutrientReading::new("Calories", 389.0),
            NutrientReading::new("Total Carbohydrate", 66.3),
            NutrientReading::new("Total Fat", 6.9),
            NutrientReading::new("Dietary Fiber", 10.6),
            NutrientReading::new("Magnesium", 177.0),
            NutrientReading::new("Added Sugars", 3.0),
        ];
        let n = Nutrients::from_readings(&readings);
        assert_eq!(n.calories, 389.0);
        assert_eq!(n.carbs, 66.3);
        assert_eq!(n.fats, 6.9);
        assert_eq!(n.fiber, 10.6);
        assert_eq!(n.magnesium, 177.0);
        assert_eq!(n.sugars, 0.0);
    }

    #[test]
    fn test_from_readings_prefers_primary_label() {
        let readings = vec![
            NutrientReading::new("Total Carbohydrate", 30.0),
            NutrientReading::new("Carbohydrate", 25.0),
        ];
        assert_eq!(Nutrients::from_readings(&readings).carbs, 25.0);
    }
}
