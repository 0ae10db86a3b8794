//! Flattened nutrient data
//!
//! The canonical nutrient representation shared by ingredients, recipes and
//! the scoring engine. Every field is a plain `f64` defaulting to 0.0.

use serde::{Deserialize, Serialize};

/// Static description of one nutrient field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NutrientField {
    /// snake_case key, also the database column name
    pub key: &'static str,
    /// Catalog display names that map onto this field, primary label first
    pub labels: &'static [&'static str],
    /// Unit label for display
    pub unit: &'static str,
}

impl NutrientField {
    /// Primary display label
    pub fn label(&self) -> &'static str {
        self.labels[0]
    }
}

macro_rules! nutrient_fields {
    ($( $field:ident : $unit:literal => [$($label:literal),+ $(,)?] ),+ $(,)?) => {
        /// Nutritional values of one ingredient, recipe or portion
        #[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct Nutrients {
            $(pub $field: f64,)+
        }

        /// Every nutrient field in declaration order
        pub const NUTRIENT_FIELDS: &[NutrientField] = &[
            $(NutrientField {
                key: stringify!($field),
                labels: &[$($label),+],
                unit: $unit,
            },)+
        ];

        impl Nutrients {
            /// Look up a field by key; `None` for keys that are not nutrient fields
            pub fn get(&self, key: &str) -> Option<f64> {
                match key {
                    $(stringify!($field) => Some(self.$field),)+
                    _ => None,
                }
            }

            /// Mutable access to a field by key
            pub fn get_mut(&mut self, key: &str) -> Option<&mut f64> {
                match key {
                    $(stringify!($field) => Some(&mut self.$field),)+
                    _ => None,
                }
            }

            /// Apply `f` to every field
            pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Self {
                Self {
                    $($field: f(self.$field),)+
                }
            }

            /// Combine two values field by field
            pub fn zip_with<F: Fn(f64, f64) -> f64>(&self, other: &Self, f: F) -> Self {
                Self {
                    $($field: f(self.$field, other.$field),)+
                }
            }
        }
    };
}

nutrient_fields! {
    // Macronutrients
    calories: "kcal" => ["Calories", "Energy"],
    protein: "g" => ["Protein"],
    carbs: "g" => ["Carbohydrate", "Total Carbohydrate", "Carbohydrates"],
    fats: "g" => ["Total Fat", "Fat"],
    fiber: "g" => ["Fiber", "Dietary Fiber"],
    sugars: "g" => ["Sugar", "Sugars", "Total Sugars"],

    // Vitamins
    vitamin_a: "µg" => ["Vitamin A"],
    vitamin_b1: "mg" => ["Thiamin", "Vitamin B1"],
    vitamin_b2: "mg" => ["Riboflavin", "Vitamin B2"],
    vitamin_b3: "mg" => ["Niacin", "Vitamin B3"],
    vitamin_b5: "mg" => ["Pantothenic Acid", "Vitamin B5"],
    vitamin_b6: "mg" => ["Vitamin B6"],
    vitamin_b7: "µg" => ["Biotin", "Vitamin B7"],
    vitamin_b9: "µg" => ["Folate", "Folic Acid", "Vitamin B9"],
    vitamin_b12: "µg" => ["Vitamin B12"],
    vitamin_c: "mg" => ["Vitamin C"],
    vitamin_d: "µg" => ["Vitamin D"],
    vitamin_e: "mg" => ["Vitamin E"],
    vitamin_k: "µg" => ["Vitamin K"],

    // Minerals (macro + trace)
    calcium: "mg" => ["Calcium"],
    phosphorus: "mg" => ["Phosphorus"],
    magnesium: "mg" => ["Magnesium"],
    sodium: "mg" => ["Sodium"],
    potassium: "mg" => ["Potassium"],
    chloride: "mg" => ["Chloride"],
    sulfur: "mg" => ["Sulfur"],
    iron: "mg" => ["Iron"],
    zinc: "mg" => ["Zinc"],
    copper: "mg" => ["Copper"],
    manganese: "mg" => ["Manganese"],
    iodine: "µg" => ["Iodine"],
    selenium: "µg" => ["Selenium"],
    molybdenum: "µg" => ["Molybdenum"],
    chromium: "µg" => ["Chromium"],
    fluoride: "µg" => ["Fluoride"],
    cobalt: "µg" => ["Cobalt"],

    // Other
    cholesterol: "mg" => ["Cholesterol"],
    saturated_fat: "g" => ["Saturated Fat"],
    trans_fat: "g" => ["Trans Fat"],
}

impl Nutrients {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Find the descriptor for a key
    pub fn field(key: &str) -> Option<&'static NutrientField> {
        NUTRIENT_FIELDS.iter().find(|f| f.key == key)
    }

    /// Iterate `(field, value)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&'static NutrientField, f64)> + '_ {
        NUTRIENT_FIELDS
            .iter()
            .map(move |f| (f, self.get(f.key).unwrap_or(0.0)))
    }

    /// True when every field is exactly zero
    pub fn is_zero(&self) -> bool {
        self.iter().all(|(_, v)| v == 0.0)
    }

    /// Scale every value by `factor`; zero values stay exactly zero
    pub fn scale(&self, factor: f64) -> Self {
        self.map(|v| if v != 0.0 { v * factor } else { 0.0 })
    }

    /// Add another set of nutrients to this one
    pub fn add(&self, other: &Nutrients) -> Self {
        self.zip_with(other, |a, b| a + b)
    }
}

impl std::ops::Add for Nutrients {
    type Output = Nutrients;

    fn add(self, other: Nutrients) -> Nutrients {
        Nutrients::add(&self, &other)
    }
}

impl std::ops::Mul<f64> for Nutrients {
    type Output = Nutrients;

    fn mul(self, factor: f64) -> Nutrients {
        self.scale(factor)
    }
}

impl std::iter::Sum for Nutrients {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Nutrients::zero(), |acc, n| acc + n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_by_key() {
        let n = Nutrients {
            protein: 12.5,
            vitamin_b12: 2.4,
            ..Default::default()
        };
        assert_eq!(n.get("protein"), Some(12.5));
        assert_eq!(n.get("vitamin_b12"), Some(2.4));
        assert_eq!(n.get("calcium"), Some(0.0));
        assert_eq!(n.get("omega_3"), None);
    }

    #[test]
    fn test_get_mut_by_key() {
        let mut n = Nutrients::zero();
        *n.get_mut("iron").unwrap() = 4.7;
        assert_eq!(n.iron, 4.7);
        assert!(n.get_mut("unobtainium").is_none());
    }

    #[test]
    fn test_field_table_matches_struct() {
        assert_eq!(NUTRIENT_FIELDS.len(), 39);
        let n = Nutrients::zero();
        for field in NUTRIENT_FIELDS {
            assert!(n.get(field.key).is_some(), "missing field {}", field.key);
            assert!(!field.labels.is_empty());
        }
        assert_eq!(Nutrients::field("carbs").unwrap().label(), "Carbohydrate");
        assert_eq!(Nutrients::field("fats").unwrap().unit, "g");
    }

    #[test]
    fn test_scale_keeps_zero_exact() {
        let n = Nutrients {
            calories: 200.0,
            sodium: 0.0,
            ..Default::default()
        };
        let scaled = n.scale(f64::INFINITY);
        assert_eq!(scaled.calories, f64::INFINITY);
        assert_eq!(scaled.sodium, 0.0);
    }

    #[test]
    fn test_sum_and_ops() {
        let a = Nutrients {
            protein: 3.0,
            fiber: 1.0,
            ..Default::default()
        };
        let b = Nutrients {
            protein: 2.0,
            ..Default::default()
        };
        let total: Nutrients = vec![a, b].into_iter().sum();
        assert_eq!(total.protein, 5.0);
        assert_eq!(total.fiber, 1.0);
        assert_eq!((a * 2.0).protein, 6.0);
        assert!(Nutrients::zero().is_zero());
        assert!(!total.is_zero());
    }

    #[test]
    fn test_serde_defaults_missing_fields() {
        let n: Nutrients = serde_json::from_str(r#"{"protein": 8.0}"#).unwrap();
        assert_eq!(n.protein, 8.0);
        assert_eq!(n.calories, 0.0);
    }
}
