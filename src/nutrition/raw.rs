//! Raw catalog record types
//!
//! Typed mirror of a grocery catalog product. Every field deserializes through
//! a lenient adapter: a value of the wrong shape resolves to the field's
//! default instead of failing the whole record.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Deserialize `T`, falling back to `T::default()` when the value has the
/// wrong shape
pub fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Number that also accepts numeric strings such as `"3.49"` or `"$3.49"`.
/// Anything else is 0.0.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LenientF64(pub f64);

impl LenientF64 {
    pub fn from_value(value: &Value) -> Self {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => {
                let s = s.trim();
                s.strip_prefix('$').unwrap_or(s).trim().parse::<f64>().ok()
            }
            _ => None,
        };
        LenientF64(parsed.filter(|v| v.is_finite()).unwrap_or(0.0))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl<'de> Deserialize<'de> for LenientF64 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(LenientF64::from_value(&value))
    }
}

/// A single value or a list of them.
///
/// `Many` is tried first: derived structs also accept sequences.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    /// The single value, or the first of the list
    pub fn first(&self) -> Option<&T> {
        match self {
            OneOrMany::One(v) => Some(v),
            OneOrMany::Many(vs) => vs.first(),
        }
    }
}

/// List whose malformed entries become defaults instead of failing the list
#[derive(Debug, Clone, PartialEq)]
pub struct LenientVec<T>(pub Vec<T>);

impl<T> Default for LenientVec<T> {
    fn default() -> Self {
        LenientVec(Vec::new())
    }
}

impl<'de, T> Deserialize<'de> for LenientVec<T>
where
    T: DeserializeOwned + Default,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .map(|v| serde_json::from_value(v).unwrap_or_default())
                .collect(),
            _ => Vec::new(),
        };
        Ok(LenientVec(items))
    }
}

/// Unit of measure: a `{abbreviation, name}` mapping or a bare string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawUnit {
    Text(String),
    Named {
        #[serde(default, deserialize_with = "lenient")]
        abbreviation: Option<String>,
        #[serde(default, deserialize_with = "lenient")]
        name: Option<String>,
    },
}

impl RawUnit {
    /// Abbreviation, then name, then the bare text; empty strings skipped
    pub fn label(&self) -> Option<&str> {
        fn non_empty(s: &Option<String>) -> Option<&str> {
            s.as_deref().filter(|s| !s.is_empty())
        }
        match self {
            RawUnit::Text(text) => Some(text.as_str()).filter(|s| !s.is_empty()),
            RawUnit::Named { abbreviation, name } => {
                non_empty(abbreviation).or_else(|| non_empty(name))
            }
        }
    }
}

/// `servingsPerPackage`: `{"value": n}` or a bare number
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawServings {
    Wrapped {
        #[serde(default)]
        value: LenientF64,
    },
    Bare(LenientF64),
}

impl Default for RawServings {
    fn default() -> Self {
        RawServings::Bare(LenientF64(0.0))
    }
}

impl RawServings {
    pub fn value(&self) -> f64 {
        match self {
            RawServings::Wrapped { value } | RawServings::Bare(value) => value.get(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawServingSize {
    pub quantity: LenientF64,
    #[serde(deserialize_with = "lenient")]
    pub unit_of_measure: Option<RawUnit>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawNutrient {
    #[serde(deserialize_with = "lenient")]
    pub display_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub code: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub description: Option<String>,
    pub quantity: LenientF64,
    pub percent_daily_intake: LenientF64,
    #[serde(deserialize_with = "lenient")]
    pub unit_of_measure: Option<RawUnit>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawNutritionInformation {
    #[serde(deserialize_with = "lenient")]
    pub servings_per_package: RawServings,
    #[serde(deserialize_with = "lenient")]
    pub serving_size: OneOrMany<RawServingSize>,
    pub nutrients: LenientVec<RawNutrient>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawPrice {
    pub regular: LenientF64,
    pub regular_per_unit_estimate: LenientF64,
    pub promo: LenientF64,
    pub promo_per_unit_estimate: LenientF64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawItem {
    #[serde(deserialize_with = "lenient")]
    pub size: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub price: RawPrice,
    #[serde(deserialize_with = "lenient")]
    pub national_price: RawPrice,
}

/// One product from a catalog search response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawProduct {
    #[serde(deserialize_with = "lenient")]
    pub product_id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub receipt_description: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub nutrition_information: OneOrMany<RawNutritionInformation>,
    pub items: LenientVec<RawItem>,
}

impl RawProduct {
    /// Parse any JSON value; non-objects give an empty product
    pub fn from_value(value: &Value) -> Self {
        RawProduct::deserialize(value).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lenient_f64() {
        let cases = [
            (json!(3.49), 3.49),
            (json!(7), 7.0),
            (json!("2.5"), 2.5),
            (json!("$3.99"), 3.99),
            (json!(" $ 1.25 "), 1.25),
            (json!("N/A"), 0.0),
            (json!(null), 0.0),
            (json!(true), 0.0),
            (json!({"value": 1}), 0.0),
        ];
        for (value, expected) in cases {
            assert_eq!(LenientF64::from_value(&value).get(), expected, "{}", value);
        }
    }

    #[test]
    fn test_one_or_many_first() {
        let one: OneOrMany<RawServingSize> =
            serde_json::from_value(json!({"quantity": 2})).unwrap();
        assert_eq!(one.first().unwrap().quantity.get(), 2.0);

        let many: OneOrMany<RawServingSize> =
            serde_json::from_value(json!([{"quantity": 3}, {"quantity": 4}])).unwrap();
        assert_eq!(many.first().unwrap().quantity.get(), 3.0);

        let empty: OneOrMany<RawServingSize> = serde_json::from_value(json!([])).unwrap();
        assert!(empty.first().is_none());
    }

    #[test]
    fn test_unit_label() {
        let unit: RawUnit =
            serde_json::from_value(json!({"abbreviation": "g", "name": "Grams"})).unwrap();
        assert_eq!(unit.label(), Some("g"));

        let unit: RawUnit =
            serde_json::from_value(json!({"abbreviation": "", "name": "Cup"})).unwrap();
        assert_eq!(unit.label(), Some("Cup"));

        let unit: RawUnit = serde_json::from_value(json!("tbsp")).unwrap();
        assert_eq!(unit.label(), Some("tbsp"));

        let unit: RawUnit = serde_json::from_value(json!({})).unwrap();
        assert_eq!(unit.label(), None);

        let unit: RawUnit =
            serde_json::from_value(json!({"abbreviation": "", "name": ""})).unwrap();
        assert_eq!(unit.label(), None);
        let unit: RawUnit = serde_json::from_value(json!("")).unwrap();
        assert_eq!(unit.label(), None);
    }

    #[test]
    fn test_servings_shapes() {
        let info: RawNutritionInformation =
            serde_json::from_value(json!({"servingsPerPackage": {"value": 8}})).unwrap();
        assert_eq!(info.servings_per_package.value(), 8.0);

        let info: RawNutritionInformation =
            serde_json::from_value(json!({"servingsPerPackage": "12"})).unwrap();
        assert_eq!(info.servings_per_package.value(), 12.0);

        let info: RawNutritionInformation =
            serde_json::from_value(json!({"servingsPerPackage": [1, 2]})).unwrap();
        assert_eq!(info.servings_per_package.value(), 0.0);
    }

    #[test]
    fn test_mistyped_fields_default() {
        let product = RawProduct::from_value(&json!({
            "productId": 12345,
            "description": ["not", "a", "string"],
            "nutritionInformation": "none",
            "items": [{"price": "cheap", "size": "18 oz"}, 42]
        }));
        assert_eq!(product.product_id, None);
        assert_eq!(product.description, None);
        assert!(product.nutrition_information.first().is_none());
        assert_eq!(product.items.0.len(), 2);
        assert_eq!(product.items.0[0].size.as_deref(), Some("18 oz"));
        assert_eq!(product.items.0[0].price, RawPrice::default());
        assert_eq!(product.items.0[1], RawItem::default());
    }

    #[test]
    fn test_non_object_product() {
        assert_eq!(RawProduct::from_value(&json!("banana")), RawProduct::default());
        assert_eq!(RawProduct::from_value(&json!(null)), RawProduct::default());
    }
}
