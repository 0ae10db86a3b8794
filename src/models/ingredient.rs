//! Ingredient model
//!
//! The canonical per-product entity produced by the normalizer, plus its
//! database persistence.

use rusqlite::{params, Connection, Row, ToSql};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::nutrition::reference::ReferenceTable;
use super::nutrients::{Nutrients, NUTRIENT_FIELDS};
use super::reading::NutrientReading;

/// Serving size unit used when the catalog does not provide one
pub const UNKNOWN_SERVING_UNIT: &str = "Unknown serving size unit";

/// Price block for one market (local store or national average)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pricing {
    pub regular: f64,
    pub regular_per_unit_estimate: f64,
    pub promo: f64,
    pub promo_per_unit_estimate: f64,
}

impl Pricing {
    /// Promo price when one is running, otherwise the regular price
    pub fn effective(&self) -> f64 {
        if self.promo > 0.0 {
            self.promo
        } else {
            self.regular
        }
    }
}

/// A catalog product or custom food with pricing and nutrients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ingredient {
    pub product_id: String,
    pub name: String,
    pub serving_size: f64,
    pub serving_size_unit: String,
    pub servings_per_container: f64,
    pub package_size: String,
    pub local_price: Pricing,
    pub national_price: Pricing,
    pub nutrients: Nutrients,
}

impl Default for Ingredient {
    fn default() -> Self {
        Self {
            product_id: String::new(),
            name: String::new(),
            serving_size: 0.0,
            serving_size_unit: UNKNOWN_SERVING_UNIT.to_string(),
            servings_per_container: 0.0,
            package_size: String::new(),
            local_price: Pricing::default(),
            national_price: Pricing::default(),
            nutrients: Nutrients::default(),
        }
    }
}

impl Ingredient {
    /// Label-style view of the nutrients: one reading per non-zero field.
    ///
    /// Percent daily intake is derived from the standard reference table.
    /// Normalization keeps quantities only, so a catalog label's own
    /// percentage is not reproduced here; read it with
    /// [`raw_readings`](crate::nutrition::normalizer::raw_readings).
    pub fn readings(&self) -> Vec<NutrientReading> {
        self.readings_with(ReferenceTable::standard())
    }

    /// Readings view against a caller-supplied reference table.
    ///
    /// `percent_daily_intake` is `quantity / rdi * 100`, or 0 when the
    /// table has no positive RDI for the field.
    pub fn readings_with(&self, table: &ReferenceTable) -> Vec<NutrientReading> {
        NUTRIENT_FIELDS
            .iter()
            .filter_map(|field| {
                let quantity = self.nutrients.get(field.key)?;
                if quantity == 0.0 {
                    return None;
                }
                let percent_daily_intake = match table.get(field.key) {
                    Some(range) if range.rdi > 0.0 => quantity / range.rdi * 100.0,
                    _ => 0.0,
                };
                Some(NutrientReading {
                    display_name: field.label().to_string(),
                    code: field.key.to_string(),
                    description: String::new(),
                    quantity,
                    percent_daily_intake,
                    unit_of_measure: field.unit.to_string(),
                })
            })
            .collect()
    }

    /// Human serving label such as "2 tbsp"; falls back to the package size
    pub fn serving_label(&self) -> String {
        if self.serving_size > 0.0 {
            let quantity = if self.serving_size.fract() == 0.0 {
                format!("{}", self.serving_size as i64)
            } else {
                format!("{}", self.serving_size)
            };
            let unit = if self.serving_size_unit == UNKNOWN_SERVING_UNIT {
                ""
            } else {
                self.serving_size_unit.as_str()
            };
            return format!("{} {}", quantity, unit).trim().to_string();
        }
        self.package_size.trim().to_string()
    }

    /// Price of one serving.
    ///
    /// Uses the local price, falling back to the national one when the store
    /// has no price, and divides by servings per container when known.
    pub fn price_per_serving(&self) -> f64 {
        let local = self.local_price.effective();
        let price = if local > 0.0 {
            local
        } else {
            self.national_price.effective()
        };
        if self.servings_per_container > 0.0 {
            price / self.servings_per_container
        } else {
            price
        }
    }
}

/// An ingredient persisted in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredIngredient {
    pub id: i64,
    #[serde(flatten)]
    pub ingredient: Ingredient,
    pub created_at: String,
    pub updated_at: String,
}

/// Result of inserting an ingredient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Created(i64),
    /// An ingredient with the same name (ignoring case) already existed
    Existing(i64),
}

impl InsertOutcome {
    pub fn id(&self) -> i64 {
        match self {
            InsertOutcome::Created(id) | InsertOutcome::Existing(id) => *id,
        }
    }
}

const PRICING_COLUMNS: [&str; 8] = [
    "local_regular",
    "local_regular_per_unit_estimate",
    "local_promo",
    "local_promo_per_unit_estimate",
    "national_regular",
    "national_regular_per_unit_estimate",
    "national_promo",
    "national_promo_per_unit_estimate",
];

fn pricing_values(ingredient: &Ingredient) -> [f64; 8] {
    let l = &ingredient.local_price;
    let n = &ingredient.national_price;
    [
        l.regular,
        l.regular_per_unit_estimate,
        l.promo,
        l.promo_per_unit_estimate,
        n.regular,
        n.regular_per_unit_estimate,
        n.promo,
        n.promo_per_unit_estimate,
    ]
}

fn pricing_from_row(row: &Row, prefix: &str) -> rusqlite::Result<Pricing> {
    Ok(Pricing {
        regular: row.get(format!("{}_regular", prefix).as_str())?,
        regular_per_unit_estimate: row
            .get(format!("{}_regular_per_unit_estimate", prefix).as_str())?,
        promo: row.get(format!("{}_promo", prefix).as_str())?,
        promo_per_unit_estimate: row
            .get(format!("{}_promo_per_unit_estimate", prefix).as_str())?,
    })
}

impl StoredIngredient {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let mut nutrients = Nutrients::zero();
        for field in NUTRIENT_FIELDS {
            if let Some(slot) = nutrients.get_mut(field.key) {
                *slot = row.get(field.key)?;
            }
        }

        Ok(Self {
            id: row.get("id")?,
            ingredient: Ingredient {
                product_id: row.get("product_id")?,
                name: row.get("name")?,
                serving_size: row.get("serving_size")?,
                serving_size_unit: row.get("serving_size_unit")?,
                servings_per_container: row.get("servings_per_container")?,
                package_size: row.get("package_size")?,
                local_price: pricing_from_row(row, "local")?,
                national_price: pricing_from_row(row, "national")?,
                nutrients,
            },
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Find an ingredient ID by name, ignoring case
    pub fn find_id_by_name(conn: &Connection, name: &str) -> DbResult<Option<i64>> {
        let result = conn.query_row(
            "SELECT id FROM ingredients WHERE LOWER(name) = LOWER(?1) ORDER BY id LIMIT 1",
            [name],
            |row| row.get(0),
        );
        match result {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert an ingredient unless one with the same name already exists
    pub fn insert(conn: &Connection, ingredient: &Ingredient) -> DbResult<InsertOutcome> {
        if let Some(existing) = Self::find_id_by_name(conn, &ingredient.name)? {
            tracing::warn!(
                name = %ingredient.name,
                id = existing,
                "ingredient already exists, reusing"
            );
            return Ok(InsertOutcome::Existing(existing));
        }

        let mut columns: Vec<&str> = vec![
            "product_id",
            "name",
            "serving_size",
            "serving_size_unit",
            "servings_per_container",
            "package_size",
        ];
        let mut values: Vec<Box<dyn ToSql>> = vec![
            Box::new(ingredient.product_id.clone()),
            Box::new(ingredient.name.clone()),
            Box::new(ingredient.serving_size),
            Box::new(ingredient.serving_size_unit.clone()),
            Box::new(ingredient.servings_per_container),
            Box::new(ingredient.package_size.clone()),
        ];

        columns.extend(PRICING_COLUMNS);
        for price in pricing_values(ingredient) {
            values.push(Box::new(price));
        }

        for (field, value) in ingredient.nutrients.iter() {
            columns.push(field.key);
            values.push(Box::new(value));
        }

        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO ingredients ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );

        let params_refs: Vec<&dyn ToSql> = values.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        let id = conn.last_insert_rowid();
        tracing::info!(name = %ingredient.name, id, "inserted ingredient");
        Ok(InsertOutcome::Created(id))
    }

    /// Get an ingredient by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM ingredients WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get an ingredient by ID, failing when it does not exist
    pub fn require(conn: &Connection, id: i64) -> DbResult<Self> {
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound {
            entity: "ingredient",
            id,
        })
    }

    /// Search ingredients by name
    pub fn search(conn: &Connection, query: &str, limit: i64) -> DbResult<Vec<Self>> {
        let search_pattern = format!("%{}%", query);
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM ingredients
            WHERE name LIKE ?1
            ORDER BY name ASC
            LIMIT ?2
            "#,
        )?;

        let items = stmt
            .query_map(params![search_pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// List ingredients by name with pagination
    pub fn list(conn: &Connection, limit: i64, offset: i64) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM ingredients ORDER BY name ASC LIMIT ?1 OFFSET ?2")?;

        let items = stmt
            .query_map(params![limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// Count stored ingredients
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM ingredients", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Number of recipes using this ingredient
    pub fn get_recipe_usage_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM recipe_ingredients WHERE ingredient_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete an ingredient.
    /// Returns Ok(false) if not found; fails if a recipe still uses it.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        if Self::get_by_id(conn, id)?.is_none() {
            return Ok(false);
        }

        let rows = conn.execute("DELETE FROM ingredients WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
