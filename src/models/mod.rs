//! Data models
//!
//! Nutrient values, ingredients and recipes, plus their database persistence.

pub mod ingredient;
pub mod nutrients;
pub mod reading;
pub mod recipe;
pub mod recipe_ingredient;
pub mod recipe_summary;

pub use ingredient::{Ingredient, InsertOutcome, Pricing, StoredIngredient, UNKNOWN_SERVING_UNIT};
pub use nutrients::{NutrientField, Nutrients, NUTRIENT_FIELDS};
pub use reading::{find_nutrient, NutrientReading};
pub use recipe::{Recipe, RecipeCreate, RecipeDetail};
pub use recipe_ingredient::{
    calculate_recipe_summary, recalculate_recipe_costing, RecipeIngredient,
    RecipeIngredientCreate, RecipeIngredientDetail,
};
pub use recipe_summary::{summarize_recipe, summarize_recipe_with, RecipeItem, RecipeSummary};
