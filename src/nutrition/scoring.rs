//! Nutrient scoring
//!
//! Each nutrient in the reference table earns between -5 and +5 points
//! depending on how far its value sits from the RDI..UL band. The sum maps to
//! a letter grade.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{Ingredient, Nutrients};
use super::reference::ReferenceTable;

/// Largest magnitude a single nutrient can contribute
pub const MAX_NUTRIENT_SCORE: i32 = 5;

/// Letter grade from A+ (best) to E
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    E,
}

impl Grade {
    pub fn from_score(total_score: i32) -> Self {
        match total_score {
            s if s >= 200 => Grade::APlus,
            s if s >= 150 => Grade::A,
            s if s >= 100 => Grade::B,
            s if s >= 50 => Grade::C,
            s if s >= 0 => Grade::D,
            _ => Grade::E,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
        }
    }

    /// Parse a stored grade string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "A+" => Some(Grade::APlus),
            "A" => Some(Grade::A),
            "B" => Some(Grade::B),
            "C" => Some(Grade::C),
            "D" => Some(Grade::D),
            "E" => Some(Grade::E),
            _ => None,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observed value and awarded points for one nutrient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientScore {
    pub value: f64,
    pub score: i32,
}

/// Result of scoring an ingredient or a recipe portion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub total_score: i32,
    pub grade: Grade,
    pub details: BTreeMap<String, NutrientScore>,
}

/// Points for one nutrient value against its RDI and UL.
///
/// Thresholds are compared in multiplied form so a value computed as
/// `rdi * 0.8` or `ul + ul * 0.10` lands in that band rather than just
/// short of it. NaN falls through every comparison and scores the minimum.
pub fn score_nutrient(value: f64, rdi: f64, ul: f64) -> i32 {
    if value < 0.0 {
        return -MAX_NUTRIENT_SCORE;
    }
    if rdi <= value && value <= ul {
        return MAX_NUTRIENT_SCORE;
    }

    if value < rdi {
        if value >= rdi * 0.8 {
            0
        } else if value >= rdi * 0.6 {
            -1
        } else if value >= rdi * 0.4 {
            -2
        } else if value >= rdi * 0.2 {
            -3
        } else {
            -5
        }
    } else if value > ul {
        if value < ul + ul * 0.10 {
            0
        } else if value < ul + ul * 0.25 {
            -1
        } else if value < ul + ul * 0.50 {
            -3
        } else {
            -5
        }
    } else {
        -MAX_NUTRIENT_SCORE
    }
}

/// Score nutrients against a reference table.
///
/// The table drives iteration: a table key with no matching nutrient field
/// scores a value of 0.0, and nutrients absent from the table are ignored.
pub fn score_nutrients_with(table: &ReferenceTable, nutrients: &Nutrients) -> ScoreBreakdown {
    let mut total_score = 0;
    let mut details = BTreeMap::new();

    for (key, range) in table.iter() {
        let value = nutrients.get(key).unwrap_or(0.0);
        let score = score_nutrient(value, range.rdi, range.ul);
        total_score += score;
        details.insert(key.to_string(), NutrientScore { value, score });
    }

    ScoreBreakdown {
        total_score,
        grade: Grade::from_score(total_score),
        details,
    }
}

/// Score nutrients against the standard table
pub fn score_nutrients(nutrients: &Nutrients) -> ScoreBreakdown {
    score_nutrients_with(ReferenceTable::standard(), nutrients)
}

/// Score an ingredient against the standard table
pub fn score_ingredient(ingredient: &Ingredient) -> ScoreBreakdown {
    score_nutrients(&ingredient.nutrients)
}
