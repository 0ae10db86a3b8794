//! Recipe name search
//!
//! Substring search, similarity-ranked fuzzy search, and a "smart" search
//! that prefers exact substring hits and falls back to fuzzy ranking.

use serde::{Deserialize, Serialize};

/// Default cut-off for fuzzy matches; scores must be strictly above it
pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// Built-in recipe names offered when the database has none of its own
pub const RECIPE_CATALOG: &[&str] = &[
    "Grilled Chicken Salad",
    "Spaghetti with Tomato Sauce",
    "Avocado Toast",
    "Chicken Stir Fry",
    "Vegan Buddha Bowl",
    "Beef Tacos",
    "Protein Pancakes",
    "Peanut Butter Smoothie",
    "Tuna Sandwich",
    "Egg Fried Rice",
    "Turkey Meatballs",
    "Lentil Soup",
    "Greek Yogurt Parfait",
    "Salmon with Quinoa",
    "Shrimp Alfredo Pasta",
    "Vegetable Curry",
    "Beef Burrito Bowl",
    "Tofu Scramble",
    "Oatmeal with Berries",
    "Caesar Salad Wrap",
    "Mushroom Risotto",
    "BBQ Pulled Pork Sandwich",
    "Spinach and Feta Omelette",
    "Vegan Chili",
    "Teriyaki Chicken Bowl",
    "Crispy Fish Tacos",
    "Pesto Pasta Salad",
    "Banana Protein Shake",
    "Quinoa and Black Bean Salad",
    "Eggplant Parmesan",
    "Sausage Breakfast Burrito",
    "Chicken Quesadilla",
    "Sweet Potato Fries",
    "Turkey Club Sandwich",
    "Vegetarian Lasagna",
    "Baked Salmon with Asparagus",
    "Coconut Rice and Beans",
    "Pancakes with Maple Syrup",
    "Shrimp Fried Rice",
    "Beef and Broccoli Stir Fry",
    "Avocado Chicken Wrap",
    "Berry Smoothie Bowl",
    "Vegan Mac and Cheese",
    "Taco Salad",
    "Buffalo Chicken Wings",
    "Mango Chicken Curry",
    "Steak and Potatoes",
    "Zucchini Noodle Pasta",
    "Tomato Basil Soup",
    "Ham and Cheese Omelette",
    "BBQ Chicken Pizza",
    "Cauliflower Rice Bowl",
    "Chicken Fajita Bowl",
    "Honey Garlic Shrimp",
    "Veggie Burger",
    "Bacon and Eggs",
    "Chickpea Salad",
    "Beef Stroganoff",
    "Vegan Lentil Curry",
    "Pulled BBQ Jackfruit Sandwich",
    "Cobb Salad",
    "Stuffed Bell Peppers",
    "Chicken Caesar Pasta",
    "Spicy Ramen Bowl",
    "Falafel Wrap",
    "Vegan Burrito Bowl",
    "Egg Salad Sandwich",
    "Garlic Butter Shrimp",
    "Kale and Quinoa Salad",
    "Beef Chili",
    "Teriyaki Tofu Bowl",
    "Grilled Cheese Sandwich",
    "Broccoli Cheddar Soup",
    "Chicken and Waffles",
    "Chocolate Protein Shake",
    "Vegetable Stir Fry",
    "Pork Fried Rice",
    "Chicken Noodle Soup",
    "Tofu Pad Thai",
    "Spicy Tuna Roll",
    "Vegan Pancakes",
    "Beef Fajitas",
    "Garlic Parmesan Wings",
    "Shrimp Tacos",
    "Chicken Alfredo",
    "Stuffed Zucchini Boats",
    "Salmon Sushi Bowl",
    "Breakfast Burrito",
    "Mushroom Stroganoff",
    "Cajun Chicken Pasta",
    "Vegetable Fried Rice",
    "Greek Chicken Bowl",
    "Vegan Tofu Curry",
    "Caprese Salad",
    "Banana Oat Muffins",
    "BBQ Ribs",
    "Pesto Chicken Sandwich",
    "Turkey Chili",
    "Vegan Power Bowl",
    "Lemon Garlic Salmon",
    "Veggie Stir Fry Noodles",
    "Honey Mustard Chicken",
    "Roasted Vegetable Wrap",
];

/// How two strings are compared in fuzzy search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Ratcliff/Obershelp matching-block ratio
    #[default]
    Gestalt,
    /// 1 - edit distance / longer length
    Levenshtein,
}

impl SimilarityMetric {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "gestalt" => Some(SimilarityMetric::Gestalt),
            "levenshtein" => Some(SimilarityMetric::Levenshtein),
            _ => None,
        }
    }

    pub fn score(&self, a: &str, b: &str) -> f64 {
        match self {
            SimilarityMetric::Gestalt => similarity(a, b),
            SimilarityMetric::Levenshtein => strsim::normalized_levenshtein(a, b),
        }
    }
}

/// A fuzzy match and its rounded score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMatch {
    pub name: String,
    pub score: f64,
}

/// Longest common block within `a[alo..ahi]` and `b[blo..bhi]`.
/// Ties go to the block starting earliest in `a`, then in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    (alo, ahi): (usize, usize),
    (blo, bhi): (usize, usize),
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
    let width = bhi - blo;
    let mut prev = vec![0usize; width];
    let mut row = vec![0usize; width];

    for i in alo..ahi {
        for j in blo..bhi {
            let col = j - blo;
            row[col] = if a[i] == b[j] {
                let k = if col > 0 { prev[col - 1] + 1 } else { 1 };
                if k > best_k {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_k = k;
                }
                k
            } else {
                0
            };
        }
        std::mem::swap(&mut prev, &mut row);
    }

    (best_i, best_j, best_k)
}

/// Total size of the matching blocks between `a` and `b`
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut total = 0;
    let mut pending = vec![((0, a.len()), (0, b.len()))];

    while let Some(((alo, ahi), (blo, bhi))) = pending.pop() {
        let (i, j, k) = longest_match(a, b, (alo, ahi), (blo, bhi));
        if k == 0 {
            continue;
        }
        total += k;
        if alo < i && blo < j {
            pending.push(((alo, i), (blo, j)));
        }
        if i + k < ahi && j + k < bhi {
            pending.push(((i + k, ahi), (j + k, bhi)));
        }
    }

    total
}

/// Ratcliff/Obershelp similarity in `0.0..=1.0`: twice the matched characters
/// over the combined length. Two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Case-insensitive substring matches, in input order
pub fn simple_search<S: AsRef<str>>(query: &str, names: &[S]) -> Vec<String> {
    let query = query.to_lowercase();
    names
        .iter()
        .map(|name| name.as_ref())
        .filter(|name| name.to_lowercase().contains(&query))
        .map(str::to_string)
        .collect()
}

/// Names scoring above `threshold` with `metric`, best first; equal scores
/// keep input order
pub fn fuzzy_search_with<S: AsRef<str>>(
    query: &str,
    names: &[S],
    threshold: f64,
    metric: SimilarityMetric,
) -> Vec<ScoredMatch> {
    let query = query.to_lowercase();
    let mut matches: Vec<ScoredMatch> = names
        .iter()
        .map(|name| name.as_ref())
        .filter_map(|name| {
            let raw = metric.score(&query, &name.to_lowercase());
            (raw > threshold).then(|| ScoredMatch {
                name: name.to_string(),
                score: round2(raw),
            })
        })
        .collect();

    // sort_by is stable
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches
}

/// Gestalt fuzzy search at the default threshold
pub fn fuzzy_search<S: AsRef<str>>(query: &str, names: &[S]) -> Vec<ScoredMatch> {
    fuzzy_search_with(query, names, DEFAULT_THRESHOLD, SimilarityMetric::Gestalt)
}

/// Substring matches when there are any, otherwise fuzzy match names
pub fn smart_search<S: AsRef<str>>(query: &str, names: &[S]) -> Vec<String> {
    smart_search_with(query, names, SimilarityMetric::Gestalt)
}

pub fn smart_search_with<S: AsRef<str>>(
    query: &str,
    names: &[S],
    metric: SimilarityMetric,
) -> Vec<String> {
    let exact = simple_search(query, names);
    if !exact.is_empty() {
        return exact;
    }
    tracing::debug!(query, "no substring match, falling back to fuzzy search");
    fuzzy_search_with(query, names, DEFAULT_THRESHOLD, metric)
        .into_iter()
        .map(|m| m.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_known_values() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", ""), 0.0);
        assert_eq!(similarity("abcd", "bcda"), 0.75);
        assert!((similarity("kitten", "sitting") - 8.0 / 13.0).abs() < 1e-12);
        assert!((similarity("tofu scramble", "tofu scrambel") - 12.0 / 13.0).abs() < 1e-12);
    }

    #[test]
    fn test_catalog_size() {
        assert_eq!(RECIPE_CATALOG.len(), 103);
    }

    #[test]
    fn test_simple_search_case_insensitive_in_order() {
        let results = simple_search("CHICKEN", RECIPE_CATALOG);
        assert_eq!(
            &results[..4],
            &[
                "Grilled Chicken Salad",
                "Chicken Stir Fry",
                "Teriyaki Chicken Bowl",
                "Chicken Quesadilla"
            ]
        );
        assert!(simple_search("sushi pizza", RECIPE_CATALOG).is_empty());
    }

    #[test]
    fn test_fuzzy_search_default_threshold() {
        let results = fuzzy_search("avocado tost", RECIPE_CATALOG);
        assert_eq!(
            results,
            vec![ScoredMatch {
                name: "Avocado Toast".into(),
                score: 0.96
            }]
        );
    }

    #[test]
    fn test_fuzzy_search_typo_below_default_threshold() {
        // Best gestalt score for this typo is 0.57
        assert!(fuzzy_search("chiken", RECIPE_CATALOG).is_empty());

        let results =
            fuzzy_search_with("chiken", RECIPE_CATALOG, 0.5, SimilarityMetric::Gestalt);
        let names: Vec<&str> = results.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Chicken Alfredo", "Chicken Stir Fry", "BBQ Chicken Pizza"]
        );
        assert_eq!(results[0].score, 0.57);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_fuzzy_ties_keep_input_order() {
        let names = ["abcx", "abcy", "abcz"];
        let results = fuzzy_search("abc", &names);
        let ordered: Vec<&str> = results.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(ordered, vec!["abcx", "abcy", "abcz"]);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        // "abc" vs "abcdef" scores exactly 2/3
        let names = ["abcdef"];
        assert!(fuzzy_search_with("abc", &names, 2.0 / 3.0, SimilarityMetric::Gestalt).is_empty());
        assert_eq!(
            fuzzy_search_with("abc", &names, 0.66, SimilarityMetric::Gestalt).len(),
            1
        );
    }

    #[test]
    fn test_smart_search() {
        assert_eq!(
            smart_search("soup", RECIPE_CATALOG),
            vec![
                "Lentil Soup",
                "Tomato Basil Soup",
                "Broccoli Cheddar Soup",
                "Chicken Noodle Soup"
            ]
        );
        assert_eq!(smart_search("lentl soup", RECIPE_CATALOG), vec!["Lentil Soup"]);
        assert!(smart_search("zzzz", RECIPE_CATALOG).is_empty());
    }

    #[test]
    fn test_levenshtein_metric() {
        assert!((SimilarityMetric::Levenshtein.score("kitten", "sitting") - 4.0 / 7.0).abs() < 1e-12);
        let results =
            fuzzy_search_with("tofu scramble", RECIPE_CATALOG, 0.6, SimilarityMetric::Levenshtein);
        assert_eq!(results[0].name, "Tofu Scramble");
        assert_eq!(results[0].score, 1.0);

        assert_eq!(SimilarityMetric::parse("Levenshtein"), Some(SimilarityMetric::Levenshtein));
        assert_eq!(SimilarityMetric::parse("jaro"), None);
    }
}
