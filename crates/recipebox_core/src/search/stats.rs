//! Recipe list statistics shown next to search results.

use crate::model::recipe::Recipe;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Distribution bucket for recipes without a difficulty.
pub const UNKNOWN_DIFFICULTY_LABEL: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeStats {
    pub total_recipes: usize,
    /// Integer mean of total cook minutes, `0` for an empty list.
    pub average_cook_time_minutes: u32,
    pub difficulty_distribution: BTreeMap<String, usize>,
    pub dish_type_distribution: BTreeMap<String, usize>,
}

pub fn compute_stats(recipes: &[Recipe]) -> RecipeStats {
    if recipes.is_empty() {
        return RecipeStats::default();
    }

    let total_minutes = recipes
        .iter()
        .map(|recipe| u64::from(recipe.total_cook_minutes()))
        .sum::<u64>();
    let average = total_minutes / recipes.len() as u64;

    let mut difficulty_distribution = BTreeMap::new();
    let mut dish_type_distribution = BTreeMap::new();
    for recipe in recipes {
        let label = recipe
            .difficulty
            .map_or(UNKNOWN_DIFFICULTY_LABEL, |difficulty| difficulty.label());
        *difficulty_distribution
            .entry(label.to_string())
            .or_insert(0) += 1;

        for dish_type in &recipe.dish_types {
            *dish_type_distribution.entry(dish_type.clone()).or_insert(0) += 1;
        }
    }

    RecipeStats {
        total_recipes: recipes.len(),
        average_cook_time_minutes: u32::try_from(average).unwrap_or(u32::MAX),
        difficulty_distribution,
        dish_type_distribution,
    }
}
