//! Filter and sort stages of recipe search.
//!
//! # Invariants
//! - Filters run in a fixed order: text, difficulty, dish types, cook time.
//! - Sorting is stable, so equal keys keep their input order.

use crate::model::recipe::{Difficulty, Recipe};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Cook-time ceiling applied when the user has not moved the slider.
pub const DEFAULT_MAX_COOK_TIME_MINUTES: u32 = 60;

/// Ordering applied to search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOption {
    #[default]
    Title,
    Difficulty,
    CookTime,
    Recent,
    Servings,
}

impl SortOption {
    pub const ALL: [SortOption; 5] = [
        Self::Title,
        Self::Difficulty,
        Self::CookTime,
        Self::Recent,
        Self::Servings,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Difficulty => "difficulty",
            Self::CookTime => "cook_time",
            Self::Recent => "recent",
            Self::Servings => "servings",
        }
    }

    fn sort(self, recipes: &mut [Recipe]) {
        match self {
            Self::Title => recipes.sort_by_cached_key(|recipe| recipe.title.to_lowercase()),
            Self::Difficulty => {
                recipes.sort_by_key(|recipe| recipe.difficulty.unwrap_or(Difficulty::Easy))
            }
            Self::CookTime => recipes.sort_by_key(Recipe::total_cook_minutes),
            Self::Recent => recipes.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            Self::Servings => recipes.sort_by_key(|recipe| recipe.servings),
        }
    }
}

impl Display for SortOption {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortOption {
    type Err = ParseSortOptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|option| option.label() == normalized)
            .ok_or_else(|| ParseSortOptionError(value.trim().to_string()))
    }
}

/// Unknown sort option label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSortOptionError(pub String);

impl Display for ParseSortOptionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown sort option `{}`; expected title|difficulty|cook_time|recent|servings",
            self.0
        )
    }
}

impl Error for ParseSortOptionError {}

/// User-selected search criteria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub query: String,
    pub difficulty: Option<Difficulty>,
    pub dish_types: BTreeSet<String>,
    pub max_cook_time_minutes: u32,
    pub sort_by: SortOption,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            query: String::new(),
            difficulty: None,
            dish_types: BTreeSet::new(),
            max_cook_time_minutes: DEFAULT_MAX_COOK_TIME_MINUTES,
            sort_by: SortOption::Title,
        }
    }
}

impl SearchFilters {
    /// Whether any criterion other than the query deviates from defaults.
    pub fn has_active_filters(&self) -> bool {
        self.difficulty.is_some()
            || !self.dish_types.is_empty()
            || self.max_cook_time_minutes != DEFAULT_MAX_COOK_TIME_MINUTES
            || self.sort_by != SortOption::Title
    }

    fn matches(&self, recipe: &Recipe, needle: Option<&str>) -> bool {
        if let Some(needle) = needle {
            let text_hit = recipe.title.to_lowercase().contains(needle)
                || recipe.description.to_lowercase().contains(needle)
                || recipe
                    .ingredients
                    .iter()
                    .any(|ingredient| ingredient.name.to_lowercase().contains(needle));
            if !text_hit {
                return false;
            }
        }

        if let Some(wanted) = self.difficulty {
            if recipe.difficulty != Some(wanted) {
                return false;
            }
        }

        if !self.dish_types.is_empty() && recipe.dish_types.is_disjoint(&self.dish_types) {
            return false;
        }

        recipe.total_cook_minutes() <= self.max_cook_time_minutes
    }
}

/// Runs the filter stages and the selected sort over `recipes`.
pub fn apply_filters(recipes: &[Recipe], filters: &SearchFilters) -> Vec<Recipe> {
    let trimmed = filters.query.trim();
    let needle = (!trimmed.is_empty()).then(|| trimmed.to_lowercase());

    let mut matched = recipes
        .iter()
        .filter(|recipe| filters.matches(recipe, needle.as_deref()))
        .cloned()
        .collect::<Vec<_>>();
    filters.sort_by.sort(&mut matched);
    matched
}
