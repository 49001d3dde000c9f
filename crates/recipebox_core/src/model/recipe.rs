//! Recipe domain model.
//!
//! # Responsibility
//! - Define the canonical recipe record with ordered ingredients and steps.
//! - Own recipe-level validation shared by repository and service layers.
//!
//! # Invariants
//! - `id == 0` means "not persisted yet"; storage assigns the real id.
//! - `servings >= 1` and `cook_time.minutes <= 59`.
//! - A persisted recipe has a non-blank title and description and at least
//!   one non-blank ingredient and step.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static HASHTAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([\p{L}\p{N}_]+)").expect("valid hashtag regex"));

/// Storage-assigned recipe identifier.
pub type RecipeId = i64;

/// Perceived effort needed to cook a recipe.
///
/// Ordering follows effort, which is also the sort order used by search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Professional,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Easy, Self::Medium, Self::Professional];

    /// Display and storage label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Professional => "Professional",
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Difficulty {
    type Err = RecipeValidationError;

    /// Parses a label case-insensitively.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|difficulty| difficulty.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| RecipeValidationError::UnknownDifficulty(trimmed.to_string()))
    }
}

/// Cook time split the way the entry form collects it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookTime {
    pub hours: u32,
    pub minutes: u32,
}

impl CookTime {
    pub fn new(hours: u32, minutes: u32) -> Self {
        Self { hours, minutes }
    }

    pub fn total_minutes(&self) -> u32 {
        self.hours.saturating_mul(60).saturating_add(self.minutes)
    }
}

/// One ingredient line of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Storage id, `0` until persisted.
    pub id: i64,
    pub name: String,
    /// Zero-based display position inside the recipe.
    pub position: u32,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, position: u32) -> Self {
        Self {
            id: 0,
            name: name.into(),
            position,
        }
    }
}

/// One preparation step of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Storage id, `0` until persisted.
    pub id: i64,
    pub description: String,
    /// Zero-based display position inside the recipe.
    pub position: u32,
}

impl Step {
    pub fn new(description: impl Into<String>, position: u32) -> Self {
        Self {
            id: 0,
            description: description.into(),
            position,
        }
    }
}

/// Canonical user-authored recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub title: String,
    pub description: String,
    /// Free text as typed by the user, e.g. `"#quick #vegan"`.
    pub hashtags: String,
    pub servings: u32,
    pub cook_time: CookTime,
    pub difficulty: Option<Difficulty>,
    pub dish_types: BTreeSet<String>,
    pub diet_types: BTreeSet<String>,
    /// Opaque reference to an image owned by the platform layer.
    pub image_uri: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<Step>,
    /// Epoch milliseconds, assigned by storage.
    pub created_at: i64,
    /// Epoch milliseconds, bumped by storage on every update.
    pub updated_at: i64,
}

impl Recipe {
    /// Creates an unsaved recipe with defaults for every optional field.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            description: description.into(),
            hashtags: String::new(),
            servings: 1,
            cook_time: CookTime::default(),
            difficulty: None,
            dish_types: BTreeSet::new(),
            diet_types: BTreeSet::new(),
            image_uri: None,
            ingredients: Vec::new(),
            steps: Vec::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }

    /// Total cook time in minutes.
    pub fn total_cook_minutes(&self) -> u32 {
        self.cook_time.total_minutes()
    }

    /// Extracts `#tag` tokens from `hashtags`, lowercased and deduplicated.
    pub fn hashtag_list(&self) -> Vec<String> {
        let unique = HASHTAG_RE
            .captures_iter(&self.hashtags)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_lowercase())
            .collect::<BTreeSet<_>>();
        unique.into_iter().collect()
    }

    /// Checks recipe-level invariants before persistence.
    ///
    /// # Errors
    /// - Returns the first violated rule in field order.
    pub fn validate(&self) -> Result<(), RecipeValidationError> {
        if self.title.trim().is_empty() {
            return Err(RecipeValidationError::BlankTitle);
        }
        if self.description.trim().is_empty() {
            return Err(RecipeValidationError::BlankDescription);
        }
        if self.servings == 0 {
            return Err(RecipeValidationError::ZeroServings);
        }
        if self.cook_time.minutes > 59 {
            return Err(RecipeValidationError::MinutesOutOfRange(
                self.cook_time.minutes,
            ));
        }
        if !self
            .ingredients
            .iter()
            .any(|ingredient| !ingredient.name.trim().is_empty())
        {
            return Err(RecipeValidationError::MissingIngredients);
        }
        if !self.steps.iter().any(|step| !step.description.trim().is_empty()) {
            return Err(RecipeValidationError::MissingSteps);
        }
        Ok(())
    }
}

/// Recipe invariant violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeValidationError {
    BlankTitle,
    BlankDescription,
    ZeroServings,
    MinutesOutOfRange(u32),
    MissingIngredients,
    MissingSteps,
    UnknownDifficulty(String),
}

impl Display for RecipeValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "recipe title must not be blank"),
            Self::BlankDescription => write!(f, "recipe description must not be blank"),
            Self::ZeroServings => write!(f, "recipe servings must be at least 1"),
            Self::MinutesOutOfRange(value) => {
                write!(f, "cook time minutes must be within 0..=59, got {value}")
            }
            Self::MissingIngredients => write!(f, "recipe needs at least one ingredient"),
            Self::MissingSteps => write!(f, "recipe needs at least one step"),
            Self::UnknownDifficulty(value) => write!(
                f,
                "unknown difficulty `{value}`; expected Easy|Medium|Professional"
            ),
        }
    }
}

impl Error for RecipeValidationError {}

#[cfg(test)]
mod tests {
    use super::{CookTime, Difficulty, Ingredient, Recipe, RecipeValidationError, Step};

    fn complete_recipe() -> Recipe {
        let mut recipe = Recipe::new("Pancakes", "Fluffy breakfast pancakes");
        recipe.ingredients.push(Ingredient::new("flour", 0));
        recipe.steps.push(Step::new("mix everything", 0));
        recipe
    }

    #[test]
    fn complete_recipe_passes_validation() {
        assert_eq!(complete_recipe().validate(), Ok(()));
    }

    #[test]
    fn validation_reports_first_violation_in_field_order() {
        let mut recipe = complete_recipe();
        recipe.title = "  ".to_string();
        recipe.description = String::new();
        assert_eq!(recipe.validate(), Err(RecipeValidationError::BlankTitle));
    }

    #[test]
    fn blank_ingredient_lines_do_not_count() {
        let mut recipe = complete_recipe();
        recipe.ingredients = vec![Ingredient::new("   ", 0)];
        assert_eq!(
            recipe.validate(),
            Err(RecipeValidationError::MissingIngredients)
        );
    }

    #[test]
    fn minutes_above_59_are_rejected() {
        let mut recipe = complete_recipe();
        recipe.cook_time = CookTime::new(1, 75);
        assert_eq!(
            recipe.validate(),
            Err(RecipeValidationError::MinutesOutOfRange(75))
        );
    }

    #[test]
    fn difficulty_parses_case_insensitively_and_orders_by_effort() {
        assert_eq!("medium".parse::<Difficulty>(), Ok(Difficulty::Medium));
        assert_eq!(" PROFESSIONAL ".parse::<Difficulty>(), Ok(Difficulty::Professional));
        assert!("hard".parse::<Difficulty>().is_err());
        assert!(Difficulty::Easy < Difficulty::Medium);
        assert!(Difficulty::Medium < Difficulty::Professional);
    }

    #[test]
    fn hashtag_list_is_lowercased_and_deduplicated() {
        let mut recipe = complete_recipe();
        recipe.hashtags = "#Quick dinner #vegan #quick".to_string();
        assert_eq!(recipe.hashtag_list(), vec!["quick", "vegan"]);
    }

    #[test]
    fn total_cook_minutes_combines_hours_and_minutes() {
        let mut recipe = complete_recipe();
        recipe.cook_time = CookTime::new(1, 30);
        assert_eq!(recipe.total_cook_minutes(), 90);
    }
}
