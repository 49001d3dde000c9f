//! Recipe use-case service.
//!
//! # Responsibility
//! - Turn raw form input into a normalized, validated recipe.
//! - Expose search, quick search and statistics over stored recipes.
//!
//! # Invariants
//! - Text fields are trimmed and blank ingredient/step lines are dropped
//!   before validation.
//! - Ingredient and step positions are reassigned densely from `0`.
//! - Service APIs never bypass repository validation/persistence contracts.

use crate::db::ChangeObserver;
use crate::mapper::normalize_string_set;
use crate::model::recipe::{
    CookTime, Difficulty, Ingredient, Recipe, RecipeId, RecipeValidationError, Step,
};
use crate::repo::recipe_repo::RecipeRepository;
use crate::repo::RepoError;
use crate::search::{apply_filters, compute_stats, RecipeStats, SearchFilters};
use log::info;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for recipe use-cases.
#[derive(Debug)]
pub enum RecipeServiceError {
    /// Input does not satisfy recipe invariants.
    Invalid(RecipeValidationError),
    /// Target recipe does not exist.
    RecipeNotFound(RecipeId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for RecipeServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "{err}"),
            Self::RecipeNotFound(id) => write!(f, "recipe not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent recipe state: {details}"),
        }
    }
}

impl Error for RecipeServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for RecipeServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::RecipeNotFound(id) => Self::RecipeNotFound(id),
            RepoError::RecipeValidation(err) => Self::Invalid(err),
            other => Self::Repo(other),
        }
    }
}

impl From<RecipeValidationError> for RecipeServiceError {
    fn from(value: RecipeValidationError) -> Self {
        Self::Invalid(value)
    }
}

pub type RecipeServiceResult<T> = Result<T, RecipeServiceError>;

/// Request model for creating a recipe from form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecipe {
    pub title: String,
    pub description: String,
    pub hashtags: String,
    pub servings: u32,
    pub cook_time: CookTime,
    pub difficulty: Option<Difficulty>,
    pub dish_types: BTreeSet<String>,
    pub diet_types: BTreeSet<String>,
    pub image_uri: Option<String>,
    /// Ingredient lines in display order; blank lines are ignored.
    pub ingredients: Vec<String>,
    /// Step lines in display order; blank lines are ignored.
    pub steps: Vec<String>,
}

impl Default for NewRecipe {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            hashtags: String::new(),
            servings: 1,
            cook_time: CookTime::default(),
            difficulty: None,
            dish_types: BTreeSet::new(),
            diet_types: BTreeSet::new(),
            image_uri: None,
            ingredients: Vec::new(),
            steps: Vec::new(),
        }
    }
}

impl NewRecipe {
    /// Builds an unsaved, normalized recipe.
    pub fn into_recipe(self) -> Recipe {
        let mut recipe = Recipe::new(self.title, self.description);
        recipe.hashtags = self.hashtags;
        recipe.servings = self.servings;
        recipe.cook_time = self.cook_time;
        recipe.difficulty = self.difficulty;
        recipe.dish_types = self.dish_types;
        recipe.diet_types = self.diet_types;
        recipe.image_uri = self.image_uri;
        recipe.ingredients = self
            .ingredients
            .into_iter()
            .map(|name| Ingredient::new(name, 0))
            .collect();
        recipe.steps = self
            .steps
            .into_iter()
            .map(|description| Step::new(description, 0))
            .collect();
        normalize_recipe(recipe)
    }
}

/// Trims text, drops blank lines, and reassigns child positions.
pub fn normalize_recipe(mut recipe: Recipe) -> Recipe {
    recipe.title = recipe.title.trim().to_string();
    recipe.description = recipe.description.trim().to_string();
    recipe.hashtags = recipe.hashtags.trim().to_string();
    recipe.dish_types = normalize_string_set(&recipe.dish_types);
    recipe.diet_types = normalize_string_set(&recipe.diet_types);
    recipe.image_uri = recipe
        .image_uri
        .map(|uri| uri.trim().to_string())
        .filter(|uri| !uri.is_empty());

    recipe.ingredients = recipe
        .ingredients
        .into_iter()
        .filter_map(|mut ingredient| {
            ingredient.name = ingredient.name.trim().to_string();
            (!ingredient.name.is_empty()).then_some(ingredient)
        })
        .zip(0u32..)
        .map(|(mut ingredient, position)| {
            ingredient.position = position;
            ingredient
        })
        .collect();
    recipe.steps = recipe
        .steps
        .into_iter()
        .filter_map(|mut step| {
            step.description = step.description.trim().to_string();
            (!step.description.is_empty()).then_some(step)
        })
        .zip(0u32..)
        .map(|(mut step, position)| {
            step.position = position;
            step
        })
        .collect();
    recipe
}

/// Recipe service facade over repository implementations.
pub struct RecipeService<R: RecipeRepository> {
    repo: R,
}

impl<R: RecipeRepository> RecipeService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Normalizes, validates and stores a new recipe.
    pub fn add_recipe(&self, request: NewRecipe) -> RecipeServiceResult<RecipeId> {
        let recipe = request.into_recipe();
        recipe.validate()?;
        let id = self.repo.insert_recipe(&recipe)?;
        info!(
            "event=recipe_add module=service status=ok recipe_id={id} ingredients={} steps={}",
            recipe.ingredients.len(),
            recipe.steps.len()
        );
        Ok(id)
    }

    pub fn get_recipe_by_id(&self, id: RecipeId) -> RecipeServiceResult<Recipe> {
        self.repo
            .get_recipe_by_id(id)?
            .ok_or(RecipeServiceError::RecipeNotFound(id))
    }

    /// Replaces a stored recipe and returns the read-back.
    pub fn update_recipe(&self, recipe: Recipe) -> RecipeServiceResult<Recipe> {
        let recipe = normalize_recipe(recipe);
        recipe.validate()?;
        self.repo.update_recipe(&recipe)?;
        self.repo
            .get_recipe_by_id(recipe.id)?
            .ok_or(RecipeServiceError::InconsistentState(
                "updated recipe not found in read-back",
            ))
    }

    pub fn delete_recipe(&self, id: RecipeId) -> RecipeServiceResult<()> {
        self.repo.delete_recipe(id)?;
        info!("event=recipe_delete module=service status=ok recipe_id={id}");
        Ok(())
    }

    /// All recipes, newest first.
    pub fn all_recipes(&self) -> RecipeServiceResult<Vec<Recipe>> {
        Ok(self.repo.get_all_recipes()?)
    }

    /// Loads every recipe and runs the filter/sort pipeline over it.
    pub fn search_recipes(&self, filters: &SearchFilters) -> RecipeServiceResult<Vec<Recipe>> {
        let recipes = self.repo.get_all_recipes()?;
        Ok(apply_filters(&recipes, filters))
    }

    /// Prefix full-text search; blank text yields no results.
    pub fn search_by_query(&self, text: &str) -> RecipeServiceResult<Vec<Recipe>> {
        Ok(self.repo.search_recipes(text)?)
    }

    pub fn recipe_stats(&self) -> RecipeServiceResult<RecipeStats> {
        let recipes = self.repo.get_all_recipes()?;
        Ok(compute_stats(&recipes))
    }

    /// Subscribes to changes affecting recipe reads.
    pub fn observe(&self) -> ChangeObserver {
        self.repo.observe_recipes()
    }
}
