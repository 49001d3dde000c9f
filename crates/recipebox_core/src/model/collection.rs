//! Recipe collection domain model.

use crate::model::recipe::Recipe;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned collection identifier.
pub type CollectionId = i64;

/// Named, user-defined grouping of recipes.
///
/// `recipes` is only populated by "with recipes" reads; `recipe_count` is
/// always filled from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeCollection {
    pub id: CollectionId,
    pub name: String,
    pub description: String,
    pub recipes: Vec<Recipe>,
    pub recipe_count: usize,
    /// Epoch milliseconds, assigned by storage.
    pub created_at: i64,
    /// Epoch milliseconds, bumped on rename and membership changes.
    pub updated_at: i64,
}

impl RecipeCollection {
    /// Creates an unsaved, empty collection.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: description.into(),
            recipes: Vec::new(),
            recipe_count: 0,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), CollectionValidationError> {
        if self.name.trim().is_empty() {
            return Err(CollectionValidationError::BlankName);
        }
        Ok(())
    }

    /// Case-insensitive match on name or description.
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        needle.is_empty()
            || self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionValidationError {
    BlankName,
}

impl Display for CollectionValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "collection name cannot be empty"),
        }
    }
}

impl Error for CollectionValidationError {}
