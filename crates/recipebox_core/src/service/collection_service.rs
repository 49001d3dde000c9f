//! Collection use-case service.
//!
//! # Responsibility
//! - Create, rename and delete recipe collections.
//! - Manage recipe membership of collections.
//!
//! # Invariants
//! - Collection names are trimmed and must not be blank.
//! - Membership changes require both the recipe and the collection to exist.

use crate::db::ChangeObserver;
use crate::model::collection::{CollectionId, CollectionValidationError, RecipeCollection};
use crate::model::recipe::RecipeId;
use crate::repo::collection_repo::CollectionRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for collection use-cases.
#[derive(Debug)]
pub enum CollectionServiceError {
    Invalid(CollectionValidationError),
    CollectionNotFound(CollectionId),
    RecipeNotFound(RecipeId),
    Repo(RepoError),
}

impl Display for CollectionServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "{err}"),
            Self::CollectionNotFound(id) => write!(f, "collection not found: {id}"),
            Self::RecipeNotFound(id) => write!(f, "recipe not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CollectionServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CollectionServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::CollectionNotFound(id) => Self::CollectionNotFound(id),
            RepoError::RecipeNotFound(id) => Self::RecipeNotFound(id),
            RepoError::CollectionValidation(err) => Self::Invalid(err),
            other => Self::Repo(other),
        }
    }
}

impl From<CollectionValidationError> for CollectionServiceError {
    fn from(value: CollectionValidationError) -> Self {
        Self::Invalid(value)
    }
}

pub type CollectionServiceResult<T> = Result<T, CollectionServiceError>;

/// Collection service facade over repository implementations.
pub struct CollectionService<C: CollectionRepository> {
    repo: C,
}

impl<C: CollectionRepository> CollectionService<C> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: C) -> Self {
        Self { repo }
    }

    /// Creates an empty collection and returns its id.
    pub fn create_collection(
        &self,
        name: &str,
        description: &str,
    ) -> CollectionServiceResult<CollectionId> {
        let collection = RecipeCollection::new(name.trim(), description.trim());
        collection.validate()?;
        let id = self.repo.insert_collection(&collection)?;
        info!("event=collection_create module=service status=ok collection_id={id}");
        Ok(id)
    }

    /// Renames a collection and/or replaces its description.
    pub fn edit_collection(&self, collection: &RecipeCollection) -> CollectionServiceResult<()> {
        let mut edited = collection.clone();
        edited.name = edited.name.trim().to_string();
        edited.description = edited.description.trim().to_string();
        edited.validate()?;
        self.repo.update_collection(&edited)?;
        Ok(())
    }

    pub fn delete_collection(&self, id: CollectionId) -> CollectionServiceResult<()> {
        self.repo.delete_collection(id)?;
        info!("event=collection_delete module=service status=ok collection_id={id}");
        Ok(())
    }

    /// All collections with their recipes loaded.
    pub fn get_collections(&self) -> CollectionServiceResult<Vec<RecipeCollection>> {
        Ok(self.repo.get_all_collections_with_recipes()?)
    }

    /// One collection with its recipes loaded, `None` when missing.
    pub fn get_collection_by_id(
        &self,
        id: CollectionId,
    ) -> CollectionServiceResult<Option<RecipeCollection>> {
        Ok(self.repo.get_collection_with_recipes(id)?)
    }

    /// Adds a recipe to a collection. Returns `false` if it was already there.
    pub fn add_to_collection(
        &self,
        recipe_id: RecipeId,
        collection_id: CollectionId,
    ) -> CollectionServiceResult<bool> {
        Ok(self.repo.add_recipe_to_collection(recipe_id, collection_id)?)
    }

    /// Removes a recipe from a collection. Returns `false` if it was not there.
    pub fn remove_from_collection(
        &self,
        recipe_id: RecipeId,
        collection_id: CollectionId,
    ) -> CollectionServiceResult<bool> {
        Ok(self
            .repo
            .remove_recipe_from_collection(recipe_id, collection_id)?)
    }

    pub fn is_recipe_in_collection(
        &self,
        recipe_id: RecipeId,
        collection_id: CollectionId,
    ) -> CollectionServiceResult<bool> {
        Ok(self.repo.is_recipe_in_collection(recipe_id, collection_id)?)
    }

    /// Collections containing the recipe, without recipes loaded.
    pub fn collections_for_recipe(
        &self,
        recipe_id: RecipeId,
    ) -> CollectionServiceResult<Vec<RecipeCollection>> {
        Ok(self.repo.collections_for_recipe(recipe_id)?)
    }

    /// Subscribes to changes affecting collection reads.
    pub fn observe(&self) -> ChangeObserver {
        self.repo.observe_collections()
    }
}
