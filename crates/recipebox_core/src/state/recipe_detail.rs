//! Recipe detail screen state, including collection membership.

use crate::db::ChangeObserver;
use crate::model::collection::CollectionId;
use crate::model::recipe::{Recipe, RecipeId};
use crate::repo::collection_repo::CollectionRepository;
use crate::repo::recipe_repo::RecipeRepository;
use crate::service::collection_service::{CollectionService, CollectionServiceResult};
use crate::service::recipe_service::{RecipeService, RecipeServiceError};
use log::warn;
use std::collections::BTreeSet;
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeDetailUiState {
    /// `None` until loaded, and after the recipe is deleted.
    pub recipe: Option<Recipe>,
    /// Ids of the collections that contain the recipe.
    pub collection_ids: BTreeSet<CollectionId>,
    pub error: Option<String>,
}

/// State holder for one recipe.
pub struct RecipeDetailState<R: RecipeRepository, C: CollectionRepository> {
    recipes: RecipeService<R>,
    collections: CollectionService<C>,
    recipe_id: RecipeId,
    observer: ChangeObserver,
    state: watch::Sender<RecipeDetailUiState>,
}

impl<R: RecipeRepository, C: CollectionRepository> RecipeDetailState<R, C> {
    /// Creates the holder and loads `recipe_id`.
    pub fn new(
        recipes: RecipeService<R>,
        collections: CollectionService<C>,
        recipe_id: RecipeId,
    ) -> Self {
        // Membership lives in the cross-ref table, so watch every table.
        let observer = collections.observe();
        let (state, _) = watch::channel(RecipeDetailUiState::default());
        let mut holder = Self {
            recipes,
            collections,
            recipe_id,
            observer,
            state,
        };
        holder.refresh();
        holder
    }

    pub fn recipe_id(&self) -> RecipeId {
        self.recipe_id
    }

    pub fn subscribe(&self) -> watch::Receiver<RecipeDetailUiState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> RecipeDetailUiState {
        self.state.borrow().clone()
    }

    /// Reloads recipe and membership when storage changed. Returns whether a
    /// reload ran.
    pub fn refresh(&mut self) -> bool {
        if !self.observer.poll_changed() {
            return false;
        }

        match self.load() {
            Ok((recipe, collection_ids)) => self.state.send_modify(|state| {
                state.recipe = recipe;
                state.collection_ids = collection_ids;
                state.error = None;
            }),
            Err(message) => {
                warn!(
                    "event=recipe_detail_reload module=state status=error recipe_id={} error={message}",
                    self.recipe_id
                );
                self.state.send_modify(|state| state.error = Some(message));
            }
        }
        true
    }

    /// Adds the recipe to `collection_id`, or removes it when already there.
    /// Returns the new membership.
    pub fn toggle_collection(&mut self, collection_id: CollectionId) -> CollectionServiceResult<bool> {
        let member = self
            .collections
            .is_recipe_in_collection(self.recipe_id, collection_id)?;
        if member {
            self.collections
                .remove_from_collection(self.recipe_id, collection_id)?;
        } else {
            self.collections
                .add_to_collection(self.recipe_id, collection_id)?;
        }
        self.refresh();
        Ok(!member)
    }

    /// Creates a collection that already contains the recipe.
    pub fn create_collection_with_recipe(
        &mut self,
        name: &str,
        description: &str,
    ) -> CollectionServiceResult<CollectionId> {
        let id = self.collections.create_collection(name, description)?;
        self.collections.add_to_collection(self.recipe_id, id)?;
        self.refresh();
        Ok(id)
    }

    fn load(&self) -> Result<(Option<Recipe>, BTreeSet<CollectionId>), String> {
        let recipe = match self.recipes.get_recipe_by_id(self.recipe_id) {
            Ok(recipe) => Some(recipe),
            Err(RecipeServiceError::RecipeNotFound(_)) => None,
            Err(err) => return Err(err.to_string()),
        };
        let collection_ids = self
            .collections
            .collections_for_recipe(self.recipe_id)
            .map_err(|err| err.to_string())?
            .into_iter()
            .map(|collection| collection.id)
            .collect();
        Ok((recipe, collection_ids))
    }
}
