//! Single collection screen state.

use crate::db::ChangeObserver;
use crate::model::collection::{CollectionId, RecipeCollection};
use crate::model::recipe::RecipeId;
use crate::repo::collection_repo::CollectionRepository;
use crate::service::collection_service::{
    CollectionService, CollectionServiceError, CollectionServiceResult,
};
use log::warn;
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionDetailUiState {
    /// `None` until loaded, and after the collection is deleted.
    pub collection: Option<RecipeCollection>,
    pub error: Option<String>,
}

/// State holder for one collection and its recipes.
pub struct CollectionDetailState<C: CollectionRepository> {
    collections: CollectionService<C>,
    collection_id: CollectionId,
    observer: ChangeObserver,
    state: watch::Sender<CollectionDetailUiState>,
}

impl<C: CollectionRepository> CollectionDetailState<C> {
    /// Creates the holder and loads `collection_id`.
    pub fn new(collections: CollectionService<C>, collection_id: CollectionId) -> Self {
        let observer = collections.observe();
        let (state, _) = watch::channel(CollectionDetailUiState::default());
        let mut holder = Self {
            collections,
            collection_id,
            observer,
            state,
        };
        holder.refresh();
        holder
    }

    pub fn collection_id(&self) -> CollectionId {
        self.collection_id
    }

    pub fn subscribe(&self) -> watch::Receiver<CollectionDetailUiState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> CollectionDetailUiState {
        self.state.borrow().clone()
    }

    /// Reloads the collection when storage changed. Returns whether a reload ran.
    pub fn refresh(&mut self) -> bool {
        if !self.observer.poll_changed() {
            return false;
        }

        match self.collections.get_collection_by_id(self.collection_id) {
            Ok(collection) => self.state.send_modify(|state| {
                state.collection = collection;
                state.error = None;
            }),
            Err(err) => {
                warn!(
                    "event=collection_detail_reload module=state status=error collection_id={} error={err}",
                    self.collection_id
                );
                self.state
                    .send_modify(|state| state.error = Some(err.to_string()));
            }
        }
        true
    }

    /// Replaces name and description of the loaded collection.
    pub fn edit(&mut self, name: &str, description: &str) -> CollectionServiceResult<()> {
        let mut collection = self
            .state
            .borrow()
            .collection
            .clone()
            .ok_or(CollectionServiceError::CollectionNotFound(self.collection_id))?;
        collection.name = name.to_string();
        collection.description = description.to_string();

        self.collections.edit_collection(&collection)?;
        self.refresh();
        Ok(())
    }

    pub fn add_recipe(&mut self, recipe_id: RecipeId) -> CollectionServiceResult<bool> {
        let added = self
            .collections
            .add_to_collection(recipe_id, self.collection_id)?;
        self.refresh();
        Ok(added)
    }

    pub fn remove_recipe(&mut self, recipe_id: RecipeId) -> CollectionServiceResult<bool> {
        let removed = self
            .collections
            .remove_from_collection(recipe_id, self.collection_id)?;
        self.refresh();
        Ok(removed)
    }
}
