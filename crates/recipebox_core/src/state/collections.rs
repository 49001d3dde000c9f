//! Collections overview state with a name/description filter.

use crate::db::ChangeObserver;
use crate::model::collection::{CollectionId, RecipeCollection};
use crate::model::recipe::RecipeId;
use crate::repo::collection_repo::CollectionRepository;
use crate::service::collection_service::{CollectionService, CollectionServiceResult};
use log::warn;
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionsUiState {
    /// Every collection with recipes, ordered by name.
    pub collections: Vec<RecipeCollection>,
    pub query: String,
    /// `collections` narrowed by `query`.
    pub filtered: Vec<RecipeCollection>,
    pub error: Option<String>,
}

impl CollectionsUiState {
    fn recompute(&mut self) {
        self.filtered = self
            .collections
            .iter()
            .filter(|collection| collection.matches_text(&self.query))
            .cloned()
            .collect();
    }
}

/// State holder behind the collections screen.
pub struct CollectionsScreenState<C: CollectionRepository> {
    collections: CollectionService<C>,
    observer: ChangeObserver,
    state: watch::Sender<CollectionsUiState>,
}

impl<C: CollectionRepository> CollectionsScreenState<C> {
    /// Creates the holder and performs the initial load.
    pub fn new(collections: CollectionService<C>) -> Self {
        let observer = collections.observe();
        let (state, _) = watch::channel(CollectionsUiState::default());
        let mut holder = Self {
            collections,
            observer,
            state,
        };
        holder.refresh();
        holder
    }

    pub fn subscribe(&self) -> watch::Receiver<CollectionsUiState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> CollectionsUiState {
        self.state.borrow().clone()
    }

    /// Reloads collections when storage changed. Returns whether a reload ran.
    pub fn refresh(&mut self) -> bool {
        if !self.observer.poll_changed() {
            return false;
        }

        match self.collections.get_collections() {
            Ok(collections) => self.state.send_modify(|state| {
                state.collections = collections;
                state.error = None;
                state.recompute();
            }),
            Err(err) => {
                warn!("event=collections_reload module=state status=error error={err}");
                self.state
                    .send_modify(|state| state.error = Some(err.to_string()));
            }
        }
        true
    }

    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.state.send_modify(|state| {
            state.query = query;
            state.recompute();
        });
    }

    pub fn create_collection(
        &mut self,
        name: &str,
        description: &str,
    ) -> CollectionServiceResult<CollectionId> {
        let id = self.collections.create_collection(name, description)?;
        self.refresh();
        Ok(id)
    }

    pub fn edit_collection(&mut self, collection: &RecipeCollection) -> CollectionServiceResult<()> {
        self.collections.edit_collection(collection)?;
        self.refresh();
        Ok(())
    }

    pub fn delete_collection(&mut self, id: CollectionId) -> CollectionServiceResult<()> {
        self.collections.delete_collection(id)?;
        self.refresh();
        Ok(())
    }

    pub fn add_recipe(
        &mut self,
        recipe_id: RecipeId,
        collection_id: CollectionId,
    ) -> CollectionServiceResult<bool> {
        let added = self.collections.add_to_collection(recipe_id, collection_id)?;
        self.refresh();
        Ok(added)
    }

    pub fn remove_recipe(
        &mut self,
        recipe_id: RecipeId,
        collection_id: CollectionId,
    ) -> CollectionServiceResult<bool> {
        let removed = self
            .collections
            .remove_from_collection(recipe_id, collection_id)?;
        self.refresh();
        Ok(removed)
    }
}
