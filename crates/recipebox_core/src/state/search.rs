//! Search screen state: filters, sort and the resulting recipe list.

use crate::db::ChangeObserver;
use crate::model::recipe::{Difficulty, Recipe};
use crate::repo::recipe_repo::RecipeRepository;
use crate::search::{apply_filters, compute_stats, RecipeStats, SearchFilters, SortOption};
use crate::service::recipe_service::RecipeService;
use log::warn;
use std::collections::BTreeSet;
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchUiState {
    pub filters: SearchFilters,
    /// Every stored recipe, newest first.
    pub all_recipes: Vec<Recipe>,
    /// `all_recipes` after the filter/sort pipeline.
    pub filtered: Vec<Recipe>,
    pub stats: RecipeStats,
    pub error: Option<String>,
}

impl SearchUiState {
    fn recompute(&mut self) {
        self.filtered = apply_filters(&self.all_recipes, &self.filters);
    }
}

/// State holder behind the search screen.
pub struct SearchScreenState<R: RecipeRepository> {
    recipes: RecipeService<R>,
    observer: ChangeObserver,
    state: watch::Sender<SearchUiState>,
}

impl<R: RecipeRepository> SearchScreenState<R> {
    /// Creates the holder and performs the initial load.
    pub fn new(recipes: RecipeService<R>) -> Self {
        let observer = recipes.observe();
        let (state, _) = watch::channel(SearchUiState::default());
        let mut holder = Self {
            recipes,
            observer,
            state,
        };
        holder.refresh();
        holder
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchUiState> {
        self.state.subscribe()
    }

    /// Clone of the current UI state.
    pub fn current(&self) -> SearchUiState {
        self.state.borrow().clone()
    }

    /// Reloads recipes when storage changed. Returns whether a reload ran.
    pub fn refresh(&mut self) -> bool {
        if !self.observer.poll_changed() {
            return false;
        }

        match self.recipes.all_recipes() {
            Ok(all_recipes) => self.state.send_modify(|state| {
                state.stats = compute_stats(&all_recipes);
                state.all_recipes = all_recipes;
                state.error = None;
                state.recompute();
            }),
            Err(err) => {
                warn!("event=search_reload module=state status=error error={err}");
                self.state
                    .send_modify(|state| state.error = Some(err.to_string()));
            }
        }
        true
    }

    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.update_filters(|filters| filters.query = query);
    }

    pub fn set_difficulty(&self, difficulty: Option<Difficulty>) {
        self.update_filters(|filters| filters.difficulty = difficulty);
    }

    pub fn set_dish_types(&self, dish_types: BTreeSet<String>) {
        self.update_filters(|filters| filters.dish_types = dish_types);
    }

    /// Adds the dish type to the filter, or removes it when already present.
    pub fn toggle_dish_type(&self, dish_type: &str) {
        self.update_filters(|filters| {
            if !filters.dish_types.remove(dish_type) {
                filters.dish_types.insert(dish_type.to_string());
            }
        });
    }

    pub fn set_max_cook_time(&self, minutes: u32) {
        self.update_filters(|filters| filters.max_cook_time_minutes = minutes);
    }

    pub fn set_sort(&self, sort_by: SortOption) {
        self.update_filters(|filters| filters.sort_by = sort_by);
    }

    /// Resets every filter and the sort; the query is kept.
    pub fn clear_filters(&self) {
        self.update_filters(|filters| {
            let query = std::mem::take(&mut filters.query);
            *filters = SearchFilters {
                query,
                ..SearchFilters::default()
            };
        });
    }

    fn update_filters(&self, change: impl FnOnce(&mut SearchFilters)) {
        self.state.send_modify(|state| {
            change(&mut state.filters);
            state.recompute();
        });
    }
}
