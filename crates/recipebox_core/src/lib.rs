//! Core domain logic for RecipeBox.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod mapper;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod state;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, ChangeObserver, Database, DbError, DbResult, Table};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::collection::{CollectionId, CollectionValidationError, RecipeCollection};
pub use model::recipe::{
    CookTime, Difficulty, Ingredient, Recipe, RecipeId, RecipeValidationError, Step,
};
pub use repo::collection_repo::{CollectionRepository, SqliteCollectionRepository};
pub use repo::recipe_repo::{RecipeRepository, SqliteRecipeRepository};
pub use repo::{RepoError, RepoResult};
pub use search::{apply_filters, compute_stats, RecipeStats, SearchFilters, SortOption};
pub use service::collection_service::{CollectionService, CollectionServiceError};
pub use service::recipe_service::{NewRecipe, RecipeService, RecipeServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
