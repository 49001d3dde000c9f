//! Presentation state holders, one per screen.
//!
//! # Responsibility
//! - Combine repository change streams with user intents into observable
//!   UI state.
//! - Forward intents to use-case services.
//!
//! # Invariants
//! - Each holder publishes its whole UI state through one
//!   `tokio::sync::watch` channel; `subscribe()` hands out receivers.
//! - `refresh()` re-queries storage only after the holder's
//!   [`ChangeObserver`](crate::db::ChangeObserver) reports a change.
//! - Load failures land in the state's `error` field instead of being
//!   dropped.

pub mod add_recipe;
pub mod collection_detail;
pub mod collections;
pub mod recipe_detail;
pub mod search;

pub use add_recipe::{AddRecipeWizard, RecipeForm, SaveStatus, WizardState, WizardStep};
pub use collection_detail::{CollectionDetailState, CollectionDetailUiState};
pub use collections::{CollectionsScreenState, CollectionsUiState};
pub use recipe_detail::{RecipeDetailState, RecipeDetailUiState};
pub use search::{SearchScreenState, SearchUiState};
