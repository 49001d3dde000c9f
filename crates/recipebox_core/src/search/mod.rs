//! In-memory recipe search pipeline.
//!
//! # Responsibility
//! - Narrow a recipe list by text, difficulty, dish type and cook time.
//! - Order the narrowed list by a user-selected sort option.
//! - Summarize a recipe list into display statistics.
//!
//! Full-text quick search lives in the recipe repository; this module only
//! works on recipes already loaded into memory.

pub mod filter;
pub mod stats;

pub use filter::{apply_filters, SearchFilters, SortOption, DEFAULT_MAX_COOK_TIME_MINUTES};
pub use stats::{compute_stats, RecipeStats, UNKNOWN_DIFFICULTY_LABEL};
