//! Domain model for recipes and collections.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep validation rules next to the data they guard.
//!
//! # Invariants
//! - Ids are assigned by storage; `0` marks an unsaved object.

pub mod collection;
pub mod recipe;
