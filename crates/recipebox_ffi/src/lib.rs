//! Flutter-facing bindings for RecipeBox core.

pub mod api;
