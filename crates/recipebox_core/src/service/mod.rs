//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into one operation per user intent.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod collection_service;
pub mod recipe_service;
