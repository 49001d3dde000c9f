//! Row <-> domain conversions.
//!
//! # Responsibility
//! - Decode SQLite rows into domain objects and encode domain fields into
//!   bindable column values.
//! - Own the JSON text encoding of string-set columns
//!   (`dish_types`, `diet_types`).
//!
//! # Invariants
//! - String sets are stored as sorted JSON arrays.
//! - Malformed string-set text decodes to an empty set; every other invalid
//!   column value is surfaced as `RepoError::InvalidData`.

use crate::model::collection::RecipeCollection;
use crate::model::recipe::{CookTime, Difficulty, Ingredient, Recipe, Step};
use crate::repo::{RepoError, RepoResult};
use rusqlite::Row;
use std::collections::BTreeSet;

pub(crate) const RECIPE_COLUMNS: &str = "recipes.id AS id,
    recipes.title AS title,
    recipes.description AS description,
    recipes.hashtags AS hashtags,
    recipes.servings AS servings,
    recipes.cook_time_hours AS cook_time_hours,
    recipes.cook_time_minutes AS cook_time_minutes,
    recipes.difficulty AS difficulty,
    recipes.dish_types AS dish_types,
    recipes.diet_types AS diet_types,
    recipes.image_uri AS image_uri,
    recipes.created_at AS created_at,
    recipes.updated_at AS updated_at";

pub(crate) const COLLECTION_COLUMNS: &str = "collections.id AS id,
    collections.name AS name,
    collections.description AS description,
    collections.created_at AS created_at,
    collections.updated_at AS updated_at,
    (SELECT COUNT(*)
     FROM recipe_collection_cross_ref cr
     WHERE cr.collection_id = collections.id) AS recipe_count";

/// Encodes a string set as a sorted JSON array.
pub fn encode_string_set(values: &BTreeSet<String>) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

/// Decodes a JSON array into a string set, falling back to an empty set.
pub fn decode_string_set(raw: &str) -> BTreeSet<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

/// Trims values and drops blanks.
pub fn normalize_string_set<I, S>(values: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|value| value.as_ref().trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

pub(crate) fn difficulty_to_db(difficulty: Option<Difficulty>) -> Option<&'static str> {
    difficulty.map(Difficulty::label)
}

/// Decodes the recipe columns selected by [`RECIPE_COLUMNS`].
///
/// Ingredients and steps are left empty; relation loaders fill them.
pub(crate) fn recipe_from_row(row: &Row<'_>) -> RepoResult<Recipe> {
    let difficulty = match row.get::<_, Option<String>>("difficulty")? {
        Some(label) => Some(label.parse::<Difficulty>().map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid difficulty `{label}` in recipes.difficulty"
            ))
        })?),
        None => None,
    };

    let dish_types: String = row.get("dish_types")?;
    let diet_types: String = row.get("diet_types")?;

    Ok(Recipe {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        hashtags: row.get("hashtags")?,
        servings: column_u32(row, "servings")?,
        cook_time: CookTime {
            hours: column_u32(row, "cook_time_hours")?,
            minutes: column_u32(row, "cook_time_minutes")?,
        },
        difficulty,
        dish_types: decode_string_set(&dish_types),
        diet_types: decode_string_set(&diet_types),
        image_uri: row.get("image_uri")?,
        ingredients: Vec::new(),
        steps: Vec::new(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub(crate) fn ingredient_from_row(row: &Row<'_>) -> RepoResult<Ingredient> {
    Ok(Ingredient {
        id: row.get("id")?,
        name: row.get("name")?,
        position: column_u32(row, "position")?,
    })
}

pub(crate) fn step_from_row(row: &Row<'_>) -> RepoResult<Step> {
    Ok(Step {
        id: row.get("id")?,
        description: row.get("description")?,
        position: column_u32(row, "position")?,
    })
}

/// Decodes the collection columns selected by [`COLLECTION_COLUMNS`].
pub(crate) fn collection_from_row(row: &Row<'_>) -> RepoResult<RecipeCollection> {
    let recipe_count: i64 = row.get("recipe_count")?;
    Ok(RecipeCollection {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        recipes: Vec::new(),
        recipe_count: usize::try_from(recipe_count).map_err(|_| {
            RepoError::InvalidData(format!("invalid recipe count `{recipe_count}`"))
        })?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn column_u32(row: &Row<'_>, column: &'static str) -> RepoResult<u32> {
    let value: i64 = row.get(column)?;
    u32::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid value `{value}` in column {column}")))
}
