//! Recipe repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `recipes` and its `ingredients`/`steps`
//!   relations.
//! - Provide FTS quick search over recipe text fields.
//! - Hand out change observers for reactive recipe lists.
//!
//! # Invariants
//! - Write paths call `Recipe::validate()` before SQL mutations.
//! - A recipe and its children are written in one transaction.
//! - Lists are ordered by `created_at DESC, id DESC`; children by
//!   `position ASC, id ASC`.

use crate::db::{ChangeObserver, Database, Table};
use crate::mapper::{
    difficulty_to_db, encode_string_set, ingredient_from_row, recipe_from_row, step_from_row,
    RECIPE_COLUMNS,
};
use crate::model::recipe::{Recipe, RecipeId};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashMap;

/// SQLite bound-parameter budget per `IN (...)` lookup.
pub(crate) const CHILD_LOOKUP_CHUNK: usize = 500;

/// Tables whose changes invalidate recipe reads.
pub const RECIPE_TABLES: [Table; 3] = [Table::Recipes, Table::Ingredients, Table::Steps];

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "recipes",
        &[
            "id",
            "title",
            "description",
            "hashtags",
            "servings",
            "cook_time_hours",
            "cook_time_minutes",
            "difficulty",
            "dish_types",
            "diet_types",
            "image_uri",
            "created_at",
            "updated_at",
        ],
    ),
    ("ingredients", &["id", "recipe_id", "name", "position"]),
    ("steps", &["id", "recipe_id", "description", "position"]),
];

/// Repository interface for recipe operations.
pub trait RecipeRepository {
    /// Returns every recipe with ingredients and steps, newest first.
    fn get_all_recipes(&self) -> RepoResult<Vec<Recipe>>;
    fn get_recipe_by_id(&self, id: RecipeId) -> RepoResult<Option<Recipe>>;
    /// Inserts an unsaved recipe and its children, returning the new id.
    fn insert_recipe(&self, recipe: &Recipe) -> RepoResult<RecipeId>;
    /// Replaces recipe fields and the full ingredient/step lists.
    fn update_recipe(&self, recipe: &Recipe) -> RepoResult<()>;
    fn delete_recipe(&self, id: RecipeId) -> RepoResult<()>;
    /// Prefix full-text search over title, description and hashtags.
    fn search_recipes(&self, query: &str) -> RepoResult<Vec<Recipe>>;
    /// Subscribes to changes affecting recipe reads.
    fn observe_recipes(&self) -> ChangeObserver;
}

/// SQLite-backed recipe repository.
pub struct SqliteRecipeRepository<'db> {
    db: &'db Database,
}

impl<'db> SqliteRecipeRepository<'db> {
    /// Constructs a repository from a migrated/ready database.
    pub fn try_new(db: &'db Database) -> RepoResult<Self> {
        ensure_connection_ready(db.conn(), REQUIRED_SCHEMA)?;
        Ok(Self { db })
    }

    fn conn(&self) -> &Connection {
        self.db.conn()
    }
}

impl RecipeRepository for SqliteRecipeRepository<'_> {
    fn get_all_recipes(&self) -> RepoResult<Vec<Recipe>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {RECIPE_COLUMNS}
             FROM recipes
             ORDER BY recipes.created_at DESC, recipes.id DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut recipes = Vec::new();
        while let Some(row) = rows.next()? {
            recipes.push(recipe_from_row(row)?);
        }

        attach_children(self.conn(), &mut recipes)?;
        Ok(recipes)
    }

    fn get_recipe_by_id(&self, id: RecipeId) -> RepoResult<Option<Recipe>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {RECIPE_COLUMNS}
             FROM recipes
             WHERE recipes.id = ?1;"
        ))?;
        let mut rows = stmt.query([id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let mut recipes = vec![recipe_from_row(row)?];
        attach_children(self.conn(), &mut recipes)?;
        Ok(recipes.pop())
    }

    fn insert_recipe(&self, recipe: &Recipe) -> RepoResult<RecipeId> {
        recipe.validate()?;
        if recipe.is_persisted() {
            return Err(RepoError::InvalidData(format!(
                "insert_recipe expects an unsaved recipe, got id {}",
                recipe.id
            )));
        }

        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            "INSERT INTO recipes (
                title,
                description,
                hashtags,
                servings,
                cook_time_hours,
                cook_time_minutes,
                difficulty,
                dish_types,
                diet_types,
                image_uri
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                recipe.title.as_str(),
                recipe.description.as_str(),
                recipe.hashtags.as_str(),
                recipe.servings,
                recipe.cook_time.hours,
                recipe.cook_time.minutes,
                difficulty_to_db(recipe.difficulty),
                encode_string_set(&recipe.dish_types),
                encode_string_set(&recipe.diet_types),
                recipe.image_uri.as_deref(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        insert_children(&tx, id, recipe)?;
        tx.commit()?;

        debug!(
            "event=recipe_insert module=repo status=ok recipe_id={id} ingredients={} steps={}",
            recipe.ingredients.len(),
            recipe.steps.len()
        );
        Ok(id)
    }

    fn update_recipe(&self, recipe: &Recipe) -> RepoResult<()> {
        recipe.validate()?;

        let tx = self.conn().unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE recipes
             SET
                title = ?1,
                description = ?2,
                hashtags = ?3,
                servings = ?4,
                cook_time_hours = ?5,
                cook_time_minutes = ?6,
                difficulty = ?7,
                dish_types = ?8,
                diet_types = ?9,
                image_uri = ?10,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?11;",
            params![
                recipe.title.as_str(),
                recipe.description.as_str(),
                recipe.hashtags.as_str(),
                recipe.servings,
                recipe.cook_time.hours,
                recipe.cook_time.minutes,
                difficulty_to_db(recipe.difficulty),
                encode_string_set(&recipe.dish_types),
                encode_string_set(&recipe.diet_types),
                recipe.image_uri.as_deref(),
                recipe.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::RecipeNotFound(recipe.id));
        }

        tx.execute("DELETE FROM ingredients WHERE recipe_id = ?1;", [recipe.id])?;
        tx.execute("DELETE FROM steps WHERE recipe_id = ?1;", [recipe.id])?;
        insert_children(&tx, recipe.id, recipe)?;
        tx.commit()?;

        debug!("event=recipe_update module=repo status=ok recipe_id={}", recipe.id);
        Ok(())
    }

    fn delete_recipe(&self, id: RecipeId) -> RepoResult<()> {
        let changed = self
            .conn()
            .execute("DELETE FROM recipes WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::RecipeNotFound(id));
        }

        debug!("event=recipe_delete module=repo status=ok recipe_id={id}");
        Ok(())
    }

    fn search_recipes(&self, query: &str) -> RepoResult<Vec<Recipe>> {
        let Some(match_expr) = build_match_expression(query) else {
            return Ok(Vec::new());
        };

        let mut stmt = self.conn().prepare(&format!(
            "SELECT {RECIPE_COLUMNS}
             FROM recipes_fts
             JOIN recipes ON recipes.id = recipes_fts.rowid
             WHERE recipes_fts MATCH ?1
             ORDER BY bm25(recipes_fts), recipes.created_at DESC, recipes.id DESC;"
        ))?;
        let mut rows = stmt.query([match_expr.as_str()])?;
        let mut recipes = Vec::new();
        while let Some(row) = rows.next()? {
            recipes.push(recipe_from_row(row)?);
        }

        attach_children(self.conn(), &mut recipes)?;
        debug!(
            "event=recipe_search module=repo status=ok query_len={} hits={}",
            query.chars().count(),
            recipes.len()
        );
        Ok(recipes)
    }

    fn observe_recipes(&self) -> ChangeObserver {
        self.db.observe(&RECIPE_TABLES)
    }
}

fn insert_children(conn: &Connection, recipe_id: RecipeId, recipe: &Recipe) -> RepoResult<()> {
    let mut insert_ingredient = conn.prepare_cached(
        "INSERT INTO ingredients (recipe_id, name, position) VALUES (?1, ?2, ?3);",
    )?;
    for ingredient in &recipe.ingredients {
        insert_ingredient.execute(params![
            recipe_id,
            ingredient.name.as_str(),
            ingredient.position
        ])?;
    }

    let mut insert_step = conn.prepare_cached(
        "INSERT INTO steps (recipe_id, description, position) VALUES (?1, ?2, ?3);",
    )?;
    for step in &recipe.steps {
        insert_step.execute(params![recipe_id, step.description.as_str(), step.position])?;
    }

    Ok(())
}

/// Loads full recipes for `ids`, keyed by id. Missing ids are skipped.
pub(crate) fn load_recipes_by_ids(
    conn: &Connection,
    ids: &[RecipeId],
) -> RepoResult<HashMap<RecipeId, Recipe>> {
    let mut recipes = Vec::new();
    for chunk in ids.chunks(CHILD_LOOKUP_CHUNK) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECIPE_COLUMNS}
             FROM recipes
             WHERE recipes.id IN ({placeholders});"
        ))?;
        let mut rows = stmt.query(params_from_iter(chunk.iter()))?;
        while let Some(row) = rows.next()? {
            recipes.push(recipe_from_row(row)?);
        }
    }

    attach_children(conn, &mut recipes)?;
    Ok(recipes
        .into_iter()
        .map(|recipe| (recipe.id, recipe))
        .collect())
}

/// Loads ingredients and steps for `recipes` in batched `IN` lookups.
pub(crate) fn attach_children(conn: &Connection, recipes: &mut [Recipe]) -> RepoResult<()> {
    if recipes.is_empty() {
        return Ok(());
    }

    let index_by_id = recipes
        .iter()
        .enumerate()
        .map(|(index, recipe)| (recipe.id, index))
        .collect::<HashMap<_, _>>();
    let ids = recipes.iter().map(|recipe| recipe.id).collect::<Vec<_>>();

    for chunk in ids.chunks(CHILD_LOOKUP_CHUNK) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let bind_values = chunk
            .iter()
            .map(|id| Value::Integer(*id))
            .collect::<Vec<_>>();

        let mut stmt = conn.prepare(&format!(
            "SELECT id, recipe_id, name, position
             FROM ingredients
             WHERE recipe_id IN ({placeholders})
             ORDER BY recipe_id ASC, position ASC, id ASC;"
        ))?;
        let mut rows = stmt.query(params_from_iter(bind_values.iter()))?;
        while let Some(row) = rows.next()? {
            let recipe_id: RecipeId = row.get("recipe_id")?;
            if let Some(&index) = index_by_id.get(&recipe_id) {
                recipes[index].ingredients.push(ingredient_from_row(row)?);
            }
        }

        let mut stmt = conn.prepare(&format!(
            "SELECT id, recipe_id, description, position
             FROM steps
             WHERE recipe_id IN ({placeholders})
             ORDER BY recipe_id ASC, position ASC, id ASC;"
        ))?;
        let mut rows = stmt.query(params_from_iter(bind_values.iter()))?;
        while let Some(row) = rows.next()? {
            let recipe_id: RecipeId = row.get("recipe_id")?;
            if let Some(&index) = index_by_id.get(&recipe_id) {
                recipes[index].steps.push(step_from_row(row)?);
            }
        }
    }

    Ok(())
}

/// Builds an FTS5 expression of quoted prefix terms joined by `AND`.
///
/// Terms without any alphanumeric character are dropped because they
/// tokenize to nothing. Returns `None` when no usable term remains.
fn build_match_expression(text: &str) -> Option<String> {
    let terms = text
        .split_whitespace()
        .filter(|term| term.chars().any(char::is_alphanumeric))
        .map(|term| format!("\"{}\"*", term.replace('"', "\"\"")))
        .collect::<Vec<_>>();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" AND "))
    }
}
