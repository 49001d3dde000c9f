//! Collection repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `collections`.
//! - Maintain the `recipe_collection_cross_ref` many-to-many relation.
//!
//! # Invariants
//! - Collections are ordered by `name COLLATE NOCASE ASC, id ASC`.
//! - Recipes inside a collection are ordered newest-added first.
//! - Membership writes are idempotent and bump the collection's
//!   `updated_at` only when membership actually changes.

use crate::db::{ChangeObserver, Database, Table};
use crate::mapper::{collection_from_row, COLLECTION_COLUMNS};
use crate::model::collection::{CollectionId, RecipeCollection};
use crate::model::recipe::RecipeId;
use crate::repo::recipe_repo::{load_recipes_by_ids, CHILD_LOOKUP_CHUNK};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::{BTreeSet, HashMap};

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "collections",
        &["id", "name", "description", "created_at", "updated_at"],
    ),
    (
        "recipe_collection_cross_ref",
        &["recipe_id", "collection_id", "added_at"],
    ),
    ("recipes", &["id"]),
];

/// Repository interface for collection operations.
pub trait CollectionRepository {
    /// Returns every collection with `recipe_count` filled and no recipes.
    fn get_all_collections(&self) -> RepoResult<Vec<RecipeCollection>>;
    /// Returns every collection with its recipes loaded.
    fn get_all_collections_with_recipes(&self) -> RepoResult<Vec<RecipeCollection>>;
    fn get_collection_by_id(&self, id: CollectionId) -> RepoResult<Option<RecipeCollection>>;
    fn get_collection_with_recipes(
        &self,
        id: CollectionId,
    ) -> RepoResult<Option<RecipeCollection>>;
    fn insert_collection(&self, collection: &RecipeCollection) -> RepoResult<CollectionId>;
    /// Updates name and description.
    fn update_collection(&self, collection: &RecipeCollection) -> RepoResult<()>;
    fn delete_collection(&self, id: CollectionId) -> RepoResult<()>;
    /// Links a recipe to a collection. Returns `false` when already linked.
    fn add_recipe_to_collection(
        &self,
        recipe_id: RecipeId,
        collection_id: CollectionId,
    ) -> RepoResult<bool>;
    /// Unlinks a recipe from a collection. Returns `false` when not linked.
    fn remove_recipe_from_collection(
        &self,
        recipe_id: RecipeId,
        collection_id: CollectionId,
    ) -> RepoResult<bool>;
    fn is_recipe_in_collection(
        &self,
        recipe_id: RecipeId,
        collection_id: CollectionId,
    ) -> RepoResult<bool>;
    /// Collections containing `recipe_id`, without recipes loaded.
    fn collections_for_recipe(&self, recipe_id: RecipeId) -> RepoResult<Vec<RecipeCollection>>;
    /// Subscribes to changes affecting collection reads, recipe edits included.
    fn observe_collections(&self) -> ChangeObserver;
}

/// SQLite-backed collection repository.
pub struct SqliteCollectionRepository<'db> {
    db: &'db Database,
}

impl<'db> SqliteCollectionRepository<'db> {
    /// Constructs a repository from a migrated/ready database.
    pub fn try_new(db: &'db Database) -> RepoResult<Self> {
        ensure_connection_ready(db.conn(), REQUIRED_SCHEMA)?;
        Ok(Self { db })
    }

    fn conn(&self) -> &Connection {
        self.db.conn()
    }

    fn query_collections(
        &self,
        where_clause: &str,
        bind: &[Value],
    ) -> RepoResult<Vec<RecipeCollection>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {COLLECTION_COLUMNS}
             FROM collections
             {where_clause}
             ORDER BY collections.name COLLATE NOCASE ASC, collections.id ASC;"
        ))?;
        let mut rows = stmt.query(params_from_iter(bind.iter()))?;
        let mut collections = Vec::new();
        while let Some(row) = rows.next()? {
            collections.push(collection_from_row(row)?);
        }
        Ok(collections)
    }

    /// Fills `recipes` for each collection from the cross-reference table.
    fn attach_recipes(&self, collections: &mut [RecipeCollection]) -> RepoResult<()> {
        if collections.is_empty() {
            return Ok(());
        }

        let index_by_id = collections
            .iter()
            .enumerate()
            .map(|(index, collection)| (collection.id, index))
            .collect::<HashMap<_, _>>();
        let collection_ids = collections
            .iter()
            .map(|collection| collection.id)
            .collect::<Vec<_>>();
        let mut links = Vec::new();
        for chunk in collection_ids.chunks(CHILD_LOOKUP_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let bind_values = chunk
                .iter()
                .map(|id| Value::Integer(*id))
                .collect::<Vec<_>>();

            let mut stmt = self.conn().prepare(&format!(
                "SELECT collection_id, recipe_id
                 FROM recipe_collection_cross_ref
                 WHERE collection_id IN ({placeholders})
                 ORDER BY collection_id ASC, added_at DESC, rowid DESC;"
            ))?;
            let mut rows = stmt.query(params_from_iter(bind_values.iter()))?;
            while let Some(row) = rows.next()? {
                let collection_id: CollectionId = row.get(0)?;
                let recipe_id: RecipeId = row.get(1)?;
                links.push((collection_id, recipe_id));
            }
        }

        let recipe_ids = links
            .iter()
            .map(|(_, recipe_id)| *recipe_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        let recipes = load_recipes_by_ids(self.conn(), &recipe_ids)?;

        for (collection_id, recipe_id) in links {
            let (Some(&index), Some(recipe)) =
                (index_by_id.get(&collection_id), recipes.get(&recipe_id))
            else {
                continue;
            };
            collections[index].recipes.push(recipe.clone());
        }

        Ok(())
    }
}

impl CollectionRepository for SqliteCollectionRepository<'_> {
    fn get_all_collections(&self) -> RepoResult<Vec<RecipeCollection>> {
        self.query_collections("", &[])
    }

    fn get_all_collections_with_recipes(&self) -> RepoResult<Vec<RecipeCollection>> {
        let mut collections = self.query_collections("", &[])?;
        self.attach_recipes(&mut collections)?;
        Ok(collections)
    }

    fn get_collection_by_id(&self, id: CollectionId) -> RepoResult<Option<RecipeCollection>> {
        let mut collections =
            self.query_collections("WHERE collections.id = ?1", &[Value::Integer(id)])?;
        Ok(collections.pop())
    }

    fn get_collection_with_recipes(
        &self,
        id: CollectionId,
    ) -> RepoResult<Option<RecipeCollection>> {
        let mut collections =
            self.query_collections("WHERE collections.id = ?1", &[Value::Integer(id)])?;
        self.attach_recipes(&mut collections)?;
        Ok(collections.pop())
    }

    fn insert_collection(&self, collection: &RecipeCollection) -> RepoResult<CollectionId> {
        collection.validate()?;
        if collection.id > 0 {
            return Err(RepoError::InvalidData(format!(
                "insert_collection expects an unsaved collection, got id {}",
                collection.id
            )));
        }

        self.conn().execute(
            "INSERT INTO collections (name, description) VALUES (?1, ?2);",
            params![collection.name.as_str(), collection.description.as_str()],
        )?;
        let id = self.conn().last_insert_rowid();

        debug!("event=collection_insert module=repo status=ok collection_id={id}");
        Ok(id)
    }

    fn update_collection(&self, collection: &RecipeCollection) -> RepoResult<()> {
        collection.validate()?;

        let changed = self.conn().execute(
            "UPDATE collections
             SET
                name = ?1,
                description = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?3;",
            params![
                collection.name.as_str(),
                collection.description.as_str(),
                collection.id
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::CollectionNotFound(collection.id));
        }

        debug!(
            "event=collection_update module=repo status=ok collection_id={}",
            collection.id
        );
        Ok(())
    }

    fn delete_collection(&self, id: CollectionId) -> RepoResult<()> {
        let changed = self
            .conn()
            .execute("DELETE FROM collections WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::CollectionNotFound(id));
        }

        debug!("event=collection_delete module=repo status=ok collection_id={id}");
        Ok(())
    }

    fn add_recipe_to_collection(
        &self,
        recipe_id: RecipeId,
        collection_id: CollectionId,
    ) -> RepoResult<bool> {
        let tx = self.conn().unchecked_transaction()?;
        if !row_exists(&tx, "collections", collection_id)? {
            return Err(RepoError::CollectionNotFound(collection_id));
        }
        if !row_exists(&tx, "recipes", recipe_id)? {
            return Err(RepoError::RecipeNotFound(recipe_id));
        }

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO recipe_collection_cross_ref (recipe_id, collection_id)
             VALUES (?1, ?2);",
            params![recipe_id, collection_id],
        )?;
        if inserted > 0 {
            touch_collection(&tx, collection_id)?;
        }
        tx.commit()?;

        debug!(
            "event=collection_link module=repo status=ok collection_id={collection_id} recipe_id={recipe_id} changed={}",
            inserted > 0
        );
        Ok(inserted > 0)
    }

    fn remove_recipe_from_collection(
        &self,
        recipe_id: RecipeId,
        collection_id: CollectionId,
    ) -> RepoResult<bool> {
        let tx = self.conn().unchecked_transaction()?;
        let removed = tx.execute(
            "DELETE FROM recipe_collection_cross_ref
             WHERE recipe_id = ?1 AND collection_id = ?2;",
            params![recipe_id, collection_id],
        )?;
        if removed > 0 {
            touch_collection(&tx, collection_id)?;
        }
        tx.commit()?;

        debug!(
            "event=collection_unlink module=repo status=ok collection_id={collection_id} recipe_id={recipe_id} changed={}",
            removed > 0
        );
        Ok(removed > 0)
    }

    fn is_recipe_in_collection(
        &self,
        recipe_id: RecipeId,
        collection_id: CollectionId,
    ) -> RepoResult<bool> {
        let found = self
            .conn()
            .query_row(
                "SELECT 1
                 FROM recipe_collection_cross_ref
                 WHERE recipe_id = ?1 AND collection_id = ?2;",
                params![recipe_id, collection_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn collections_for_recipe(&self, recipe_id: RecipeId) -> RepoResult<Vec<RecipeCollection>> {
        self.query_collections(
            "WHERE collections.id IN (
                SELECT collection_id
                FROM recipe_collection_cross_ref
                WHERE recipe_id = ?1
             )",
            &[Value::Integer(recipe_id)],
        )
    }

    fn observe_collections(&self) -> ChangeObserver {
        self.db.observe(&Table::ALL)
    }
}

fn row_exists(conn: &Connection, table: &'static str, id: i64) -> RepoResult<bool> {
    let found = conn
        .query_row(
            &format!("SELECT 1 FROM {table} WHERE id = ?1;"),
            [id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn touch_collection(conn: &Connection, collection_id: CollectionId) -> RepoResult<()> {
    conn.execute(
        "UPDATE collections
         SET updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1;",
        [collection_id],
    )?;
    Ok(())
}
