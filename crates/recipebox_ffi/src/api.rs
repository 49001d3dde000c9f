//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Flatten domain types into plain strings/numbers for the UI.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every failure is returned as an envelope with `ok = false` and a
//!   human-readable `message`.
//! - The database path is fixed on first use for the rest of the process.

use log::warn;
use recipebox_core::config::default_db_path;
use recipebox_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, open_db,
    CollectionService, CookTime, CoreConfig, Difficulty, NewRecipe, Recipe, RecipeCollection,
    RecipeService, SearchFilters, SortOption, SqliteCollectionRepository, SqliteRecipeRepository,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;

static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.trim()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Pins the database file used by every other call.
///
/// Must run before the first data call; afterwards only the same path is
/// accepted. Without it the path comes from `RECIPEBOX_DB_PATH` or the
/// platform data directory.
///
/// # FFI contract
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_db_path(path: String) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return "db path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = DB_PATH.get_or_init(|| requested.clone());
    if *active == requested {
        String::new()
    } else {
        format!(
            "db path already set to `{}`; refusing to switch",
            active.display()
        )
    }
}

/// Recipe projection returned to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeItem {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub hashtags: String,
    pub servings: u32,
    pub cook_time_hours: u32,
    pub cook_time_minutes: u32,
    /// `Easy|Medium|Professional`, or `None` when unset.
    pub difficulty: Option<String>,
    pub dish_types: Vec<String>,
    pub diet_types: Vec<String>,
    pub image_uri: Option<String>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Collection projection returned to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionItem {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub recipe_count: u32,
    /// Member recipe ids, newest-added first.
    pub recipe_ids: Vec<i64>,
    pub updated_at: i64,
}

/// Form input for creating a recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeDraft {
    pub title: String,
    pub description: String,
    pub hashtags: String,
    pub servings: u32,
    pub cook_time_hours: u32,
    pub cook_time_minutes: u32,
    pub difficulty: Option<String>,
    pub dish_types: Vec<String>,
    pub diet_types: Vec<String>,
    pub image_uri: Option<String>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
}

/// Search criteria coming from the search screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeSearchRequest {
    pub query: String,
    pub difficulty: Option<String>,
    pub dish_types: Vec<String>,
    /// Defaults to 60 minutes when `None`.
    pub max_cook_time_minutes: Option<u32>,
    /// `title|difficulty|cook_time|recent|servings`; defaults to `title`.
    pub sort_by: Option<String>,
}

/// Generic action response envelope for create/update/delete calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Id of the created or touched entity.
    pub id: Option<i64>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: i64) -> Self {
        Self {
            ok: true,
            id: Some(id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeResponse {
    pub ok: bool,
    pub recipe: Option<RecipeItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeListResponse {
    pub ok: bool,
    pub items: Vec<RecipeItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionListResponse {
    pub ok: bool,
    pub items: Vec<CollectionItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionResponse {
    pub ok: bool,
    pub collection: Option<CollectionItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipResponse {
    pub ok: bool,
    pub is_member: bool,
    pub message: String,
}

/// One `label -> count` row of a distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionEntry {
    pub label: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeStatsResponse {
    pub ok: bool,
    pub total_recipes: u32,
    pub average_cook_time_minutes: u32,
    pub difficulty_distribution: Vec<DistributionEntry>,
    pub dish_type_distribution: Vec<DistributionEntry>,
    pub message: String,
}

/// Creates a recipe from form input.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; validation failures come back as `ok = false`.
#[flutter_rust_bridge::frb(sync)]
pub fn recipe_add(draft: RecipeDraft) -> ActionResponse {
    let request = match to_new_recipe(draft) {
        Ok(request) => request,
        Err(message) => return ActionResponse::failure(message),
    };

    match with_recipe_service(|service| service.add_recipe(request).map_err(|err| err.to_string())) {
        Ok(id) => ActionResponse::success("Recipe saved", id),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Loads one recipe with ingredients and steps.
#[flutter_rust_bridge::frb(sync)]
pub fn recipe_get(recipe_id: i64) -> RecipeResponse {
    recipe_response(with_recipe_service(|service| {
        service
            .get_recipe_by_id(recipe_id)
            .map_err(|err| err.to_string())
    }))
}

/// Replaces every field of a stored recipe with the draft.
///
/// # FFI contract
/// - Ingredient and step lists are replaced as a whole.
/// - Returns the stored recipe after the update.
#[flutter_rust_bridge::frb(sync)]
pub fn recipe_update(recipe_id: i64, draft: RecipeDraft) -> RecipeResponse {
    let request = match to_new_recipe(draft) {
        Ok(request) => request,
        Err(message) => return recipe_response(Err(message)),
    };
    recipe_response(with_recipe_service(|service| {
        let mut recipe = request.into_recipe();
        recipe.id = recipe_id;
        service.update_recipe(recipe).map_err(|err| err.to_string())
    }))
}

#[flutter_rust_bridge::frb(sync)]
pub fn recipe_delete(recipe_id: i64) -> ActionResponse {
    match with_recipe_service(|service| {
        service
            .delete_recipe(recipe_id)
            .map_err(|err| err.to_string())
    }) {
        Ok(()) => ActionResponse::success("Recipe deleted", recipe_id),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Lists every recipe, newest first.
#[flutter_rust_bridge::frb(sync)]
pub fn recipe_list() -> RecipeListResponse {
    recipe_list_response(with_recipe_service(|service| {
        service.all_recipes().map_err(|err| err.to_string())
    }))
}

/// Runs the filter/sort pipeline.
#[flutter_rust_bridge::frb(sync)]
pub fn recipe_search(request: RecipeSearchRequest) -> RecipeListResponse {
    let filters = match to_search_filters(request) {
        Ok(filters) => filters,
        Err(message) => return recipe_list_response(Err(message)),
    };
    recipe_list_response(with_recipe_service(|service| {
        service
            .search_recipes(&filters)
            .map_err(|err| err.to_string())
    }))
}

/// Prefix full-text search over title, description and hashtags.
#[flutter_rust_bridge::frb(sync)]
pub fn recipe_quick_search(text: String) -> RecipeListResponse {
    recipe_list_response(with_recipe_service(|service| {
        service
            .search_by_query(text.as_str())
            .map_err(|err| err.to_string())
    }))
}

#[flutter_rust_bridge::frb(sync)]
pub fn recipe_stats() -> RecipeStatsResponse {
    match with_recipe_service(|service| service.recipe_stats().map_err(|err| err.to_string())) {
        Ok(stats) => RecipeStatsResponse {
            ok: true,
            total_recipes: clamp_u32(stats.total_recipes),
            average_cook_time_minutes: stats.average_cook_time_minutes,
            difficulty_distribution: to_distribution(stats.difficulty_distribution),
            dish_type_distribution: to_distribution(stats.dish_type_distribution),
            message: String::new(),
        },
        Err(message) => RecipeStatsResponse {
            ok: false,
            total_recipes: 0,
            average_cook_time_minutes: 0,
            difficulty_distribution: Vec::new(),
            dish_type_distribution: Vec::new(),
            message,
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn collection_create(name: String, description: String) -> ActionResponse {
    match with_collection_service(|service| {
        service
            .create_collection(name.as_str(), description.as_str())
            .map_err(|err| err.to_string())
    }) {
        Ok(id) => ActionResponse::success("Collection created", id),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Lists collections with member recipe ids, ordered by name.
#[flutter_rust_bridge::frb(sync)]
pub fn collection_list() -> CollectionListResponse {
    match with_collection_service(|service| {
        service.get_collections().map_err(|err| err.to_string())
    }) {
        Ok(collections) => CollectionListResponse {
            ok: true,
            items: collections.into_iter().map(to_collection_item).collect(),
            message: String::new(),
        },
        Err(message) => CollectionListResponse {
            ok: false,
            items: Vec::new(),
            message,
        },
    }
}

/// Loads one collection with member recipe ids.
#[flutter_rust_bridge::frb(sync)]
pub fn collection_get(collection_id: i64) -> CollectionResponse {
    match with_collection_service(|service| {
        service
            .get_collection_by_id(collection_id)
            .map_err(|err| err.to_string())
    }) {
        Ok(Some(collection)) => CollectionResponse {
            ok: true,
            collection: Some(to_collection_item(collection)),
            message: String::new(),
        },
        Ok(None) => CollectionResponse {
            ok: false,
            collection: None,
            message: format!("collection not found: {collection_id}"),
        },
        Err(message) => CollectionResponse {
            ok: false,
            collection: None,
            message,
        },
    }
}

/// Lists the collections containing a recipe, ordered by name.
///
/// Items carry `recipe_count` but no `recipe_ids`.
#[flutter_rust_bridge::frb(sync)]
pub fn collections_for_recipe(recipe_id: i64) -> CollectionListResponse {
    match with_collection_service(|service| {
        service
            .collections_for_recipe(recipe_id)
            .map_err(|err| err.to_string())
    }) {
        Ok(collections) => CollectionListResponse {
            ok: true,
            items: collections.into_iter().map(to_collection_item).collect(),
            message: String::new(),
        },
        Err(message) => CollectionListResponse {
            ok: false,
            items: Vec::new(),
            message,
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn collection_contains_recipe(recipe_id: i64, collection_id: i64) -> MembershipResponse {
    match with_collection_service(|service| {
        service
            .is_recipe_in_collection(recipe_id, collection_id)
            .map_err(|err| err.to_string())
    }) {
        Ok(is_member) => MembershipResponse {
            ok: true,
            is_member,
            message: String::new(),
        },
        Err(message) => MembershipResponse {
            ok: false,
            is_member: false,
            message,
        },
    }
}

/// Replaces name and description of a collection.
#[flutter_rust_bridge::frb(sync)]
pub fn collection_edit(collection_id: i64, name: String, description: String) -> ActionResponse {
    match with_collection_service(|service| {
        let mut collection = RecipeCollection::new(name, description);
        collection.id = collection_id;
        service
            .edit_collection(&collection)
            .map_err(|err| err.to_string())
    }) {
        Ok(()) => ActionResponse::success("Collection updated", collection_id),
        Err(message) => ActionResponse::failure(message),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn collection_delete(collection_id: i64) -> ActionResponse {
    match with_collection_service(|service| {
        service
            .delete_collection(collection_id)
            .map_err(|err| err.to_string())
    }) {
        Ok(()) => ActionResponse::success("Collection deleted", collection_id),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Adds a recipe to a collection; adding twice is not an error.
#[flutter_rust_bridge::frb(sync)]
pub fn collection_add_recipe(recipe_id: i64, collection_id: i64) -> ActionResponse {
    match with_collection_service(|service| {
        service
            .add_to_collection(recipe_id, collection_id)
            .map_err(|err| err.to_string())
    }) {
        Ok(true) => ActionResponse::success("Recipe added to collection", collection_id),
        Ok(false) => ActionResponse::success("Recipe already in collection", collection_id),
        Err(message) => ActionResponse::failure(message),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn collection_remove_recipe(recipe_id: i64, collection_id: i64) -> ActionResponse {
    match with_collection_service(|service| {
        service
            .remove_from_collection(recipe_id, collection_id)
            .map_err(|err| err.to_string())
    }) {
        Ok(true) => ActionResponse::success("Recipe removed from collection", collection_id),
        Ok(false) => ActionResponse::success("Recipe was not in collection", collection_id),
        Err(message) => ActionResponse::failure(message),
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| match CoreConfig::from_env() {
            Ok(config) => config.db_path,
            Err(err) => {
                warn!("event=ffi_config module=ffi status=error error={err}");
                default_db_path()
            }
        })
        .clone()
}

fn open_database() -> Result<recipebox_core::Database, String> {
    let db_path = resolve_db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|err| format!("db directory setup failed: {err}"))?;
    }
    open_db(&db_path).map_err(|err| format!("db open failed: {err}"))
}

fn with_recipe_service<T>(
    f: impl FnOnce(&RecipeService<SqliteRecipeRepository<'_>>) -> Result<T, String>,
) -> Result<T, String> {
    let db = open_database()?;
    let repo = SqliteRecipeRepository::try_new(&db)
        .map_err(|err| format!("recipe repo init failed: {err}"))?;
    f(&RecipeService::new(repo))
}

fn with_collection_service<T>(
    f: impl FnOnce(&CollectionService<SqliteCollectionRepository<'_>>) -> Result<T, String>,
) -> Result<T, String> {
    let db = open_database()?;
    let repo = SqliteCollectionRepository::try_new(&db)
        .map_err(|err| format!("collection repo init failed: {err}"))?;
    f(&CollectionService::new(repo))
}

fn recipe_response(result: Result<Recipe, String>) -> RecipeResponse {
    match result {
        Ok(recipe) => RecipeResponse {
            ok: true,
            recipe: Some(to_recipe_item(recipe)),
            message: String::new(),
        },
        Err(message) => RecipeResponse {
            ok: false,
            recipe: None,
            message,
        },
    }
}

fn recipe_list_response(result: Result<Vec<Recipe>, String>) -> RecipeListResponse {
    match result {
        Ok(recipes) => RecipeListResponse {
            ok: true,
            message: format!("{} recipe(s)", recipes.len()),
            items: recipes.into_iter().map(to_recipe_item).collect(),
        },
        Err(message) => RecipeListResponse {
            ok: false,
            items: Vec::new(),
            message,
        },
    }
}

fn parse_difficulty(raw: Option<String>) -> Result<Option<Difficulty>, String> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(label) => label
            .parse::<Difficulty>()
            .map(Some)
            .map_err(|err| err.to_string()),
    }
}

fn to_new_recipe(draft: RecipeDraft) -> Result<NewRecipe, String> {
    Ok(NewRecipe {
        difficulty: parse_difficulty(draft.difficulty)?,
        title: draft.title,
        description: draft.description,
        hashtags: draft.hashtags,
        servings: draft.servings.max(1),
        cook_time: CookTime::new(draft.cook_time_hours, draft.cook_time_minutes),
        dish_types: draft.dish_types.into_iter().collect(),
        diet_types: draft.diet_types.into_iter().collect(),
        image_uri: draft.image_uri,
        ingredients: draft.ingredients,
        steps: draft.steps,
    })
}

fn to_search_filters(request: RecipeSearchRequest) -> Result<SearchFilters, String> {
    let defaults = SearchFilters::default();
    let sort_by = match request.sort_by.as_deref().map(str::trim) {
        None | Some("") => defaults.sort_by,
        Some(label) => label
            .parse::<SortOption>()
            .map_err(|err| err.to_string())?,
    };

    Ok(SearchFilters {
        query: request.query,
        difficulty: parse_difficulty(request.difficulty)?,
        dish_types: request.dish_types.into_iter().collect(),
        max_cook_time_minutes: request
            .max_cook_time_minutes
            .unwrap_or(defaults.max_cook_time_minutes),
        sort_by,
    })
}

fn to_recipe_item(recipe: Recipe) -> RecipeItem {
    RecipeItem {
        id: recipe.id,
        title: recipe.title,
        description: recipe.description,
        hashtags: recipe.hashtags,
        servings: recipe.servings,
        cook_time_hours: recipe.cook_time.hours,
        cook_time_minutes: recipe.cook_time.minutes,
        difficulty: recipe.difficulty.map(|difficulty| difficulty.label().to_string()),
        dish_types: recipe.dish_types.into_iter().collect(),
        diet_types: recipe.diet_types.into_iter().collect(),
        image_uri: recipe.image_uri,
        ingredients: recipe
            .ingredients
            .into_iter()
            .map(|ingredient| ingredient.name)
            .collect(),
        steps: recipe.steps.into_iter().map(|step| step.description).collect(),
        created_at: recipe.created_at,
        updated_at: recipe.updated_at,
    }
}

fn to_collection_item(collection: RecipeCollection) -> CollectionItem {
    CollectionItem {
        id: collection.id,
        name: collection.name,
        description: collection.description,
        recipe_count: clamp_u32(collection.recipe_count),
        recipe_ids: collection.recipes.iter().map(|recipe| recipe.id).collect(),
        updated_at: collection.updated_at,
    }
}

fn to_distribution(counts: BTreeMap<String, usize>) -> Vec<DistributionEntry> {
    counts
        .into_iter()
        .map(|(label, count)| DistributionEntry {
            label,
            count: clamp_u32(count),
        })
        .collect()
}

fn clamp_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{
        collection_add_recipe, collection_contains_recipe, collection_create, collection_delete,
        collection_get, collection_list, collection_remove_recipe, collections_for_recipe,
        configure_db_path, core_version, init_logging, recipe_add, recipe_delete, recipe_get,
        recipe_quick_search, recipe_search, recipe_stats, recipe_update, RecipeDraft,
        RecipeSearchRequest,
    };
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn use_test_db() {
        let path: PathBuf = std::env::temp_dir().join(format!(
            "recipebox-ffi-test-{}.sqlite3",
            std::process::id()
        ));
        let error = configure_db_path(path.to_string_lossy().into_owned());
        assert!(error.is_empty(), "{error}");
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        format!("{prefix}{nanos}")
    }

    fn draft(title: &str) -> RecipeDraft {
        RecipeDraft {
            title: title.to_string(),
            description: "weeknight dinner".to_string(),
            servings: 2,
            cook_time_minutes: 25,
            difficulty: Some("medium".to_string()),
            dish_types: vec!["Dinner".to_string()],
            ingredients: vec!["rice".to_string(), String::new()],
            steps: vec!["cook rice".to_string()],
            ..RecipeDraft::default()
        }
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "/tmp/logs".to_string());
        assert!(error.contains("unsupported log level"));
    }

    #[test]
    fn configure_db_path_rejects_blank_and_conflicting_paths() {
        use_test_db();
        assert!(!configure_db_path("   ".to_string()).is_empty());
        assert!(configure_db_path("/somewhere/else.sqlite3".to_string())
            .contains("refusing to switch"));
    }

    #[test]
    fn recipe_add_get_and_quick_search_roundtrip() {
        use_test_db();
        let token = unique_token("risotto");
        let created = recipe_add(draft(&token));
        assert!(created.ok, "{}", created.message);
        let recipe_id = created.id.unwrap();

        let loaded = recipe_get(recipe_id);
        assert!(loaded.ok, "{}", loaded.message);
        let item = loaded.recipe.unwrap();
        assert_eq!(item.title, token);
        assert_eq!(item.difficulty.as_deref(), Some("Medium"));
        assert_eq!(item.ingredients, vec!["rice".to_string()]);

        let hits = recipe_quick_search(token.clone());
        assert!(hits.ok, "{}", hits.message);
        assert!(hits.items.iter().any(|hit| hit.id == recipe_id));

        let filtered = recipe_search(RecipeSearchRequest {
            query: token,
            difficulty: Some("Medium".to_string()),
            sort_by: Some("cook_time".to_string()),
            ..RecipeSearchRequest::default()
        });
        assert!(filtered.ok, "{}", filtered.message);
        assert_eq!(filtered.items.len(), 1);

        assert!(recipe_stats().total_recipes >= 1);
        assert!(recipe_delete(recipe_id).ok);
        assert!(!recipe_get(recipe_id).ok);
    }

    #[test]
    fn recipe_add_rejects_invalid_input_without_panicking() {
        use_test_db();
        let mut invalid = draft("Untitled");
        invalid.steps.clear();
        let response = recipe_add(invalid);
        assert!(!response.ok);
        assert!(response.message.contains("step"));

        let bad_difficulty = recipe_add(RecipeDraft {
            difficulty: Some("impossible".to_string()),
            ..draft("Soup")
        });
        assert!(!bad_difficulty.ok);
        assert!(bad_difficulty.message.contains("unknown difficulty"));
    }

    #[test]
    fn recipe_search_rejects_unknown_sort_option() {
        use_test_db();
        let response = recipe_search(RecipeSearchRequest {
            sort_by: Some("popularity".to_string()),
            ..RecipeSearchRequest::default()
        });
        assert!(!response.ok);
        assert!(response.message.contains("unknown sort option"));
    }

    #[test]
    fn collection_membership_flow() {
        use_test_db();
        let recipe_id = recipe_add(draft(&unique_token("pilaf"))).id.unwrap();
        let name = unique_token("Weeknights ");
        let collection_id = collection_create(name.clone(), String::new()).id.unwrap();

        assert_eq!(
            collection_add_recipe(recipe_id, collection_id).message,
            "Recipe added to collection"
        );
        assert_eq!(
            collection_add_recipe(recipe_id, collection_id).message,
            "Recipe already in collection"
        );

        let listed = collection_list();
        let item = listed
            .items
            .iter()
            .find(|item| item.id == collection_id)
            .unwrap();
        assert_eq!(item.name, name);
        assert_eq!(item.recipe_ids, vec![recipe_id]);

        assert!(!collection_add_recipe(recipe_id, i64::MAX).ok);
        assert!(!collection_create("  ".to_string(), String::new()).ok);
        assert!(collection_delete(collection_id).ok);
        assert!(!collection_delete(collection_id).ok);
    }

    #[test]
    fn recipe_update_replaces_fields_and_children() {
        use_test_db();
        let recipe_id = recipe_add(draft(&unique_token("curry"))).id.unwrap();

        let title = unique_token("green curry");
        let updated = recipe_update(
            recipe_id,
            RecipeDraft {
                difficulty: None,
                ingredients: vec!["coconut milk".to_string(), "paste".to_string()],
                steps: vec!["simmer".to_string(), "serve".to_string()],
                ..draft(&title)
            },
        );
        assert!(updated.ok, "{}", updated.message);
        let item = updated.recipe.unwrap();
        assert_eq!(item.id, recipe_id);
        assert_eq!(item.title, title);
        assert_eq!(item.difficulty, None);
        assert_eq!(item.ingredients, vec!["coconut milk", "paste"]);
        assert_eq!(item.steps, vec!["simmer", "serve"]);

        let missing = recipe_update(i64::MAX, draft("Ghost"));
        assert!(!missing.ok);
        assert!(missing.recipe.is_none());
        assert!(missing.message.contains("not found"));

        let invalid = recipe_update(
            recipe_id,
            RecipeDraft {
                title: "  ".to_string(),
                ..draft("unused")
            },
        );
        assert!(!invalid.ok);
        assert_eq!(recipe_get(recipe_id).recipe.unwrap().title, title);
    }

    #[test]
    fn collection_lookup_and_membership_queries() {
        use_test_db();
        let recipe_id = recipe_add(draft(&unique_token("tagine"))).id.unwrap();
        let name = unique_token("Slow cooking ");
        let collection_id = collection_create(name.clone(), "low and slow".to_string())
            .id
            .unwrap();

        assert!(!collection_contains_recipe(recipe_id, collection_id).is_member);
        assert!(collections_for_recipe(recipe_id).items.is_empty());

        assert!(collection_add_recipe(recipe_id, collection_id).ok);
        let membership = collection_contains_recipe(recipe_id, collection_id);
        assert!(membership.ok);
        assert!(membership.is_member);

        let loaded = collection_get(collection_id);
        assert!(loaded.ok, "{}", loaded.message);
        let item = loaded.collection.unwrap();
        assert_eq!(item.name, name);
        assert_eq!(item.description, "low and slow");
        assert_eq!(item.recipe_ids, vec![recipe_id]);

        let containing = collections_for_recipe(recipe_id);
        assert!(containing.ok);
        assert_eq!(
            containing.items.iter().map(|item| item.id).collect::<Vec<_>>(),
            vec![collection_id]
        );
        assert_eq!(containing.items[0].recipe_count, 1);

        assert!(collection_remove_recipe(recipe_id, collection_id).ok);
        assert!(!collection_contains_recipe(recipe_id, collection_id).is_member);

        assert!(collection_delete(collection_id).ok);
        let gone = collection_get(collection_id);
        assert!(!gone.ok);
        assert!(gone.collection.is_none());
    }
}
