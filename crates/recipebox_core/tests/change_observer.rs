use recipebox_core::db::open_db_in_memory;
use recipebox_core::{
    CollectionRepository, NewRecipe, RecipeCollection, RecipeRepository, RecipeService, Table,
    SqliteCollectionRepository, SqliteRecipeRepository,
};
use std::time::Duration;

fn new_recipe(title: &str) -> NewRecipe {
    NewRecipe {
        title: title.to_string(),
        description: "desc".to_string(),
        ingredients: vec!["water".to_string()],
        steps: vec!["boil".to_string()],
        ..NewRecipe::default()
    }
}

#[test]
fn first_poll_reports_change_then_waits_for_commits() {
    let db = open_db_in_memory().unwrap();
    let service = RecipeService::new(SqliteRecipeRepository::try_new(&db).unwrap());
    let mut observer = service.observe();

    assert!(observer.poll_changed());
    assert!(!observer.poll_changed());

    service.add_recipe(new_recipe("Tea")).unwrap();
    assert!(observer.poll_changed());
    assert!(!observer.poll_changed());
}

#[test]
fn observers_only_see_their_tables() {
    let db = open_db_in_memory().unwrap();
    let recipes = SqliteRecipeRepository::try_new(&db).unwrap();
    let collections = SqliteCollectionRepository::try_new(&db).unwrap();

    let mut recipe_observer = recipes.observe_recipes();
    let mut collection_observer = collections.observe_collections();
    let mut steps_only = db.observe(&[Table::Steps]);
    assert!(recipe_observer.poll_changed());
    assert!(collection_observer.poll_changed());
    assert!(steps_only.poll_changed());

    collections
        .insert_collection(&RecipeCollection::new("Drinks", ""))
        .unwrap();
    assert!(!recipe_observer.poll_changed());
    assert!(collection_observer.poll_changed());
    assert!(!steps_only.poll_changed());

    RecipeService::new(SqliteRecipeRepository::try_new(&db).unwrap())
        .add_recipe(new_recipe("Lemonade"))
        .unwrap();
    assert!(recipe_observer.poll_changed());
    assert!(collection_observer.poll_changed());
    assert!(steps_only.poll_changed());
}

#[test]
fn rolled_back_writes_are_not_published() {
    let db = open_db_in_memory().unwrap();
    let mut observer = db.observe(&Table::ALL);
    assert!(observer.poll_changed());

    {
        let tx = db.conn().unchecked_transaction().unwrap();
        tx.execute(
            "INSERT INTO collections (name, description) VALUES ('Discarded', '');",
            [],
        )
        .unwrap();
        tx.rollback().unwrap();
    }
    assert!(!observer.poll_changed());

    db.conn()
        .execute(
            "INSERT INTO collections (name, description) VALUES ('Kept', '');",
            [],
        )
        .unwrap();
    assert!(observer.poll_changed());
}

#[test]
fn failed_insert_does_not_publish() {
    let db = open_db_in_memory().unwrap();
    let repo = SqliteRecipeRepository::try_new(&db).unwrap();
    let mut observer = repo.observe_recipes();
    assert!(observer.poll_changed());

    let mut persisted = new_recipe("Ghost").into_recipe();
    persisted.id = 10;
    assert!(repo.insert_recipe(&persisted).is_err());
    assert!(repo.delete_recipe(10).is_err());
    assert!(!observer.poll_changed());
}

#[tokio::test]
async fn changed_resolves_after_commit() {
    let db = open_db_in_memory().unwrap();
    let service = RecipeService::new(SqliteRecipeRepository::try_new(&db).unwrap());
    let mut observer = service.observe();

    tokio::time::timeout(Duration::from_secs(1), observer.changed())
        .await
        .expect("initial load is reported immediately")
        .unwrap();

    let (changed, added) = tokio::join!(
        tokio::time::timeout(Duration::from_secs(1), observer.changed()),
        async { service.add_recipe(new_recipe("Cocoa")) },
    );
    added.unwrap();
    changed.expect("commit wakes the observer").unwrap();
    assert!(!observer.poll_changed());
}

#[tokio::test]
async fn changed_errors_once_database_is_dropped() {
    let db = open_db_in_memory().unwrap();
    let mut observer = db.observe(&[Table::Recipes]);
    assert!(observer.poll_changed());

    drop(db);
    let result = tokio::time::timeout(Duration::from_secs(1), observer.changed())
        .await
        .expect("closed channel resolves immediately");
    assert!(result.is_err());
}
