use recipebox_core::db::open_db_in_memory;
use recipebox_core::state::add_recipe::MISSING_FIELDS_MESSAGE;
use recipebox_core::state::{
    AddRecipeWizard, CollectionDetailState, CollectionsScreenState, RecipeDetailState,
    SearchScreenState, WizardStep,
};
use recipebox_core::{
    CollectionService, CookTime, Database, Difficulty, NewRecipe, RecipeId, RecipeService,
    SortOption, SqliteCollectionRepository, SqliteRecipeRepository,
};
use std::collections::BTreeSet;

fn recipes(db: &Database) -> RecipeService<SqliteRecipeRepository<'_>> {
    RecipeService::new(SqliteRecipeRepository::try_new(db).unwrap())
}

fn collections(db: &Database) -> CollectionService<SqliteCollectionRepository<'_>> {
    CollectionService::new(SqliteCollectionRepository::try_new(db).unwrap())
}

fn add_recipe(db: &Database, title: &str, minutes: u32, dish_type: &str) -> RecipeId {
    recipes(db)
        .add_recipe(NewRecipe {
            title: title.to_string(),
            description: format!("{title} description"),
            cook_time: CookTime::new(minutes / 60, minutes % 60),
            dish_types: BTreeSet::from([dish_type.to_string()]),
            ingredients: vec!["salt".to_string()],
            steps: vec!["cook".to_string()],
            ..NewRecipe::default()
        })
        .unwrap()
}

fn titles(recipes: &[recipebox_core::Recipe]) -> Vec<&str> {
    recipes.iter().map(|recipe| recipe.title.as_str()).collect()
}

#[test]
fn search_state_loads_and_reloads_on_change() {
    let db = open_db_in_memory().unwrap();
    add_recipe(&db, "Waffles", 25, "Breakfast");

    let mut screen = SearchScreenState::new(recipes(&db));
    let state = screen.current();
    assert_eq!(titles(&state.filtered), vec!["Waffles"]);
    assert_eq!(state.stats.total_recipes, 1);
    assert!(!screen.refresh());

    add_recipe(&db, "Omelette", 10, "Breakfast");
    assert!(screen.refresh());
    let state = screen.current();
    assert_eq!(state.all_recipes.len(), 2);
    assert_eq!(titles(&state.filtered), vec!["Omelette", "Waffles"]);
    assert_eq!(state.stats.total_recipes, 2);
}

#[test]
fn search_state_setters_recompute_results() {
    let db = open_db_in_memory().unwrap();
    add_recipe(&db, "Waffles", 25, "Breakfast");
    add_recipe(&db, "Chili", 90, "Dinner");
    add_recipe(&db, "Toast", 5, "Breakfast");

    let screen = SearchScreenState::new(recipes(&db));
    let mut receiver = screen.subscribe();
    assert_eq!(titles(&screen.current().filtered), vec!["Toast", "Waffles"]);

    screen.set_max_cook_time(120);
    screen.set_sort(SortOption::CookTime);
    assert!(receiver.has_changed().unwrap());
    assert_eq!(
        titles(&receiver.borrow_and_update().filtered),
        vec!["Toast", "Waffles", "Chili"]
    );

    screen.toggle_dish_type("Breakfast");
    assert_eq!(titles(&screen.current().filtered), vec!["Toast", "Waffles"]);
    screen.toggle_dish_type("Breakfast");
    assert_eq!(screen.current().filtered.len(), 3);

    screen.set_dish_types(BTreeSet::from(["Dinner".to_string()]));
    assert_eq!(titles(&screen.current().filtered), vec!["Chili"]);

    screen.set_difficulty(Some(Difficulty::Easy));
    assert!(screen.current().filtered.is_empty());

    screen.set_query("waf");
    screen.clear_filters();
    let state = screen.current();
    assert_eq!(state.filters.query, "waf");
    assert!(!state.filters.has_active_filters());
    assert_eq!(titles(&state.filtered), vec!["Waffles"]);
}

#[test]
fn collections_state_filters_and_forwards_intents() {
    let db = open_db_in_memory().unwrap();
    let soup = add_recipe(&db, "Soup", 30, "Lunch");

    let mut screen = CollectionsScreenState::new(collections(&db));
    assert!(screen.current().collections.is_empty());

    let winter = screen.create_collection("Winter", "warm food").unwrap();
    screen.create_collection("Picnic", "").unwrap();
    assert_eq!(screen.current().collections.len(), 2);

    assert!(screen.add_recipe(soup, winter).unwrap());
    assert!(!screen.add_recipe(soup, winter).unwrap());
    let state = screen.current();
    let loaded = state
        .collections
        .iter()
        .find(|collection| collection.id == winter)
        .unwrap();
    assert_eq!(loaded.recipes.len(), 1);

    screen.set_query("WARM");
    let filtered = screen.current().filtered;
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, winter);

    let mut renamed = loaded.clone();
    renamed.name = "Cold days".to_string();
    screen.edit_collection(&renamed).unwrap();
    assert_eq!(screen.current().collections[0].name, "Cold days");

    assert!(screen.remove_recipe(soup, winter).unwrap());
    screen.delete_collection(winter).unwrap();
    let state = screen.current();
    assert_eq!(state.collections.len(), 1);
    assert!(state.filtered.is_empty());
    assert!(screen.create_collection("  ", "").is_err());
}

#[test]
fn collection_detail_tracks_its_collection() {
    let db = open_db_in_memory().unwrap();
    let soup = add_recipe(&db, "Soup", 30, "Lunch");
    let stew = add_recipe(&db, "Stew", 45, "Dinner");
    let winter = collections(&db).create_collection("Winter", "").unwrap();

    let mut detail = CollectionDetailState::new(collections(&db), winter);
    assert_eq!(detail.collection_id(), winter);
    assert!(detail.current().collection.unwrap().recipes.is_empty());

    detail.add_recipe(soup).unwrap();
    detail.add_recipe(stew).unwrap();
    let loaded = detail.current().collection.unwrap();
    assert_eq!(
        loaded.recipes.iter().map(|recipe| recipe.id).collect::<Vec<_>>(),
        vec![stew, soup]
    );

    detail.edit(" Winter warmers ", "slow food").unwrap();
    let loaded = detail.current().collection.unwrap();
    assert_eq!(loaded.name, "Winter warmers");
    assert_eq!(loaded.description, "slow food");

    assert!(detail.remove_recipe(soup).unwrap());
    assert_eq!(detail.current().collection.unwrap().recipe_count, 1);

    collections(&db).delete_collection(winter).unwrap();
    assert!(detail.refresh());
    assert!(detail.current().collection.is_none());
    assert!(detail.edit("Again", "").is_err());
}

#[test]
fn recipe_detail_toggles_membership() {
    let db = open_db_in_memory().unwrap();
    let soup = add_recipe(&db, "Soup", 30, "Lunch");
    let winter = collections(&db).create_collection("Winter", "").unwrap();

    let mut detail = RecipeDetailState::new(recipes(&db), collections(&db), soup);
    assert_eq!(detail.recipe_id(), soup);
    let state = detail.current();
    assert_eq!(state.recipe.unwrap().title, "Soup");
    assert!(state.collection_ids.is_empty());

    assert!(detail.toggle_collection(winter).unwrap());
    assert_eq!(detail.current().collection_ids, BTreeSet::from([winter]));
    assert!(!detail.toggle_collection(winter).unwrap());
    assert!(detail.current().collection_ids.is_empty());

    let favourites = detail
        .create_collection_with_recipe("Favourites", "")
        .unwrap();
    assert_eq!(detail.current().collection_ids, BTreeSet::from([favourites]));

    recipes(&db).delete_recipe(soup).unwrap();
    assert!(detail.refresh());
    let state = detail.current();
    assert!(state.recipe.is_none());
    assert!(state.collection_ids.is_empty());
    assert!(state.error.is_none());
}

#[test]
fn recipe_detail_for_missing_recipe_has_no_error() {
    let db = open_db_in_memory().unwrap();
    let detail = RecipeDetailState::new(recipes(&db), collections(&db), 404);

    let state = detail.current();
    assert!(state.recipe.is_none());
    assert!(state.error.is_none());
}

#[test]
fn wizard_gates_each_step_on_required_fields() {
    let db = open_db_in_memory().unwrap();
    let wizard = AddRecipeWizard::new(recipes(&db));

    assert_eq!(wizard.step(), WizardStep::Details);
    assert!(!wizard.can_proceed());
    assert!(!wizard.next());

    wizard.set_title("Flatbread");
    assert!(!wizard.next());
    wizard.set_description("  ");
    assert!(!wizard.next());
    wizard.set_description("Two ingredients");
    assert!(wizard.next());
    assert_eq!(wizard.step(), WizardStep::Ingredients);

    assert!(!wizard.next());
    wizard.set_ingredients(vec!["flour".to_string(), "yogurt".to_string()]);
    assert!(wizard.next());

    wizard.set_steps(vec!["".to_string()]);
    assert!(!wizard.next());
    wizard.set_steps(vec!["mix".to_string(), "".to_string(), "fry".to_string()]);
    assert!(wizard.next());
    assert_eq!(wizard.step(), WizardStep::Confirm);
    assert!(!wizard.next());
}

#[test]
fn wizard_go_to_reaches_any_step_without_gating() {
    let db = open_db_in_memory().unwrap();
    let wizard = AddRecipeWizard::new(recipes(&db));

    assert!(!wizard.previous());
    assert!(!wizard.go_to(WizardStep::Details));

    assert!(wizard.go_to(WizardStep::Confirm));
    assert_eq!(wizard.step(), WizardStep::Confirm);
    assert_eq!(wizard.current().furthest_step, WizardStep::Confirm);

    assert!(wizard.go_to(WizardStep::Ingredients));
    assert!(wizard.previous());
    assert_eq!(wizard.step(), WizardStep::Details);
    assert_eq!(wizard.current().furthest_step, WizardStep::Confirm);

    // Jumping ahead does not bypass validation on save.
    assert!(wizard.go_to(WizardStep::Confirm));
    assert_eq!(wizard.save(), None);
    assert_eq!(
        wizard.current().status.error.as_deref(),
        Some(MISSING_FIELDS_MESSAGE)
    );
}

#[test]
fn wizard_next_and_previous_walk_the_steps_in_order() {
    let db = open_db_in_memory().unwrap();
    let wizard = AddRecipeWizard::new(recipes(&db));

    wizard.set_title("Flatbread");
    wizard.set_description("Two ingredients");
    wizard.set_ingredients(vec!["flour".to_string()]);
    assert!(wizard.next());
    assert!(wizard.next());
    assert_eq!(wizard.step(), WizardStep::Steps);
    assert!(!wizard.next());

    assert!(wizard.previous());
    assert_eq!(wizard.step(), WizardStep::Ingredients);
    assert_eq!(wizard.current().furthest_step, WizardStep::Steps);
}

#[test]
fn wizard_normalizes_cook_time_and_servings() {
    let db = open_db_in_memory().unwrap();
    let wizard = AddRecipeWizard::new(recipes(&db));

    let form = wizard.current().form;
    assert_eq!(form.cook_time_hours, "00");
    assert_eq!(form.cook_time_minutes, "00");
    assert_eq!(form.ingredients, vec![String::new()]);

    wizard.set_cook_time("1", "75");
    let form = wizard.current().form;
    assert_eq!(form.cook_time_hours, "01");
    assert_eq!(form.cook_time_minutes, "59");
    assert_eq!(form.cook_time(), CookTime::new(1, 59));

    wizard.set_cook_time("123", "5x");
    let form = wizard.current().form;
    assert_eq!(form.cook_time_hours, "12");
    assert_eq!(form.cook_time_minutes, "05");

    wizard.set_servings(0);
    assert_eq!(wizard.current().form.servings, 1);
}

#[test]
fn wizard_save_reports_missing_fields_then_succeeds() {
    let db = open_db_in_memory().unwrap();
    let wizard = AddRecipeWizard::new(recipes(&db));
    let mut receiver = wizard.subscribe();

    assert_eq!(wizard.save(), None);
    let status = receiver.borrow_and_update().status.clone();
    assert_eq!(status.error.as_deref(), Some(MISSING_FIELDS_MESSAGE));
    assert!(!status.is_success);

    wizard.clear_error();
    assert!(wizard.current().status.error.is_none());

    wizard.set_title(" Flatbread ");
    wizard.set_description("Two ingredients");
    wizard.set_hashtags("#bread");
    wizard.set_cook_time("0", "20");
    wizard.set_difficulty(Some(Difficulty::Easy));
    wizard.set_dish_types(BTreeSet::from(["Side".to_string()]));
    wizard.set_diet_types(BTreeSet::from(["Vegetarian".to_string()]));
    wizard.set_image_uri(Some("file:///bread.jpg".to_string()));
    wizard.set_ingredients(vec!["flour".to_string(), "".to_string(), "yogurt".to_string()]);
    wizard.set_steps(vec!["mix".to_string(), "fry".to_string()]);
    assert!(wizard.validate());

    let id = wizard.save().unwrap();
    let status = wizard.current().status;
    assert!(status.is_success);
    assert!(!status.is_loading);
    assert_eq!(status.created_recipe_id, Some(id));

    let stored = recipes(&db).get_recipe_by_id(id).unwrap();
    assert_eq!(stored.title, "Flatbread");
    assert_eq!(stored.cook_time, CookTime::new(0, 20));
    assert_eq!(stored.ingredients.len(), 2);
    assert_eq!(stored.image_uri.as_deref(), Some("file:///bread.jpg"));

    wizard.consume_success();
    assert!(!wizard.current().status.is_success);

    wizard.reset();
    let state = wizard.current();
    assert_eq!(state.step, WizardStep::Details);
    assert!(state.form.title.is_empty());
}
