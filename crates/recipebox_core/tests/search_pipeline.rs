use recipebox_core::db::open_db_in_memory;
use recipebox_core::{
    CookTime, Difficulty, NewRecipe, RecipeId, RecipeService, SearchFilters, SortOption,
    SqliteRecipeRepository,
};
use std::collections::BTreeSet;

struct Seed {
    pancakes: RecipeId,
    lasagna: RecipeId,
    salad: RecipeId,
    brisket: RecipeId,
}

fn seed(service: &RecipeService<SqliteRecipeRepository<'_>>) -> Seed {
    let add = |title: &str,
                   servings: u32,
                   cook_time: CookTime,
                   difficulty: Option<Difficulty>,
                   dish_type: &str,
                   ingredient: &str| {
        service
            .add_recipe(NewRecipe {
                title: title.to_string(),
                description: format!("Homemade {}", title.to_lowercase()),
                servings,
                cook_time,
                difficulty,
                dish_types: BTreeSet::from([dish_type.to_string()]),
                ingredients: vec![ingredient.to_string()],
                steps: vec!["cook".to_string()],
                ..NewRecipe::default()
            })
            .unwrap()
    };

    Seed {
        pancakes: add(
            "Pancakes",
            4,
            CookTime::new(0, 20),
            Some(Difficulty::Easy),
            "Breakfast",
            "flour",
        ),
        lasagna: add(
            "Lasagna",
            6,
            CookTime::new(0, 55),
            Some(Difficulty::Professional),
            "Dinner",
            "pasta sheets",
        ),
        salad: add("Greek salad", 2, CookTime::new(0, 10), None, "Lunch", "feta"),
        brisket: add(
            "Brisket",
            8,
            CookTime::new(5, 0),
            Some(Difficulty::Medium),
            "Dinner",
            "beef",
        ),
    }
}

fn ids(recipes: &[recipebox_core::Recipe]) -> Vec<RecipeId> {
    recipes.iter().map(|recipe| recipe.id).collect()
}

#[test]
fn default_filters_hide_long_recipes_and_sort_by_title() {
    let db = open_db_in_memory().unwrap();
    let service = RecipeService::new(SqliteRecipeRepository::try_new(&db).unwrap());
    let seed = seed(&service);

    let result = service.search_recipes(&SearchFilters::default()).unwrap();
    assert_eq!(ids(&result), vec![seed.salad, seed.lasagna, seed.pancakes]);
}

#[test]
fn filters_combine_query_difficulty_dish_type_and_cook_time() {
    let db = open_db_in_memory().unwrap();
    let service = RecipeService::new(SqliteRecipeRepository::try_new(&db).unwrap());
    let seed = seed(&service);

    let by_ingredient = SearchFilters {
        query: "  FETA ".to_string(),
        ..SearchFilters::default()
    };
    assert_eq!(ids(&service.search_recipes(&by_ingredient).unwrap()), vec![seed.salad]);

    let dinner = SearchFilters {
        dish_types: BTreeSet::from(["Dinner".to_string()]),
        max_cook_time_minutes: 600,
        ..SearchFilters::default()
    };
    assert_eq!(
        ids(&service.search_recipes(&dinner).unwrap()),
        vec![seed.brisket, seed.lasagna]
    );

    let medium_dinner = SearchFilters {
        difficulty: Some(Difficulty::Medium),
        ..dinner.clone()
    };
    assert_eq!(
        ids(&service.search_recipes(&medium_dinner).unwrap()),
        vec![seed.brisket]
    );
    assert!(medium_dinner.has_active_filters());

    let nothing = SearchFilters {
        query: "sushi".to_string(),
        ..SearchFilters::default()
    };
    assert!(service.search_recipes(&nothing).unwrap().is_empty());
}

#[test]
fn sort_options_order_results() {
    let db = open_db_in_memory().unwrap();
    let service = RecipeService::new(SqliteRecipeRepository::try_new(&db).unwrap());
    let seed = seed(&service);

    let sorted = |sort_by: SortOption| {
        let filters = SearchFilters {
            max_cook_time_minutes: 600,
            sort_by,
            ..SearchFilters::default()
        };
        ids(&service.search_recipes(&filters).unwrap())
    };

    assert_eq!(
        sorted(SortOption::CookTime),
        vec![seed.salad, seed.pancakes, seed.lasagna, seed.brisket]
    );
    assert_eq!(
        sorted(SortOption::Servings),
        vec![seed.salad, seed.pancakes, seed.lasagna, seed.brisket]
    );
    // Missing difficulty sorts with Easy; ties keep the newest-first load order.
    assert_eq!(
        sorted(SortOption::Difficulty),
        vec![seed.salad, seed.pancakes, seed.brisket, seed.lasagna]
    );
    assert_eq!(
        sorted(SortOption::Recent),
        vec![seed.brisket, seed.salad, seed.lasagna, seed.pancakes]
    );
}

#[test]
fn stats_cover_every_stored_recipe() {
    let db = open_db_in_memory().unwrap();
    let service = RecipeService::new(SqliteRecipeRepository::try_new(&db).unwrap());

    let empty = service.recipe_stats().unwrap();
    assert_eq!(empty.total_recipes, 0);
    assert_eq!(empty.average_cook_time_minutes, 0);

    seed(&service);
    let stats = service.recipe_stats().unwrap();
    assert_eq!(stats.total_recipes, 4);
    // (20 + 55 + 10 + 300) / 4
    assert_eq!(stats.average_cook_time_minutes, 96);
    assert_eq!(stats.difficulty_distribution.get("Unknown"), Some(&1));
    assert_eq!(stats.difficulty_distribution.get("Professional"), Some(&1));
    assert_eq!(stats.dish_type_distribution.get("Dinner"), Some(&2));
    assert_eq!(stats.dish_type_distribution.get("Lunch"), Some(&1));
}

#[test]
fn quick_search_goes_through_full_text_index() {
    let db = open_db_in_memory().unwrap();
    let service = RecipeService::new(SqliteRecipeRepository::try_new(&db).unwrap());
    let seed = seed(&service);

    assert_eq!(ids(&service.search_by_query("homemade pan").unwrap()), vec![seed.pancakes]);
    assert!(service.search_by_query("").unwrap().is_empty());
    // Ingredients are not part of the full-text index.
    assert!(service.search_by_query("feta").unwrap().is_empty());
}
