//! RecipeBox command-line front end.
//!
//! Usage:
//! ```bash
//! recipebox add --title "Pancakes" --description "Sunday breakfast" \
//!     --ingredient flour --ingredient milk --step "whisk" --step "fry"
//! recipebox search --query pan --sort cook_time --max-cook-time 30
//! recipebox find pan
//! recipebox edit 1 --minutes 25 --step "whisk" --step "fry" --step "serve"
//! recipebox collection create "Breakfast"
//! recipebox collection add 1 1
//! ```
//!
//! # Responsibility
//! - Resolve configuration (env, then flags) and open the database.
//! - Map subcommands onto core services and print plain-text results.

use clap::{Parser, Subcommand};
use log::info;
use recipebox_core::{
    init_logging, open_db, CollectionService, CookTime, CoreConfig, Difficulty, Ingredient,
    NewRecipe, Recipe, RecipeCollection, RecipeService, SearchFilters, SortOption,
    SqliteCollectionRepository, SqliteRecipeRepository, Step,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "recipebox", version, about = "Local recipe box")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Database file (overrides RECIPEBOX_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log level (overrides RECIPEBOX_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute log directory (overrides RECIPEBOX_LOG_DIR)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    #[command(flatten)]
    Recipe(RecipeCommand),

    /// Collection management commands
    Collection {
        #[command(subcommand)]
        action: CollectionCommand,
    },
}

#[derive(Subcommand)]
enum RecipeCommand {
    /// Add a recipe
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value = "")]
        hashtags: String,
        #[arg(long, default_value_t = 1)]
        servings: u32,
        #[arg(long, default_value_t = 0)]
        hours: u32,
        #[arg(long, default_value_t = 0)]
        minutes: u32,
        /// Easy, Medium or Professional
        #[arg(long)]
        difficulty: Option<Difficulty>,
        #[arg(long = "dish-type")]
        dish_types: Vec<String>,
        #[arg(long = "diet-type")]
        diet_types: Vec<String>,
        #[arg(long)]
        image_uri: Option<String>,
        /// Repeat once per ingredient line
        #[arg(long = "ingredient")]
        ingredients: Vec<String>,
        /// Repeat once per step, in order
        #[arg(long = "step")]
        steps: Vec<String>,
    },

    /// Print one recipe
    Show { id: i64 },

    /// Change fields of a stored recipe; omitted flags keep their value
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        hashtags: Option<String>,
        #[arg(long)]
        servings: Option<u32>,
        #[arg(long)]
        hours: Option<u32>,
        #[arg(long)]
        minutes: Option<u32>,
        #[arg(long, conflicts_with = "clear_difficulty")]
        difficulty: Option<Difficulty>,
        #[arg(long)]
        clear_difficulty: bool,
        /// Replaces the ingredient list when given
        #[arg(long = "ingredient")]
        ingredients: Vec<String>,
        /// Replaces the step list when given
        #[arg(long = "step")]
        steps: Vec<String>,
    },

    /// List all recipes, newest first
    List,

    /// Filter and sort recipes
    Search {
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long)]
        difficulty: Option<Difficulty>,
        #[arg(long = "dish-type")]
        dish_types: Vec<String>,
        #[arg(long, default_value_t = recipebox_core::search::DEFAULT_MAX_COOK_TIME_MINUTES)]
        max_cook_time: u32,
        /// title, difficulty, cook_time, recent or servings
        #[arg(long, default_value = "title")]
        sort: SortOption,
    },

    /// Full-text prefix search over title, description and hashtags
    Find { text: String },

    /// Print recipe statistics
    Stats,

    /// Delete a recipe
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum CollectionCommand {
    /// Create an empty collection
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// List collections with recipe counts
    List,

    /// Print one collection and its recipes
    Show { id: i64 },

    /// Rename a collection
    Rename {
        id: i64,
        name: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a collection (recipes are kept)
    Delete { id: i64 },

    /// Add a recipe to a collection
    Add { collection_id: i64, recipe_id: i64 },

    /// Remove a recipe from a collection
    Remove { collection_id: i64, recipe_id: i64 },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let mut config = CoreConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(dir) = cli.log_dir {
        config.log_dir = Some(dir);
    }

    if let Some(dir) = &config.log_dir {
        init_logging(&config.log_level, dir)?;
    }

    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = open_db(&config.db_path)?;
    info!("event=cli_start module=cli status=ok");

    match cli.command {
        Command::Collection { action } => {
            let service = CollectionService::new(SqliteCollectionRepository::try_new(&db)?);
            run_collection(&service, action)
        }
        Command::Recipe(command) => {
            let service = RecipeService::new(SqliteRecipeRepository::try_new(&db)?);
            run_recipe(&service, command)
        }
    }
}

fn run_recipe(
    service: &RecipeService<SqliteRecipeRepository<'_>>,
    command: RecipeCommand,
) -> CliResult<()> {
    match command {
        RecipeCommand::Add {
            title,
            description,
            hashtags,
            servings,
            hours,
            minutes,
            difficulty,
            dish_types,
            diet_types,
            image_uri,
            ingredients,
            steps,
        } => {
            let id = service.add_recipe(NewRecipe {
                title,
                description,
                hashtags,
                servings,
                cook_time: CookTime::new(hours, minutes),
                difficulty,
                dish_types: dish_types.into_iter().collect(),
                diet_types: diet_types.into_iter().collect(),
                image_uri,
                ingredients,
                steps,
            })?;
            println!("created recipe {id}");
        }
        RecipeCommand::Show { id } => print_recipe_detail(&service.get_recipe_by_id(id)?),
        RecipeCommand::Edit {
            id,
            title,
            description,
            hashtags,
            servings,
            hours,
            minutes,
            difficulty,
            clear_difficulty,
            ingredients,
            steps,
        } => {
            let mut recipe = service.get_recipe_by_id(id)?;
            if let Some(title) = title {
                recipe.title = title;
            }
            if let Some(description) = description {
                recipe.description = description;
            }
            if let Some(hashtags) = hashtags {
                recipe.hashtags = hashtags;
            }
            if let Some(servings) = servings {
                recipe.servings = servings;
            }
            if let Some(hours) = hours {
                recipe.cook_time.hours = hours;
            }
            if let Some(minutes) = minutes {
                recipe.cook_time.minutes = minutes;
            }
            if clear_difficulty {
                recipe.difficulty = None;
            } else if difficulty.is_some() {
                recipe.difficulty = difficulty;
            }
            if !ingredients.is_empty() {
                recipe.ingredients = ingredients
                    .into_iter()
                    .map(|name| Ingredient::new(name, 0))
                    .collect();
            }
            if !steps.is_empty() {
                recipe.steps = steps
                    .into_iter()
                    .map(|description| Step::new(description, 0))
                    .collect();
            }
            let updated = service.update_recipe(recipe)?;
            println!("updated recipe {}", updated.id);
        }
        RecipeCommand::List => print_recipe_lines(&service.all_recipes()?),
        RecipeCommand::Search {
            query,
            difficulty,
            dish_types,
            max_cook_time,
            sort,
        } => {
            let filters = SearchFilters {
                query,
                difficulty,
                dish_types: dish_types.into_iter().collect(),
                max_cook_time_minutes: max_cook_time,
                sort_by: sort,
            };
            print_recipe_lines(&service.search_recipes(&filters)?);
        }
        RecipeCommand::Find { text } => print_recipe_lines(&service.search_by_query(&text)?),
        RecipeCommand::Stats => {
            let stats = service.recipe_stats()?;
            println!("recipes: {}", stats.total_recipes);
            println!("average cook time: {} min", stats.average_cook_time_minutes);
            for (label, count) in &stats.difficulty_distribution {
                println!("difficulty {label}: {count}");
            }
            for (label, count) in &stats.dish_type_distribution {
                println!("dish type {label}: {count}");
            }
        }
        RecipeCommand::Delete { id } => {
            service.delete_recipe(id)?;
            println!("deleted recipe {id}");
        }
    }
    Ok(())
}

fn run_collection(
    service: &CollectionService<SqliteCollectionRepository<'_>>,
    action: CollectionCommand,
) -> CliResult<()> {
    match action {
        CollectionCommand::Create { name, description } => {
            let id = service.create_collection(&name, &description)?;
            println!("created collection {id}");
        }
        CollectionCommand::List => {
            for collection in service.get_collections()? {
                print_collection_line(&collection);
            }
        }
        CollectionCommand::Show { id } => {
            let collection = service
                .get_collection_by_id(id)?
                .ok_or_else(|| format!("collection not found: {id}"))?;
            print_collection_line(&collection);
            if !collection.description.is_empty() {
                println!("  {}", collection.description);
            }
            print_recipe_lines(&collection.recipes);
        }
        CollectionCommand::Rename {
            id,
            name,
            description,
        } => {
            let mut collection = service
                .get_collection_by_id(id)?
                .ok_or_else(|| format!("collection not found: {id}"))?;
            collection.name = name;
            if let Some(description) = description {
                collection.description = description;
            }
            service.edit_collection(&collection)?;
            println!("updated collection {id}");
        }
        CollectionCommand::Delete { id } => {
            service.delete_collection(id)?;
            println!("deleted collection {id}");
        }
        CollectionCommand::Add {
            collection_id,
            recipe_id,
        } => {
            if service.add_to_collection(recipe_id, collection_id)? {
                println!("added recipe {recipe_id} to collection {collection_id}");
            } else {
                println!("recipe {recipe_id} already in collection {collection_id}");
            }
        }
        CollectionCommand::Remove {
            collection_id,
            recipe_id,
        } => {
            if service.remove_from_collection(recipe_id, collection_id)? {
                println!("removed recipe {recipe_id} from collection {collection_id}");
            } else {
                println!("recipe {recipe_id} was not in collection {collection_id}");
            }
        }
    }
    Ok(())
}

fn print_recipe_lines(recipes: &[Recipe]) {
    if recipes.is_empty() {
        println!("(no recipes)");
        return;
    }
    for recipe in recipes {
        println!(
            "{:>5}  {}  [{} min, {}]",
            recipe.id,
            recipe.title,
            recipe.total_cook_minutes(),
            recipe
                .difficulty
                .map_or("-", |difficulty| difficulty.label())
        );
    }
}

fn print_recipe_detail(recipe: &Recipe) {
    println!("#{} {}", recipe.id, recipe.title);
    println!("{}", recipe.description);
    println!(
        "servings: {}  cook time: {}h{:02}m  difficulty: {}",
        recipe.servings,
        recipe.cook_time.hours,
        recipe.cook_time.minutes,
        recipe
            .difficulty
            .map_or("-", |difficulty| difficulty.label())
    );
    if !recipe.hashtag_list().is_empty() {
        println!("tags: {}", recipe.hashtag_list().join(", "));
    }
    if !recipe.dish_types.is_empty() {
        println!("dish types: {}", join(&recipe.dish_types));
    }
    if !recipe.diet_types.is_empty() {
        println!("diet: {}", join(&recipe.diet_types));
    }
    println!("ingredients:");
    for ingredient in &recipe.ingredients {
        println!("  - {}", ingredient.name);
    }
    println!("steps:");
    for (number, step) in recipe.steps.iter().enumerate() {
        println!("  {}. {}", number + 1, step.description);
    }
}

fn print_collection_line(collection: &RecipeCollection) {
    println!(
        "{:>5}  {}  ({} recipes)",
        collection.id, collection.name, collection.recipe_count
    );
}

fn join<'a>(values: impl IntoIterator<Item = &'a String>) -> String {
    values
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
