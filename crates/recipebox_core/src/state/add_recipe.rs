//! Add-recipe wizard: a linear stepper over the recipe form.
//!
//! # Invariants
//! - Steps run `Details -> Ingredients -> Steps -> Confirm`.
//! - `next()` only advances past a complete step.
//! - `go_to()` jumps to any step; `save()` re-validates the whole form.
//! - Cook time fields always hold two digits; minutes stay within `00..=59`.

use crate::model::recipe::{CookTime, Difficulty, RecipeId};
use crate::repo::recipe_repo::RecipeRepository;
use crate::service::recipe_service::{NewRecipe, RecipeService};
use log::{info, warn};
use std::collections::BTreeSet;
use tokio::sync::watch;

pub const MISSING_FIELDS_MESSAGE: &str = "Please fill in all required fields";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    #[default]
    Details,
    Ingredients,
    Steps,
    Confirm,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        Self::Details,
        Self::Ingredients,
        Self::Steps,
        Self::Confirm,
    ];

    /// Zero-based position in the stepper.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }
}

/// Raw form input as the user typed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeForm {
    pub title: String,
    pub description: String,
    pub hashtags: String,
    pub servings: u32,
    pub cook_time_hours: String,
    pub cook_time_minutes: String,
    pub difficulty: Option<Difficulty>,
    pub dish_types: BTreeSet<String>,
    pub diet_types: BTreeSet<String>,
    /// One entry per input line; starts with a single empty line.
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub image_uri: Option<String>,
}

impl Default for RecipeForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            hashtags: String::new(),
            servings: 1,
            cook_time_hours: "00".to_string(),
            cook_time_minutes: "00".to_string(),
            difficulty: None,
            dish_types: BTreeSet::new(),
            diet_types: BTreeSet::new(),
            ingredients: vec![String::new()],
            steps: vec![String::new()],
            image_uri: None,
        }
    }
}

impl RecipeForm {
    fn has_details(&self) -> bool {
        !self.title.trim().is_empty() && !self.description.trim().is_empty()
    }

    fn has_ingredients(&self) -> bool {
        self.ingredients.iter().any(|line| !line.trim().is_empty())
    }

    fn has_steps(&self) -> bool {
        self.steps.iter().any(|line| !line.trim().is_empty())
    }

    pub fn cook_time(&self) -> CookTime {
        CookTime::new(
            self.cook_time_hours.parse().unwrap_or(0),
            self.cook_time_minutes.parse().unwrap_or(0),
        )
    }

    fn to_request(&self) -> NewRecipe {
        NewRecipe {
            title: self.title.clone(),
            description: self.description.clone(),
            hashtags: self.hashtags.clone(),
            servings: self.servings,
            cook_time: self.cook_time(),
            difficulty: self.difficulty,
            dish_types: self.dish_types.clone(),
            diet_types: self.diet_types.clone(),
            image_uri: self.image_uri.clone(),
            ingredients: self.ingredients.clone(),
            steps: self.steps.clone(),
        }
    }
}

/// Outcome of the save intent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveStatus {
    pub is_loading: bool,
    pub error: Option<String>,
    pub is_success: bool,
    pub created_recipe_id: Option<RecipeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardState {
    pub form: RecipeForm,
    pub step: WizardStep,
    /// Furthest step visited so far.
    pub furthest_step: WizardStep,
    pub status: SaveStatus,
}

impl WizardState {
    fn can_proceed(&self) -> bool {
        match self.step {
            WizardStep::Details => self.form.has_details(),
            WizardStep::Ingredients => self.form.has_ingredients(),
            WizardStep::Steps => self.form.has_steps(),
            WizardStep::Confirm => true,
        }
    }
}

/// State holder behind the add-recipe wizard.
pub struct AddRecipeWizard<R: RecipeRepository> {
    recipes: RecipeService<R>,
    state: watch::Sender<WizardState>,
}

impl<R: RecipeRepository> AddRecipeWizard<R> {
    pub fn new(recipes: RecipeService<R>) -> Self {
        let (state, _) = watch::channel(WizardState::default());
        Self { recipes, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<WizardState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> WizardState {
        self.state.borrow().clone()
    }

    pub fn step(&self) -> WizardStep {
        self.state.borrow().step
    }

    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.update_form(|form| form.title = title);
    }

    pub fn set_description(&self, description: impl Into<String>) {
        let description = description.into();
        self.update_form(|form| form.description = description);
    }

    pub fn set_hashtags(&self, hashtags: impl Into<String>) {
        let hashtags = hashtags.into();
        self.update_form(|form| form.hashtags = hashtags);
    }

    /// Stores servings, raising `0` to `1`.
    pub fn set_servings(&self, servings: u32) {
        self.update_form(|form| form.servings = servings.max(1));
    }

    /// Keeps the first two digits of each field, zero-padded; minutes are
    /// clamped to `59`.
    pub fn set_cook_time(&self, hours: &str, minutes: &str) {
        let hours = two_digits(hours);
        let minutes = two_digits(minutes)
            .parse::<u32>()
            .map_or_else(|_| "00".to_string(), |value| format!("{:02}", value.min(59)));
        self.update_form(|form| {
            form.cook_time_hours = hours;
            form.cook_time_minutes = minutes;
        });
    }

    pub fn set_difficulty(&self, difficulty: Option<Difficulty>) {
        self.update_form(|form| form.difficulty = difficulty);
    }

    pub fn set_dish_types(&self, dish_types: BTreeSet<String>) {
        self.update_form(|form| form.dish_types = dish_types);
    }

    pub fn set_diet_types(&self, diet_types: BTreeSet<String>) {
        self.update_form(|form| form.diet_types = diet_types);
    }

    pub fn set_ingredients(&self, ingredients: Vec<String>) {
        self.update_form(|form| form.ingredients = ingredients);
    }

    pub fn set_steps(&self, steps: Vec<String>) {
        self.update_form(|form| form.steps = steps);
    }

    pub fn set_image_uri(&self, image_uri: Option<String>) {
        self.update_form(|form| form.image_uri = image_uri);
    }

    /// Whether the current step is complete.
    pub fn can_proceed(&self) -> bool {
        self.state.borrow().can_proceed()
    }

    /// Advances one step if the current one is complete.
    pub fn next(&self) -> bool {
        self.state.send_if_modified(|state| {
            let Some(next) = state.step.next() else {
                return false;
            };
            if !state.can_proceed() {
                return false;
            }
            state.step = next;
            state.furthest_step = state.furthest_step.max(next);
            true
        })
    }

    pub fn previous(&self) -> bool {
        self.state.send_if_modified(|state| match state.step.previous() {
            Some(previous) => {
                state.step = previous;
                true
            }
            None => false,
        })
    }

    /// Jumps to any step. Completeness is only enforced by `next()` and
    /// `save()`. Returns whether the step changed.
    pub fn go_to(&self, step: WizardStep) -> bool {
        self.state.send_if_modified(|state| {
            if step == state.step {
                return false;
            }
            state.step = step;
            state.furthest_step = state.furthest_step.max(step);
            true
        })
    }

    /// Whether every required field is filled.
    pub fn validate(&self) -> bool {
        let state = self.state.borrow();
        state.form.has_details() && state.form.has_ingredients() && state.form.has_steps()
    }

    /// Stores the recipe. Returns the new id on success; failures are
    /// reported through `status.error`.
    pub fn save(&self) -> Option<RecipeId> {
        if self.state.borrow().status.is_loading {
            return None;
        }
        if !self.validate() {
            self.state.send_modify(|state| {
                state.status.error = Some(MISSING_FIELDS_MESSAGE.to_string());
            });
            return None;
        }

        let request = self.state.borrow().form.to_request();
        self.state.send_modify(|state| {
            state.status.is_loading = true;
            state.status.error = None;
        });

        match self.recipes.add_recipe(request) {
            Ok(id) => {
                info!("event=wizard_save module=state status=ok recipe_id={id}");
                self.state.send_modify(|state| {
                    state.status.is_loading = false;
                    state.status.is_success = true;
                    state.status.created_recipe_id = Some(id);
                });
                Some(id)
            }
            Err(err) => {
                warn!("event=wizard_save module=state status=error error={err}");
                self.state.send_modify(|state| {
                    state.status.is_loading = false;
                    state.status.error = Some(err.to_string());
                });
                None
            }
        }
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|state| state.status.error = None);
    }

    /// Acknowledges a successful save.
    pub fn consume_success(&self) {
        self.state.send_modify(|state| {
            state.status.is_success = false;
            state.status.created_recipe_id = None;
        });
    }

    /// Clears the form, returns to the first step and resets the status.
    pub fn reset(&self) {
        self.state.send_replace(WizardState::default());
    }

    fn update_form(&self, change: impl FnOnce(&mut RecipeForm)) {
        self.state.send_modify(|state| change(&mut state.form));
    }
}

fn two_digits(raw: &str) -> String {
    let digits = raw
        .chars()
        .filter(char::is_ascii_digit)
        .take(2)
        .collect::<String>();
    format!("{digits:0>2}")
}
