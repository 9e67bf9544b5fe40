//! The recipe page: one form that either creates or edits, above a card per
//! recipe. Every action posts back and redirects to a freshly listed page.
use serde::{Deserialize, Serialize};

use infra::ids::Id;

use crate::recipes::{Recipe, RecipeDraft};

mod resources;

pub use self::resources::RecipePages;

const CREATE_TITLE: &str = "My Recipe Book";
const EDIT_TITLE: &str = "Edit Recipe";
const CREATE_LABEL: &str = "Add Recipe";
const EDIT_LABEL: &str = "Update Recipe";

/// Whether the form is creating a recipe or editing the one named.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    editing_id: Option<Id<Recipe>>,
}

#[derive(Debug, Serialize)]
struct FormView {
    title: &'static str,
    submit_label: &'static str,
    editing_id: Option<Id<Recipe>>,
    course_locked: bool,
    name: String,
    course: String,
    ingredients: String,
    instructions: String,
}

#[derive(Debug, Serialize)]
struct PageView {
    form: FormView,
    recipes: Vec<Recipe>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    edit: Option<String>,
}

/// The posted recipe form.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecipeForm {
    #[serde(default)]
    pub editing_id: Option<String>,
    pub name: String,
    pub course: String,
    pub ingredients: String,
    pub instructions: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub course: String,
}

#[derive(Debug, PartialEq, Eq)]
enum Submission {
    Create(RecipeDraft),
    Update(Id<Recipe>, RecipeDraft),
}

impl FormState {
    pub fn create() -> Self {
        FormState { editing_id: None }
    }

    pub fn editing(id: Id<Recipe>) -> Self {
        FormState {
            editing_id: Some(id),
        }
    }

    pub fn editing_id(&self) -> Option<&Id<Recipe>> {
        self.editing_id.as_ref()
    }
}

impl From<&PageQuery> for FormState {
    fn from(query: &PageQuery) -> Self {
        match query.edit.as_ref().and_then(|s| s.parse().ok()) {
            Some(id) => FormState::editing(id),
            None => FormState::create(),
        }
    }
}

impl FormView {
    fn create() -> Self {
        FormView {
            title: CREATE_TITLE,
            submit_label: CREATE_LABEL,
            editing_id: None,
            course_locked: false,
            name: String::new(),
            course: String::new(),
            ingredients: String::new(),
            instructions: String::new(),
        }
    }

    fn edit(recipe: &Recipe) -> Self {
        FormView {
            title: EDIT_TITLE,
            submit_label: EDIT_LABEL,
            editing_id: Some(recipe.id().clone()),
            course_locked: true,
            name: recipe.name.clone(),
            course: recipe.course.clone(),
            ingredients: recipe.ingredients.clone(),
            instructions: recipe.instructions.clone(),
        }
    }

    /// Keeps what was typed after a submission failed.
    fn refill(form: &RecipeForm) -> Self {
        let editing_id = form.editing_id();
        let (title, submit_label) = match editing_id {
            Some(_) => (EDIT_TITLE, EDIT_LABEL),
            None => (CREATE_TITLE, CREATE_LABEL),
        };
        FormView {
            title,
            submit_label,
            course_locked: editing_id.is_some(),
            editing_id,
            name: form.name.clone(),
            course: form.course.clone(),
            ingredients: form.ingredients.clone(),
            instructions: form.instructions.clone(),
        }
    }
}

impl PageView {
    /// Falls back to create mode when the edited recipe is not listed.
    fn new(state: &FormState, recipes: Vec<Recipe>) -> Self {
        let form = state
            .editing_id()
            .and_then(|id| recipes.iter().find(|r| r.id() == id))
            .map(FormView::edit)
            .unwrap_or_else(FormView::create);
        PageView { form, recipes }
    }

    fn refilled(form: &RecipeForm, recipes: Vec<Recipe>) -> Self {
        PageView {
            form: FormView::refill(form),
            recipes,
        }
    }
}

impl RecipeForm {
    /// An empty or unparseable `editing_id` means the form creates.
    fn editing_id(&self) -> Option<Id<Recipe>> {
        self.editing_id.as_ref().and_then(|s| s.parse().ok())
    }

    fn into_submission(self) -> Submission {
        let editing_id = self.editing_id();
        let RecipeForm {
            name,
            course,
            ingredients,
            instructions,
            ..
        } = self;
        let draft = RecipeDraft {
            name,
            course,
            ingredients,
            instructions,
        };
        match editing_id {
            Some(id) => Submission::Update(id, draft),
            None => Submission::Create(draft),
        }
    }
}
