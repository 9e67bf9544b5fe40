use serde::{Deserialize, Serialize};
use serde_json::Value;

use infra::documents::{DocMeta, HasMeta, PartitionKey, Partitioned};
use infra::ids::{Entity, Id};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    #[serde(flatten)]
    pub meta: DocMeta<Recipe>,
    pub name: String,
    pub course: String,
    pub ingredients: String,
    pub instructions: String,
}

/// The body of a create or replace: a recipe without its id.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RecipeDraft {
    pub name: String,
    pub course: String,
    pub ingredients: String,
    pub instructions: String,
}

/// Any scalar is accepted as the course; numbers and `true` are used in
/// their JSON text form.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct DeleteRequest {
    #[serde(default)]
    pub course: Option<Value>,
}

impl Recipe {
    pub fn new(draft: RecipeDraft) -> Self {
        Self::with_id(Id::default(), draft)
    }

    pub fn with_id(id: Id<Recipe>, draft: RecipeDraft) -> Self {
        let RecipeDraft {
            name,
            course,
            ingredients,
            instructions,
        } = draft;
        Recipe {
            meta: DocMeta::new_with_id(id),
            name,
            course,
            ingredients,
            instructions,
        }
    }

    pub fn id(&self) -> &Id<Recipe> {
        &self.meta.id
    }
}

impl DeleteRequest {
    /// Empty, zero, `false` and `null` count as missing, as do arrays and
    /// objects.
    pub fn partition(&self) -> Option<PartitionKey> {
        match self.course.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(PartitionKey::new(s.as_str())),
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(PartitionKey::new(n.to_string())),
            Value::Bool(true) => Some(PartitionKey::new("true")),
            _ => None,
        }
    }
}

impl Entity for Recipe {
    const PREFIX: &'static str = "recipe";
}

impl HasMeta for Recipe {
    fn meta(&self) -> &DocMeta<Self> {
        &self.meta
    }
    fn meta_mut(&mut self) -> &mut DocMeta<Self> {
        &mut self.meta
    }
}

impl Partitioned for Recipe {
    const PARTITION_PATH: &'static str = "/course";

    fn partition_key(&self) -> PartitionKey {
        PartitionKey::new(self.course.as_str())
    }
}
