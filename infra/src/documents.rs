use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::ids::{Entity, Id};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
#[serde(bound = "")]
pub struct DocMeta<T> {
    #[serde(default, skip_serializing_if = "Id::is_unassigned")]
    pub id: Id<T>,
    #[serde(skip)]
    pub _phantom: PhantomData<T>,
}

/// The value a document is physically partitioned by. The store needs it
/// alongside the id to address a single document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct PartitionKey(String);

pub trait HasMeta: Entity + Sized {
    fn meta(&self) -> &DocMeta<Self>;
    fn meta_mut(&mut self) -> &mut DocMeta<Self>;
}

pub trait Partitioned {
    /// JSON path of the partitioning property, e.g. `/course`.
    const PARTITION_PATH: &'static str;
    fn partition_key(&self) -> PartitionKey;
}

impl<T> Default for DocMeta<T> {
    fn default() -> Self {
        DocMeta {
            id: Default::default(),
            _phantom: PhantomData,
        }
    }
}

impl<T> DocMeta<T> {
    pub fn new_with_id(id: Id<T>) -> Self {
        DocMeta {
            id,
            ..Default::default()
        }
    }
}

impl PartitionKey {
    pub fn new<S: Into<String>>(value: S) -> Self {
        PartitionKey(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(&self.0)
    }
}
