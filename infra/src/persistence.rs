use err_derive::Error;
use serde::{de::DeserializeOwned, Serialize};

use crate::documents::{HasMeta, PartitionKey, Partitioned};
use crate::ids::{Entity, Id};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(display = "document not found")]
    NotFound,
    #[error(display = "document already exists")]
    Conflict,
    #[error(display = "store replied {}: {}", status, body)]
    Remote {
        status: u16,
        body: serde_json::Value,
    },
    #[error(display = "store transport: {}", _0)]
    Transport(#[error(source)] reqwest::Error),
    #[error(display = "document encoding: {}", _0)]
    Encoding(#[error(source)] serde_json::Error),
    #[error(display = "invalid store credentials: {}", _0)]
    Credentials(String),
    #[error(display = "store lock poisoned")]
    Poisoned,
}

/// Item operations over a single container of documents.
///
/// Point operations are addressed by id and partition key; listing reads
/// every partition.
pub trait Storage {
    /// Creates the container (and whatever encloses it) when missing.
    fn setup<D: Entity + Partitioned>(&self) -> Result<(), StoreError>;

    fn read_all<D: DeserializeOwned + Entity>(&self) -> Result<Vec<D>, StoreError>;

    /// Assigns an id when the document has none, then inserts it.
    fn create<D>(&self, document: &mut D) -> Result<D, StoreError>
    where
        D: Serialize + DeserializeOwned + HasMeta + Partitioned;

    /// Replaces the document at its own (id, partition key). Never inserts.
    fn replace<D>(&self, document: &D) -> Result<D, StoreError>
    where
        D: Serialize + DeserializeOwned + HasMeta + Partitioned;

    fn delete<D: Entity>(&self, id: &Id<D>, partition: &PartitionKey) -> Result<(), StoreError>;
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        match self {
            StoreError::NotFound => true,
            _ => false,
        }
    }
}
