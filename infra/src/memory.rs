//! A process-local container, used for development and tests.
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use log::*;
use serde::{de::DeserializeOwned, Serialize};

use crate::documents::{HasMeta, PartitionKey, Partitioned};
use crate::ids::{Entity, Id, IdGen};
use crate::persistence::{Storage, StoreError};

type Items = BTreeMap<(PartitionKey, String), serde_json::Value>;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Arc<Mutex<Items>>,
    idgen: IdGen,
}

/// Hands out handles onto one shared [`MemoryStore`].
#[derive(Debug, Default)]
pub struct MemoryConnectionManager {
    store: MemoryStore,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> Result<MutexGuard<Items>, StoreError> {
        self.items.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl Storage for MemoryStore {
    fn setup<D: Entity + Partitioned>(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn read_all<D: DeserializeOwned + Entity>(&self) -> Result<Vec<D>, StoreError> {
        let items = self.items()?;
        trace!("read_all: {} items", items.len());
        items
            .values()
            .map(|json| serde_json::from_value(json.clone()).map_err(StoreError::Encoding))
            .collect()
    }

    fn create<D>(&self, document: &mut D) -> Result<D, StoreError>
    where
        D: Serialize + DeserializeOwned + HasMeta + Partitioned,
    {
        if document.meta().id.is_unassigned() {
            document.meta_mut().id = self.idgen.generate();
        }
        let key = (
            document.partition_key(),
            document.meta().id.as_str().to_string(),
        );
        let json = serde_json::to_value(&*document).map_err(StoreError::Encoding)?;

        let mut items = self.items()?;
        if items.contains_key(&key) {
            warn!("Create of existing document {:?}", key);
            return Err(StoreError::Conflict);
        }
        debug!("Create {:?}", key);
        items.insert(key, json.clone());

        serde_json::from_value(json).map_err(StoreError::Encoding)
    }

    fn replace<D>(&self, document: &D) -> Result<D, StoreError>
    where
        D: Serialize + DeserializeOwned + HasMeta + Partitioned,
    {
        let key = (
            document.partition_key(),
            document.meta().id.as_str().to_string(),
        );
        let json = serde_json::to_value(document).map_err(StoreError::Encoding)?;

        let mut items = self.items()?;
        match items.get_mut(&key) {
            Some(slot) => {
                debug!("Replace {:?}", key);
                *slot = json.clone();
            }
            None => {
                debug!("Replace of missing document {:?}", key);
                return Err(StoreError::NotFound);
            }
        }

        serde_json::from_value(json).map_err(StoreError::Encoding)
    }

    fn delete<D: Entity>(&self, id: &Id<D>, partition: &PartitionKey) -> Result<(), StoreError> {
        let key = (partition.clone(), id.as_str().to_string());
        let mut items = self.items()?;
        match items.remove(&key) {
            Some(_) => {
                debug!("Delete {:?}", key);
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }
}

impl MemoryConnectionManager {
    pub fn new(store: MemoryStore) -> Self {
        MemoryConnectionManager { store }
    }
}

impl r2d2::ManageConnection for MemoryConnectionManager {
    type Connection = MemoryStore;
    type Error = StoreError;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        Ok(self.store.clone())
    }

    fn is_valid(&self, _: &mut Self::Connection) -> Result<(), Self::Error> {
        Ok(())
    }

    fn has_broken(&self, _: &mut Self::Connection) -> bool {
        false
    }
}
