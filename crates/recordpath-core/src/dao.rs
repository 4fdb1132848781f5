//! Collection lookup.
//!
//! The data-access layer itself (schema storage, migrations, the actual
//! database) is an external collaborator out of scope for this crate; all
//! the resolver needs is a synchronous, case-insensitive lookup by name or
//! id. `InMemoryDao` is a test double in the same spirit as the
//! workspace's `SchemaCache`, minus the asynchronous Postgres introspection
//! that crate does -- this resolver's own I/O contract is a synchronous
//! call into the enclosing layer; it never suspends or blocks otherwise.

use crate::error::{Error, Result};
use crate::schema::Collection;
use std::collections::HashMap;

/// Loads a [`Collection`] by name or id.
pub trait Dao {
    fn find_collection_by_name_or_id(&self, name_or_id: &str) -> Result<Collection>;
}

/// An in-memory `Dao` used by tests and by hosts that keep their whole
/// schema resident in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDao {
    by_id: HashMap<String, Collection>,
    by_name: HashMap<String, Collection>,
}

impl InMemoryDao {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, collection: Collection) -> Self {
        self.by_id
            .insert(collection.id.to_lowercase(), collection.clone());
        self.by_name
            .insert(collection.name.to_lowercase(), collection);
        self
    }
}

impl Dao for InMemoryDao {
    fn find_collection_by_name_or_id(&self, name_or_id: &str) -> Result<Collection> {
        let key = name_or_id.to_lowercase();
        self.by_name
            .get(&key)
            .or_else(|| self.by_id.get(&key))
            .cloned()
            .ok_or_else(|| Error::UnknownCollection(name_or_id.to_string()))
    }
}
