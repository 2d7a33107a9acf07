use std::collections::BTreeMap;

use anyhow::{Context, Result};
use filtermix_core::OperationRepresentation;
use tracing::{info, warn};

use crate::store::KeyValueStore;

/// Key holding the whole `{name: representation}` map.
pub const REPRESENTATIONS_KEY: &str = "representations";

/// Named filter stacks saved by the user.
pub struct RepresentationLibrary<S> {
    store: S,
}

impl<S: KeyValueStore> RepresentationLibrary<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Every saved representation. A stored map that fails to decode reads
    /// as empty.
    pub fn all(&self) -> Result<BTreeMap<String, OperationRepresentation>> {
        let Some(bytes) = self.store.get(REPRESENTATIONS_KEY)? else {
            return Ok(BTreeMap::new());
        };
        match serde_json::from_slice(&bytes) {
            Ok(map) => Ok(map),
            Err(err) => {
                warn!(%err, "stored representations are unreadable, treating as empty");
                Ok(BTreeMap::new())
            }
        }
    }

    pub fn names(&self) -> Result<Vec<String>> {
        Ok(self.all()?.into_keys().collect())
    }

    /// Save under `name`, replacing any representation already there.
    pub fn save(&mut self, name: &str, representation: &OperationRepresentation) -> Result<()> {
        let mut all = self.all()?;
        all.insert(name.to_owned(), representation.clone());
        self.write(&all)?;
        info!(name, items = representation.items.len(), "saved representation");
        Ok(())
    }

    pub fn load(&self, name: &str) -> Result<Option<OperationRepresentation>> {
        Ok(self.all()?.remove(name))
    }

    /// Returns whether anything was removed.
    pub fn delete(&mut self, name: &str) -> Result<bool> {
        let mut all = self.all()?;
        if all.remove(name).is_none() {
            return Ok(false);
        }
        self.write(&all)?;
        info!(name, "deleted representation");
        Ok(true)
    }

    fn write(&mut self, all: &BTreeMap<String, OperationRepresentation>) -> Result<()> {
        let bytes = serde_json::to_vec(all).context("failed to encode representations")?;
        self.store.set(REPRESENTATIONS_KEY, &bytes)
    }
}
