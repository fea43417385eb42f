//! Named factory registries for matrix adapters and solver engines.
//!
//! Names are normalized (lowercased, trimmed); registration is one-shot per
//! name and `get` builds a fresh instance per call, so plugins never share
//! per-request state. Factories are held instead of instances to keep
//! registration free of initialization cycles.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};

type Factory<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// Case-insensitive name → zero-argument factory map.
pub struct Registry<T> {
    kind: &'static str,
    entries: RwLock<HashMap<String, Factory<T>>>,
}

impl<T> Registry<T> {
    pub fn new(kind: &'static str) -> Self {
        Registry {
            kind,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn normalize(name: &str) -> String {
        name.trim().to_lowercase()
    }

    /// Bind `name` to `factory`. Fails if the name is already bound.
    pub fn register<F>(&self, name: &str, factory: F) -> Result<()>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let key = Self::normalize(name);
        let mut entries = self.entries.write();
        if entries.contains_key(&key) {
            return Err(Error::InvalidInput(format!(
                "{} '{}' is already registered",
                self.kind, name
            )));
        }
        entries.insert(key, Arc::new(factory));
        Ok(())
    }

    /// Build a fresh instance for `name`.
    pub fn get(&self, name: &str) -> Result<T> {
        let key = Self::normalize(name);
        let entries = self.entries.read();
        match entries.get(&key) {
            Some(factory) => Ok(factory()),
            None => Err(Error::UnknownPlugin(format!(
                "{} '{}' is not registered",
                self.kind, name
            ))),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(&Self::normalize(name))
    }

    /// Registered names in lexicographic order.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }
}
