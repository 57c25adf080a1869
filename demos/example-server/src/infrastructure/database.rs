use nestrs::prelude::*;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// In-memory table store keyed by `"{table}:{id}"`.
#[derive(Injectable)]
pub struct Database {
    #[inject(default = "RwLock::new(HashMap::new())")]
    storage: RwLock<HashMap<String, String>>,
}

impl Database {
    pub fn insert(&self, table: &str, id: &str, data: String) {
        let mut storage = self.storage.write().unwrap_or_else(PoisonError::into_inner);
        storage.insert(format!("{}:{}", table, id), data);
    }

    pub fn get(&self, table: &str, id: &str) -> Option<String> {
        let storage = self.storage.read().unwrap_or_else(PoisonError::into_inner);
        storage.get(&format!("{}:{}", table, id)).cloned()
    }

    pub fn remove(&self, table: &str, id: &str) -> Option<String> {
        let mut storage = self.storage.write().unwrap_or_else(PoisonError::into_inner);
        storage.remove(&format!("{}:{}", table, id))
    }

    pub fn scan(&self, table: &str) -> Vec<String> {
        let storage = self.storage.read().unwrap_or_else(PoisonError::into_inner);
        let prefix = format!("{}:", table);
        storage
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .map(|(_, v)| v.clone())
            .collect()
    }
}

#[module(providers = [Database], exports = [Database], global = true)]
pub struct DatabaseModule;
