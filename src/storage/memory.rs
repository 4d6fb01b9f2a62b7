use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use anyhow::{Result, anyhow};
use serde_json::Value;

use super::document::{Document, DocumentStore, Query, WriteMode, apply_query, merge_fields};

type Collections = HashMap<String, BTreeMap<String, Value>>;

/// In-memory document store. Backs the test-suite and scratch sessions;
/// every call runs under one lock, which is what makes `remove_batch` and
/// `adjust` atomic here.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.read().expect("store lock poisoned");
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document::new(id, data.clone())))
    }

    async fn put(&self, collection: &str, id: &str, data: Value, mode: WriteMode) -> Result<()> {
        let mut collections = self.collections.write().expect("store lock poisoned");
        let docs = collections.entry(collection.to_string()).or_default();
        match mode {
            WriteMode::Replace => {
                docs.insert(id.to_string(), data);
            }
            WriteMode::Merge => match docs.get_mut(id) {
                Some(existing) => merge_fields(existing, &data),
                None => {
                    docs.insert(id.to_string(), data);
                }
            },
        }
        Ok(())
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<()> {
        let mut collections = self.collections.write().expect("store lock poisoned");
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn query(&self, collection: &str, query: Query) -> Result<Vec<Document>> {
        let collections = self.collections.read().expect("store lock poisoned");
        let docs = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document::new(id.clone(), data.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(apply_query(docs, &query))
    }

    async fn remove_batch(&self, collection: &str, ids: &[String]) -> Result<()> {
        let mut collections = self.collections.write().expect("store lock poisoned");
        if let Some(docs) = collections.get_mut(collection) {
            for id in ids {
                docs.remove(id);
            }
        }
        Ok(())
    }

    async fn adjust(&self, collection: &str, id: &str, deltas: &[(&str, i64)]) -> Result<()> {
        let mut collections = self.collections.write().expect("store lock poisoned");
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| anyhow!("no document {collection}/{id} to adjust"))?;
        let fields = doc
            .as_object_mut()
            .ok_or_else(|| anyhow!("document {collection}/{id} is not a field map"))?;
        for (field, delta) in deltas {
            let current = fields.get(*field).and_then(Value::as_i64).unwrap_or(0);
            fields.insert(field.to_string(), Value::from(current + delta));
        }
        Ok(())
    }
}
