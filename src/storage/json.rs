use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use super::document::{Document, DocumentStore, Query, WriteMode, apply_query, merge_fields};

type Collections = HashMap<String, BTreeMap<String, Value>>;

/// Document store persisted as a single JSON file, giving the CLI a local
/// backend with the same semantics the remote store offers. Mutations are
/// written through under one lock via a temp-file rename, so a crash leaves
/// either the old or the new state on disk, never a torn file.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    collections: Mutex<Collections>,
}

impl JsonStore {
    /// Open a store file, creating an empty store if the file is absent.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let collections = if path.exists() {
            let raw = fs::read(&path)
                .with_context(|| format!("failed to read store file {}", path.display()))?;
            serde_json::from_slice(&raw)
                .with_context(|| format!("store file {} is not valid JSON", path.display()))?
        } else {
            Collections::new()
        };
        Ok(Self {
            path,
            collections: Mutex::new(collections),
        })
    }

    fn persist(&self, collections: &Collections) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        let raw = serde_json::to_vec_pretty(collections).context("failed to encode store")?;
        fs::write(&tmp, raw).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl DocumentStore for JsonStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.lock().expect("store lock poisoned");
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document::new(id, data.clone())))
    }

    async fn put(&self, collection: &str, id: &str, data: Value, mode: WriteMode) -> Result<()> {
        let mut collections = self.collections.lock().expect("store lock poisoned");
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
        self.persist(&collections)
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<()> {
        let mut collections = self.collections.lock().expect("store lock poisoned");
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        self.persist(&collections)
    }

    async fn query(&self, collection: &str, query: Query) -> Result<Vec<Document>> {
        let collections = self.collections.lock().expect("store lock poisoned");
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
        let mut collections = self.collections.lock().expect("store lock poisoned");
        if let Some(docs) = collections.get_mut(collection) {
            for id in ids {
                docs.remove(id);
            }
        }
        self.persist(&collections)
    }

    async fn adjust(&self, collection: &str, id: &str, deltas: &[(&str, i64)]) -> Result<()> {
        let mut collections = self.collections.lock().expect("store lock poisoned");
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
        self.persist(&collections)
    }
}
