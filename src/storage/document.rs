use std::cmp::Ordering;
use std::future::Future;

use anyhow::Result;
use serde_json::Value;

/// A stored document: its id plus the raw field map.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the whole document.
    Replace,
    /// Shallow-merge the supplied top-level fields into the existing
    /// document, creating it if absent. Unsupplied fields keep their values.
    Merge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Equality filters plus optional ordering and a page limit — the only query
/// shapes the services need from the store.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filters: Vec<(String, Value)>,
    pub order_by: Option<(String, SortDirection)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn ordered_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// The remote document database the services write through, reduced to the
/// client-SDK surface the ledger actually uses.
///
/// Consistency contract: single-document writes are last-write-wins,
/// `remove_batch` is all-or-nothing for its id set, and `adjust` is the
/// store's transactional numeric read-modify-write, so concurrent deltas to
/// one document do not lose increments.
pub trait DocumentStore: Send + Sync + 'static {
    fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<Document>>> + Send;

    fn put(
        &self,
        collection: &str,
        id: &str,
        data: Value,
        mode: WriteMode,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete one document. Deleting an absent document succeeds.
    fn remove(&self, collection: &str, id: &str) -> impl Future<Output = Result<()>> + Send;

    fn query(
        &self,
        collection: &str,
        query: Query,
    ) -> impl Future<Output = Result<Vec<Document>>> + Send;

    /// Atomically delete every listed document.
    fn remove_batch(
        &self,
        collection: &str,
        ids: &[String],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Atomically add the given deltas to numeric fields of one document.
    /// Fails if the document does not exist; missing fields start at zero.
    fn adjust(
        &self,
        collection: &str,
        id: &str,
        deltas: &[(&str, i64)],
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Shallow-merge `patch`'s top-level fields into `target`.
pub(crate) fn merge_fields(target: &mut Value, patch: &Value) {
    if let (Value::Object(target), Value::Object(patch)) = (target, patch) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// Filter, order and page an unfiltered document set according to `query`.
/// Backends without native query support evaluate queries with this.
pub(crate) fn apply_query(mut docs: Vec<Document>, query: &Query) -> Vec<Document> {
    docs.retain(|doc| {
        query
            .filters
            .iter()
            .all(|(field, expected)| doc.data.get(field) == Some(expected))
    });

    if let Some((field, direction)) = &query.order_by {
        docs.sort_by(|a, b| {
            let ord = compare_values(a.data.get(field), b.data.get(field));
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
    }

    if let Some(limit) = query.limit {
        docs.truncate(limit);
    }
    docs
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}
