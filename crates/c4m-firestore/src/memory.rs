//! In-memory document store for local runs and tests.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::{FirestoreError, FirestoreResult};
use crate::store::{Condition, Direction, DocumentStore, FilterOp, Query};
use crate::types::{Document, Fields, Value};

/// Collections keyed by name, documents kept in id order.
#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Fields>>>,
    fail_deletes: AtomicBool,
    fail_all: AtomicBool,
    latency: RwLock<Option<Duration>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every delete fail with `Unavailable`.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, AtomicOrdering::SeqCst);
    }

    /// Make every operation fail with `Unavailable`.
    pub fn set_fail_all(&self, fail: bool) {
        self.fail_all.store(fail, AtomicOrdering::SeqCst);
    }

    /// Delay every operation by `latency`.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write().await = latency;
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.len())
            .unwrap_or(0)
    }

    async fn before_op(&self) -> FirestoreResult<()> {
        let latency = *self.latency.read().await;
        if let Some(delay) = latency {
            tokio::time::sleep(delay).await;
        }
        if self.fail_all.load(AtomicOrdering::SeqCst) {
            return Err(FirestoreError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }

    fn document(collection: &str, id: &str, fields: &Fields) -> Document {
        Document::named(format!("memory/{}/{}", collection, id), fields.clone())
    }
}

/// Ordering between two stored values of the same kind.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::StringValue(x), Value::StringValue(y)) => Some(x.cmp(y)),
        (Value::BooleanValue(x), Value::BooleanValue(y)) => Some(x.cmp(y)),
        (Value::IntegerValue(x), Value::IntegerValue(y)) => {
            Some(x.parse::<i64>().ok()?.cmp(&y.parse::<i64>().ok()?))
        }
        (Value::DoubleValue(x), Value::DoubleValue(y)) => x.partial_cmp(y),
        (Value::TimestampValue(x), Value::TimestampValue(y)) => {
            let x: DateTime<Utc> = DateTime::parse_from_rfc3339(x).ok()?.into();
            let y: DateTime<Utc> = DateTime::parse_from_rfc3339(y).ok()?.into();
            Some(x.cmp(&y))
        }
        _ => None,
    }
}

fn matches(fields: &Fields, condition: &Condition) -> bool {
    let Some(value) = fields.get(&condition.field) else {
        return false;
    };
    match condition.op {
        FilterOp::Equal => compare(value, &condition.value) == Some(Ordering::Equal),
        FilterOp::LessThan => compare(value, &condition.value) == Some(Ordering::Less),
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(&self, collection: &str, id: &str) -> FirestoreResult<Option<Document>> {
        self.before_op().await?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|c| c.get(id))
            .map(|fields| Self::document(collection, id, fields)))
    }

    async fn create(&self, collection: &str, id: &str, fields: Fields) -> FirestoreResult<Document> {
        self.before_op().await?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            return Err(FirestoreError::AlreadyExists(format!("{}/{}", collection, id)));
        }
        let doc = Self::document(collection, id, &fields);
        docs.insert(id.to_string(), fields);
        Ok(doc)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        mask: Option<Vec<String>>,
    ) -> FirestoreResult<Document> {
        self.before_op().await?;
        let mut collections = self.collections.write().await;
        let existing = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| FirestoreError::not_found(format!("{}/{}", collection, id)))?;

        match mask {
            Some(paths) => {
                for path in paths {
                    match fields.get(&path) {
                        Some(value) => {
                            existing.insert(path, value.clone());
                        }
                        None => {
                            existing.remove(&path);
                        }
                    }
                }
            }
            None => *existing = fields,
        }

        Ok(Self::document(collection, id, existing))
    }

    async fn delete(&self, collection: &str, id: &str) -> FirestoreResult<()> {
        self.before_op().await?;
        if self.fail_deletes.load(AtomicOrdering::SeqCst) {
            return Err(FirestoreError::Unavailable("injected delete failure".to_string()));
        }
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn query(&self, collection: &str, query: Query) -> FirestoreResult<Vec<Document>> {
        self.before_op().await?;
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<(&String, &Fields)> = docs
            .iter()
            .filter(|(_, fields)| query.conditions.iter().all(|c| matches(fields, c)))
            .collect();

        if let Some((field, direction)) = &query.order_by {
            // Documents without the order field are dropped, as Firestore does.
            hits.retain(|(_, fields)| fields.contains_key(field));
            hits.sort_by(|(_, a), (_, b)| {
                let ord = match (a.get(field), b.get(field)) {
                    (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
                    _ => Ordering::Equal,
                };
                match direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }

        let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(hits
            .into_iter()
            .take(limit)
            .map(|(id, fields)| Self::document(collection, id, fields))
            .collect())
    }
}
