//! In-memory vector store for tests.
//!
//! Brute-force cosine search over named vectors, with knobs to slow down or
//! fail collection creation so concurrent and racing callers can be
//! exercised without a Qdrant server.

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{Payload, PayloadSchemaType, PointStruct, QueryRequest, ScoredPoint, VectorParams, VectorStore};

#[derive(Debug, Default)]
struct Collection {
    vectors: BTreeMap<String, VectorParams>,
    points: Vec<PointStruct>,
    indexes: BTreeMap<String, PayloadSchemaType>,
}

#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    collections: Mutex<HashMap<String, Collection>>,
    create_calls: AtomicUsize,
    create_delay: Option<Duration>,
    /// Collections that "appear" between the existence check and creation
    conflicting: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Sleep inside `create_collection` to widen race windows.
    pub(crate) fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    /// Make the next creation of `name` behave as if another process won the race.
    pub(crate) fn with_conflict_on(self, name: &str) -> Self {
        self.lock_conflicts().push(name.to_string());
        self
    }

    pub(crate) fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn point_count(&self, collection: &str) -> usize {
        self.lock().get(collection).map_or(0, |c| c.points.len())
    }

    pub(crate) fn vectors_of(&self, collection: &str) -> Option<BTreeMap<String, VectorParams>> {
        self.lock().get(collection).map(|c| c.vectors.clone())
    }

    pub(crate) fn indexes_of(&self, collection: &str) -> BTreeMap<String, PayloadSchemaType> {
        self.lock().get(collection).map(|c| c.indexes.clone()).unwrap_or_default()
    }

    pub(crate) fn payloads_of(&self, collection: &str) -> Vec<Payload> {
        self.lock()
            .get(collection)
            .map(|c| c.points.iter().map(|p| p.payload.clone()).collect())
            .unwrap_or_default()
    }

    /// Insert a raw point, bypassing validation, to simulate foreign writers.
    pub(crate) fn insert_raw(&self, collection: &str, point: PointStruct) {
        self.lock().entry(collection.to_string()).or_default().points.push(point);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Collection>> {
        self.collections.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_conflicts(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.conflicting.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn not_found(name: &str) -> Error {
        Error::Store {
            status: Some(404),
            message: format!("Collection `{name}` doesn't exist!"),
        }
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}

/// Supports `{"must": [{"key": "a.b", "match": {"value": v}}]}` only.
fn matches_filter(payload: &Payload, filter: Option<&Value>) -> bool {
    let Some(conditions) = filter.and_then(|f| f.get("must")).and_then(Value::as_array) else {
        return true;
    };
    conditions.iter().all(|cond| {
        let (Some(key), Some(expected)) = (
            cond.get("key").and_then(Value::as_str),
            cond.pointer("/match/value"),
        ) else {
            return false;
        };
        let mut current = payload.get(key.split('.').next().unwrap_or(key));
        for part in key.split('.').skip(1) {
            current = current.and_then(|v| v.get(part));
        }
        current == Some(expected)
    })
}

impl VectorStore for MemoryStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.lock().contains_key(name))
    }

    async fn create_collection(&self, name: &str, vectors: &BTreeMap<String, VectorParams>) -> Result<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }

        let raced = {
            let mut conflicts = self.lock_conflicts();
            let before = conflicts.len();
            conflicts.retain(|c| c != name);
            conflicts.len() != before
        };

        let mut collections = self.lock();
        if raced || collections.contains_key(name) {
            collections.entry(name.to_string()).or_insert_with(|| Collection {
                vectors: vectors.clone(),
                ..Collection::default()
            });
            return Err(Error::Store {
                status: Some(409),
                message: format!("Wrong input: Collection `{name}` already exists!"),
            });
        }

        collections.insert(
            name.to_string(),
            Collection {
                vectors: vectors.clone(),
                ..Collection::default()
            },
        );
        Ok(())
    }

    async fn create_payload_index(
        &self,
        collection: &str,
        field: &str,
        schema: PayloadSchemaType,
    ) -> Result<()> {
        let mut collections = self.lock();
        let target = collections.get_mut(collection).ok_or_else(|| Self::not_found(collection))?;
        target.indexes.insert(field.to_string(), schema);
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<PointStruct>) -> Result<()> {
        let mut collections = self.lock();
        let target = collections.get_mut(collection).ok_or_else(|| Self::not_found(collection))?;
        for point in points {
            target.points.retain(|p| p.id != point.id);
            target.points.push(point);
        }
        Ok(())
    }

    async fn query(&self, collection: &str, request: QueryRequest) -> Result<Vec<ScoredPoint>> {
        let collections = self.lock();
        let target = collections.get(collection).ok_or_else(|| Self::not_found(collection))?;

        let mut hits: Vec<ScoredPoint> = target
            .points
            .iter()
            .filter(|p| matches_filter(&p.payload, request.filter.as_ref()))
            .filter_map(|p| {
                p.vector.get(&request.using).map(|v| ScoredPoint {
                    id: Value::String(p.id.clone()),
                    score: Some(cosine(v, &request.vector)),
                    payload: Some(p.payload.clone()),
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.unwrap_or(0.0).total_cmp(&a.score.unwrap_or(0.0)));
        hits.truncate(request.limit);
        Ok(hits)
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_matches_nested_keys() {
        let payload = json!({ "metadata": { "platform": "TikTok" } });
        let payload = payload.as_object().unwrap();

        let hit = json!({ "must": [{ "key": "metadata.platform", "match": { "value": "TikTok" } }] });
        let miss = json!({ "must": [{ "key": "metadata.platform", "match": { "value": "Reddit" } }] });
        assert!(matches_filter(payload, Some(&hit)));
        assert!(!matches_filter(payload, Some(&miss)));
        assert!(matches_filter(payload, None));
    }

    #[test]
    fn test_cosine_of_identical_vectors_is_one() {
        assert!((cosine(&[1.0, 2.0], &[1.0, 2.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
