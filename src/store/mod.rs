//! Vector store abstraction.
//!
//! The connector only talks to the store through [`VectorStore`], which
//! mirrors the small subset of the Qdrant API it needs: collection
//! existence, creation, payload indexes, upsert and named-vector query.

pub mod qdrant;

#[cfg(test)]
pub(crate) mod memory;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;

pub use qdrant::QdrantClient;

/// Point payload: arbitrary JSON object.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Payload key holding the entry text.
pub const DOCUMENT_KEY: &str = "document";

/// Legacy payload key some collections use for the entry text.
pub const LEGACY_TEXT_KEY: &str = "text";

/// Payload key holding the caller metadata.
pub const METADATA_KEY: &str = "metadata";

/// Distance metric of a vector slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Distance {
    #[default]
    Cosine,
    Euclid,
    Dot,
    Manhattan,
}

/// Definition of one named vector slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorParams {
    pub size: usize,
    pub distance: Distance,
}

/// Payload index types understood by Qdrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadSchemaType {
    Keyword,
    Integer,
    Float,
    Geo,
    Text,
    Bool,
    Datetime,
    Uuid,
}

/// A point to upsert.
#[derive(Debug, Clone, Serialize)]
pub struct PointStruct {
    pub id: String,
    /// Named vectors, keyed by slot name
    pub vector: HashMap<String, Vec<f32>>,
    pub payload: Payload,
}

/// Nearest-neighbour query against one named vector slot.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub vector: Vec<f32>,
    pub using: String,
    pub limit: usize,
    /// Qdrant filter in its JSON (REST) shape
    pub filter: Option<serde_json::Value>,
}

/// A query hit.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoredPoint {
    pub id: serde_json::Value,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub payload: Option<Payload>,
}

/// Operations the connector needs from a vector database.
pub trait VectorStore: Send + Sync {
    /// Whether a collection with this name exists.
    fn collection_exists(&self, name: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Create a collection with the given named vector slots.
    ///
    /// Fails (with a store error for which `Error::is_already_exists` is
    /// true) if the collection is already present.
    fn create_collection(
        &self,
        name: &str,
        vectors: &BTreeMap<String, VectorParams>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Create a payload index on `field`.
    fn create_payload_index(
        &self,
        collection: &str,
        field: &str,
        schema: PayloadSchemaType,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Insert or replace points.
    fn upsert(&self, collection: &str, points: Vec<PointStruct>) -> impl Future<Output = Result<()>> + Send;

    /// Run a nearest-neighbour query, best hits first.
    fn query(
        &self,
        collection: &str,
        request: QueryRequest,
    ) -> impl Future<Output = Result<Vec<ScoredPoint>>> + Send;

    /// Names of all collections.
    fn list_collections(&self) -> impl Future<Output = Result<Vec<String>>> + Send;
}
