//! Qdrant connector.
//!
//! Owns the store handle and the default collection, embeds through the
//! shared provider, and turns query hits back into enriched entries.

use crate::embeddings::{BoxedProvider, EmbeddingProvider};
use crate::error::{Error, Result};
use crate::model::{Entry, Metadata};
use crate::store::{
    Distance, DOCUMENT_KEY, LEGACY_TEXT_KEY, METADATA_KEY, Payload, PayloadSchemaType, PointStruct,
    QdrantClient, QueryRequest, ScoredPoint, VectorParams, VectorStore,
};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Text embedded once per collection creation to check the provider's
/// declared vector size against what it actually returns.
const DIMENSION_CHECK_TEXT: &str = "dimension check";

/// Connector between the tool layer and the vector store.
pub struct Connector<S = QdrantClient, P = BoxedProvider> {
    store: S,
    provider: Arc<P>,
    default_collection: Option<String>,
    field_indexes: BTreeMap<String, PayloadSchemaType>,
    /// One async lock per collection still being set up; entries are
    /// dropped once the collection is known to exist
    creation_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: VectorStore, P: EmbeddingProvider> Connector<S, P> {
    /// Create a connector.
    pub fn new(store: S, provider: Arc<P>, default_collection: Option<String>) -> Self {
        Self {
            store,
            provider,
            default_collection,
            field_indexes: BTreeMap::new(),
            creation_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Payload indexes to create right after a collection is created.
    #[must_use]
    pub fn with_field_indexes(mut self, field_indexes: BTreeMap<String, PayloadSchemaType>) -> Self {
        self.field_indexes = field_indexes;
        self
    }

    /// The embedding provider shared by all operations.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Pick the explicit collection, else the default.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if neither is set.
    pub fn resolve_collection<'a>(&'a self, explicit: Option<&'a str>) -> Result<&'a str> {
        explicit
            .filter(|name| !name.is_empty())
            .or(self.default_collection.as_deref())
            .ok_or_else(|| {
                Error::Config("No collection name provided and no default collection configured".into())
            })
    }

    fn creation_lock(&self, name: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .creation_locks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(locks.entry(name.to_string()).or_default())
    }

    fn release_creation_lock(&self, name: &str) {
        self.creation_locks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(name);
    }

    /// Make sure `name` exists, creating it with this provider's vector slot if not.
    ///
    /// Concurrent callers in this process are serialized per collection;
    /// a creation rejected because another process got there first is
    /// treated as success.
    ///
    /// # Errors
    ///
    /// Returns `Error::DimensionMismatch` if the provider returns vectors of
    /// a different size than it declares, or `Error::Store` on remote failure.
    pub async fn ensure_collection_exists(&self, name: &str) -> Result<()> {
        if self.store.collection_exists(name).await? {
            return Ok(());
        }

        let lock = self.creation_lock(name);
        let _guard = lock.lock().await;
        let result = self.create_collection_locked(name).await;
        if result.is_ok() {
            // Late arrivals see the collection on their first existence check
            self.release_creation_lock(name);
        }
        result
    }

    async fn create_collection_locked(&self, name: &str) -> Result<()> {
        // Another task may have created it while we waited
        if self.store.collection_exists(name).await? {
            return Ok(());
        }

        let vector_name = self.provider.vector_name();
        let vector_size = self.provider.vector_size();
        self.validate_dimension().await?;

        let mut vectors = BTreeMap::new();
        vectors.insert(
            vector_name.clone(),
            VectorParams {
                size: vector_size,
                distance: Distance::Cosine,
            },
        );

        match self.store.create_collection(name, &vectors).await {
            Ok(()) => {
                info!(collection = name, vector_name = %vector_name, vector_size, "Created collection");
            }
            Err(e) if e.is_already_exists() => {
                debug!(collection = name, "Collection created concurrently elsewhere");
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        for (field, schema) in &self.field_indexes {
            self.store.create_payload_index(name, field, *schema).await?;
            debug!(collection = name, field = %field, ?schema, "Created payload index");
        }

        Ok(())
    }

    async fn validate_dimension(&self) -> Result<()> {
        let sample = self.provider.embed_documents(&[DIMENSION_CHECK_TEXT]).await?;
        let actual = sample.first().map_or(0, Vec::len);
        self.check_dimension(actual)
    }

    fn check_dimension(&self, actual: usize) -> Result<()> {
        let expected = self.provider.vector_size();
        if actual == expected {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                vector_name: self.provider.vector_name(),
                expected,
                actual,
            })
        }
    }

    /// Embed and store one entry as a new point.
    ///
    /// Every call creates a new point; there is no dedup by content.
    /// A `similarity_score` on the entry is ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if no collection resolves, `Error::Embedding`
    /// or `Error::DimensionMismatch` on embedding failure, `Error::Store`
    /// on remote failure.
    pub async fn store(&self, entry: &Entry, collection: Option<&str>) -> Result<()> {
        let collection = self.resolve_collection(collection)?;
        self.ensure_collection_exists(collection).await?;

        let vector = self
            .provider
            .embed_documents(&[entry.content.as_str()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("Provider returned no embedding for document".into()))?;
        self.check_dimension(vector.len())?;

        let mut payload = Payload::new();
        payload.insert(DOCUMENT_KEY.to_string(), Value::String(entry.content.clone()));
        payload.insert(
            METADATA_KEY.to_string(),
            entry.metadata.clone().map_or(Value::Null, Value::Object),
        );

        let point = PointStruct {
            id: uuid::Uuid::new_v4().to_string(),
            vector: HashMap::from([(self.provider.vector_name(), vector)]),
            payload,
        };
        debug!(collection, id = %point.id, "Upserting point");

        self.store.upsert(collection, vec![point]).await
    }

    /// Semantic search, best matches first.
    ///
    /// A collection that does not exist yields an empty result.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if no collection resolves, `Error::Embedding`
    /// on query embedding failure, `Error::Store` on remote failure.
    pub async fn search(
        &self,
        query: &str,
        collection: Option<&str>,
        limit: usize,
        filter: Option<Value>,
    ) -> Result<Vec<Entry>> {
        let collection = self.resolve_collection(collection)?;
        if !self.store.collection_exists(collection).await? {
            debug!(collection, "Search against missing collection");
            return Ok(Vec::new());
        }

        let vector = self.provider.embed_query(query).await?;
        let hits = self
            .store
            .query(
                collection,
                QueryRequest {
                    vector,
                    using: self.provider.vector_name(),
                    limit,
                    filter,
                },
            )
            .await?;

        Ok(hits.into_iter().map(entry_from_point).collect())
    }

    /// Names of every collection in the store.
    ///
    /// # Errors
    ///
    /// Returns `Error::Store` on remote failure.
    pub async fn collection_names(&self) -> Result<Vec<String>> {
        self.store.list_collections().await
    }
}

/// Map a query hit to an enriched entry, tolerating malformed payloads.
fn entry_from_point(point: ScoredPoint) -> Entry {
    let mut payload = point.payload.unwrap_or_default();

    // A null or empty `document` counts as absent so legacy `text` still shows
    let document = payload
        .remove(DOCUMENT_KEY)
        .filter(|value| !is_blank_document(value));
    let content = match document.or_else(|| payload.remove(LEGACY_TEXT_KEY)) {
        Some(Value::String(text)) => text,
        Some(Value::Null) | None => String::new(),
        Some(other) => {
            warn!(id = %point.id, "Non-string document payload");
            other.to_string()
        }
    };

    let metadata: Option<Metadata> = match payload.remove(METADATA_KEY) {
        Some(Value::Object(map)) => Some(map),
        _ => None,
    };

    Entry {
        content,
        metadata,
        similarity_score: point.score,
        platform: None,
        date: None,
    }
    .enriched()
}

fn is_blank_document(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}
