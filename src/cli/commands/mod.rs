//! Command implementations.

pub mod collections;
pub mod completions;
pub mod find;
pub mod model;
pub mod store;
pub mod version;

use crate::config::Settings;
use crate::connector::Connector;
use crate::embeddings::{create_embedding_provider, ModelRegistry};
use crate::error::{Error, Result};
use crate::store::QdrantClient;
use crate::tools::MemoryTools;
use std::future::Future;
use std::sync::Arc;

/// Run an async command body on a fresh runtime.
pub(crate) fn block_on<F: Future<Output = Result<()>>>(future: F) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;
    rt.block_on(future)
}

/// Qdrant client for the resolved settings. Call from inside the runtime.
pub(crate) fn open_store(settings: &Settings) -> Result<QdrantClient> {
    QdrantClient::new(&settings.qdrant_url, settings.qdrant_api_key.clone())
}

/// Load the embedding model and wire up the tool layer.
///
/// The first run may download model files into `MODEL_CACHE_DIR`.
pub(crate) async fn open_tools(settings: &Settings) -> Result<MemoryTools> {
    let registry = Arc::new(ModelRegistry::with_builtin_models());
    let provider = create_embedding_provider(settings, registry).await?;
    let connector = Connector::new(open_store(settings)?, Arc::new(provider), settings.collection_name.clone())
        .with_field_indexes(settings.field_indexes.clone());
    Ok(MemoryTools::new(connector, settings.search_limit, settings.read_only))
}

/// Parse a CLI JSON argument that must be an object.
pub(crate) fn parse_json_object(flag: &str, raw: &str) -> Result<serde_json::Map<String, serde_json::Value>> {
    match serde_json::from_str(raw) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(Error::InvalidArgument(format!("--{flag} must be a JSON object"))),
        Err(e) => Err(Error::InvalidArgument(format!("--{flag} is not valid JSON: {e}"))),
    }
}
