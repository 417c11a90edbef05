//! Embedding backends.
//!
//! A backend runs inference for one loaded model. Calls are synchronous and
//! potentially slow, so providers dispatch them to the blocking pool rather
//! than calling them on the async executor.
//!
//! [`StaticModelBackend`] serves the stock Model2Vec models; transformer
//! models go through [`super::onnx::OnnxBackend`].

use crate::error::{Error, Result};
use model2vec_rs::model::StaticModel;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use super::registry::{ModelDescription, ModelRegistry, Pooling};

/// Synchronous batch text-to-vector inference.
pub trait EmbeddingBackend: Send + Sync + 'static {
    /// Name of the loaded model.
    fn model_name(&self) -> &str;

    /// Embed a batch of texts. One vector per text, same order.
    ///
    /// # Errors
    ///
    /// Returns `Error::Embedding` if inference fails.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Model2Vec static-embedding backend.
///
/// Model2Vec models are mean-pooled by construction, so only
/// `Pooling::Mean` descriptions can be loaded.
pub struct StaticModelBackend {
    model: StaticModel,
    model_name: String,
}

impl StaticModelBackend {
    /// Load a registered model.
    ///
    /// The model is read from the cache directory when it has already been
    /// materialized there, otherwise it is fetched from its source.
    ///
    /// # Errors
    ///
    /// Returns `Error::Embedding` if the model is not registered, uses an
    /// unsupported pooling strategy, or fails to load.
    pub fn load(registry: &ModelRegistry, model_name: &str, cache_dir: &Path) -> Result<Self> {
        let description = registry.describe(model_name).ok_or_else(|| {
            Error::Embedding(format!("Model '{model_name}' is not registered"))
        })?;

        if description.pooling != Pooling::Mean {
            return Err(Error::Embedding(format!(
                "Model '{model_name}' uses {:?} pooling; static models only support mean pooling",
                description.pooling
            )));
        }

        let location = model_location(&description, cache_dir);
        info!(model = %model_name, location = %location.display(), "Loading embedding model");

        let model = StaticModel::from_pretrained(&location, None, Some(description.normalize), None)
            .map_err(|e| {
                Error::Embedding(format!(
                    "Failed to load model '{model_name}' from {}: {e}",
                    location.display()
                ))
            })?;

        Ok(Self {
            model,
            model_name: model_name.to_string(),
        })
    }
}

impl EmbeddingBackend for StaticModelBackend {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.model.encode(texts);
        if embeddings.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Model '{}' returned {} embeddings for {} inputs",
                self.model_name,
                embeddings.len(),
                texts.len()
            )));
        }
        Ok(embeddings)
    }
}

/// Run a backend on the blocking pool and await the result.
pub(crate) async fn embed_blocking<B: EmbeddingBackend>(
    backend: &Arc<B>,
    texts: Vec<String>,
) -> Result<Vec<Vec<f32>>> {
    let backend = Arc::clone(backend);
    tokio::task::spawn_blocking(move || backend.embed(&texts))
        .await
        .map_err(|e| Error::Embedding(format!("Embedding worker failed: {e}")))?
}

/// Directory name a model is materialized under inside the cache.
#[must_use]
pub fn cache_dir_name(repo_id: &str) -> String {
    format!("models--{}", repo_id.replace('/', "--"))
}

/// Pick the local cache copy of a model if it holds the weights file,
/// otherwise fall back to the source id for a hub download.
fn model_location(description: &ModelDescription, cache_dir: &Path) -> PathBuf {
    let candidates = [
        cache_dir.join(&description.name),
        cache_dir.join(cache_dir_name(description.source.id())),
    ];

    candidates
        .into_iter()
        .find(|dir| dir.join(&description.model_file).is_file())
        .unwrap_or_else(|| PathBuf::from(description.source.id()))
}
