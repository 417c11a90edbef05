//! Custom embedding provider.
//!
//! Registers a named model from an external source, then embeds with it.
//! Queries are prefixed with an instruction; documents are not. The
//! reference collections were populated with exactly this asymmetry, so the
//! prefix used here must match the one used at indexing time or relevance
//! degrades without any visible error.

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error};

use super::backend::{embed_blocking, EmbeddingBackend};
use super::config::{DEFAULT_QUERY_PREFIX, DEFAULT_VECTOR_NAME};
use super::hub;
use super::onnx::OnnxBackend;
use super::provider::EmbeddingProvider;
use super::registry::{ModelDescription, ModelRegistry};
use super::types::{instruct_models, ProviderInfo};

/// Construction options for [`CustomEmbeddingProvider`].
#[derive(Debug, Clone)]
pub struct CustomProviderOptions {
    pub model_name: String,
    /// HuggingFace repo id. When set the model is registered before loading.
    pub source: Option<String>,
    pub cache_dir: PathBuf,
    /// Prepended to every query. Empty disables prefixing.
    pub query_prefix: String,
    pub vector_name: String,
}

impl CustomProviderOptions {
    /// Options for a model with the default prefix and vector slot.
    pub fn new(model_name: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_name: model_name.into(),
            source: None,
            cache_dir: cache_dir.into(),
            query_prefix: DEFAULT_QUERY_PREFIX.to_string(),
            vector_name: DEFAULT_VECTOR_NAME.to_string(),
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_query_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.query_prefix = prefix.into();
        self
    }
}

/// Embedding provider backed by a registered custom model.
pub struct CustomEmbeddingProvider<B: EmbeddingBackend = OnnxBackend> {
    backend: Arc<B>,
    registry: Arc<ModelRegistry>,
    model_name: String,
    query_prefix: String,
    vector_name: String,
}

impl CustomEmbeddingProvider<OnnxBackend> {
    /// Register the model (if a source is configured), fetch any files
    /// missing from the cache, and load it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Embedding` if registration, download or loading
    /// fails; there is no provider without a working model.
    pub async fn new(options: CustomProviderOptions, registry: Arc<ModelRegistry>) -> Result<Self> {
        register_model(&options, &registry)?;
        let description = registry.describe(&options.model_name).ok_or_else(|| {
            Error::Embedding(format!(
                "Model '{}' is not registered; set CUSTOM_HF_MODEL_ID to its HuggingFace repo",
                options.model_name
            ))
        })?;

        let dir = hub::materialize(&description, &options.cache_dir).await?;
        let backend = tokio::task::spawn_blocking(move || OnnxBackend::load(&description, &dir))
            .await
            .map_err(|e| Error::Embedding(format!("Model loading worker failed: {e}")))??;
        Ok(Self::assemble(options, registry, backend))
    }
}

impl<B: EmbeddingBackend> CustomEmbeddingProvider<B> {
    /// Build a provider around an already loaded backend.
    ///
    /// Registration still runs, so the registry reports the model's
    /// dimension exactly as it would for [`CustomEmbeddingProvider::new`].
    ///
    /// # Errors
    ///
    /// Returns `Error::Embedding` if registration fails.
    pub fn with_backend(
        options: CustomProviderOptions,
        registry: Arc<ModelRegistry>,
        backend: B,
    ) -> Result<Self> {
        register_model(&options, &registry)?;
        Ok(Self::assemble(options, registry, backend))
    }

    fn assemble(options: CustomProviderOptions, registry: Arc<ModelRegistry>, backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            registry,
            model_name: options.model_name,
            query_prefix: options.query_prefix,
            vector_name: options.vector_name,
        }
    }

    /// The query text actually sent to the backend.
    fn prefixed(&self, query: &str) -> String {
        if self.query_prefix.is_empty() {
            query.to_string()
        } else {
            format!("{}{query}", self.query_prefix)
        }
    }
}

fn register_model(options: &CustomProviderOptions, registry: &ModelRegistry) -> Result<()> {
    let Some(source) = options.source.as_deref() else {
        return Ok(());
    };

    let dimension = instruct_models::fallback_dimension(&options.model_name);
    let description = ModelDescription::custom(&options.model_name, source, dimension);
    registry.register(description).map_err(|e| {
        error!(model = %options.model_name, "Failed to register custom model: {e}");
        e
    })
}

impl<B: EmbeddingBackend> EmbeddingProvider for CustomEmbeddingProvider<B> {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "custom".to_string(),
            model: self.model_name.clone(),
            vector_name: self.vector_name(),
            dimensions: self.vector_size(),
            query_prefix: Some(self.query_prefix.clone()),
        }
    }

    fn vector_name(&self) -> String {
        self.vector_name.clone()
    }

    fn vector_size(&self) -> usize {
        self.registry
            .dimension(&self.model_name)
            .unwrap_or_else(|| instruct_models::fallback_dimension(&self.model_name))
    }

    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let texts: Vec<String> = texts.iter().map(|s| (*s).to_string()).collect();
        embed_blocking(&self.backend, texts).await
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let prefixed = self.prefixed(query);
        debug!(
            "Embedding query with prefix: '{}...'",
            prefixed.chars().take(100).collect::<String>()
        );

        let mut embeddings = embed_blocking(&self.backend, vec![prefixed]).await?;
        embeddings.pop().ok_or_else(|| {
            Error::Embedding(format!(
                "Model '{}' returned no embedding for the query",
                self.backend.model_name()
            ))
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Deterministic backend: a bag-of-bytes histogram folded into `dim`
    /// buckets and L2-normalized. Different texts give different vectors,
    /// identical texts identical ones.
    pub(crate) struct HashingBackend {
        pub dim: usize,
    }

    impl EmbeddingBackend for HashingBackend {
        fn model_name(&self) -> &str {
            "hashing"
        }

        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| hash_embed(t, self.dim)).collect())
        }
    }

    pub(crate) fn hash_embed(text: &str, dim: usize) -> Vec<f32> {
        let mut v = vec![0.0f32; dim];
        for (i, b) in text.bytes().enumerate() {
            v[(usize::from(b) + i) % dim] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }

    struct FailingBackend;

    impl EmbeddingBackend for FailingBackend {
        fn model_name(&self) -> &str {
            "failing"
        }

        fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(Error::Embedding("backend offline".into()))
        }
    }

    fn provider(prefix: &str) -> CustomEmbeddingProvider<HashingBackend> {
        let options = CustomProviderOptions::new("hashing", "/tmp/unused")
            .with_source("org/hashing")
            .with_query_prefix(prefix);
        CustomEmbeddingProvider::with_backend(
            options,
            Arc::new(ModelRegistry::new()),
            HashingBackend { dim: 1024 },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_query_differs_from_document_with_prefix() {
        let provider = provider(DEFAULT_QUERY_PREFIX);
        let text = "sunset over the lake #nofilter";

        let query = provider.embed_query(text).await.unwrap();
        let docs = provider.embed_documents(&[text]).await.unwrap();

        assert_ne!(query, docs[0]);
        assert_eq!(query, hash_embed(&format!("{DEFAULT_QUERY_PREFIX}{text}"), 1024));
    }

    #[tokio::test]
    async fn test_query_equals_document_without_prefix() {
        let provider = provider("");
        let text = "sunset over the lake #nofilter";

        let query = provider.embed_query(text).await.unwrap();
        let docs = provider.embed_documents(&[text]).await.unwrap();

        assert_eq!(query, docs[0]);
    }

    #[tokio::test]
    async fn test_documents_keep_order_and_count() {
        let provider = provider(DEFAULT_QUERY_PREFIX);
        let docs = provider.embed_documents(&["a", "b", "c"]).await.unwrap();
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[1], hash_embed("b", 1024));
    }

    #[test]
    fn test_vector_metadata() {
        let provider = provider(DEFAULT_QUERY_PREFIX);
        assert_eq!(provider.vector_name(), "text_dense");
        // Registered with the fallback table's default for unknown names
        assert_eq!(provider.vector_size(), 1024);
    }

    #[test]
    fn test_vector_size_uses_registry_before_fallback() {
        let registry = Arc::new(ModelRegistry::new());
        registry
            .register(ModelDescription::custom("multilingual-e5-small", "intfloat/multilingual-e5-small", 384))
            .unwrap();

        let options = CustomProviderOptions::new("multilingual-e5-small", "/tmp/unused");
        let provider =
            CustomEmbeddingProvider::with_backend(options, registry, HashingBackend { dim: 384 })
                .unwrap();
        assert_eq!(provider.vector_size(), 384);
    }

    #[test]
    fn test_vector_size_falls_back_without_registration() {
        let options = CustomProviderOptions::new("multilingual-e5-base", "/tmp/unused");
        let provider = CustomEmbeddingProvider::with_backend(
            options,
            Arc::new(ModelRegistry::new()),
            HashingBackend { dim: 768 },
        )
        .unwrap();
        assert_eq!(provider.vector_size(), 768);
    }

    #[test]
    fn test_registration_twice_with_shared_registry() {
        let registry = Arc::new(ModelRegistry::new());
        for _ in 0..2 {
            let options = CustomProviderOptions::new("m", "/tmp/unused").with_source("org/m");
            CustomEmbeddingProvider::with_backend(options, Arc::clone(&registry), HashingBackend { dim: 8 })
                .unwrap();
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registration_failure_is_fatal() {
        let options = CustomProviderOptions::new("m", "/tmp/unused").with_source("");
        let result = CustomEmbeddingProvider::with_backend(
            options,
            Arc::new(ModelRegistry::new()),
            HashingBackend { dim: 8 },
        );
        assert!(matches!(result, Err(Error::Embedding(_))));
    }

    #[tokio::test]
    async fn test_unregistered_model_fails_before_download() {
        let temp = tempfile::TempDir::new().unwrap();
        let options = CustomProviderOptions::new("no-source", temp.path());
        let result = CustomEmbeddingProvider::new(options, Arc::new(ModelRegistry::new())).await;
        assert!(matches!(result, Err(Error::Embedding(msg)) if msg.contains("CUSTOM_HF_MODEL_ID")));
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_surfaces_as_embedding_error() {
        let options = CustomProviderOptions::new("failing", "/tmp/unused");
        let provider = CustomEmbeddingProvider::with_backend(
            options,
            Arc::new(ModelRegistry::new()),
            FailingBackend,
        )
        .unwrap();

        let result = provider.embed_query("anything").await;
        assert!(matches!(result, Err(Error::Embedding(msg)) if msg == "backend offline"));
    }
}
