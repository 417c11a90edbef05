//! Model2Vec embedding provider.
//!
//! Stock static-embedding models with no instruction prefix. Queries and
//! documents are embedded identically, and the vector slot is named after
//! the model (`fast-<model>`), so collections built with different stock
//! models never share a slot.

use crate::error::{Error, Result};
use std::path::Path;
use std::sync::Arc;

use super::backend::{embed_blocking, EmbeddingBackend, StaticModelBackend};
use super::provider::EmbeddingProvider;
use super::registry::ModelRegistry;
use super::types::{model2vec_models, ProviderInfo};

/// Model2Vec embedding provider.
pub struct Model2VecProvider<B: EmbeddingBackend = StaticModelBackend> {
    backend: Arc<B>,
    /// Model name (e.g., "minishlab/potion-base-8M")
    model_name: String,
    /// Output dimensions (256 for potion models)
    dimensions: usize,
}

impl Model2VecProvider<StaticModelBackend> {
    /// Load a stock Model2Vec model.
    ///
    /// # Arguments
    ///
    /// * `model_name` - Optional model name. Defaults to `minishlab/potion-base-8M`.
    /// * `cache_dir` - Directory checked for an already materialized copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded.
    pub fn with_model(model_name: Option<String>, cache_dir: &Path) -> Result<Self> {
        let model_name = model_name.unwrap_or_else(|| model2vec_models::default_config().name);
        let registry = ModelRegistry::with_builtin_models();

        if registry.describe(&model_name).is_none() {
            return Err(Error::Embedding(format!(
                "Unknown Model2Vec model '{model_name}'. Use the custom provider to register it."
            )));
        }

        let backend = StaticModelBackend::load(&registry, &model_name, cache_dir)?;
        Ok(Self::with_backend(&model_name, backend))
    }
}

impl<B: EmbeddingBackend> Model2VecProvider<B> {
    /// Build a provider around an already loaded backend.
    pub fn with_backend(model_name: &str, backend: B) -> Self {
        let config = model2vec_models::get_config(model_name);
        Self {
            backend: Arc::new(backend),
            model_name: config.name,
            dimensions: config.dimensions,
        }
    }
}

impl<B: EmbeddingBackend> EmbeddingProvider for Model2VecProvider<B> {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "model2vec".to_string(),
            model: self.model_name.clone(),
            vector_name: self.vector_name(),
            dimensions: self.dimensions,
            query_prefix: None,
        }
    }

    fn vector_name(&self) -> String {
        let short = self.model_name.rsplit('/').next().unwrap_or(&self.model_name);
        format!("fast-{}", short.to_lowercase())
    }

    fn vector_size(&self) -> usize {
        self.dimensions
    }

    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let texts: Vec<String> = texts.iter().map(|&s| s.to_string()).collect();
        embed_blocking(&self.backend, texts).await
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        embed_blocking(&self.backend, vec![query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("Model2Vec returned no embeddings".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::custom::tests::HashingBackend;

    #[test]
    fn test_vector_name_derived_from_model() {
        let provider = Model2VecProvider::with_backend("potion-base-8M", HashingBackend { dim: 256 });
        assert_eq!(provider.vector_name(), "fast-potion-base-8m");
        assert_eq!(provider.vector_size(), 256);
        assert_eq!(provider.info().model, "minishlab/potion-base-8M");
    }

    #[tokio::test]
    async fn test_query_and_document_embed_identically() {
        let provider = Model2VecProvider::with_backend("potion-base-8M", HashingBackend { dim: 256 });
        let query = provider.embed_query("hiking in the alps").await.unwrap();
        let docs = provider.embed_documents(&["hiking in the alps"]).await.unwrap();
        assert_eq!(query, docs[0]);
    }

    #[test]
    fn test_unknown_model_is_rejected_before_loading() {
        let temp = tempfile::TempDir::new().unwrap();
        let result = Model2VecProvider::with_model(Some("not-a-model".into()), temp.path());
        assert!(matches!(result, Err(Error::Embedding(msg)) if msg.contains("Unknown Model2Vec model")));
    }
}
