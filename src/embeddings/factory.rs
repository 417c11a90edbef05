//! Embedding provider factory.
//!
//! Builds the configured provider from resolved settings.

use crate::config::Settings;
use crate::error::{Error, Result};
use std::sync::Arc;
use tracing::info;

use super::config::DEFAULT_MODEL;
use super::custom::{CustomEmbeddingProvider, CustomProviderOptions};
use super::model2vec::Model2VecProvider;
use super::provider::{BoxedProvider, EmbeddingProvider};
use super::registry::ModelRegistry;
use super::types::EmbeddingProviderType;

/// Create the embedding provider selected by `settings`.
///
/// The custom provider may download model files on first use; call this
/// before serving requests.
///
/// # Errors
///
/// Returns `Error::Embedding` if the model cannot be registered, fetched
/// or loaded.
pub async fn create_embedding_provider(
    settings: &Settings,
    registry: Arc<ModelRegistry>,
) -> Result<BoxedProvider> {
    let provider = match settings.provider {
        EmbeddingProviderType::Custom => {
            let mut options =
                CustomProviderOptions::new(settings.model_name.clone(), settings.cache_dir.clone())
                    .with_query_prefix(settings.query_prefix.clone());
            options.vector_name.clone_from(&settings.vector_name);
            if let Some(source) = &settings.model_source {
                options = options.with_source(source.clone());
            }
            BoxedProvider::new(CustomEmbeddingProvider::new(options, registry).await?)
        }
        EmbeddingProviderType::Model2vec => {
            // The instruct default means "nothing chosen" for the stock provider
            let model = (settings.model_name != DEFAULT_MODEL).then(|| settings.model_name.clone());
            let cache_dir = settings.cache_dir.clone();
            let provider = tokio::task::spawn_blocking(move || Model2VecProvider::with_model(model, &cache_dir))
                .await
                .map_err(|e| Error::Embedding(format!("Model loading worker failed: {e}")))??;
            BoxedProvider::new(provider)
        }
    };

    let info = provider.info();
    info!(
        provider = %info.name,
        model = %info.model,
        vector_name = %info.vector_name,
        dimensions = info.dimensions,
        "Embedding provider ready"
    );
    Ok(provider)
}
