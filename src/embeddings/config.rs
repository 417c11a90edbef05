//! Embedding configuration resolution.
//!
//! Same layering as the rest of the settings: environment first, then the
//! `embeddings` section of the config file, then defaults.

use std::path::PathBuf;

use super::types::EmbeddingSettings;

/// Model used when nothing is configured.
pub const DEFAULT_MODEL: &str = "multilingual-e5-large-instruct";

/// HuggingFace repo the default model is registered from.
pub const DEFAULT_MODEL_SOURCE: &str = "intfloat/multilingual-e5-large-instruct";

/// Vector slot name of the existing social media collections.
pub const DEFAULT_VECTOR_NAME: &str = "text_dense";

/// On-disk model cache used when nothing is configured.
pub const DEFAULT_CACHE_DIR: &str = "/mnt/mcp_model";

/// HuggingFace Hub that model files are downloaded from.
pub const DEFAULT_HF_ENDPOINT: &str = "https://huggingface.co";

/// Instruction the reference collection's queries were embedded with.
///
/// Changing this silently degrades relevance against collections that were
/// populated with this prefix.
pub const DEFAULT_QUERY_PREFIX: &str = "Instruct: Given a query of a social media caption, find other social media captions that are most relevant. Query: ";

/// Embedding settings after all layers are applied.
#[derive(Debug, Clone)]
pub struct ResolvedEmbeddingSettings {
    pub model_name: String,
    pub model_source: Option<String>,
    pub cache_dir: PathBuf,
    pub query_prefix: String,
    pub vector_name: String,
}

/// Resolve embedding settings from the config file section and an env lookup.
///
/// `lookup` must already treat empty values as unset, except for the query
/// prefix where an explicitly empty value is meaningful only through the
/// config file (an empty string there disables prefixing).
pub fn resolve_embedding_settings<F>(settings: &EmbeddingSettings, lookup: &F) -> ResolvedEmbeddingSettings
where
    F: Fn(&str) -> Option<String>,
{
    let model_name = lookup("EMBEDDING_MODEL")
        .or_else(|| settings.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let model_source = lookup("CUSTOM_HF_MODEL_ID")
        .or_else(|| settings.source.clone())
        .or_else(|| (model_name == DEFAULT_MODEL).then(|| DEFAULT_MODEL_SOURCE.to_string()));

    ResolvedEmbeddingSettings {
        model_name,
        model_source,
        cache_dir: lookup("MODEL_CACHE_DIR")
            .or_else(|| settings.cache_dir.clone())
            .map_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR), PathBuf::from),
        query_prefix: lookup("CUSTOM_QUERY_PREFIX")
            .or_else(|| lookup("EMBEDDING_QUERY_PREFIX"))
            .or_else(|| settings.query_prefix.clone())
            .unwrap_or_else(|| DEFAULT_QUERY_PREFIX.to_string()),
        vector_name: lookup("QDRANT_VECTOR_NAME")
            .or_else(|| settings.vector_name.clone())
            .unwrap_or_else(|| DEFAULT_VECTOR_NAME.to_string()),
    }
}

/// Resolve the model cache directory from the environment alone.
///
/// Used for diagnostics where loading the full settings is not wanted.
pub fn resolve_cache_dir() -> PathBuf {
    std::env::var("MODEL_CACHE_DIR")
        .ok()
        .filter(|v| !v.is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR), PathBuf::from)
}

/// Resolve the HuggingFace Hub endpoint from the environment.
pub fn resolve_hf_endpoint() -> String {
    std::env::var("HF_ENDPOINT")
        .ok()
        .filter(|v| !v.is_empty())
        .map_or_else(|| DEFAULT_HF_ENDPOINT.to_string(), |v| v.trim_end_matches('/').to_string())
}

/// Resolve the HuggingFace token (needed for gated or private repos).
pub fn resolve_hf_token() -> Option<String> {
    std::env::var("HF_TOKEN").ok().filter(|v| !v.is_empty())
}
