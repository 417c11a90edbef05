//! Configuration management.
//!
//! Settings come from three layers, highest priority first:
//! 1. Environment variables (`QDRANT_URL`, `COLLECTION_NAME`, ...)
//! 2. The config file at `~/.social-recall/config.json`
//! 3. Built-in defaults
//!
//! Resolution is a pure function over a config file value and an
//! environment lookup, so it can be exercised without touching the
//! process environment.

use crate::embeddings::{EmbeddingProviderType, EmbeddingSettings};
use crate::error::{Error, Result};
use crate::store::PayloadSchemaType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Default Qdrant gRPC endpoint.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// Default collection used when neither the caller nor the environment names one.
pub const DEFAULT_COLLECTION: &str = "social_media";

/// Default number of results returned by `find`.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Qdrant connection and tool settings as stored in the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QdrantSettings {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub collection_name: Option<String>,
    pub search_limit: Option<usize>,
    pub read_only: Option<bool>,
    /// Payload indexes applied right after a collection is created.
    pub field_indexes: Option<BTreeMap<String, PayloadSchemaType>>,
}

/// Local configuration file structure.
///
/// Stored at `~/.social-recall/config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecallConfig {
    pub qdrant: Option<QdrantSettings>,
    pub embeddings: Option<EmbeddingSettings>,
}

/// Fully resolved settings for one process.
#[derive(Debug, Clone)]
pub struct Settings {
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub collection_name: Option<String>,
    pub search_limit: usize,
    pub read_only: bool,
    pub field_indexes: BTreeMap<String, PayloadSchemaType>,
    pub provider: EmbeddingProviderType,
    pub model_name: String,
    pub model_source: Option<String>,
    pub cache_dir: PathBuf,
    pub query_prefix: String,
    pub vector_name: String,
}

impl Settings {
    /// Load settings from the config file and the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if an environment variable holds an unparseable value.
    pub fn load() -> Result<Self> {
        let config = load_config()?;
        Self::from_sources(&config, |key| std::env::var(key).ok())
    }

    /// Resolve settings from an explicit config value and environment lookup.
    ///
    /// Empty environment values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for malformed numeric, boolean or enum values.
    pub fn from_sources<F>(config: &RecallConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).filter(|v| !v.is_empty());
        let qdrant = config.qdrant.clone().unwrap_or_default();
        let embeddings = config.embeddings.clone().unwrap_or_default();

        let search_limit = match lookup("QDRANT_SEARCH_LIMIT") {
            Some(raw) => raw.parse::<usize>().map_err(|e| {
                Error::Config(format!("QDRANT_SEARCH_LIMIT must be a positive integer: {e}"))
            })?,
            None => qdrant.search_limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
        };
        if search_limit == 0 {
            return Err(Error::Config("search limit must be at least 1".into()));
        }

        let read_only = match lookup("QDRANT_READ_ONLY") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| Error::Config(format!("QDRANT_READ_ONLY is not a boolean: {raw}")))?,
            None => qdrant.read_only.unwrap_or(false),
        };

        let provider = match lookup("EMBEDDING_PROVIDER") {
            Some(raw) => raw.parse::<EmbeddingProviderType>().map_err(Error::Config)?,
            None => embeddings.provider.unwrap_or_default(),
        };

        let embedding = crate::embeddings::config::resolve_embedding_settings(&embeddings, &lookup);

        Ok(Self {
            qdrant_url: lookup("QDRANT_URL")
                .or(qdrant.url)
                .unwrap_or_else(|| DEFAULT_QDRANT_URL.to_string()),
            qdrant_api_key: lookup("QDRANT_API_KEY").or(qdrant.api_key),
            collection_name: lookup("COLLECTION_NAME")
                .or(qdrant.collection_name)
                .or_else(|| Some(DEFAULT_COLLECTION.to_string())),
            search_limit,
            read_only,
            field_indexes: qdrant.field_indexes.unwrap_or_default(),
            provider,
            model_name: embedding.model_name,
            model_source: embedding.model_source,
            cache_dir: embedding.cache_dir,
            query_prefix: embedding.query_prefix,
            vector_name: embedding.vector_name,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Get the config file path.
pub fn config_path() -> Result<PathBuf> {
    directories::BaseDirs::new()
        .map(|b| b.home_dir().join(".social-recall").join("config.json"))
        .ok_or(Error::Config("Could not determine home directory".into()))
}

/// Load the configuration file, or defaults if it does not exist.
pub fn load_config() -> Result<RecallConfig> {
    let path = config_path()?;

    if !path.exists() {
        return Ok(RecallConfig::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {e}")))
}
