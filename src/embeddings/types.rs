//! Embedding types and configuration.
//!
//! Provider selection, config-file settings, and the static model tables
//! used when a backend cannot report a model's dimensionality itself.

use serde::{Deserialize, Serialize};

/// Embedding provider types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderType {
    /// Registered custom model with query instruction prefix
    #[default]
    Custom,
    /// Stock Model2Vec static model, no prefix
    Model2vec,
}

impl std::fmt::Display for EmbeddingProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Custom => write!(f, "custom"),
            Self::Model2vec => write!(f, "model2vec"),
        }
    }
}

impl std::str::FromStr for EmbeddingProviderType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "custom" | "custom_fastembed" => Ok(Self::Custom),
            "model2vec" | "fastembed" => Ok(Self::Model2vec),
            _ => Err(format!("Unknown embedding provider: {s}")),
        }
    }
}

/// Embedding settings stored in the `embeddings` section of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    pub provider: Option<EmbeddingProviderType>,
    pub model: Option<String>,
    /// External source (HuggingFace repo id) to register the model from.
    pub source: Option<String>,
    pub cache_dir: Option<String>,
    pub query_prefix: Option<String>,
    pub vector_name: Option<String>,
}

/// Provider metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub model: String,
    pub vector_name: String,
    pub dimensions: usize,
    pub query_prefix: Option<String>,
}

/// Stock model name and output dimensions.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub name: String,
    pub dimensions: usize,
}

/// Instruction-tuned models the reference collections were built with.
///
/// Only consulted when the registry has no description for a model.
pub mod instruct_models {
    /// Dimension assumed for models missing from the table.
    pub const DEFAULT_DIMENSION: usize = 1024;

    const DIMENSIONS: &[(&str, usize)] = &[
        ("multilingual-e5-large-instruct", 1024),
        ("multilingual-e5-base", 768),
        ("multilingual-e5-small", 384),
    ];

    /// Look up a model's dimension, falling back to `DEFAULT_DIMENSION`.
    #[must_use]
    pub fn fallback_dimension(model: &str) -> usize {
        let short = model.rsplit('/').next().unwrap_or(model);
        DIMENSIONS
            .iter()
            .find(|(name, _)| *name == short)
            .map_or(DEFAULT_DIMENSION, |(_, dim)| *dim)
    }
}

/// Model2Vec model configurations (static embeddings).
pub mod model2vec_models {
    use super::ModelConfig;

    /// potion-base-8M - fast 256d embeddings
    pub fn potion_base_8m() -> ModelConfig {
        ModelConfig {
            name: "minishlab/potion-base-8M".to_string(),
            dimensions: 256,
        }
    }

    /// potion-base-32M - larger 256d embeddings
    pub fn potion_base_32m() -> ModelConfig {
        ModelConfig {
            name: "minishlab/potion-base-32M".to_string(),
            dimensions: 256,
        }
    }

    /// potion-multilingual-128M - multilingual 256d embeddings
    pub fn potion_multilingual_128m() -> ModelConfig {
        ModelConfig {
            name: "minishlab/potion-multilingual-128M".to_string(),
            dimensions: 256,
        }
    }

    pub fn default_config() -> ModelConfig {
        potion_base_8m()
    }

    pub fn all() -> Vec<ModelConfig> {
        vec![potion_base_8m(), potion_base_32m(), potion_multilingual_128m()]
    }

    pub fn get_config(model: &str) -> ModelConfig {
        match model {
            "minishlab/potion-base-8M" | "potion-base-8M" => potion_base_8m(),
            "minishlab/potion-base-32M" | "potion-base-32M" => potion_base_32m(),
            "minishlab/potion-multilingual-128M" | "potion-multilingual-128M" => {
                potion_multilingual_128m()
            }
            _ => ModelConfig {
                name: model.to_string(),
                dimensions: 256, // Model2Vec default
            },
        }
    }
}
