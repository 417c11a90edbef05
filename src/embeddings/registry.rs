//! Registry of named embedding models.
//!
//! A backend can only load models the registry knows about. Custom models
//! are added by pointing a name at an external source (a HuggingFace repo
//! id) together with the pooling, normalization and dimension the model was
//! trained with. The registry is an ordinary owned value: whoever builds a
//! provider decides which registry it sees.

use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, info, warn};

use super::types::model2vec_models;

/// How token embeddings are reduced to a single vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Pooling {
    Mean,
    Cls,
}

/// Where a model's files come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ModelSource {
    /// HuggingFace Hub repository id, e.g. `intfloat/multilingual-e5-large-instruct`.
    HuggingFace(String),
}

impl ModelSource {
    /// Identifier understood by the hub client.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::HuggingFace(repo) => repo,
        }
    }
}

/// Everything a backend needs to materialize and run a model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDescription {
    pub name: String,
    pub source: ModelSource,
    pub pooling: Pooling,
    pub normalize: bool,
    pub dimension: usize,
    /// Weights file, relative to the model directory.
    pub model_file: String,
    /// Files the weights file depends on (external ONNX data).
    pub additional_files: Vec<String>,
}

impl ModelDescription {
    /// Description for a custom model with the defaults the social media
    /// collections were built with: mean pooling, normalized output, and
    /// the ONNX export hub repos publish under `onnx/` (graph plus external
    /// weights file).
    #[must_use]
    pub fn custom(name: &str, source_id: &str, dimension: usize) -> Self {
        Self {
            name: name.to_string(),
            source: ModelSource::HuggingFace(source_id.to_string()),
            pooling: Pooling::Mean,
            normalize: true,
            dimension,
            model_file: "onnx/model.onnx".to_string(),
            additional_files: vec!["onnx/model.onnx_data".to_string()],
        }
    }
}

/// Registry of model descriptions keyed by model name.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: RwLock<HashMap<String, ModelDescription>>,
}

impl ModelRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with the stock Model2Vec models.
    #[must_use]
    pub fn with_builtin_models() -> Self {
        let registry = Self::new();
        {
            let mut models = registry.write();
            for config in model2vec_models::all() {
                let short = config.name.rsplit('/').next().unwrap_or(&config.name).to_string();
                let description = ModelDescription {
                    name: config.name.clone(),
                    source: ModelSource::HuggingFace(config.name.clone()),
                    pooling: Pooling::Mean,
                    normalize: true,
                    dimension: config.dimensions,
                    model_file: "model.safetensors".to_string(),
                    additional_files: vec!["tokenizer.json".to_string(), "config.json".to_string()],
                };
                models.insert(short, description.clone());
                models.insert(config.name, description);
            }
        }
        registry
    }

    /// Register a model description.
    ///
    /// Registering a name that is already known succeeds without replacing
    /// the existing description.
    ///
    /// # Errors
    ///
    /// Returns `Error::Embedding` if the description is unusable (empty name
    /// or source, zero dimension).
    pub fn register(&self, description: ModelDescription) -> Result<()> {
        if description.name.trim().is_empty() {
            return Err(Error::Embedding("cannot register a model without a name".into()));
        }
        if description.source.id().trim().is_empty() {
            return Err(Error::Embedding(format!(
                "cannot register model '{}' without a source",
                description.name
            )));
        }
        if description.dimension == 0 {
            return Err(Error::Embedding(format!(
                "cannot register model '{}' with zero dimension",
                description.name
            )));
        }

        let mut models = self.write();
        if let Some(existing) = models.get(&description.name) {
            if existing.dimension == description.dimension {
                debug!(model = %description.name, "Model already registered");
            } else {
                warn!(
                    model = %description.name,
                    registered = existing.dimension,
                    requested = description.dimension,
                    "Model already registered with a different dimension, keeping the first"
                );
            }
            return Ok(());
        }

        info!(
            model = %description.name,
            source = %description.source.id(),
            dimension = description.dimension,
            "Registered custom model"
        );
        models.insert(description.name.clone(), description);
        Ok(())
    }

    /// Look up a model description by name.
    #[must_use]
    pub fn describe(&self, name: &str) -> Option<ModelDescription> {
        self.models
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Declared dimension of a registered model.
    #[must_use]
    pub fn dimension(&self, name: &str) -> Option<usize> {
        self.describe(name).map(|d| d.dimension)
    }

    /// Number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, ModelDescription>> {
        self.models
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
