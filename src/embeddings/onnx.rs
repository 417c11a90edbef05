//! ONNX transformer backend on fastembed.
//!
//! Loads a user-defined model from a local directory (see [`super::hub`])
//! with the pooling recorded in its [`ModelDescription`]. Files listed in
//! `additional_files` are handed to the runtime as external initializers,
//! which is how large models such as `multilingual-e5-large-instruct` ship
//! their weights (`onnx/model.onnx` + `onnx/model.onnx_data`).

use crate::error::{Error, Result};
use fastembed::{
    InitOptionsUserDefined, Pooling as OnnxPooling, TextEmbedding, TokenizerFiles,
    UserDefinedEmbeddingModel,
};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

use super::backend::EmbeddingBackend;
use super::registry::{ModelDescription, Pooling};

/// fastembed ONNX backend.
///
/// fastembed's `embed()` takes `&mut self`, hence the mutex.
pub struct OnnxBackend {
    model: Mutex<TextEmbedding>,
    model_name: String,
}

impl OnnxBackend {
    /// Load `description` from `dir`, which must hold every required file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Embedding` if the description is not an ONNX model,
    /// asks for unnormalized output, a file is missing, or the runtime
    /// rejects the model.
    pub fn load(description: &ModelDescription, dir: &Path) -> Result<Self> {
        let files = ModelFiles::read(description, dir)?;

        let mut model = UserDefinedEmbeddingModel::new(files.onnx, files.tokenizer)
            .with_pooling(onnx_pooling(description.pooling));
        for (name, buffer) in files.external {
            model = model.with_external_initializer(name, buffer);
        }

        let embedding = TextEmbedding::try_new_from_user_defined(model, InitOptionsUserDefined::default())
            .map_err(|e| {
                Error::Embedding(format!(
                    "Failed to load model '{}' from {}: {e}",
                    description.name,
                    dir.display()
                ))
            })?;

        info!(
            model = %description.name,
            dir = %dir.display(),
            pooling = ?description.pooling,
            "Loaded ONNX embedding model"
        );
        Ok(Self {
            model: Mutex::new(embedding),
            model_name: description.name.clone(),
        })
    }
}

impl EmbeddingBackend for OnnxBackend {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut model = self
            .model
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let embeddings = model
            .embed(texts.to_vec(), None)
            .map_err(|e| Error::Embedding(format!("Model '{}' failed to embed: {e}", self.model_name)))?;

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

fn onnx_pooling(pooling: Pooling) -> OnnxPooling {
    match pooling {
        Pooling::Mean => OnnxPooling::Mean,
        Pooling::Cls => OnnxPooling::Cls,
    }
}

/// Raw bytes of everything fastembed needs, read up front.
struct ModelFiles {
    onnx: Vec<u8>,
    /// External initializers keyed by the file name the graph refers to
    external: Vec<(String, Vec<u8>)>,
    tokenizer: TokenizerFiles,
}

impl ModelFiles {
    fn read(description: &ModelDescription, dir: &Path) -> Result<Self> {
        if !description.model_file.ends_with(".onnx") {
            return Err(Error::Embedding(format!(
                "Model '{}' ships {}, not an ONNX graph; use EMBEDDING_PROVIDER=model2vec for static models",
                description.name, description.model_file
            )));
        }
        // fastembed always L2-normalizes pooled output
        if !description.normalize {
            return Err(Error::Embedding(format!(
                "Model '{}' asks for unnormalized output, which the ONNX backend cannot produce",
                description.name
            )));
        }

        let read = |file: &str| {
            std::fs::read(dir.join(file)).map_err(|e| {
                Error::Embedding(format!(
                    "Failed to load model '{}': cannot read {file} in {}: {e}",
                    description.name,
                    dir.display()
                ))
            })
        };

        let external = description
            .additional_files
            .iter()
            .map(|file| -> Result<(String, Vec<u8>)> {
                let name = Path::new(file)
                    .file_name()
                    .map_or_else(|| file.clone(), |n| n.to_string_lossy().into_owned());
                Ok((name, read(file)?))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            onnx: read(&description.model_file)?,
            external,
            tokenizer: TokenizerFiles {
                tokenizer_file: read("tokenizer.json")?,
                config_file: read("config.json")?,
                special_tokens_map_file: read("special_tokens_map.json")?,
                tokenizer_config_file: read("tokenizer_config.json")?,
            },
        })
    }
}
