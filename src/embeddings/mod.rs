//! Embedding module.
//!
//! Turns text into fixed-size vectors for the Qdrant connector.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │    Connector     │
//! └────────┬─────────┘
//!          │ EmbeddingProvider
//!     ┌────┴──────────────┐
//!     ▼                   ▼
//! ┌────────────┐   ┌─────────────┐
//! │   Custom   │   │  Model2Vec  │
//! │ (prefixed) │   │   (stock)   │
//! └─────┬──────┘   └──────┬──────┘
//!       │ EmbeddingBackend │
//!       ▼                  ▼
//! ┌─────────────┐   ┌──────────────────┐
//! │ OnnxBackend │   │StaticModelBackend│ ◄── ModelRegistry
//! │ (fastembed) │   │  (model2vec-rs)  │
//! └──────┬──────┘   └────────┬─────────┘
//!        │ hub::materialize  │
//!        ▼                   ▼
//!     MODEL_CACHE_DIR / HuggingFace Hub
//! ```
//!
//! # Configuration
//!
//! - `EMBEDDING_PROVIDER` - `custom` (default) or `model2vec`
//! - `EMBEDDING_MODEL` - Model name (default: `multilingual-e5-large-instruct`)
//! - `CUSTOM_HF_MODEL_ID` - HuggingFace repo to register the model from
//! - `MODEL_CACHE_DIR` - Model cache (default: `/mnt/mcp_model`)
//! - `CUSTOM_QUERY_PREFIX` - Query instruction prefix
//! - `QDRANT_VECTOR_NAME` - Vector slot name (default: `text_dense`)
//! - `HF_ENDPOINT` / `HF_TOKEN` - Hub used for model file downloads

pub mod backend;
pub mod cache;
pub mod config;
pub mod custom;
pub mod factory;
pub mod hub;
pub mod model2vec;
pub mod onnx;
pub mod provider;
pub mod registry;
pub mod types;

// Re-exports for convenience
pub use backend::{EmbeddingBackend, StaticModelBackend};
pub use cache::{inspect as inspect_cache, CacheReport, CachedModel};
pub use config::{resolve_cache_dir, DEFAULT_MODEL, DEFAULT_QUERY_PREFIX, DEFAULT_VECTOR_NAME};
pub use custom::{CustomEmbeddingProvider, CustomProviderOptions};
pub use factory::create_embedding_provider;
pub use model2vec::Model2VecProvider;
pub use onnx::OnnxBackend;
pub use provider::{BoxedProvider, EmbeddingProvider};
pub use registry::{ModelDescription, ModelRegistry, ModelSource, Pooling};
pub use types::{EmbeddingProviderType, EmbeddingSettings, ModelConfig, ProviderInfo};
