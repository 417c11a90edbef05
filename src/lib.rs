//! social-recall - semantic memory for social media captions
//!
//! Stores free-text entries in Qdrant and finds them again by meaning.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`tools`] - The `store` / `find` tool boundary
//! - [`connector`] - Collection lifecycle, upsert and search
//! - [`store`] - Vector store trait and Qdrant gRPC client
//! - [`embeddings`] - Embedding providers and model registry
//! - [`model`] - Entry type and enrichment rules
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod connector;
pub mod embeddings;
pub mod error;
pub mod model;
pub mod store;
pub mod tools;

pub use connector::Connector;
pub use error::{Error, Result};
pub use model::Entry;
pub use tools::MemoryTools;

/// Global quiet flag for `--quiet`.
///
/// When set, commands suppress informational output; errors and
/// requested data (search results, JSON) are still printed.
pub static QUIET: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

/// Check if quiet mode is active.
#[inline]
pub fn is_quiet() -> bool {
    QUIET.load(std::sync::atomic::Ordering::Relaxed)
}
