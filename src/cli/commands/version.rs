//! `recall version`: build info plus the compiled-in defaults.

use crate::config::{DEFAULT_COLLECTION, DEFAULT_QDRANT_URL};
use crate::embeddings::{DEFAULT_MODEL, DEFAULT_VECTOR_NAME};
use crate::error::Result;
use serde::Serialize;

#[derive(Serialize)]
struct VersionOutput {
    name: &'static str,
    version: &'static str,
    profile: &'static str,
    defaults: Defaults,
}

/// What a run with no config file and no environment would use.
#[derive(Serialize)]
struct Defaults {
    qdrant_url: &'static str,
    collection: &'static str,
    embedding_model: &'static str,
    vector_name: &'static str,
}

fn version_output() -> VersionOutput {
    VersionOutput {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        profile: if cfg!(debug_assertions) { "debug" } else { "release" },
        defaults: Defaults {
            qdrant_url: DEFAULT_QDRANT_URL,
            collection: DEFAULT_COLLECTION,
            embedding_model: DEFAULT_MODEL,
            vector_name: DEFAULT_VECTOR_NAME,
        },
    }
}

/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(json: bool) -> Result<()> {
    let output = version_output();
    if json {
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    let d = &output.defaults;
    println!("{} {} ({})", output.name, output.version, output.profile);
    println!("  qdrant:     {} (collection {})", d.qdrant_url, d.collection);
    println!("  embeddings: {} -> {}", d.embedding_model, d.vector_name);
    Ok(())
}
