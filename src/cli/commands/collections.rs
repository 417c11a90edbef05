//! Collections command implementation.

use crate::config::Settings;
use crate::error::Result;
use crate::store::VectorStore;
use serde::Serialize;

use super::{block_on, open_store};

#[derive(Serialize)]
struct CollectionsOutput {
    collections: Vec<String>,
    count: usize,
    default: Option<String>,
}

/// List the collections in the configured Qdrant instance.
///
/// No model is loaded for this command.
///
/// # Errors
///
/// Returns `Error::Store` if Qdrant cannot be reached.
pub fn execute(settings: &Settings, json: bool) -> Result<()> {
    block_on(async {
        let store = open_store(settings)?;
        let collections = store.list_collections().await?;

        if json {
            let output = CollectionsOutput {
                count: collections.len(),
                collections,
                default: settings.collection_name.clone(),
            };
            println!("{}", serde_json::to_string(&output)?);
        } else if collections.is_empty() {
            println!("No collections.");
        } else {
            for name in &collections {
                let marker = if settings.collection_name.as_deref() == Some(name.as_str()) {
                    " (default)"
                } else {
                    ""
                };
                println!("{name}{marker}");
            }
        }
        Ok(())
    })
}
