//! Model command implementation.
//!
//! Reports the resolved embedding configuration and what the model cache
//! on disk actually contains, to explain slow first starts and hub
//! downloads.

use crate::config::Settings;
use crate::embeddings::{
    create_embedding_provider, inspect_cache, CacheReport, EmbeddingProvider, ModelRegistry,
    ProviderInfo,
};
use crate::error::Result;
use colored::Colorize;
use serde::Serialize;
use std::sync::Arc;

use super::block_on;

#[derive(Serialize)]
struct ModelOutput<'a> {
    provider: String,
    model: &'a str,
    source: Option<&'a str>,
    vector_name: &'a str,
    query_prefix: &'a str,
    cache: CacheReport,
    loaded: Option<ProviderInfo>,
}

/// Execute the model command.
///
/// # Errors
///
/// Returns an error only when `load` is set and the model fails to load.
pub fn execute(settings: &Settings, load: bool, json: bool) -> Result<()> {
    let cache = inspect_cache(&settings.cache_dir);

    let mut loaded = None;
    if load {
        block_on(async {
            let registry = Arc::new(ModelRegistry::with_builtin_models());
            let provider = create_embedding_provider(settings, registry).await?;
            loaded = Some(provider.info());
            Ok(())
        })?;
    }

    if json {
        let output = ModelOutput {
            provider: settings.provider.to_string(),
            model: &settings.model_name,
            source: settings.model_source.as_deref(),
            vector_name: &settings.vector_name,
            query_prefix: &settings.query_prefix,
            cache,
            loaded,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("{}", "Embedding Model".cyan().bold());
    println!("  Provider:     {}", settings.provider);
    println!("  Model:        {}", settings.model_name);
    if let Some(source) = &settings.model_source {
        println!("  Source:       {source}");
    }
    println!("  Vector name:  {}", settings.vector_name);
    if settings.query_prefix.is_empty() {
        println!("  Query prefix: {}", "(none)".dimmed());
    } else {
        println!("  Query prefix: {}", settings.query_prefix);
    }
    println!();

    print_cache(&cache);

    if let Some(info) = loaded {
        println!();
        println!("{}", "Loaded".cyan().bold());
        println!("  Model:      {}", info.model);
        println!("  Vector:     {}", info.vector_name);
        println!("  Dimensions: {}", info.dimensions);
    }

    Ok(())
}

fn print_cache(cache: &CacheReport) {
    println!("{}", "Model Cache".cyan().bold());
    println!("  Path:   {}", cache.path.display());

    if !cache.exists {
        println!("  Status: {}", "missing (models will be downloaded)".yellow());
        return;
    }
    if !cache.is_dir {
        println!("  Status: {}", "not a directory".red());
        return;
    }

    println!("  Files:  {} ({} bytes)", cache.total_files, cache.total_bytes);
    if cache.models.is_empty() {
        println!("  Status: {}", "no cached models".yellow());
        return;
    }

    for model in &cache.models {
        let mark = |ok: bool| if ok { "✓".green() } else { "✗".red() };
        println!(
            "  {} {}  refs/main {}  snapshots {}",
            mark(model.has_weights),
            model.name,
            mark(model.has_refs_main),
            mark(model.has_snapshots)
        );
    }
}
