//! Model cache diagnostics.
//!
//! Inspects the on-disk model cache to explain why a model is being
//! downloaded instead of loaded locally.

use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A `models--<org>--<name>` directory found in the cache.
#[derive(Debug, Clone, Serialize)]
pub struct CachedModel {
    pub name: String,
    pub path: PathBuf,
    pub has_refs_main: bool,
    pub has_snapshots: bool,
    pub has_weights: bool,
}

/// Summary of a model cache directory.
#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    pub path: PathBuf,
    pub exists: bool,
    pub is_dir: bool,
    pub total_files: usize,
    pub total_bytes: u64,
    pub models: Vec<CachedModel>,
}

impl CacheReport {
    /// Whether the cache holds at least one model with weights.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.models.iter().any(|m| m.has_weights)
    }
}

/// Inspect a model cache directory.
///
/// Never fails: unreadable entries are skipped and a missing directory is
/// reported through `exists`.
pub fn inspect(dir: &Path) -> CacheReport {
    let mut report = CacheReport {
        path: dir.to_path_buf(),
        exists: dir.exists(),
        is_dir: dir.is_dir(),
        total_files: 0,
        total_bytes: 0,
        models: Vec::new(),
    };

    if !report.is_dir {
        return report;
    }

    for entry in WalkDir::new(dir).into_iter().filter_map(std::result::Result::ok) {
        let file_type = entry.file_type();
        if file_type.is_file() {
            report.total_files += 1;
            report.total_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
        } else if file_type.is_dir() {
            let name = entry.file_name().to_string_lossy();
            if name.starts_with("models--") {
                report.models.push(describe_model_dir(entry.path(), &name));
            }
        }
    }

    report.models.sort_by(|a, b| a.name.cmp(&b.name));
    report
}

fn describe_model_dir(path: &Path, name: &str) -> CachedModel {
    let has_weights = WalkDir::new(path)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .any(|e| {
            let file = e.file_name().to_string_lossy();
            e.file_type().is_file() && (file.ends_with(".safetensors") || file.ends_with(".onnx"))
        });

    CachedModel {
        name: name.to_string(),
        path: path.to_path_buf(),
        has_refs_main: path.join("refs").join("main").is_file(),
        has_snapshots: path.join("snapshots").is_dir(),
        has_weights,
    }
}
