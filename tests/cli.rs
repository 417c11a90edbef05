//! Binary surface tests. None of these need a Qdrant server or a model.

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

const RECALL_ENV: &[&str] = &[
    "QDRANT_URL",
    "QDRANT_API_KEY",
    "COLLECTION_NAME",
    "QDRANT_SEARCH_LIMIT",
    "QDRANT_READ_ONLY",
    "EMBEDDING_PROVIDER",
    "EMBEDDING_MODEL",
    "CUSTOM_HF_MODEL_ID",
    "MODEL_CACHE_DIR",
    "CUSTOM_QUERY_PREFIX",
    "EMBEDDING_QUERY_PREFIX",
    "QDRANT_VECTOR_NAME",
    "HF_ENDPOINT",
    "HF_TOKEN",
    "RUST_LOG",
];

/// `recall` with a clean environment and an empty home directory.
fn recall(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("recall").unwrap();
    for key in RECALL_ENV {
        cmd.env_remove(key);
    }
    cmd.env("HOME", home.path());
    cmd
}

fn stderr_json(output: &std::process::Output) -> Value {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let line = stderr.lines().last().unwrap_or_default();
    serde_json::from_str(line).unwrap()
}

#[test]
fn test_version_json() {
    let home = TempDir::new().unwrap();
    let output = recall(&home).args(["version", "--json"]).output().unwrap();
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["name"], "social-recall");
    assert_eq!(json["defaults"]["collection"], "social_media");
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    let output = recall(&home).arg("--help").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["store", "find", "collections", "model"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn test_store_in_read_only_mode_fails() {
    let home = TempDir::new().unwrap();
    let output = recall(&home)
        .env("QDRANT_READ_ONLY", "true")
        .args(["store", "hello world"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let json = stderr_json(&output);
    assert_eq!(json["error"]["code"], "READ_ONLY");
    assert!(json["error"]["hint"].is_string());
}

#[test]
fn test_store_rejects_non_object_metadata() {
    let home = TempDir::new().unwrap();
    let output = recall(&home)
        .args(["store", "hello", "--metadata", "[1, 2]"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(5));
    assert_eq!(stderr_json(&output)["error"]["code"], "INVALID_ARGUMENT");
}

#[test]
fn test_bad_search_limit_is_config_error() {
    let home = TempDir::new().unwrap();
    let output = recall(&home)
        .env("QDRANT_SEARCH_LIMIT", "lots")
        .args(["find", "hiking"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stderr_json(&output)["error"]["code"], "CONFIG_ERROR");
}

#[test]
fn test_malformed_config_file_is_config_error() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join(".social-recall");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.json"), "{ not json").unwrap();

    let output = recall(&home).args(["collections"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_non_http_qdrant_url_is_config_error() {
    let home = TempDir::new().unwrap();
    let output = recall(&home)
        .env("QDRANT_URL", "localhost:6334")
        .args(["collections"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stderr_json(&output)["error"]["code"], "CONFIG_ERROR");
}

#[test]
fn test_model_reports_cache_without_loading() {
    let home = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    let model_dir = cache.path().join("models--intfloat--multilingual-e5-large-instruct");
    std::fs::create_dir_all(model_dir.join("snapshots")).unwrap();

    let output = recall(&home)
        .env("MODEL_CACHE_DIR", cache.path())
        .args(["model", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["provider"], "custom");
    assert_eq!(json["vector_name"], "text_dense");
    assert_eq!(json["cache"]["exists"], true);
    assert_eq!(json["cache"]["models"][0]["has_snapshots"], true);
    assert!(json["loaded"].is_null());
}

#[test]
fn test_completions_generate() {
    let home = TempDir::new().unwrap();
    let output = recall(&home).args(["completions", "bash"]).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("recall"));
}
