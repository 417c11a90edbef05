//! Model files from the HuggingFace Hub.
//!
//! Files are laid out the way the hub cache lays them out, so a cache that
//! was populated by other tools is reused as is:
//! `models--<org>--<name>/refs/main` names the snapshot and
//! `models--<org>--<name>/snapshots/<snapshot>/` holds the files.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::backend::cache_dir_name;
use super::config::{resolve_hf_endpoint, resolve_hf_token};
use super::registry::ModelDescription;

/// Tokenizer files a transformer model needs next to its weights.
pub const TOKENIZER_FILES: [&str; 4] = [
    "tokenizer.json",
    "config.json",
    "special_tokens_map.json",
    "tokenizer_config.json",
];

/// Revision downloaded files are fetched from and stored under.
const REVISION: &str = "main";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Every file `description` needs on disk: weights, extra files, tokenizer.
#[must_use]
pub fn required_files(description: &ModelDescription) -> Vec<String> {
    let mut files = vec![description.model_file.clone()];
    let extra = description
        .additional_files
        .iter()
        .map(String::as_str)
        .chain(TOKENIZER_FILES);
    for file in extra {
        if !files.iter().any(|f| f == file) {
            files.push(file.to_string());
        }
    }
    files
}

/// A local directory that already holds every required file.
///
/// Checks `cache_dir/<name>` first, then the snapshot `refs/main` points at.
#[must_use]
pub fn find_local(description: &ModelDescription, cache_dir: &Path) -> Option<PathBuf> {
    let files = required_files(description);
    let repo_dir = cache_dir.join(cache_dir_name(description.source.id()));
    let snapshot = std::fs::read_to_string(repo_dir.join("refs").join("main"))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| REVISION.to_string());

    [cache_dir.join(&description.name), repo_dir.join("snapshots").join(snapshot)]
        .into_iter()
        .find(|dir| files.iter().all(|file| dir.join(file).is_file()))
}

/// Make sure every file of `description` is on disk, downloading what is
/// missing, and return the directory holding them.
///
/// # Errors
///
/// Returns `Error::Embedding` if a download fails and `Error::Io` if the
/// cache cannot be written.
pub async fn materialize(description: &ModelDescription, cache_dir: &Path) -> Result<PathBuf> {
    if let Some(dir) = find_local(description, cache_dir) {
        debug!(model = %description.name, dir = %dir.display(), "Model files found in cache");
        return Ok(dir);
    }
    HubClient::from_env()?.fetch_model(description, cache_dir).await
}

/// Minimal HuggingFace Hub file client.
#[derive(Debug, Clone)]
pub struct HubClient {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HubClient {
    /// # Errors
    ///
    /// Returns `Error::Config` if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token,
        })
    }

    /// Client for `HF_ENDPOINT` / `HF_TOKEN`.
    ///
    /// # Errors
    ///
    /// Same as [`HubClient::new`].
    pub fn from_env() -> Result<Self> {
        Self::new(resolve_hf_endpoint(), resolve_hf_token())
    }

    fn file_url(&self, repo: &str, file: &str) -> String {
        format!("{}/{repo}/resolve/{REVISION}/{file}", self.endpoint)
    }

    /// Download the missing files of `description` into the hub layout
    /// under `cache_dir` and point `refs/main` at them.
    ///
    /// # Errors
    ///
    /// Same as [`materialize`].
    pub async fn fetch_model(&self, description: &ModelDescription, cache_dir: &Path) -> Result<PathBuf> {
        let repo = description.source.id();
        let repo_dir = cache_dir.join(cache_dir_name(repo));
        let snapshot = repo_dir.join("snapshots").join(REVISION);

        info!(model = %description.name, repo, target = %snapshot.display(), "Downloading model files");
        for file in required_files(description) {
            let target = snapshot.join(&file);
            if target.is_file() {
                continue;
            }
            self.download(repo, &file, &target).await?;
        }

        let refs = repo_dir.join("refs");
        tokio::fs::create_dir_all(&refs).await?;
        tokio::fs::write(refs.join("main"), REVISION).await?;
        Ok(snapshot)
    }

    /// Stream one file to `target`, via a `.part` file renamed on completion.
    async fn download(&self, repo: &str, file: &str, target: &Path) -> Result<()> {
        let url = self.file_url(repo, file);
        debug!(url = %url, "Downloading");

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let mut response = request
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to download {file} from {repo}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Embedding(format!(
                "Failed to download {file} from {repo}: HTTP {status}"
            )));
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file_name = target.file_name().map_or_else(|| file.into(), |n| n.to_string_lossy());
        let partial = target.with_file_name(format!("{file_name}.part"));

        let mut out = tokio::fs::File::create(&partial).await?;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::Embedding(format!("Download of {file} from {repo} was interrupted: {e}")))?
        {
            out.write_all(&chunk).await?;
        }
        out.flush().await?;
        tokio::fs::rename(&partial, target).await?;
        Ok(())
    }
}
