//! Entry model.
//!
//! An entry is what callers store and what searches return. `platform` and
//! `date` are never supplied by the store itself; they are derived from the
//! content and metadata of search results.

use serde::{Deserialize, Serialize};

use super::enrich::{detect_platform, extract_date};

/// Free-form structured payload attached at store time.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A single entry in a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// The embeddable text
    pub content: String,

    /// Caller-supplied metadata
    #[serde(default)]
    pub metadata: Option<Metadata>,

    /// Relevance score from the vector store, set on search results only
    #[serde(default)]
    pub similarity_score: Option<f32>,

    /// Detected social media platform
    #[serde(default)]
    pub platform: Option<String>,

    /// Extracted or inferred date
    #[serde(default)]
    pub date: Option<String>,
}

impl Entry {
    /// Create an entry with content only.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: None,
            similarity_score: None,
            platform: None,
            date: None,
        }
    }

    /// Attach metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Fill `platform` and `date` if they are not already set.
    ///
    /// Existing values are never overwritten, so enriching twice is the
    /// same as enriching once.
    pub fn enrich(&mut self) {
        if self.platform.is_none() {
            self.platform = Some(detect_platform(&self.content).to_string());
        }
        if self.date.is_none() {
            self.date = extract_date(&self.content, self.metadata.as_ref());
        }
    }

    /// Owned variant of [`Entry::enrich`].
    #[must_use]
    pub fn enriched(mut self) -> Self {
        self.enrich();
        self
    }
}
