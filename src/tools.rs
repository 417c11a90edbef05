//! Tool boundary: the `store` and `find` operations exposed to agents.
//!
//! Thin layer over [`Connector`] that enforces read-only mode, applies the
//! configured default limit, and renders results as text for tool replies.

use crate::connector::Connector;
use crate::embeddings::{BoxedProvider, EmbeddingProvider};
use crate::error::{Error, Result};
use crate::model::{Entry, Metadata};
use crate::store::{QdrantClient, VectorStore};
use std::fmt::Write as _;
use tracing::info;

/// `store` / `find` operations over a connector.
pub struct MemoryTools<S = QdrantClient, P = BoxedProvider> {
    connector: Connector<S, P>,
    search_limit: usize,
    read_only: bool,
}

impl<S: VectorStore, P: EmbeddingProvider> MemoryTools<S, P> {
    pub fn new(connector: Connector<S, P>, search_limit: usize, read_only: bool) -> Self {
        Self {
            connector,
            search_limit,
            read_only,
        }
    }

    pub fn connector(&self) -> &Connector<S, P> {
        &self.connector
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Store a piece of information, returning the confirmation text.
    ///
    /// # Errors
    ///
    /// Returns `Error::ReadOnly` in read-only mode, `Error::InvalidArgument`
    /// for blank input, and any connector error otherwise.
    pub async fn store(
        &self,
        information: &str,
        metadata: Option<Metadata>,
        collection: Option<&str>,
    ) -> Result<String> {
        if self.read_only {
            return Err(Error::ReadOnly);
        }
        if information.trim().is_empty() {
            return Err(Error::InvalidArgument("information must not be empty".into()));
        }

        let mut entry = Entry::new(information);
        entry.metadata = metadata;
        self.connector.store(&entry, collection).await?;
        info!(collection = ?collection, "Stored entry");

        Ok(format!("Remembered: {information}"))
    }

    /// Find entries relevant to `query`. `limit` defaults to the configured limit.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` for a zero limit and any connector
    /// error otherwise.
    pub async fn find(
        &self,
        query: &str,
        limit: Option<usize>,
        collection: Option<&str>,
        filter: Option<serde_json::Value>,
    ) -> Result<Vec<Entry>> {
        let limit = limit.unwrap_or(self.search_limit);
        if limit == 0 {
            return Err(Error::InvalidArgument("limit must be at least 1".into()));
        }
        self.connector.search(query, collection, limit, filter).await
    }

    /// [`MemoryTools::find`] rendered as a tool reply.
    ///
    /// # Errors
    ///
    /// Same as [`MemoryTools::find`].
    pub async fn find_formatted(
        &self,
        query: &str,
        limit: Option<usize>,
        collection: Option<&str>,
        filter: Option<serde_json::Value>,
    ) -> Result<String> {
        let entries = self.find(query, limit, collection, filter).await?;
        Ok(format_results(query, &entries))
    }
}

/// Render search results as tool reply text.
#[must_use]
pub fn format_results(query: &str, entries: &[Entry]) -> String {
    if entries.is_empty() {
        return format!("No information found for the query '{query}'");
    }

    let mut out = format!("Results for the query '{query}'");
    for entry in entries {
        out.push('\n');
        out.push_str(&format_entry(entry));
    }
    out
}

/// Render a single entry as an `<entry>` block.
#[must_use]
pub fn format_entry(entry: &Entry) -> String {
    let metadata = entry
        .metadata
        .as_ref()
        .map(|m| serde_json::Value::Object(m.clone()).to_string())
        .unwrap_or_default();

    let mut out = format!(
        "<entry><content>{}</content><metadata>{metadata}</metadata>",
        entry.content
    );
    if let Some(score) = entry.similarity_score {
        let _ = write!(out, "<score>{score:.4}</score>");
    }
    if let Some(platform) = &entry.platform {
        let _ = write!(out, "<platform>{platform}</platform>");
    }
    if let Some(date) = &entry.date {
        let _ = write!(out, "<date>{date}</date>");
    }
    out.push_str("</entry>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::custom::tests::HashingBackend;
    use crate::embeddings::{CustomEmbeddingProvider, CustomProviderOptions, ModelDescription, ModelRegistry};
    use crate::store::memory::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    fn tools(read_only: bool) -> MemoryTools<MemoryStore, CustomEmbeddingProvider<HashingBackend>> {
        let registry = Arc::new(ModelRegistry::new());
        registry
            .register(ModelDescription::custom("hashing", "org/hashing", 32))
            .unwrap();
        let provider = CustomEmbeddingProvider::with_backend(
            CustomProviderOptions::new("hashing", "/tmp/unused"),
            registry,
            HashingBackend { dim: 32 },
        )
        .unwrap();
        let connector = Connector::new(MemoryStore::new(), Arc::new(provider), Some("posts".into()));
        MemoryTools::new(connector, 2, read_only)
    }

    #[tokio::test]
    async fn test_store_confirms() {
        let tools = tools(false);
        let reply = tools.store("first post #tweet", None, None).await.unwrap();
        assert_eq!(reply, "Remembered: first post #tweet");
    }

    #[tokio::test]
    async fn test_read_only_rejects_store() {
        let tools = tools(true);
        let err = tools.store("anything", None, None).await.unwrap_err();
        assert!(matches!(err, Error::ReadOnly));
        assert_eq!(tools.connector().collection_names().await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_blank_information_rejected() {
        let err = tools(false).store("   ", None, None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_find_uses_default_limit() {
        let tools = tools(false);
        for text in ["one", "two", "three"] {
            tools.store(text, None, None).await.unwrap();
        }
        assert_eq!(tools.find("one", None, None, None).await.unwrap().len(), 2);
        assert_eq!(tools.find("one", Some(3), None, None).await.unwrap().len(), 3);
        assert!(matches!(
            tools.find("one", Some(0), None, None).await,
            Err(Error::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_find_formatted_empty() {
        let reply = tools(false).find_formatted("hiking", None, None, None).await.unwrap();
        assert_eq!(reply, "No information found for the query 'hiking'");
    }

    #[tokio::test]
    async fn test_find_formatted_entries() {
        let tools = tools(false);
        let metadata = json!({ "date": "2024-03-15" }).as_object().cloned();
        tools.store("trail run #strava", metadata, None).await.unwrap();

        let reply = tools.find_formatted("trail run", Some(1), None, None).await.unwrap();
        assert!(reply.starts_with("Results for the query 'trail run'"));
        assert!(reply.contains("<content>trail run #strava</content>"));
        assert!(reply.contains(r#"<metadata>{"date":"2024-03-15"}</metadata>"#));
        assert!(reply.contains("<platform>Social Media</platform>"));
        assert!(reply.contains("<date>2024-03-15</date>"));
    }

    #[test]
    fn test_format_entry_without_optionals() {
        let entry = Entry::new("plain");
        assert_eq!(format_entry(&entry), "<entry><content>plain</content><metadata></metadata></entry>");
    }
}
