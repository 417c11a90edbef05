//! Embedding provider trait.
//!
//! Defines the interface that all embedding providers must implement.
//! Queries and documents are embedded through separate methods because
//! instruction-tuned models expect them in different formats.

use crate::error::Result;
use std::future::Future;
use std::pin::Pin;

use super::types::ProviderInfo;

/// Trait for embedding providers.
///
/// `vector_size` must be constant for the provider's lifetime and equal to
/// the length of every vector the embed methods return.
pub trait EmbeddingProvider: Send + Sync {
    /// Get provider metadata.
    fn info(&self) -> ProviderInfo;

    /// Name of the vector slot this provider writes to and reads from.
    fn vector_name(&self) -> String;

    /// Dimensionality of the vectors this provider returns.
    fn vector_size(&self) -> usize;

    /// Embed documents for storage. One vector per text, same order, no prefix.
    fn embed_documents(&self, texts: &[&str]) -> impl Future<Output = Result<Vec<Vec<f32>>>> + Send;

    /// Embed a search query.
    ///
    /// Implementations may rewrite the query (e.g. prepend an instruction)
    /// before embedding; the rewritten text never leaves the provider.
    fn embed_query(&self, query: &str) -> impl Future<Output = Result<Vec<f32>>> + Send;
}

/// Boxed provider for dynamic dispatch.
///
/// Since the trait has async methods with `impl Future`, we need this wrapper
/// for runtime polymorphism.
pub struct BoxedProvider {
    inner: Box<dyn EmbeddingProviderBoxed + Send + Sync>,
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe version of EmbeddingProvider for boxing.
pub trait EmbeddingProviderBoxed: Send + Sync {
    fn info(&self) -> ProviderInfo;
    fn vector_name(&self) -> String;
    fn vector_size(&self) -> usize;
    fn embed_documents_boxed(&self, texts: &[&str]) -> BoxFuture<'_, Result<Vec<Vec<f32>>>>;
    fn embed_query_boxed(&self, query: &str) -> BoxFuture<'_, Result<Vec<f32>>>;
}

impl BoxedProvider {
    /// Create a new boxed provider.
    pub fn new<P: EmbeddingProvider + 'static>(provider: P) -> Self {
        Self {
            inner: Box::new(BoxedProviderWrapper(provider)),
        }
    }
}

impl EmbeddingProvider for BoxedProvider {
    fn info(&self) -> ProviderInfo {
        self.inner.info()
    }

    fn vector_name(&self) -> String {
        self.inner.vector_name()
    }

    fn vector_size(&self) -> usize {
        self.inner.vector_size()
    }

    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.inner.embed_documents_boxed(texts).await
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        self.inner.embed_query_boxed(query).await
    }
}

/// Wrapper to implement EmbeddingProviderBoxed for any EmbeddingProvider.
struct BoxedProviderWrapper<P: EmbeddingProvider + 'static>(P);

impl<P: EmbeddingProvider + 'static> EmbeddingProviderBoxed for BoxedProviderWrapper<P> {
    fn info(&self) -> ProviderInfo {
        self.0.info()
    }

    fn vector_name(&self) -> String {
        self.0.vector_name()
    }

    fn vector_size(&self) -> usize {
        self.0.vector_size()
    }

    fn embed_documents_boxed(&self, texts: &[&str]) -> BoxFuture<'_, Result<Vec<Vec<f32>>>> {
        // Owned copies so the future does not borrow the caller's slice.
        let texts_owned: Vec<String> = texts.iter().map(|s| (*s).to_string()).collect();
        Box::pin(async move {
            let refs: Vec<&str> = texts_owned.iter().map(String::as_str).collect();
            self.0.embed_documents(&refs).await
        })
    }

    fn embed_query_boxed(&self, query: &str) -> BoxFuture<'_, Result<Vec<f32>>> {
        let query_owned = query.to_string();
        Box::pin(async move { self.0.embed_query(&query_owned).await })
    }
}
