//! Document retrieval: batched ANN lookups, candidate merge, optional rerank.

use crate::error::{EmbeddingError, Error, Result, StoreError};
use crate::memory::embedding::EmbeddingProvider;
use crate::memory::index::{DistanceMetric, DocumentStore, VectorIndex};
use crate::memory::merge::merge_candidates;
use crate::memory::types::{QueryInput, RetrievalResult};
use async_trait::async_trait;
use futures::future::try_join_all;
use std::sync::Arc;

/// Retriever settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrieverConfig {
    pub distance: DistanceMetric,
    /// Candidates at or beyond this distance are dropped.
    pub max_distance: f32,
    /// Maximum number of documents returned.
    pub k: usize,
    /// Present the final list least-similar first.
    pub reverse: bool,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            distance: DistanceMetric::Cosine,
            max_distance: 0.9,
            k: 5,
            reverse: true,
        }
    }
}

impl RetrieverConfig {
    /// Build a config from a metric tag ("cosine" or "euclidean").
    pub fn new(distance: &str, max_distance: f32, k: usize, reverse: bool) -> Result<Self> {
        let config = Self {
            distance: distance.parse()?,
            max_distance,
            k,
            reverse,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Error::invalid("k must be positive"));
        }
        if self.max_distance.is_nan() {
            return Err(Error::invalid("max_distance must be a number"));
        }
        Ok(())
    }
}

/// Post-processing over an ordered result. May reorder, filter, or annotate.
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn rerank(&self, result: RetrievalResult) -> Result<RetrievalResult>;
}

#[async_trait]
impl<F> Reranker for F
where
    F: Fn(RetrievalResult) -> Result<RetrievalResult> + Send + Sync,
{
    async fn rerank(&self, result: RetrievalResult) -> Result<RetrievalResult> {
        self(result)
    }
}

/// Retrieves documents for a query batch through a vector index.
#[derive(Clone)]
pub struct DocumentRetriever {
    documents: Arc<dyn DocumentStore>,
    index: Arc<dyn VectorIndex>,
    embeddings: Arc<dyn EmbeddingProvider>,
    reranker: Option<Arc<dyn Reranker>>,
    config: RetrieverConfig,
}

impl std::fmt::Debug for DocumentRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentRetriever")
            .field("config", &self.config)
            .field("reranker", &self.reranker.is_some())
            .finish_non_exhaustive()
    }
}

impl DocumentRetriever {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        index: Arc<dyn VectorIndex>,
        embeddings: Arc<dyn EmbeddingProvider>,
        config: RetrieverConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            documents,
            index,
            embeddings,
            reranker: None,
            config,
        })
    }

    pub fn with_reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Create the vector index if it does not exist yet.
    ///
    /// Best effort: failures are logged and otherwise ignored.
    pub async fn prepare_index(&self) {
        let dim = self.embeddings.dim();
        match self.index.create_index(dim, self.config.distance).await {
            Ok(()) => {
                tracing::info!(dim, distance = %self.config.distance, "vector index created");
            }
            Err(Error::Store(StoreError::IndexExists)) => {
                tracing::debug!("vector index already exists");
            }
            Err(error) => tracing::warn!(%error, "vector index creation failed, continuing"),
        }
    }

    /// Retrieve up to `k` documents for a query or a batch of queries.
    ///
    /// All queries share one ranked list. Finding nothing is not an error.
    pub async fn retrieve(&self, input: impl Into<QueryInput>) -> Result<RetrievalResult> {
        let mut result = RetrievalResult::new(input.into().into_batch());
        if result.queries.is_empty() {
            return Ok(result);
        }

        let vectors = self.embeddings.embed(result.queries.texts()).await?;
        if vectors.len() != result.queries.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: result.queries.len(),
                actual: vectors.len(),
            }
            .into());
        }

        // Over-fetch so dedup and the threshold still leave k behind.
        let fetch = self.config.k.saturating_mul(2);
        let lookups =
            try_join_all(vectors.iter().map(|vector| self.index.query(vector, fetch))).await?;
        let fetched: usize = lookups.iter().map(Vec::len).sum();

        let merged = merge_candidates(
            lookups.into_iter().flatten(),
            self.config.max_distance,
            self.config.k,
        );

        tracing::debug!(
            queries = result.queries.len(),
            fetched,
            kept = merged.len(),
            "document candidates merged"
        );

        if merged.is_empty() {
            return Ok(result);
        }

        result.documents = try_join_all(
            merged
                .iter()
                .map(|candidate| self.documents.get(&candidate.document_id)),
        )
        .await?;

        if let Some(reranker) = &self.reranker {
            result = reranker.rerank(result).await?;
        }

        if self.config.reverse {
            result.documents.reverse();
        }

        Ok(result)
    }
}
