//! Vector index and document lookup boundaries, plus an in-memory brute-force index.

use crate::error::{EmbeddingError, Error, Result, StoreError};
use crate::memory::embedding::{cosine_similarity, euclidean_distance, EmbeddingProvider};
use crate::memory::types::{Candidate, Document};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Distance metric of the vector index. Both map onto "smaller is closer".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclidean,
}

impl DistanceMetric {
    /// Distance between two vectors under this metric.
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Cosine => (1.0 - cosine_similarity(a, b)).max(0.0),
            DistanceMetric::Euclidean => euclidean_distance(a, b),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
        }
    }
}

impl std::str::FromStr for DistanceMetric {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "cosine" => Ok(DistanceMetric::Cosine),
            "euclidean" => Ok(DistanceMetric::Euclidean),
            other => Err(Error::invalid(format!(
                "unsupported distance metric '{other}', expected cosine or euclidean"
            ))),
        }
    }
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Approximate nearest neighbor lookup over stored document vectors.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Up to `k` nearest documents, ascending by distance.
    ///
    /// The same document may recur across separate calls.
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Candidate>>;

    /// Create the index. Failing because it already exists is expected.
    async fn create_index(&self, _dim: usize, _metric: DistanceMetric) -> Result<()> {
        Ok(())
    }
}

/// Document lookup by id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, document_id: &str) -> Result<Document>;
}

#[derive(Debug, Clone, Copy)]
struct IndexSpec {
    dim: usize,
    metric: DistanceMetric,
}

#[derive(Debug)]
struct IndexedDocument {
    document: Document,
    vector: Vec<f32>,
}

/// Documents and their vectors held in memory, searched by full scan.
///
/// Until `create_index` is called, queries use cosine distance and every
/// vector must match the dimension of the first stored one.
#[derive(Debug, Default)]
pub struct InMemoryDocumentIndex {
    spec: RwLock<Option<IndexSpec>>,
    documents: RwLock<Vec<IndexedDocument>>,
}

impl InMemoryDocumentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document with its vector.
    pub async fn insert(&self, document: Document, vector: Vec<f32>) -> Result<()> {
        let spec = *self.spec.read().await;
        let mut documents = self.documents.write().await;
        check_dim(expected_dim(spec, &documents), &vector)?;

        match documents
            .iter_mut()
            .find(|entry| entry.document.id == document.id)
        {
            Some(existing) => {
                existing.document = document;
                existing.vector = vector;
            }
            None => documents.push(IndexedDocument { document, vector }),
        }
        Ok(())
    }

    /// Embed each document's content and insert it.
    pub async fn add_documents(
        &self,
        embeddings: &dyn EmbeddingProvider,
        documents: Vec<Document>,
    ) -> Result<()> {
        let texts = documents.iter().map(|d| d.content.clone()).collect();
        let vectors = embeddings.embed(texts).await?;
        if vectors.len() != documents.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: documents.len(),
                actual: vectors.len(),
            }
            .into());
        }
        for (document, vector) in documents.into_iter().zip(vectors) {
            self.insert(document, vector).await?;
        }
        Ok(())
    }

    pub async fn remove(&self, document_id: &str) {
        self.documents
            .write()
            .await
            .retain(|entry| entry.document.id != document_id);
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

/// The index's dimension once created, otherwise that of the first stored vector.
fn expected_dim(spec: Option<IndexSpec>, documents: &[IndexedDocument]) -> Option<usize> {
    spec.map(|spec| spec.dim)
        .or_else(|| documents.first().map(|entry| entry.vector.len()))
}

fn check_dim(expected: Option<usize>, vector: &[f32]) -> Result<()> {
    match expected {
        Some(expected) if vector.len() != expected => Err(StoreError::DimensionMismatch {
            expected,
            actual: vector.len(),
        }
        .into()),
        _ => Ok(()),
    }
}

#[async_trait]
impl VectorIndex for InMemoryDocumentIndex {
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Candidate>> {
        let spec = *self.spec.read().await;
        let metric = spec.map(|spec| spec.metric).unwrap_or_default();
        let documents = self.documents.read().await;
        check_dim(expected_dim(spec, &documents), vector)?;

        let mut candidates: Vec<Candidate> = documents
            .iter()
            .map(|entry| {
                Candidate::new(&entry.document.id, metric.distance(vector, &entry.vector))
            })
            .collect();

        candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        candidates.truncate(k);
        Ok(candidates)
    }

    async fn create_index(&self, dim: usize, metric: DistanceMetric) -> Result<()> {
        let mut spec = self.spec.write().await;
        if spec.is_some() {
            return Err(StoreError::IndexExists.into());
        }
        *spec = Some(IndexSpec { dim, metric });
        tracing::debug!(dim, %metric, "vector index created");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentIndex {
    async fn get(&self, document_id: &str) -> Result<Document> {
        self.documents
            .read()
            .await
            .iter()
            .find(|entry| entry.document.id == document_id)
            .map(|entry| entry.document.clone())
            .ok_or_else(|| StoreError::DocumentNotFound(document_id.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_parsing() {
        assert_eq!("cosine".parse::<DistanceMetric>().unwrap(), DistanceMetric::Cosine);
        assert_eq!(
            "euclidean".parse::<DistanceMetric>().unwrap(),
            DistanceMetric::Euclidean
        );
        let error = "manhattan".parse::<DistanceMetric>().unwrap_err();
        assert!(matches!(error, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn query_returns_ascending_distances_up_to_k() {
        let index = InMemoryDocumentIndex::new();
        index
            .create_index(2, DistanceMetric::Euclidean)
            .await
            .unwrap();
        index.insert(Document::with_id("far", "far"), vec![5.0, 0.0]).await.unwrap();
        index.insert(Document::with_id("near", "near"), vec![1.0, 0.0]).await.unwrap();
        index.insert(Document::with_id("mid", "mid"), vec![3.0, 0.0]).await.unwrap();

        let hits = index.query(&[0.0, 0.0], 2).await.unwrap();

        assert_eq!(
            hits,
            vec![Candidate::new("near", 1.0), Candidate::new("mid", 3.0)]
        );
    }

    #[tokio::test]
    async fn second_create_fails_with_index_exists() {
        let index = InMemoryDocumentIndex::new();
        index.create_index(3, DistanceMetric::Cosine).await.unwrap();

        let error = index.create_index(3, DistanceMetric::Cosine).await.unwrap_err();

        assert!(matches!(error, Error::Store(StoreError::IndexExists)));
    }

    #[tokio::test]
    async fn wrong_dimension_is_rejected() {
        let index = InMemoryDocumentIndex::new();
        index.create_index(3, DistanceMetric::Cosine).await.unwrap();

        let error = index.query(&[1.0, 0.0], 5).await.unwrap_err();
        assert!(matches!(
            error,
            Error::Store(StoreError::DimensionMismatch { expected: 3, actual: 2 })
        ));
        assert!(index.insert(Document::new("x"), vec![1.0]).await.is_err());
    }

    #[tokio::test]
    async fn stored_vectors_fix_the_dimension_before_index_creation() {
        let index = InMemoryDocumentIndex::new();
        index.insert(Document::with_id("a", "a"), vec![1.0, 0.0, 0.0]).await.unwrap();

        let error = index.query(&[1.0, 0.0], 5).await.unwrap_err();
        assert!(matches!(
            error,
            Error::Store(StoreError::DimensionMismatch { expected: 3, actual: 2 })
        ));
        assert!(index.insert(Document::with_id("b", "b"), vec![1.0]).await.is_err());
        assert_eq!(index.query(&[1.0, 0.0, 0.0], 5).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_index_accepts_any_dimension() {
        let index = InMemoryDocumentIndex::new();
        assert!(index.query(&[1.0, 2.0], 5).await.unwrap().is_empty());
    }

    /// Returns one vector fewer than it was asked for.
    struct ShortEmbeddings;

    #[async_trait]
    impl EmbeddingProvider for ShortEmbeddings {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().skip(1).map(|_| vec![1.0, 0.0]).collect())
        }

        fn dim(&self) -> usize {
            2
        }
    }

    #[tokio::test]
    async fn add_documents_rejects_missing_vectors() {
        let index = InMemoryDocumentIndex::new();

        let error = index
            .add_documents(
                &ShortEmbeddings,
                vec![Document::new("first"), Document::new("second")],
            )
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            Error::Embedding(EmbeddingError::CountMismatch { expected: 2, actual: 1 })
        ));
        assert!(index.is_empty().await);
    }

    #[tokio::test]
    async fn insert_replaces_same_id() {
        let index = InMemoryDocumentIndex::new();
        index.insert(Document::with_id("a", "old"), vec![1.0, 0.0]).await.unwrap();
        index.insert(Document::with_id("a", "new"), vec![0.0, 1.0]).await.unwrap();

        assert_eq!(index.len().await, 1);
        assert_eq!(index.get("a").await.unwrap().content, "new");
    }

    #[tokio::test]
    async fn missing_document_is_an_upstream_error() {
        let index = InMemoryDocumentIndex::new();
        let error = index.get("nope").await.unwrap_err();
        assert!(error.is_upstream());
    }
}
