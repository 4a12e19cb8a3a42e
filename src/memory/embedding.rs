//! Embedding providers: fastembed-backed model and deterministic fake embeddings.

use crate::error::{EmbeddingError, Error, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;

/// Turns text into fixed-dimension vectors.
///
/// `embed` returns one vector per input, in input order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Dimension of every vector this provider produces.
    fn dim(&self) -> usize;
}

/// Embedding model wrapper with thread-safe sharing.
///
/// fastembed inference is blocking, so calls go through spawn_blocking.
pub struct EmbeddingModel {
    model: Arc<fastembed::TextEmbedding>,
    dim: usize,
}

impl std::fmt::Debug for EmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingModel")
            .field("dim", &self.dim)
            .finish_non_exhaustive()
    }
}

impl EmbeddingModel {
    /// Create a new embedding model, storing downloaded model files in `cache_dir`.
    pub fn new(cache_dir: &Path) -> Result<Self> {
        let options = fastembed::InitOptions::default()
            .with_cache_dir(cache_dir.to_path_buf())
            .with_show_download_progress(true);

        let model = fastembed::TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::Failed(e.to_string()))?;

        let dim = model
            .embed(vec!["dimension probe"], None)
            .map_err(|e| EmbeddingError::Failed(e.to_string()))?
            .first()
            .map(Vec::len)
            .unwrap_or_default();

        tracing::info!(dim, cache_dir = %cache_dir.display(), "embedding model loaded");

        Ok(Self {
            model: Arc::new(model),
            dim,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for EmbeddingModel {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let model = self.model.clone();
        tokio::task::spawn_blocking(move || {
            model
                .embed(texts, None)
                .map_err(|e| Error::from(EmbeddingError::Failed(e.to_string())))
        })
        .await
        .map_err(|e| Error::Other(anyhow::anyhow!("embedding task failed: {}", e)))?
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

/// Deterministic embeddings derived from a SHA-256 digest of the text.
///
/// Equal texts map to equal unit vectors. Useful for tests and offline runs
/// where no model is available; the vectors carry no semantic meaning.
#[derive(Debug, Clone)]
pub struct FakeEmbeddings {
    dim: usize,
}

impl FakeEmbeddings {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    /// Embed a single text synchronously.
    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = Vec::with_capacity(self.dim);
        let mut counter: u32 = 0;
        while vector.len() < self.dim {
            let digest = Sha256::new()
                .chain_update(text.as_bytes())
                .chain_update(counter.to_le_bytes())
                .finalize();
            for chunk in digest.chunks_exact(2) {
                if vector.len() == self.dim {
                    break;
                }
                let raw = u16::from_le_bytes([chunk[0], chunk[1]]);
                vector.push(raw as f32 / u16::MAX as f32 * 2.0 - 1.0);
            }
            counter += 1;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbeddings {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in [-1, 1] where:
/// - 1.0 means identical direction
/// - 0.0 means orthogonal
/// - -1.0 means opposite direction
///
/// Returns 0.0 if either vector is empty or has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

/// Euclidean (L2) distance between two vectors of equal length.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_embeddings_are_deterministic_unit_vectors() {
        let embeddings = FakeEmbeddings::new(250);
        let vectors = embeddings
            .embed(vec!["robot".into(), "sensors".into(), "robot".into()])
            .await
            .unwrap();

        assert_eq!(vectors.len(), 3);
        assert!(vectors.iter().all(|v| v.len() == 250));
        assert_eq!(vectors[0], vectors[2]);
        assert_ne!(vectors[0], vectors[1]);

        let norm = vectors[0].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn cosine_similarity_bounds() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn euclidean_distance_of_known_points() {
        assert!((euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-6);
        assert_eq!(euclidean_distance(&[1.0, 2.0], &[1.0, 2.0]), 0.0);
    }
}
