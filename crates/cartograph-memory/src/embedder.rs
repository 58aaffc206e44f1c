//! Embedding capability contract: a stateless batch text → unit-vector mapping.
//!
//! The trait shape (`async_trait`, batch + single operations) follows the
//! teacher's `EmbeddingProvider`; the concrete implementation here is a
//! deterministic placeholder so the rest of the pipeline is fully exercisable
//! without bundling a real model — same role as the teacher's own
//! `generate_placeholder_embedding` fallback.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use cartograph_core::error::Result;

pub const EMBEDDING_DIM: usize = 384;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, order-preserving. Empty input yields empty output.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut batch = self.embed_batch(&[text]).await?;
        Ok(batch.pop().unwrap_or_default())
    }

    /// Stable model identifier recorded in `Meta` at first use.
    fn model_name(&self) -> &str;

    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }
}

/// Deterministic, SHA-256-seeded unit-vector embedder.
///
/// Identical input always yields identical output, satisfying §4.2's
/// determinism requirement without depending on a downloaded model.
pub struct PlaceholderEmbedder {
    model_name: String,
    dimensions: usize,
}

impl PlaceholderEmbedder {
    pub fn new() -> Self {
        PlaceholderEmbedder {
            model_name: "placeholder-sha256-384".to_string(),
            dimensions: EMBEDDING_DIM,
        }
    }
}

impl Default for PlaceholderEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for PlaceholderEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| embed_one(t, self.dimensions)).collect())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

fn embed_one(text: &str, dimensions: usize) -> Vec<f32> {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();

    let mut raw: Vec<f32> = (0..dimensions)
        .map(|i| {
            let byte = digest[i % digest.len()] as f32 / 255.0;
            (byte * 2.0) - 1.0
        })
        .collect();

    normalize(&mut raw);
    raw
}

fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// SHA-256 content hash, used both as the embedding-cache key and for
/// chunk/file fingerprints.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
