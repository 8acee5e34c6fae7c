//! Per-user snippet index: add texts, retrieve the top-k most similar.
//!
//! Vectors come from [`HashEmbedder`] and are L2-normalized, so inner
//! product is cosine similarity. Everything lives in process memory; the
//! [`IndexCache`](crate::index_cache::IndexCache) bounds how many of these
//! exist at once.

use crate::embedding::HashEmbedder;
use switchboard_core::error::MemoryError;

/// Inner product with f64 accumulation. Zero on length mismatch is not an
/// option here; the caller checks dimensions first.
fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
    }
    dot as f32
}

/// An append-only similarity index over short texts.
pub struct SnippetIndex {
    embedder: HashEmbedder,
    docs: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

impl SnippetIndex {
    pub fn new(dim: usize) -> Self {
        Self {
            embedder: HashEmbedder::new(dim),
            docs: Vec::new(),
            vectors: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Embed and append texts. Duplicates are stored again; the index has
    /// no notion of identity beyond position.
    pub fn add<S: Into<String>>(&mut self, texts: impl IntoIterator<Item = S>) {
        for text in texts {
            let text = text.into();
            self.vectors.push(self.embedder.embed(&text));
            self.docs.push(text);
        }
    }

    /// Up to `k` stored texts most similar to `query`, most similar first.
    /// Empty when the index is empty or `k` is zero.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<String>, MemoryError> {
        if k == 0 || self.docs.is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = self.embedder.embed(query);

        let mut scored: Vec<(f32, usize)> = Vec::with_capacity(self.vectors.len());
        for (i, vector) in self.vectors.iter().enumerate() {
            if vector.len() != query_vec.len() {
                return Err(MemoryError::Index(format!(
                    "dimension mismatch: stored {} vs query {}",
                    vector.len(),
                    query_vec.len()
                )));
            }
            scored.push((inner_product(vector, &query_vec), i));
        }

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored.into_iter().map(|(_, i)| self.docs[i].clone()).collect())
    }
}
