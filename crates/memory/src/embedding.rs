//! Deterministic text embedding for the snippet index.
//!
//! Signed feature hashing over word unigrams and bigrams: each feature
//! hashes (FNV-1a) to a bucket and a sign, the buckets accumulate, and the
//! result is L2-normalized. No model weights, no I/O, and identical text
//! always produces an identical vector, which is all the snippet index
//! contract asks for. Texts sharing words land near each other under
//! inner product, which is what makes retrieval useful at all.

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Hash-based embedder with a fixed output dimension.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    /// `dim` is clamped to at least 1.
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Embed `text` into an L2-normalized vector. Text with no word
    /// characters embeds to the zero vector.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let words: Vec<String> = text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();

        let mut vector = vec![0.0f32; self.dim];
        let mut bump = |feature: &str| {
            let hash = fnv1a(feature.as_bytes());
            let bucket = (hash % self.dim as u64) as usize;
            let sign = if hash & (1u64 << 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        };

        for word in &words {
            bump(word);
        }
        for pair in words.windows(2) {
            bump(&format!("{} {}", pair[0], pair[1]));
        }

        let norm = vector.iter().map(|v| f64::from(*v) * f64::from(*v)).sum::<f64>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v = (f64::from(*v) / norm) as f32;
            }
        }
        vector
    }
}
