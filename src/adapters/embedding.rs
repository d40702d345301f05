//! Embedding-space similarity resolver

use super::SimilarityResolver;
use crate::config::{AnalysisConfig, DEFAULT_SIMILAR_TOP_K};
use crate::error::AnalysisError;
use crate::schema::EmbeddingTable;
use crate::types::SimilarCommunity;

/// Cosine similarity, `None` when either vector has zero norm
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    let similarity = dot / (norm_a * norm_b);
    similarity.is_finite().then_some(similarity)
}

/// Resolves similar communities by cosine similarity in an embedding table.
///
/// The brand's own community always comes first (score 1.0), followed by the
/// `top_k` closest other communities scoring at least `min_similarity`.
pub struct EmbeddingResolver<'a> {
    embeddings: &'a EmbeddingTable,
    top_k: usize,
    min_similarity: f64,
}

impl<'a> EmbeddingResolver<'a> {
    pub fn new(embeddings: &'a EmbeddingTable) -> Self {
        Self {
            embeddings,
            top_k: DEFAULT_SIMILAR_TOP_K,
            min_similarity: 0.0,
        }
    }

    /// Resolver using the configured `similar_top_k` and `min_similarity`
    pub fn from_config(embeddings: &'a EmbeddingTable, config: &AnalysisConfig) -> Self {
        Self::new(embeddings)
            .with_top_k(config.similar_top_k)
            .with_min_similarity(config.min_similarity)
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_min_similarity(mut self, min_similarity: f64) -> Self {
        self.min_similarity = min_similarity;
        self
    }
}

impl SimilarityResolver for EmbeddingResolver<'_> {
    fn similar(&self, brand: &str) -> Result<Vec<SimilarCommunity>, AnalysisError> {
        let brand = brand.to_lowercase();
        let Some(anchor) = self.embeddings.get(&brand) else {
            return Ok(Vec::new());
        };

        let mut neighbours: Vec<SimilarCommunity> = self
            .embeddings
            .iter()
            .filter(|(name, _)| *name != brand)
            .filter_map(|(name, vector)| {
                cosine_similarity(anchor, vector)
                    .filter(|score| *score >= self.min_similarity)
                    .map(|score| SimilarCommunity::new(name, score))
            })
            .collect();

        neighbours.sort_by(|a, b| b.score.total_cmp(&a.score));
        neighbours.truncate(self.top_k);

        let mut similar = Vec::with_capacity(neighbours.len() + 1);
        similar.push(SimilarCommunity::new(brand, 1.0));
        similar.extend(neighbours);
        Ok(similar)
    }
}
