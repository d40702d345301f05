//! Collaborator adapters
//!
//! The per-brand pipeline depends on two outside sources: something that
//! knows which communities are close to a brand, and something that can load
//! a brand's stock history. Both are traits so callers can plug in their own.
//!
//! Reference implementations:
//! - [`EmbeddingResolver`]: cosine similarity over an embedding table
//! - [`CsvStockSource`]: `<root>/<TICKER>.csv` files
//! - `HashMap` implementations for precomputed, in-memory data

mod embedding;
mod finance;

pub use embedding::{cosine_similarity, EmbeddingResolver};
pub use finance::CsvStockSource;

use crate::error::AnalysisError;
use crate::types::{BrandTicker, SimilarCommunity, StockRow};
use std::collections::HashMap;

/// Resolves the communities semantically related to a brand
pub trait SimilarityResolver: Send + Sync {
    /// Similar communities of `brand`; empty when the brand is unknown
    fn similar(&self, brand: &str) -> Result<Vec<SimilarCommunity>, AnalysisError>;
}

/// Loads raw stock rows for a brand
pub trait StockSource: Send + Sync {
    /// Raw rows for `brand`; empty when no data exists
    fn load(&self, brand: &BrandTicker) -> Result<Vec<StockRow>, AnalysisError>;
}

/// Precomputed similar sets keyed by lowercase brand
impl SimilarityResolver for HashMap<String, Vec<SimilarCommunity>> {
    fn similar(&self, brand: &str) -> Result<Vec<SimilarCommunity>, AnalysisError> {
        Ok(self.get(&brand.to_lowercase()).cloned().unwrap_or_default())
    }
}

/// In-memory stock rows keyed by ticker
impl StockSource for HashMap<String, Vec<StockRow>> {
    fn load(&self, brand: &BrandTicker) -> Result<Vec<StockRow>, AnalysisError> {
        Ok(self.get(&brand.ticker).cloned().unwrap_or_default())
    }
}
