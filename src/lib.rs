//! brandpulse - Brand sentiment vs. stock volatility correlation engine
//!
//! brandpulse correlates hyperlink sentiment between forum communities with the
//! price and volume volatility of the brands those communities discuss, through
//! a deterministic pipeline: similar-community resolution → activity join →
//! stock preparation → volatility derivation → feature correlation →
//! cross-brand aggregation.
//!
//! ## Modules
//!
//! - **Per-Brand Pipeline**: one brand's feature correlation table ([`pipeline`])
//! - **Cross-Brand Aggregator**: ranked table across every mapped brand ([`aggregate`])
//! - **Analysis Session**: immutable result of one run, with brand series ([`session`])

pub mod adapters;
pub mod aggregate;
pub mod config;
pub mod error;
pub mod features;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod series;
pub mod session;
pub mod types;
pub mod volatility;

#[cfg(test)]
pub(crate) mod fixtures;

pub use adapters::{CsvStockSource, EmbeddingResolver, SimilarityResolver, StockSource};
pub use aggregate::{aggregate, reduce_correlations, CrossBrandAggregator};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use pipeline::{analyze_brand, BrandPipeline};
pub use report::{ReportEncoder, ReportFormat};
pub use session::{AnalysisSession, BrandSeries, SessionBuilder};
pub use types::{
    AggregateRow, AggregateTable, AggregationReport, BrandOutcome, BrandTicker, SkipReason,
};

// Schema exports
pub use schema::{ActivityReader, EmbeddingTable};

/// brandpulse version embedded in reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "brandpulse";
