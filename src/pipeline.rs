//! Per-brand pipeline orchestration
//!
//! This module runs one brand from its community identifier to a feature
//! correlation table.
//!
//! Pipeline stages:
//! 1. SimilarityResolver - Resolve the related communities
//! 2. ActivityTable - Keep links touching those communities
//! 3. StockSource - Load the brand's stock rows
//! 4. StockNormalizer / VolatilityPair - Prepare the table and derive volatility
//! 5. FeatureCorrelator - Correlate each feature with both volatility series
//!
//! Every stage that has nothing to work with ends the run as a
//! [`BrandOutcome::Skipped`]; errors end it as [`SkipReason::Failed`].

use crate::adapters::{CsvStockSource, EmbeddingResolver, SimilarityResolver, StockSource};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::FeatureCorrelator;
use crate::normalizer::StockNormalizer;
use crate::schema::EmbeddingTable;
use crate::types::{
    ActivityTable, BrandCorrelations, BrandOutcome, BrandTicker, SkipReason, SkippedBrand,
};
use crate::volatility::VolatilityPair;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Run the pipeline for one brand against an embedding table and a stock directory.
///
/// # Arguments
/// * `brand` - Brand and ticker to analyze
/// * `embeddings` - Community embedding table
/// * `activity` - Full hyperlink activity table
/// * `finance_path` - Directory holding `<TICKER>.csv` files
/// * `config` - Analysis configuration
///
/// # Example
/// ```ignore
/// let outcome = analyze_brand(
///     &BrandTicker::new("amazon", "AMZN"),
///     &embeddings,
///     &activity,
///     Path::new("data/finance"),
///     &AnalysisConfig::default(),
/// );
/// ```
pub fn analyze_brand(
    brand: &BrandTicker,
    embeddings: &EmbeddingTable,
    activity: &ActivityTable,
    finance_path: &Path,
    config: &AnalysisConfig,
) -> BrandOutcome {
    let resolver = EmbeddingResolver::from_config(embeddings, config);
    let stocks = CsvStockSource::new(finance_path);
    BrandPipeline::new(&resolver, &stocks, config).analyze_brand(brand, activity)
}

/// Per-brand pipeline over arbitrary collaborators.
///
/// Holds only shared borrows, so one pipeline can serve many brands across threads.
#[derive(Clone, Copy)]
pub struct BrandPipeline<'a> {
    resolver: &'a dyn SimilarityResolver,
    stocks: &'a dyn StockSource,
    config: &'a AnalysisConfig,
}

impl<'a> BrandPipeline<'a> {
    pub fn new(
        resolver: &'a dyn SimilarityResolver,
        stocks: &'a dyn StockSource,
        config: &'a AnalysisConfig,
    ) -> Self {
        Self {
            resolver,
            stocks,
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        self.config
    }

    /// Analyze one brand. Never fails; failures become `Skipped(Failed)`.
    pub fn analyze_brand(&self, brand: &BrandTicker, activity: &ActivityTable) -> BrandOutcome {
        let outcome = self
            .run(brand, activity)
            .unwrap_or_else(|e| skipped(brand, SkipReason::Failed(e.to_string())));

        match &outcome {
            BrandOutcome::Analyzed(result) => debug!(
                brand = %result.brand,
                ticker = %result.ticker,
                communities = result.community_count,
                activity = result.activity_count,
                features = result.table.len(),
                "brand analyzed"
            ),
            BrandOutcome::Skipped(skip) => match &skip.reason {
                SkipReason::Failed(_) => warn!(
                    brand = %skip.brand,
                    ticker = %skip.ticker,
                    reason = %skip.reason,
                    "brand failed"
                ),
                _ => info!(
                    brand = %skip.brand,
                    ticker = %skip.ticker,
                    reason = %skip.reason,
                    "brand skipped"
                ),
            },
        }

        outcome
    }

    /// Feature columns to correlate
    pub fn features(&self, activity: &ActivityTable) -> Vec<String> {
        self.config.feature_columns(activity)
    }

    fn run(
        &self,
        brand: &BrandTicker,
        activity: &ActivityTable,
    ) -> Result<BrandOutcome, AnalysisError> {
        // Stage 1: Resolve similar communities
        let communities: HashSet<String> = self
            .resolver
            .similar(&brand.brand)?
            .into_iter()
            .map(|community| community.name.to_lowercase())
            .collect();
        if communities.is_empty() {
            return Ok(skipped(brand, SkipReason::NoSimilarCommunities));
        }
        debug!(brand = %brand.brand, communities = communities.len(), "resolved similar communities");

        // Stage 2: Join activity
        let records = activity.touching(&communities);
        if records.is_empty() {
            return Ok(skipped(brand, SkipReason::NoActivity));
        }

        // Stage 3: Load stock rows
        let rows = self.stocks.load(brand)?;
        if rows.is_empty() {
            return Ok(skipped(brand, SkipReason::NoStockData));
        }

        // Stage 4: Prepare and derive volatility
        let stock = StockNormalizer::prepare(rows);
        if stock.is_empty() {
            return Ok(skipped(brand, SkipReason::NoStockData));
        }
        let volatility = VolatilityPair::from_stock(
            &stock,
            self.config.volatility_window,
            self.config.cadence,
        );

        // Stage 5: Correlate features
        let features = self.features(activity);
        let table = FeatureCorrelator::new(self.config.cadence).correlate(
            &records,
            &volatility,
            &features,
        );
        if table.is_empty() {
            return Ok(skipped(brand, SkipReason::NoCorrelations));
        }

        Ok(BrandOutcome::Analyzed(BrandCorrelations {
            brand: brand.brand.clone(),
            ticker: brand.ticker.clone(),
            community_count: communities.len(),
            activity_count: records.len(),
            table,
        }))
    }
}

fn skipped(brand: &BrandTicker, reason: SkipReason) -> BrandOutcome {
    BrandOutcome::Skipped(SkippedBrand {
        brand: brand.brand.clone(),
        ticker: brand.ticker.clone(),
        reason,
    })
}
