//! Analysis configuration
//!
//! Every tunable of the engine lives in [`AnalysisConfig`]. The defaults
//! reproduce the reference analysis; a JSON file may override any subset.

use crate::error::AnalysisError;
use crate::series::Cadence;
use crate::types::{ActivityTable, BrandTicker, LINK_SENTIMENT};
use crate::volatility::DEFAULT_VOLATILITY_WINDOW;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default consistency threshold on |average correlation|
pub const DEFAULT_CONSISTENCY_THRESHOLD: f64 = 0.10;

/// Default number of similar communities taken per brand
pub const DEFAULT_SIMILAR_TOP_K: usize = 10;

/// Brand → ticker pairs analyzed when no mapping is configured
pub const DEFAULT_BRANDS: [(&str, &str); 20] = [
    ("amazon", "AMZN"),
    ("apple", "AAPL"),
    ("google", "GOOGL"),
    ("microsoft", "MSFT"),
    ("facebook", "FB"),
    ("netflix", "NFLX"),
    ("tesla", "TSLA"),
    ("nvidia", "NVDA"),
    ("intel", "INTC"),
    ("amd", "AMD"),
    ("twitter", "TWTR"),
    ("ebay", "EBAY"),
    ("nintendo", "NTDOY"),
    ("sony", "SONY"),
    ("starbucks", "SBUX"),
    ("mcdonalds", "MCD"),
    ("nike", "NKE"),
    ("walmart", "WMT"),
    ("disney", "DIS"),
    ("cocacola", "KO"),
];

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Ordered brand → ticker mapping analyzed by the aggregator
    pub brands: Vec<BrandTicker>,
    /// Rolling window (trading days) for volatility
    pub volatility_window: usize,
    /// Cadence shared by volatility and feature series
    pub cadence: Cadence,
    /// |average correlation| a brand must exceed to count toward consistency
    pub consistency_threshold: f64,
    /// Similar communities kept per brand, besides the brand itself
    pub similar_top_k: usize,
    /// Minimum cosine similarity for a community to be kept
    pub min_similarity: f64,
    /// Feature columns to correlate; `None` uses every activity feature column
    pub features: Option<Vec<String>>,
    /// Column holding the compound sentiment-intensity score
    pub compound_column: String,
    /// Column holding the negative sentiment-intensity score
    pub negative_column: String,
    /// Field delimiter of activity files
    pub delimiter: char,
    /// First stock date kept in a session (inclusive)
    pub start_date: NaiveDate,
    /// Last stock date kept in a session (inclusive)
    pub end_date: NaiveDate,
    /// Run brands on the rayon thread pool
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            brands: DEFAULT_BRANDS
                .iter()
                .map(|(brand, ticker)| BrandTicker::new(*brand, *ticker))
                .collect(),
            volatility_window: DEFAULT_VOLATILITY_WINDOW,
            cadence: Cadence::MonthEnd,
            consistency_threshold: DEFAULT_CONSISTENCY_THRESHOLD,
            similar_top_k: DEFAULT_SIMILAR_TOP_K,
            min_similarity: 0.0,
            features: None,
            compound_column: "vader_compound".to_string(),
            negative_column: "vader_neg".to_string(),
            delimiter: '\t',
            start_date: NaiveDate::from_ymd_opt(2014, 1, 1).unwrap_or(NaiveDate::MIN),
            end_date: NaiveDate::from_ymd_opt(2017, 5, 1).unwrap_or(NaiveDate::MAX),
            parallel: false,
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    pub fn from_file(path: &Path) -> Result<Self, AnalysisError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.brands.is_empty() {
            return Err(AnalysisError::InvalidConfig(
                "brand mapping must not be empty".to_string(),
            ));
        }
        if self.volatility_window < 2 {
            return Err(AnalysisError::InvalidConfig(format!(
                "volatility_window must be at least 2, got {}",
                self.volatility_window
            )));
        }
        if !(0.0..=1.0).contains(&self.consistency_threshold) {
            return Err(AnalysisError::InvalidConfig(format!(
                "consistency_threshold must be within [0, 1], got {}",
                self.consistency_threshold
            )));
        }
        if self.similar_top_k == 0 {
            return Err(AnalysisError::InvalidConfig(
                "similar_top_k must be at least 1".to_string(),
            ));
        }
        if self.start_date > self.end_date {
            return Err(AnalysisError::InvalidConfig(format!(
                "start_date {} is after end_date {}",
                self.start_date, self.end_date
            )));
        }
        if !self.delimiter.is_ascii() {
            return Err(AnalysisError::InvalidConfig(
                "delimiter must be an ASCII character".to_string(),
            ));
        }
        Ok(())
    }

    /// Ticker mapped to `brand`, if any
    pub fn ticker_for(&self, brand: &str) -> Option<&str> {
        let brand = brand.to_lowercase();
        self.brands
            .iter()
            .find(|entry| entry.brand == brand)
            .map(|entry| entry.ticker.as_str())
    }

    /// Builder-style override of the brand mapping
    pub fn with_brands(mut self, brands: Vec<BrandTicker>) -> Self {
        self.brands = brands;
        self
    }

    /// Builder-style override of the feature list
    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.features = Some(features);
        self
    }

    /// Feature columns to correlate: the configured list, else every activity
    /// feature column followed by `LINK_SENTIMENT`
    pub fn feature_columns(&self, activity: &ActivityTable) -> Vec<String> {
        if let Some(features) = &self.features {
            return features.clone();
        }
        let mut features = activity.feature_names().to_vec();
        if !features.iter().any(|name| name == LINK_SENTIMENT) {
            features.push(LINK_SENTIMENT.to_string());
        }
        features
    }
}
