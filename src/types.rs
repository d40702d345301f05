//! Core types for the brandpulse engine
//!
//! This module defines the records that flow through each stage of the engine:
//! ingested activity and stock rows, per-brand correlation tables, per-brand
//! outcomes and the cross-brand aggregate table.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

/// Column carrying the signed link sentiment of an activity record
pub const LINK_SENTIMENT: &str = "LINK_SENTIMENT";

/// A brand tracked both as a forum community and as a listed security
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandTicker {
    /// Community identifier (lowercase)
    pub brand: String,
    /// Ticker symbol
    pub ticker: String,
}

impl BrandTicker {
    pub fn new(brand: impl Into<String>, ticker: impl Into<String>) -> Self {
        Self {
            brand: brand.into().to_lowercase(),
            ticker: ticker.into(),
        }
    }
}

/// A community deemed close to a brand in embedding space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarCommunity {
    /// Community identifier
    pub name: String,
    /// Similarity score (cosine similarity for the embedding resolver)
    pub score: f64,
}

impl SimilarCommunity {
    pub fn new(name: impl Into<String>, score: f64) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// One hyperlink between two communities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Linking community
    pub source: String,
    /// Linked community
    pub target: String,
    /// Post identifier, when the source table carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    /// When the link was posted (UTC)
    pub timestamp: DateTime<Utc>,
    /// Signed sentiment polarity of the link
    pub link_sentiment: f64,
    /// Named textual/psychological feature scores
    #[serde(default)]
    pub features: HashMap<String, f64>,
}

impl ActivityRecord {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        timestamp: DateTime<Utc>,
        link_sentiment: f64,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            post_id: None,
            timestamp,
            link_sentiment,
            features: HashMap::new(),
        }
    }

    /// Attach a feature score
    pub fn with_feature(mut self, name: impl Into<String>, value: f64) -> Self {
        self.features.insert(name.into(), value);
        self
    }

    /// Look up a feature score. `LINK_SENTIMENT` resolves to the polarity itself.
    pub fn feature(&self, name: &str) -> Option<f64> {
        if name == LINK_SENTIMENT {
            return Some(self.link_sentiment);
        }
        self.features.get(name).copied()
    }

    /// Whether either endpoint belongs to `communities` (expected lowercase)
    pub fn touches(&self, communities: &HashSet<String>) -> bool {
        communities.contains(&self.source.to_lowercase())
            || communities.contains(&self.target.to_lowercase())
    }

    /// Calendar date of the link (UTC)
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Activity records plus the names of their feature columns
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityTable {
    records: Vec<ActivityRecord>,
    feature_names: Vec<String>,
}

impl ActivityTable {
    /// Build a table with an explicit feature column order
    pub fn new(records: Vec<ActivityRecord>, feature_names: Vec<String>) -> Self {
        Self {
            records,
            feature_names,
        }
    }

    /// Build a table whose feature columns are every feature seen, sorted by name
    pub fn from_records(records: Vec<ActivityRecord>) -> Self {
        let names: BTreeSet<&String> = records.iter().flat_map(|r| r.features.keys()).collect();
        let feature_names = names.into_iter().cloned().collect();
        Self {
            records,
            feature_names,
        }
    }

    pub fn records(&self) -> &[ActivityRecord] {
        &self.records
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose source or target is one of `communities`, compared case-insensitively
    pub fn touching<'a>(&'a self, communities: &HashSet<String>) -> Vec<&'a ActivityRecord> {
        self.records
            .iter()
            .filter(|record| record.touches(communities))
            .collect()
    }
}

/// One trading day of a stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRow {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: f64,
}

impl StockRow {
    pub fn new(date: NaiveDate, close: f64, volume: f64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume,
        }
    }

    /// Attach the daily high and low
    pub fn with_range(mut self, high: f64, low: f64) -> Self {
        self.high = Some(high);
        self.low = Some(low);
        self
    }
}

/// Stock column selector for derived series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockField {
    Close,
    Volume,
}

/// Prepared stock table: dates strictly increasing, no duplicates.
///
/// Only [`crate::normalizer::StockNormalizer`] constructs this type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockTable {
    pub(crate) rows: Vec<StockRow>,
}

impl StockTable {
    pub fn rows(&self) -> &[StockRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column in date order
    pub fn column(&self, field: StockField) -> Vec<f64> {
        self.rows
            .iter()
            .map(|row| match field {
                StockField::Close => row.close,
                StockField::Volume => row.volume,
            })
            .collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|row| row.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|row| row.date)
    }
}

/// Correlation of one feature with the price and volume volatility of one brand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCorrelationRow {
    #[serde(rename = "Feature")]
    pub feature: String,
    pub r_price: f64,
    pub r_volume: f64,
    pub r_avg: f64,
}

impl FeatureCorrelationRow {
    pub fn new(feature: impl Into<String>, r_price: f64, r_volume: f64) -> Self {
        Self {
            feature: feature.into(),
            r_price,
            r_volume,
            r_avg: (r_price + r_volume) / 2.0,
        }
    }
}

/// Per-brand feature correlations, ordered by |r_avg| descending
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCorrelationTable {
    pub rows: Vec<FeatureCorrelationRow>,
}

impl FeatureCorrelationTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// First `n` rows (strongest correlations)
    pub fn top(&self, n: usize) -> &[FeatureCorrelationRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    pub fn get(&self, feature: &str) -> Option<&FeatureCorrelationRow> {
        self.rows.iter().find(|row| row.feature == feature)
    }
}

/// A successful per-brand run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandCorrelations {
    pub brand: String,
    pub ticker: String,
    /// Number of similar communities whose activity was joined
    pub community_count: usize,
    /// Number of activity records that matched those communities
    pub activity_count: usize,
    pub table: FeatureCorrelationTable,
}

/// Why a brand contributed nothing to the aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "message")]
pub enum SkipReason {
    NoSimilarCommunities,
    NoActivity,
    NoStockData,
    NoCorrelations,
    Failed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoSimilarCommunities => write!(f, "no similar communities found"),
            SkipReason::NoActivity => write!(f, "no hyperlink activity found"),
            SkipReason::NoStockData => write!(f, "no stock data found"),
            SkipReason::NoCorrelations => write!(f, "no correlations computed"),
            SkipReason::Failed(msg) => write!(f, "failed: {}", msg),
        }
    }
}

/// A brand that was skipped, and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedBrand {
    pub brand: String,
    pub ticker: String,
    pub reason: SkipReason,
}

/// Result of running the per-brand pipeline for one brand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum BrandOutcome {
    Analyzed(BrandCorrelations),
    Skipped(SkippedBrand),
}

impl BrandOutcome {
    pub fn brand(&self) -> &str {
        match self {
            BrandOutcome::Analyzed(result) => &result.brand,
            BrandOutcome::Skipped(skipped) => &skipped.brand,
        }
    }

    pub fn ticker(&self) -> &str {
        match self {
            BrandOutcome::Analyzed(result) => &result.ticker,
            BrandOutcome::Skipped(skipped) => &skipped.ticker,
        }
    }

    pub fn is_analyzed(&self) -> bool {
        matches!(self, BrandOutcome::Analyzed(_))
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            BrandOutcome::Analyzed(_) => None,
            BrandOutcome::Skipped(skipped) => Some(&skipped.reason),
        }
    }
}

/// Cross-brand statistics for one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    #[serde(rename = "Feature")]
    pub feature: String,
    #[serde(rename = "Avg Price Corr")]
    pub avg_price_corr: f64,
    #[serde(rename = "Avg Volume Corr")]
    pub avg_volume_corr: f64,
    #[serde(rename = "Avg Overall Corr")]
    pub avg_overall_corr: f64,
    #[serde(rename = "Std Price Corr")]
    pub std_price_corr: f64,
    #[serde(rename = "Std Volume Corr")]
    pub std_volume_corr: f64,
    #[serde(rename = "Max Price Corr")]
    pub max_price_corr: f64,
    #[serde(rename = "Max Volume Corr")]
    pub max_volume_corr: f64,
    #[serde(rename = "Brands Analyzed")]
    pub brands_analyzed: usize,
    #[serde(rename = "Consistency")]
    pub consistency: f64,
    #[serde(rename = "Abs Avg Overall")]
    pub abs_avg_overall: f64,
}

/// Ranked cross-brand table, ordered by `Abs Avg Overall` descending
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateTable {
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    /// An empty table ("no data")
    pub const fn empty() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, feature: &str) -> Option<&AggregateRow> {
        self.rows.iter().find(|row| row.feature == feature)
    }

    /// First `n` rows by `Abs Avg Overall`
    pub fn top(&self, n: usize) -> &[AggregateRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// `n` rows with the largest signed `Avg Price Corr`
    pub fn top_by_price(&self, n: usize) -> Vec<&AggregateRow> {
        Self::largest_by(&self.rows, n, |row| row.avg_price_corr)
    }

    /// `n` rows with the largest signed `Avg Volume Corr`
    pub fn top_by_volume(&self, n: usize) -> Vec<&AggregateRow> {
        Self::largest_by(&self.rows, n, |row| row.avg_volume_corr)
    }

    fn largest_by<F>(rows: &[AggregateRow], n: usize, key: F) -> Vec<&AggregateRow>
    where
        F: Fn(&AggregateRow) -> f64,
    {
        let mut ranked: Vec<&AggregateRow> = rows.iter().collect();
        ranked.sort_by(|a, b| key(b).total_cmp(&key(a)));
        ranked.truncate(n);
        ranked
    }
}

/// Summary of one brand that contributed to the aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandSummary {
    pub brand: String,
    pub ticker: String,
    pub community_count: usize,
    pub activity_count: usize,
    pub feature_count: usize,
}

impl From<&BrandCorrelations> for BrandSummary {
    fn from(result: &BrandCorrelations) -> Self {
        Self {
            brand: result.brand.clone(),
            ticker: result.ticker.clone(),
            community_count: result.community_count,
            activity_count: result.activity_count,
            feature_count: result.table.len(),
        }
    }
}

/// Aggregate table plus which brands made it in and which were skipped
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationReport {
    pub table: AggregateTable,
    pub analyzed: Vec<BrandSummary>,
    pub skipped: Vec<SkippedBrand>,
}

impl AggregationReport {
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
