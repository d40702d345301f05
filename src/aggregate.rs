//! Cross-brand aggregation
//!
//! Runs the per-brand pipeline over every mapped brand and reduces the
//! per-brand feature tables into one ranked table. Each feature row carries
//! the mean and population std of its correlations across brands, the
//! largest absolute correlations and the share of brands where the average
//! correlation clears the consistency threshold.

use crate::adapters::{CsvStockSource, EmbeddingResolver, SimilarityResolver, StockSource};
use crate::config::AnalysisConfig;
use crate::pipeline::BrandPipeline;
use crate::schema::EmbeddingTable;
use crate::series::{mean, population_std};
use crate::types::{
    ActivityTable, AggregateRow, AggregateTable, AggregationReport, BrandCorrelations,
    BrandOutcome, BrandSummary, BrandTicker, FeatureCorrelationRow,
};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Aggregate every brand against an embedding table and a stock directory.
///
/// # Example
/// ```ignore
/// let config = AnalysisConfig::default();
/// let report = aggregate(&config.brands, &embeddings, &activity, Path::new("data/finance"), &config);
/// for row in report.table.top(10) {
///     println!("{}: {:.3}", row.feature, row.avg_overall_corr);
/// }
/// ```
pub fn aggregate(
    brands: &[BrandTicker],
    embeddings: &EmbeddingTable,
    activity: &ActivityTable,
    finance_path: &Path,
    config: &AnalysisConfig,
) -> AggregationReport {
    let resolver = EmbeddingResolver::from_config(embeddings, config);
    let stocks = CsvStockSource::new(finance_path);
    CrossBrandAggregator::new(&resolver, &stocks, config).aggregate(brands, activity)
}

/// Runs the per-brand pipeline across brands and reduces the results
pub struct CrossBrandAggregator<'a> {
    pipeline: BrandPipeline<'a>,
}

impl<'a> CrossBrandAggregator<'a> {
    pub fn new(
        resolver: &'a dyn SimilarityResolver,
        stocks: &'a dyn StockSource,
        config: &'a AnalysisConfig,
    ) -> Self {
        Self {
            pipeline: BrandPipeline::new(resolver, stocks, config),
        }
    }

    /// Per-brand outcomes in mapping order
    pub fn outcomes(&self, brands: &[BrandTicker], activity: &ActivityTable) -> Vec<BrandOutcome> {
        let pipeline = self.pipeline;
        if pipeline.config().parallel {
            brands
                .par_iter()
                .map(|brand| pipeline.analyze_brand(brand, activity))
                .collect()
        } else {
            brands
                .iter()
                .map(|brand| pipeline.analyze_brand(brand, activity))
                .collect()
        }
    }

    /// Analyze every brand and build the aggregate report
    pub fn aggregate(&self, brands: &[BrandTicker], activity: &ActivityTable) -> AggregationReport {
        let outcomes = self.outcomes(brands, activity);

        let mut results: Vec<BrandCorrelations> = Vec::new();
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut skipped = Vec::new();

        for outcome in outcomes {
            match outcome {
                BrandOutcome::Analyzed(result) => match slots.get(&result.ticker) {
                    Some(&slot) => results[slot] = result,
                    None => {
                        slots.insert(result.ticker.clone(), results.len());
                        results.push(result);
                    }
                },
                BrandOutcome::Skipped(skip) => skipped.push(skip),
            }
        }

        let table = reduce_correlations(&results, self.pipeline.config().consistency_threshold);
        info!(
            skipped = skipped.len(),
            "Computed aggregate correlations: {} features across {} brands",
            table.len(),
            results.len()
        );

        AggregationReport {
            table,
            analyzed: results.iter().map(BrandSummary::from).collect(),
            skipped,
        }
    }
}

/// Reduce per-brand tables into the ranked aggregate table.
///
/// Features appear in first-encountered order before the final stable sort
/// on |mean average correlation|.
pub fn reduce_correlations(results: &[BrandCorrelations], threshold: f64) -> AggregateTable {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&FeatureCorrelationRow>> = HashMap::new();

    for row in results.iter().flat_map(|result| &result.table.rows) {
        groups
            .entry(row.feature.as_str())
            .or_insert_with(|| {
                order.push(row.feature.as_str());
                Vec::new()
            })
            .push(row);
    }

    let mut rows: Vec<AggregateRow> = order
        .iter()
        .filter_map(|feature| summarize(feature, groups.get(feature)?, threshold))
        .collect();

    rows.sort_by(|a, b| b.abs_avg_overall.total_cmp(&a.abs_avg_overall));

    AggregateTable { rows }
}

fn summarize(feature: &str, rows: &[&FeatureCorrelationRow], threshold: f64) -> Option<AggregateRow> {
    let prices: Vec<f64> = rows.iter().map(|row| row.r_price).collect();
    let volumes: Vec<f64> = rows.iter().map(|row| row.r_volume).collect();
    let averages: Vec<f64> = rows.iter().map(|row| row.r_avg).collect();

    let avg_overall_corr = mean(&averages)?;
    let consistent = averages.iter().filter(|avg| avg.abs() > threshold).count();

    Some(AggregateRow {
        feature: feature.to_string(),
        avg_price_corr: mean(&prices)?,
        avg_volume_corr: mean(&volumes)?,
        avg_overall_corr,
        std_price_corr: population_std(&prices)?,
        std_volume_corr: population_std(&volumes)?,
        max_price_corr: prices.iter().map(|r| r.abs()).fold(0.0, f64::max),
        max_volume_corr: volumes.iter().map(|r| r.abs()).fold(0.0, f64::max),
        brands_analyzed: rows.len(),
        consistency: consistent as f64 / rows.len() as f64,
        abs_avg_overall: avg_overall_corr.abs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{date, monthly_activity, oscillating_stock, similar_map, two_month_links};
    use crate::types::{FeatureCorrelationTable, SkipReason, StockRow};
    use pretty_assertions::assert_eq;

    fn brand_result(ticker: &str, rows: &[(&str, f64, f64)]) -> BrandCorrelations {
        BrandCorrelations {
            brand: ticker.to_lowercase(),
            ticker: ticker.to_string(),
            community_count: 1,
            activity_count: 1,
            table: FeatureCorrelationTable {
                rows: rows
                    .iter()
                    .map(|(feature, price, volume)| FeatureCorrelationRow::new(*feature, *price, *volume))
                    .collect(),
            },
        }
    }

    #[test]
    fn test_opposite_brands_cancel_out() {
        let results = vec![
            brand_result("AAA", &[("joy", 0.5, 0.5), ("anger", 0.3, 0.1)]),
            brand_result("BBB", &[("joy", -0.5, -0.5), ("anger", 0.2, 0.2)]),
        ];

        let table = reduce_correlations(&results, 0.10);

        let joy = table.get("joy").unwrap();
        assert_eq!(joy.avg_overall_corr, 0.0);
        assert_eq!(joy.abs_avg_overall, 0.0);
        assert_eq!(joy.max_price_corr, 0.5);
        assert_eq!(joy.max_volume_corr, 0.5);
        assert_eq!(joy.std_price_corr, 0.5);
        assert_eq!(joy.brands_analyzed, 2);
        assert_eq!(joy.consistency, 1.0);
        assert_eq!(table.rows.last().unwrap().feature, "joy");
    }

    #[test]
    fn test_threshold_is_strict() {
        let results = vec![
            brand_result("AAA", &[("calm", 0.1, 0.1)]),
            brand_result("BBB", &[("calm", 0.3, 0.3)]),
        ];

        let table = reduce_correlations(&results, 0.10);
        assert_eq!(table.get("calm").unwrap().consistency, 0.5);
    }

    #[test]
    fn test_invariants_hold() {
        let results = vec![
            brand_result("AAA", &[("a", 0.9, -0.2), ("b", 0.05, 0.1), ("c", -0.6, -0.7)]),
            brand_result("BBB", &[("a", 0.4, 0.3), ("c", -0.1, 0.2)]),
            brand_result("CCC", &[("b", -0.3, 0.8)]),
        ];

        let table = reduce_correlations(&results, 0.10);

        assert_eq!(table.len(), 3);
        assert!(table
            .rows
            .windows(2)
            .all(|w| w[0].abs_avg_overall >= w[1].abs_avg_overall));
        for row in &table.rows {
            assert!(row.brands_analyzed >= 1);
            assert!((0.0..=1.0).contains(&row.consistency));
            let contributing = results
                .iter()
                .filter_map(|r| r.table.get(&row.feature))
                .collect::<Vec<_>>();
            assert_eq!(row.brands_analyzed, contributing.len());
            for c in contributing {
                assert!(row.max_price_corr >= c.r_price.abs());
                assert!(row.max_volume_corr >= c.r_volume.abs());
            }
        }
    }

    #[test]
    fn test_order_is_invariant_under_brand_permutation() {
        let a = brand_result("AAA", &[("x", 0.9, 0.1), ("y", 0.2, 0.2)]);
        let b = brand_result("BBB", &[("y", -0.8, -0.4), ("z", 0.3, 0.1)]);
        let c = brand_result("CCC", &[("z", 0.6, 0.6), ("x", -0.1, 0.0)]);

        let forward = reduce_correlations(&[a.clone(), b.clone(), c.clone()], 0.10);
        let reversed = reduce_correlations(&[c, b, a], 0.10);

        let names = |t: &AggregateTable| t.rows.iter().map(|r| r.feature.clone()).collect::<Vec<_>>();
        assert_eq!(names(&forward), names(&reversed));
    }

    #[test]
    fn test_ties_keep_first_encountered_order() {
        let results = vec![brand_result("AAA", &[("first", 0.4, 0.4), ("second", -0.4, -0.4)])];
        let table = reduce_correlations(&results, 0.10);

        let names: Vec<&str> = table.rows.iter().map(|r| r.feature.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_no_results_is_empty_table() {
        assert!(reduce_correlations(&[], 0.10).is_empty());
    }

    #[test]
    fn test_single_brand_end_to_end() {
        let resolver = similar_map(&[("amazon", "amazon")]);
        let mut stocks: HashMap<String, Vec<StockRow>> = HashMap::new();
        stocks.insert("AMZN".to_string(), oscillating_stock(date(2015, 1, 1), 181, 0));
        let activity = ActivityTable::from_records(monthly_activity("amazon", 2015, 6));
        let config = AnalysisConfig::default();
        let brands = vec![BrandTicker::new("amazon", "AMZN")];

        let report = CrossBrandAggregator::new(&resolver, &stocks, &config).aggregate(&brands, &activity);

        assert!(!report.table.is_empty());
        assert_eq!(report.analyzed.len(), 1);
        for row in &report.table.rows {
            assert_eq!(row.brands_analyzed, 1);
            assert!(row.consistency == 0.0 || row.consistency == 1.0);
        }
    }

    #[test]
    fn test_two_link_brand_with_default_features() {
        let resolver = similar_map(&[("amazon", "amazon")]);
        let mut stocks: HashMap<String, Vec<StockRow>> = HashMap::new();
        stocks.insert("AMZN".to_string(), oscillating_stock(date(2015, 1, 1), 59, 0));
        let activity = ActivityTable::from_records(two_month_links("amazon"));
        let config = AnalysisConfig::default();
        let brands = vec![BrandTicker::new("amazon", "AMZN")];

        let report = CrossBrandAggregator::new(&resolver, &stocks, &config).aggregate(&brands, &activity);

        assert!(!report.table.is_empty());
        for row in &report.table.rows {
            assert_eq!(row.brands_analyzed, 1);
            assert!(row.consistency == 0.0 || row.consistency == 1.0);
        }
    }

    #[test]
    fn test_only_brand_without_stock_gives_empty_table() {
        let resolver = similar_map(&[("amazon", "amazon")]);
        let stocks: HashMap<String, Vec<StockRow>> = HashMap::new();
        let activity = ActivityTable::from_records(monthly_activity("amazon", 2015, 6));
        let config = AnalysisConfig::default();
        let brands = vec![BrandTicker::new("amazon", "AMZN")];

        let report = CrossBrandAggregator::new(&resolver, &stocks, &config).aggregate(&brands, &activity);

        assert!(report.table.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::NoStockData);
    }

    #[test]
    fn test_brand_without_communities_does_not_contribute() {
        let resolver = similar_map(&[("amazon", "amazon")]);
        let mut stocks: HashMap<String, Vec<StockRow>> = HashMap::new();
        stocks.insert("AMZN".to_string(), oscillating_stock(date(2015, 1, 1), 181, 0));
        stocks.insert("AAPL".to_string(), oscillating_stock(date(2015, 1, 1), 181, 2));
        let activity = ActivityTable::from_records(monthly_activity("amazon", 2015, 6));
        let config = AnalysisConfig::default();
        let brands = vec![
            BrandTicker::new("apple", "AAPL"),
            BrandTicker::new("amazon", "AMZN"),
        ];

        let report = CrossBrandAggregator::new(&resolver, &stocks, &config).aggregate(&brands, &activity);

        assert_eq!(report.skipped[0].reason, SkipReason::NoSimilarCommunities);
        assert!(report.table.rows.iter().all(|row| row.brands_analyzed == 1));
    }

    #[test]
    fn test_repeated_ticker_keeps_latest_result() {
        let resolver = similar_map(&[("amazon", "amazon"), ("kindle", "amazon"), ("kindle", "kindle")]);
        let mut stocks: HashMap<String, Vec<StockRow>> = HashMap::new();
        stocks.insert("AMZN".to_string(), oscillating_stock(date(2015, 1, 1), 181, 0));
        let activity = ActivityTable::from_records(monthly_activity("amazon", 2015, 6));
        let config = AnalysisConfig::default();
        let brands = vec![
            BrandTicker::new("amazon", "AMZN"),
            BrandTicker::new("kindle", "AMZN"),
        ];

        let report = CrossBrandAggregator::new(&resolver, &stocks, &config).aggregate(&brands, &activity);

        assert_eq!(report.analyzed.len(), 1);
        assert_eq!(report.analyzed[0].brand, "kindle");
        assert_eq!(report.analyzed[0].community_count, 2);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let resolver = similar_map(&[("amazon", "amazon"), ("apple", "apple")]);
        let mut stocks: HashMap<String, Vec<StockRow>> = HashMap::new();
        stocks.insert("AMZN".to_string(), oscillating_stock(date(2015, 1, 1), 181, 0));
        stocks.insert("AAPL".to_string(), oscillating_stock(date(2015, 1, 1), 181, 2));
        let mut records = monthly_activity("amazon", 2015, 6);
        records.extend(monthly_activity("apple", 2015, 6));
        let activity = ActivityTable::from_records(records);
        let brands = vec![
            BrandTicker::new("amazon", "AMZN"),
            BrandTicker::new("apple", "AAPL"),
        ];

        let sequential = AnalysisConfig::default();
        let parallel = AnalysisConfig {
            parallel: true,
            ..AnalysisConfig::default()
        };

        let a = CrossBrandAggregator::new(&resolver, &stocks, &sequential).aggregate(&brands, &activity);
        let b = CrossBrandAggregator::new(&resolver, &stocks, &parallel).aggregate(&brands, &activity);
        assert_eq!(a, b);
    }
}
