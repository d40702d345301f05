//! Analysis session
//!
//! An [`AnalysisSession`] is the read-only result of one analysis run: the
//! active brand's activity and series, the prepared stock table and the
//! cross-brand aggregate. It is built in one call by [`SessionBuilder`]; a
//! new run produces a new session rather than updating an old one.

use crate::adapters::{CsvStockSource, EmbeddingResolver, SimilarityResolver, StockSource};
use crate::aggregate::CrossBrandAggregator;
use crate::config::AnalysisConfig;
use crate::features::FeatureCorrelator;
use crate::normalizer::StockNormalizer;
use crate::schema::EmbeddingTable;
use crate::series::{Aggregation, Cadence, TimeSeries};
use crate::types::{
    ActivityRecord, ActivityTable, AggregateTable, AggregationReport, FeatureCorrelationTable,
    StockRow, StockTable,
};
use crate::volatility::VolatilityPair;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

static EMPTY_TABLE: AggregateTable = AggregateTable::empty();

/// Time-aligned sentiment series of the active brand
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrandSeries {
    /// Monthly sum of link sentiment
    pub monthly_sentiment: TimeSeries,
    /// Monthly sum of negative link sentiment, as a positive magnitude
    pub monthly_negativity: TimeSeries,
    /// Monthly sample std of link sentiment
    pub monthly_sentiment_std: TimeSeries,
    pub monthly_compound_std: TimeSeries,
    pub monthly_compound_sum: TimeSeries,
    pub monthly_negative_std: TimeSeries,
    pub monthly_negative_sum: TimeSeries,
    pub weekly_sentiment: TimeSeries,
    pub weekly_negativity: TimeSeries,
}

impl BrandSeries {
    /// Derive every series from the brand's activity
    pub fn from_records(records: &[ActivityRecord], config: &AnalysisConfig) -> Self {
        let sentiment = |cadence, aggregation| {
            TimeSeries::resample(
                records.iter().map(|r| (r.date(), Some(r.link_sentiment))),
                cadence,
                aggregation,
            )
        };
        let negativity = |cadence| {
            TimeSeries::resample(
                records
                    .iter()
                    .filter(|r| r.link_sentiment < 0.0)
                    .map(|r| (r.date(), Some(r.link_sentiment))),
                cadence,
                Aggregation::Sum,
            )
            .scaled(-1.0)
        };
        let column = |name: &str, aggregation| {
            TimeSeries::resample(
                records.iter().map(|r| (r.date(), r.feature(name))),
                Cadence::MonthEnd,
                aggregation,
            )
        };

        Self {
            monthly_sentiment: sentiment(Cadence::MonthEnd, Aggregation::Sum),
            monthly_negativity: negativity(Cadence::MonthEnd),
            monthly_sentiment_std: sentiment(Cadence::MonthEnd, Aggregation::Std),
            monthly_compound_std: column(&config.compound_column, Aggregation::Std),
            monthly_compound_sum: column(&config.compound_column, Aggregation::Sum),
            monthly_negative_std: column(&config.negative_column, Aggregation::Std),
            monthly_negative_sum: column(&config.negative_column, Aggregation::Sum),
            weekly_sentiment: sentiment(Cadence::WeekEnd, Aggregation::Sum),
            weekly_negativity: negativity(Cadence::WeekEnd),
        }
    }
}

/// Builds an [`AnalysisSession`].
///
/// Aggregation runs only when both a similarity resolver (or embeddings) and
/// a stock source (or finance directory) are supplied.
pub struct SessionBuilder<'a> {
    activity: ActivityTable,
    stock_rows: Vec<StockRow>,
    brands: Vec<String>,
    active_brand: String,
    embeddings: Option<&'a EmbeddingTable>,
    finance_path: Option<PathBuf>,
    resolver: Option<Box<dyn SimilarityResolver + 'a>>,
    stock_source: Option<Box<dyn StockSource + 'a>>,
    date_range: Option<(NaiveDate, NaiveDate)>,
}

impl<'a> SessionBuilder<'a> {
    /// Start a session for `active_brand`, whose activity is every link touching `brands`
    pub fn new(
        activity: ActivityTable,
        stock_rows: Vec<StockRow>,
        brands: Vec<String>,
        active_brand: impl Into<String>,
    ) -> Self {
        Self {
            activity,
            stock_rows,
            brands: brands.into_iter().map(|b| b.to_lowercase()).collect(),
            active_brand: active_brand.into().to_lowercase(),
            embeddings: None,
            finance_path: None,
            resolver: None,
            stock_source: None,
            date_range: None,
        }
    }

    pub fn with_embeddings(mut self, embeddings: &'a EmbeddingTable) -> Self {
        self.embeddings = Some(embeddings);
        self
    }

    pub fn with_finance_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.finance_path = Some(path.into());
        self
    }

    /// Custom similarity resolver; takes precedence over embeddings
    pub fn with_resolver(mut self, resolver: impl SimilarityResolver + 'a) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Custom stock source; takes precedence over the finance path
    pub fn with_stock_source(mut self, source: impl StockSource + 'a) -> Self {
        self.stock_source = Some(Box::new(source));
        self
    }

    /// Override the configured stock date range (inclusive)
    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range = Some((start, end));
        self
    }

    pub fn build(self, config: &AnalysisConfig) -> AnalysisSession {
        let (start, end) = self
            .date_range
            .unwrap_or((config.start_date, config.end_date));

        let brand_set: HashSet<String> = self.brands.iter().cloned().collect();
        let brand_activity: Vec<ActivityRecord> = self
            .activity
            .touching(&brand_set)
            .into_iter()
            .cloned()
            .collect();
        let series = BrandSeries::from_records(&brand_activity, config);
        let stock = StockNormalizer::prepare_within(self.stock_rows, Some(start), Some(end));

        let resolver: Option<Box<dyn SimilarityResolver + 'a>> = self.resolver.or_else(|| {
            self.embeddings.map(|embeddings| {
                Box::new(EmbeddingResolver::from_config(embeddings, config))
                    as Box<dyn SimilarityResolver + 'a>
            })
        });
        let stock_source: Option<Box<dyn StockSource + 'a>> = self.stock_source.or_else(|| {
            self.finance_path
                .map(|path| Box::new(CsvStockSource::new(path)) as Box<dyn StockSource + 'a>)
        });

        let aggregation = match (resolver.as_deref(), stock_source.as_deref()) {
            (Some(resolver), Some(stocks)) => Some(
                CrossBrandAggregator::new(resolver, stocks, config)
                    .aggregate(&config.brands, &self.activity),
            ),
            _ => {
                debug!("similarity resolver or stock source missing, skipping aggregation");
                None
            }
        };

        AnalysisSession {
            session_id: Uuid::new_v4(),
            computed_at: Utc::now(),
            active_brand: self.active_brand,
            brands: self.brands,
            activity: self.activity,
            brand_activity,
            stock,
            series,
            aggregation,
        }
    }
}

/// Immutable result of one analysis run
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    session_id: Uuid,
    computed_at: DateTime<Utc>,
    active_brand: String,
    brands: Vec<String>,
    activity: ActivityTable,
    brand_activity: Vec<ActivityRecord>,
    stock: StockTable,
    series: BrandSeries,
    aggregation: Option<AggregationReport>,
}

impl AnalysisSession {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn computed_at(&self) -> DateTime<Utc> {
        self.computed_at
    }

    pub fn active_brand(&self) -> &str {
        &self.active_brand
    }

    pub fn brands(&self) -> &[String] {
        &self.brands
    }

    /// Full activity table
    pub fn activity(&self) -> &ActivityTable {
        &self.activity
    }

    /// Links touching the session's brands
    pub fn brand_activity(&self) -> &[ActivityRecord] {
        &self.brand_activity
    }

    /// Stock table limited to the session's date range
    pub fn stock(&self) -> &StockTable {
        &self.stock
    }

    pub fn series(&self) -> &BrandSeries {
        &self.series
    }

    /// Aggregate report, when aggregation ran
    pub fn aggregation(&self) -> Option<&AggregationReport> {
        self.aggregation.as_ref()
    }

    /// Aggregate table; empty when aggregation did not run or found nothing
    pub fn aggregate_table(&self) -> &AggregateTable {
        self.aggregation
            .as_ref()
            .map_or(&EMPTY_TABLE, |report| &report.table)
    }

    /// Feature correlations of the active brand's activity against the session stock
    pub fn brand_correlations(&self, config: &AnalysisConfig) -> FeatureCorrelationTable {
        let volatility =
            VolatilityPair::from_stock(&self.stock, config.volatility_window, config.cadence);
        let records: Vec<&ActivityRecord> = self.brand_activity.iter().collect();
        let features = config.feature_columns(&self.activity);
        FeatureCorrelator::new(config.cadence).correlate(&records, &volatility, &features)
    }

    /// Monthly sample std of one feature over the brand's activity
    pub fn feature_volatility(&self, feature: &str) -> TimeSeries {
        TimeSeries::resample(
            self.brand_activity
                .iter()
                .map(|r| (r.date(), r.feature(feature))),
            Cadence::MonthEnd,
            Aggregation::Std,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::EMOTION_FEATURES;
    use crate::fixtures::{date, monthly_activity, oscillating_stock, similar_map, write_stock_csv};
    use crate::types::BrandTicker;
    use std::collections::HashMap;

    fn activity() -> ActivityTable {
        let mut records = monthly_activity("amazon", 2015, 6);
        records.extend(monthly_activity("gaming", 2015, 3));
        ActivityTable::from_records(records)
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig::default().with_brands(vec![BrandTicker::new("amazon", "AMZN")])
    }

    #[test]
    fn test_without_embeddings_aggregate_is_empty() {
        let session = SessionBuilder::new(
            activity(),
            oscillating_stock(date(2015, 1, 1), 181, 0),
            vec!["amazon".to_string()],
            "amazon",
        )
        .with_finance_path("/nonexistent")
        .build(&config());

        assert!(session.aggregation().is_none());
        assert!(session.aggregate_table().is_empty());
        assert_eq!(session.brand_activity().len(), 12);
    }

    #[test]
    fn test_series_of_active_brand() {
        let session = SessionBuilder::new(
            activity(),
            Vec::new(),
            vec!["Amazon".to_string()],
            "Amazon",
        )
        .build(&config());

        let series = session.series();
        assert_eq!(session.active_brand(), "amazon");
        assert_eq!(series.monthly_sentiment.len(), 6);
        // January: two links at -1.0
        assert_eq!(series.monthly_sentiment.get(date(2015, 1, 31)), Some(-2.0));
        assert_eq!(series.monthly_negativity.get(date(2015, 1, 31)), Some(2.0));
        assert_eq!(series.monthly_negativity.get(date(2015, 2, 28)), Some(0.0));
        // negative links fall in January and April only; June has none
        assert_eq!(series.monthly_negativity.len(), 4);
        assert_eq!(series.monthly_negativity.get(date(2015, 4, 30)), Some(2.0));
        assert_eq!(series.monthly_negativity.get(date(2015, 6, 30)), None);
        assert_eq!(series.monthly_sentiment_std.get(date(2015, 2, 28)), Some(0.0));
        assert!(series.monthly_compound_std.get(date(2015, 1, 31)).is_some());
        assert!((series.monthly_negative_sum.get(date(2015, 1, 31)).unwrap() - 0.6).abs() < 1e-12);
        assert_eq!(series.weekly_sentiment.points.first().map(|p| p.date), Some(date(2015, 1, 11)));
        assert!(series.weekly_negativity.len() > series.monthly_negativity.len());
    }

    #[test]
    fn test_stock_is_limited_to_date_range() {
        let session = SessionBuilder::new(
            activity(),
            oscillating_stock(date(2015, 1, 1), 181, 0),
            vec!["amazon".to_string()],
            "amazon",
        )
        .with_date_range(date(2015, 2, 1), date(2015, 3, 31))
        .build(&config());

        assert_eq!(session.stock().first_date(), Some(date(2015, 2, 1)));
        assert_eq!(session.stock().last_date(), Some(date(2015, 3, 31)));

        let default_range = SessionBuilder::new(
            activity(),
            oscillating_stock(date(2013, 12, 1), 60, 0),
            vec!["amazon".to_string()],
            "amazon",
        )
        .build(&config());
        assert_eq!(default_range.stock().first_date(), Some(date(2014, 1, 1)));
    }

    #[test]
    fn test_aggregates_with_custom_collaborators() {
        let mut stocks: HashMap<String, Vec<StockRow>> = HashMap::new();
        stocks.insert("AMZN".to_string(), oscillating_stock(date(2015, 1, 1), 181, 0));

        let session = SessionBuilder::new(
            activity(),
            oscillating_stock(date(2015, 1, 1), 181, 0),
            vec!["amazon".to_string()],
            "amazon",
        )
        .with_resolver(similar_map(&[("amazon", "amazon")]))
        .with_stock_source(stocks)
        .build(&config());

        let report = session.aggregation().unwrap();
        assert_eq!(report.analyzed.len(), 1);
        assert!(!session.aggregate_table().is_empty());
    }

    #[test]
    fn test_aggregates_with_embeddings_and_finance_path() {
        let dir = tempfile::tempdir().unwrap();
        write_stock_csv(dir.path(), "AMZN", &oscillating_stock(date(2015, 1, 1), 181, 0));
        let embeddings = EmbeddingTable::new(vec![
            ("amazon".to_string(), vec![1.0, 0.0]),
            ("gaming".to_string(), vec![0.0, 1.0]),
        ])
        .unwrap();

        let session = SessionBuilder::new(activity(), Vec::new(), vec!["amazon".to_string()], "amazon")
            .with_embeddings(&embeddings)
            .with_finance_path(dir.path())
            .build(&config());

        assert!(!session.aggregate_table().is_empty());
        assert_ne!(session.session_id(), Uuid::nil());
    }

    #[test]
    fn test_brand_correlations_and_feature_volatility() {
        let session = SessionBuilder::new(
            activity(),
            oscillating_stock(date(2015, 1, 1), 181, 0),
            vec!["amazon".to_string()],
            "amazon",
        )
        .build(&config());

        let table = session.brand_correlations(&config());
        assert!(table.get("LIWC_Anger").is_some());

        // Features are constant within a month, so the monthly std is zero
        let anger = session.feature_volatility(EMOTION_FEATURES[2]);
        assert_eq!(anger.len(), 6);
        assert!(anger.points.iter().all(|p| p.value == Some(0.0)));
        let sad = session.feature_volatility("LIWC_Sad");
        assert!(sad.points.iter().all(|p| p.value.is_none()));
    }
}
