//! Feature correlation
//!
//! This module correlates activity features with stock volatility:
//! - each feature is resampled to the volatility cadence (bucket mean)
//! - Pearson correlation is taken against price and volume volatility
//!   over the buckets where both sides are defined
//! - features with an undefined correlation on either side are dropped

use crate::series::{Aggregation, Cadence, TimeSeries};
use crate::types::{ActivityRecord, FeatureCorrelationRow, FeatureCorrelationTable};
use crate::volatility::VolatilityPair;

/// Minimum number of aligned buckets for a correlation to be defined
pub const MIN_ALIGNED_BUCKETS: usize = 2;

/// Names of the 86 hyperlink text properties, in the order they appear in a
/// `PROPERTIES` cell.
pub const PROPERTY_COLUMNS: [&str; 86] = [
    "num_chars",
    "num_chars_no_whitespace",
    "frac_alphabetical",
    "frac_digits",
    "frac_uppercase",
    "frac_whitespace",
    "frac_special",
    "num_words",
    "num_unique_words",
    "num_long_words",
    "avg_word_length",
    "num_unique_stopwords",
    "frac_stopwords",
    "num_sentences",
    "num_long_sentences",
    "avg_chars_per_sentence",
    "avg_words_per_sentence",
    "automated_readability_index",
    "vader_pos",
    "vader_neg",
    "vader_compound",
    "LIWC_Funct",
    "LIWC_Pronoun",
    "LIWC_Ppron",
    "LIWC_I",
    "LIWC_We",
    "LIWC_You",
    "LIWC_SheHe",
    "LIWC_They",
    "LIWC_Ipron",
    "LIWC_Article",
    "LIWC_Verbs",
    "LIWC_AuxVb",
    "LIWC_Past",
    "LIWC_Present",
    "LIWC_Future",
    "LIWC_Adverbs",
    "LIWC_Prep",
    "LIWC_Conj",
    "LIWC_Negate",
    "LIWC_Quant",
    "LIWC_Numbers",
    "LIWC_Swear",
    "LIWC_Social",
    "LIWC_Family",
    "LIWC_Friends",
    "LIWC_Humans",
    "LIWC_Affect",
    "LIWC_Posemo",
    "LIWC_Negemo",
    "LIWC_Anx",
    "LIWC_Anger",
    "LIWC_Sad",
    "LIWC_CogMech",
    "LIWC_Insight",
    "LIWC_Cause",
    "LIWC_Discrep",
    "LIWC_Tentat",
    "LIWC_Certain",
    "LIWC_Inhib",
    "LIWC_Incl",
    "LIWC_Excl",
    "LIWC_Percept",
    "LIWC_See",
    "LIWC_Hear",
    "LIWC_Feel",
    "LIWC_Bio",
    "LIWC_Body",
    "LIWC_Health",
    "LIWC_Sexual",
    "LIWC_Ingest",
    "LIWC_Relativ",
    "LIWC_Motion",
    "LIWC_Space",
    "LIWC_Time",
    "LIWC_Work",
    "LIWC_Achiev",
    "LIWC_Leisure",
    "LIWC_Home",
    "LIWC_Money",
    "LIWC_Relig",
    "LIWC_Death",
    "LIWC_Assent",
    "LIWC_Dissent",
    "LIWC_Nonflu",
    "LIWC_Filler",
];

/// Emotion features whose monthly spread is reported per brand
pub const EMOTION_FEATURES: [&str; 4] = ["LIWC_Affect", "LIWC_Anx", "LIWC_Anger", "LIWC_Sad"];

/// Property column names as owned strings
pub fn property_columns() -> Vec<String> {
    PROPERTY_COLUMNS.iter().map(|name| name.to_string()).collect()
}

/// Pearson correlation of two equally long samples.
///
/// Returns `None` below [`MIN_ALIGNED_BUCKETS`] points or when either side is constant.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < MIN_ALIGNED_BUCKETS {
        return None;
    }

    let mean_x = x[..n].iter().sum::<f64>() / n as f64;
    let mean_y = y[..n].iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x[..n].iter().zip(&y[..n]) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    // constant inputs leave only rounding noise relative to the values' magnitude
    let scale_x: f64 = x[..n].iter().map(|v| v * v).sum();
    let scale_y: f64 = y[..n].iter().map(|v| v * v).sum();
    if var_x <= f64::EPSILON * scale_x || var_y <= f64::EPSILON * scale_y {
        return None;
    }

    let r = cov / (var_x.sqrt() * var_y.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Correlates activity features against a volatility pair
pub struct FeatureCorrelator {
    cadence: Cadence,
}

impl Default for FeatureCorrelator {
    fn default() -> Self {
        Self::new(Cadence::MonthEnd)
    }
}

impl FeatureCorrelator {
    pub fn new(cadence: Cadence) -> Self {
        Self { cadence }
    }

    /// Bucket-mean series of one feature
    pub fn feature_series(&self, records: &[&ActivityRecord], feature: &str) -> TimeSeries {
        TimeSeries::resample(
            records
                .iter()
                .filter_map(|r| r.feature(feature).map(|v| (r.date(), Some(v)))),
            self.cadence,
            Aggregation::Mean,
        )
    }

    /// Correlate every feature in `features` with both volatility series
    pub fn correlate(
        &self,
        records: &[&ActivityRecord],
        volatility: &VolatilityPair,
        features: &[String],
    ) -> FeatureCorrelationTable {
        let mut rows: Vec<FeatureCorrelationRow> = features
            .iter()
            .filter_map(|feature| {
                let series = self.feature_series(records, feature);
                if series.is_empty() {
                    return None;
                }

                let (fx, price) = series.aligned(&volatility.price);
                let r_price = pearson_correlation(&fx, &price)?;
                let (fx, volume) = series.aligned(&volatility.volume);
                let r_volume = pearson_correlation(&fx, &volume)?;

                Some(FeatureCorrelationRow::new(feature.clone(), r_price, r_volume))
            })
            .collect();

        rows.sort_by(|a, b| b.r_avg.abs().total_cmp(&a.r_avg.abs()));

        FeatureCorrelationTable { rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::SeriesPoint;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly(values: &[(NaiveDate, f64)]) -> TimeSeries {
        TimeSeries {
            points: values
                .iter()
                .map(|(d, v)| SeriesPoint { date: *d, value: Some(*v) })
                .collect(),
        }
    }

    fn record(y: i32, m: u32, anger: f64, joy: f64) -> ActivityRecord {
        let ts = Utc.with_ymd_and_hms(y, m, 10, 12, 0, 0).unwrap();
        ActivityRecord::new("apple", "iphone", ts, 1.0)
            .with_feature("anger", anger)
            .with_feature("joy", joy)
            .with_feature("flat", 1.0)
    }

    #[test]
    fn test_pearson_perfect_correlation() {
        let r = pearson_correlation(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert!((r - 1.0).abs() < 1e-12);

        let r = pearson_correlation(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_undefined_cases() {
        assert_eq!(pearson_correlation(&[1.0], &[1.0]), None);
        assert_eq!(pearson_correlation(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson_correlation(&[0.1, 0.1, 0.1], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson_correlation(&[0.0, 0.0, 0.0], &[1.0, 2.0, 3.0]), None);
    }

    #[test]
    fn test_pearson_is_scale_free() {
        let r = pearson_correlation(&[1e-9, 2e-9, 4e-9], &[1.0, 2.0, 4.0]).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        let r = pearson_correlation(&[3e-9, 2e-9, 1e-9], &[1.0, 2.0, 3.0]).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_property_columns_shape() {
        let columns = property_columns();
        assert_eq!(columns.len(), 86);
        assert_eq!(columns[20], "vader_compound");
        assert_eq!(columns[85], "LIWC_Filler");
        for emotion in EMOTION_FEATURES {
            assert!(columns.iter().any(|c| c == emotion));
        }
    }

    #[test]
    fn test_correlate_sorts_by_average_and_drops_constant_features() {
        let records = vec![
            record(2015, 1, 0.1, 0.9),
            record(2015, 2, 0.2, 0.5),
            record(2015, 3, 0.4, 0.8),
        ];
        let refs: Vec<&ActivityRecord> = records.iter().collect();
        let volatility = VolatilityPair {
            price: monthly(&[(date(2015, 1, 31), 1.0), (date(2015, 2, 28), 2.0), (date(2015, 3, 31), 4.0)]),
            volume: monthly(&[(date(2015, 1, 31), 3.0), (date(2015, 2, 28), 2.0), (date(2015, 3, 31), 1.0)]),
        };
        let features = vec!["joy".to_string(), "anger".to_string(), "flat".to_string(), "missing".to_string()];

        let table = FeatureCorrelator::default().correlate(&refs, &volatility, &features);

        let names: Vec<&str> = table.rows.iter().map(|r| r.feature.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(!names.contains(&"flat"));
        assert!(!names.contains(&"missing"));
        assert!(table.rows.windows(2).all(|w| w[0].r_avg.abs() >= w[1].r_avg.abs()));

        let anger = table.get("anger").unwrap();
        assert!((anger.r_price - 1.0).abs() < 1e-9);
        assert!(anger.r_volume < 0.0);
        assert!((anger.r_avg - (anger.r_price + anger.r_volume) / 2.0).abs() < 1e-12);
    }
}
