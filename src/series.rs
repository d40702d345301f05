//! Cadence-bucketed time series
//!
//! Observations are grouped into calendar buckets (month-end or week-end) and
//! reduced with an [`Aggregation`]. Every bucket between the first and last
//! observation is kept, so gaps show up as empty buckets rather than
//! disappearing from the series.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resampling cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    /// Calendar month, labelled with its last day
    MonthEnd,
    /// Monday–Sunday week, labelled with the Sunday
    WeekEnd,
}

impl Cadence {
    /// Label of the bucket containing `date`
    pub fn bucket(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Cadence::MonthEnd => last_day_of_month(date.year(), date.month()),
            Cadence::WeekEnd => {
                let offset = 6 - date.weekday().num_days_from_monday() as i64;
                date + Duration::days(offset)
            }
        }
    }

    /// Label of the bucket following `label`
    pub fn next(&self, label: NaiveDate) -> NaiveDate {
        match self {
            Cadence::MonthEnd => {
                let (year, month) = if label.month() == 12 {
                    (label.year() + 1, 1)
                } else {
                    (label.year(), label.month() + 1)
                };
                last_day_of_month(year, month)
            }
            Cadence::WeekEnd => label + Duration::days(7),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::MonthEnd => "month_end",
            Cadence::WeekEnd => "week_end",
        }
    }
}

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// Bucket reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Sum of values; an empty bucket sums to 0
    Sum,
    Mean,
    /// Sample standard deviation; needs at least two values
    Std,
    Max,
    Min,
}

impl Aggregation {
    fn reduce(&self, values: &[f64]) -> Option<f64> {
        match self {
            Aggregation::Sum => Some(values.iter().sum()),
            Aggregation::Mean => mean(values),
            Aggregation::Std => sample_std(values),
            Aggregation::Max => values.iter().copied().reduce(f64::max),
            Aggregation::Min => values.iter().copied().reduce(f64::min),
        }
    }
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample (n - 1) standard deviation, `None` below two values
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - avg).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Population (n) standard deviation, `None` for an empty slice
pub fn population_std(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - avg).powi(2)).sum();
    Some((ss / values.len() as f64).sqrt())
}

/// One bucket of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// Ordered, gap-free bucketed series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub points: Vec<SeriesPoint>,
}

impl TimeSeries {
    /// Bucket `observations` at `cadence` and reduce each bucket with `aggregation`.
    ///
    /// A `None` observation still opens its bucket but contributes no value.
    pub fn resample<I>(observations: I, cadence: Cadence, aggregation: Aggregation) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, Option<f64>)>,
    {
        let mut buckets: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for (date, value) in observations {
            let entry = buckets.entry(cadence.bucket(date)).or_default();
            if let Some(v) = value.filter(|v| v.is_finite()) {
                entry.push(v);
            }
        }

        let (first, last) = match (buckets.keys().next(), buckets.keys().next_back()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Self::default(),
        };

        let mut points = Vec::with_capacity(buckets.len());
        let mut label = first;
        while label <= last {
            let values = buckets.get(&label).map(Vec::as_slice).unwrap_or(&[]);
            points.push(SeriesPoint {
                date: label,
                value: aggregation.reduce(values),
            });
            label = cadence.next(label);
        }

        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Value of the bucket labelled `date`
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by(|point| point.date.cmp(&date))
            .ok()
            .and_then(|idx| self.points[idx].value)
    }

    /// Multiply every defined value by `factor`
    pub fn scaled(mut self, factor: f64) -> Self {
        for point in &mut self.points {
            point.value = point.value.map(|v| v * factor);
        }
        self
    }

    /// Pairs of defined values sharing a bucket with `other`
    pub fn aligned(&self, other: &TimeSeries) -> (Vec<f64>, Vec<f64>) {
        let mut left = Vec::new();
        let mut right = Vec::new();
        for point in &self.points {
            if let (Some(a), Some(b)) = (point.value, other.get(point.date)) {
                left.push(a);
                right.push(b);
            }
        }
        (left, right)
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.value).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_end_bucket() {
        assert_eq!(Cadence::MonthEnd.bucket(date(2016, 2, 3)), date(2016, 2, 29));
        assert_eq!(Cadence::MonthEnd.bucket(date(2015, 12, 31)), date(2015, 12, 31));
        assert_eq!(Cadence::MonthEnd.next(date(2015, 12, 31)), date(2016, 1, 31));
    }

    #[test]
    fn test_week_end_bucket_is_sunday() {
        // 2015-01-07 is a Wednesday
        assert_eq!(Cadence::WeekEnd.bucket(date(2015, 1, 7)), date(2015, 1, 11));
        // Sundays close their own week
        assert_eq!(Cadence::WeekEnd.bucket(date(2015, 1, 11)), date(2015, 1, 11));
        assert_eq!(Cadence::WeekEnd.bucket(date(2015, 1, 12)), date(2015, 1, 18));
    }

    #[test]
    fn test_resample_keeps_interior_gaps() {
        let series = TimeSeries::resample(
            vec![
                (date(2015, 1, 3), Some(1.0)),
                (date(2015, 1, 20), Some(2.0)),
                (date(2015, 3, 5), Some(-1.0)),
            ],
            Cadence::MonthEnd,
            Aggregation::Sum,
        );

        assert_eq!(
            series.points,
            vec![
                SeriesPoint { date: date(2015, 1, 31), value: Some(3.0) },
                SeriesPoint { date: date(2015, 2, 28), value: Some(0.0) },
                SeriesPoint { date: date(2015, 3, 31), value: Some(-1.0) },
            ]
        );
    }

    #[test]
    fn test_resample_std_needs_two_values() {
        let series = TimeSeries::resample(
            vec![
                (date(2015, 1, 3), Some(1.0)),
                (date(2015, 1, 4), Some(3.0)),
                (date(2015, 2, 4), Some(3.0)),
            ],
            Cadence::MonthEnd,
            Aggregation::Std,
        );

        assert!((series.get(date(2015, 1, 31)).unwrap() - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(series.get(date(2015, 2, 28)), None);
    }

    #[test]
    fn test_missing_observation_opens_bucket() {
        let series = TimeSeries::resample(
            vec![(date(2015, 1, 3), None), (date(2015, 2, 3), Some(4.0))],
            Cadence::MonthEnd,
            Aggregation::Mean,
        );

        assert_eq!(series.len(), 2);
        assert_eq!(series.get(date(2015, 1, 31)), None);
        assert_eq!(series.get(date(2015, 2, 28)), Some(4.0));
    }

    #[test]
    fn test_aligned_skips_missing_pairs() {
        let a = TimeSeries::resample(
            vec![(date(2015, 1, 3), Some(1.0)), (date(2015, 3, 3), Some(3.0))],
            Cadence::MonthEnd,
            Aggregation::Mean,
        );
        let b = TimeSeries::resample(
            vec![(date(2015, 2, 3), Some(5.0)), (date(2015, 3, 3), Some(6.0))],
            Cadence::MonthEnd,
            Aggregation::Mean,
        );

        assert_eq!(a.aligned(&b), (vec![3.0], vec![6.0]));
    }

    #[test]
    fn test_population_vs_sample_std() {
        let values = [0.5, -0.5];
        assert!((population_std(&values).unwrap() - 0.5).abs() < 1e-12);
        assert!((sample_std(&values).unwrap() - 0.5f64 * 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(population_std(&[]), None);
    }
}
