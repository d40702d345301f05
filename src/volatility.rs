//! Stock volatility derivation
//!
//! Volatility is the rolling standard deviation of day-over-day percentage
//! change. The rolling window only yields a value once it is full and every
//! change inside it is defined; the daily values are then bucketed by cadence
//! and averaged.

use crate::series::{sample_std, Aggregation, Cadence, TimeSeries};
use crate::types::{StockField, StockTable};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default rolling window in trading days
pub const DEFAULT_VOLATILITY_WINDOW: usize = 7;

/// Rolling window used for daily price volatility views
pub const DAILY_PRICE_VOLATILITY_WINDOW: usize = 30;

/// Fixed-size window of percentage changes
#[derive(Debug, Clone)]
pub struct RollingWindow {
    values: VecDeque<Option<f64>>,
    window_size: usize,
}

impl RollingWindow {
    pub fn new(window_size: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(window_size),
            window_size,
        }
    }

    /// Push the next value and return the window's sample std, if defined
    pub fn push(&mut self, value: Option<f64>) -> Option<f64> {
        self.values.push_back(value);
        while self.values.len() > self.window_size {
            self.values.pop_front();
        }

        if self.values.len() < self.window_size {
            return None;
        }
        let defined: Option<Vec<f64>> = self.values.iter().copied().collect();
        defined.and_then(|values| sample_std(&values))
    }
}

/// Day-over-day fractional change; the first entry and divisions by zero are `None`
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    let mut changes = Vec::with_capacity(values.len());
    let mut previous: Option<f64> = None;
    for &value in values {
        let change = previous
            .filter(|prev| *prev != 0.0)
            .map(|prev| value / prev - 1.0)
            .filter(|c| c.is_finite());
        changes.push(change);
        previous = Some(value);
    }
    changes
}

/// Rolling sample std over `window` entries
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut rolling = RollingWindow::new(window);
    values.iter().map(|value| rolling.push(*value)).collect()
}

/// Price and volume volatility at one cadence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolatilityPair {
    pub price: TimeSeries,
    pub volume: TimeSeries,
}

impl VolatilityPair {
    /// Derive both series from a prepared stock table
    pub fn from_stock(stock: &StockTable, window: usize, cadence: Cadence) -> Self {
        let price = stock.rolling_volatility(StockField::Close, window);
        let volume = stock.rolling_volatility(StockField::Volume, window);

        Self {
            price: TimeSeries::resample(price, cadence, Aggregation::Mean),
            volume: TimeSeries::resample(volume, cadence, Aggregation::Mean),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.price.is_empty() && self.volume.is_empty()
    }
}

impl StockTable {
    /// Daily rolling volatility of one column, one entry per row
    pub fn rolling_volatility(
        &self,
        field: StockField,
        window: usize,
    ) -> Vec<(NaiveDate, Option<f64>)> {
        let changes = pct_change(&self.column(field));
        let stds = rolling_std(&changes, window);
        self.rows.iter().map(|row| row.date).zip(stds).collect()
    }

    /// Monthly High max minus Low min
    pub fn monthly_spread(&self) -> TimeSeries {
        let highs = TimeSeries::resample(
            self.rows.iter().map(|row| (row.date, row.high)),
            Cadence::MonthEnd,
            Aggregation::Max,
        );
        let lows = TimeSeries::resample(
            self.rows.iter().map(|row| (row.date, row.low)),
            Cadence::MonthEnd,
            Aggregation::Min,
        );

        let mut spread = highs;
        for point in &mut spread.points {
            point.value = match (point.value, lows.get(point.date)) {
                (Some(high), Some(low)) => Some(high - low),
                _ => None,
            };
        }
        spread
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::StockNormalizer;
    use crate::types::StockRow;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_pct_change() {
        let changes = pct_change(&[100.0, 110.0, 0.0, 5.0]);
        assert_eq!(changes[0], None);
        assert!((changes[1].unwrap() - 0.1).abs() < 1e-12);
        assert!((changes[2].unwrap() + 1.0).abs() < 1e-12);
        // Change from zero is undefined
        assert_eq!(changes[3], None);
    }

    #[test]
    fn test_rolling_window_requires_full_defined_window() {
        let stds = rolling_std(&[None, Some(1.0), Some(3.0), Some(5.0)], 2);
        assert_eq!(stds[0], None);
        // Window [None, 1.0] contains a gap
        assert_eq!(stds[1], None);
        assert!((stds[2].unwrap() - 2f64.sqrt()).abs() < 1e-12);
        assert!((stds[3].unwrap() - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_rolling_window_drops_oldest_value() {
        let mut window = RollingWindow::new(3);
        window.push(Some(100.0));
        window.push(Some(1.0));
        window.push(Some(1.0));
        let std = window.push(Some(1.0));
        assert_eq!(std, Some(0.0));
    }

    #[test]
    fn test_volatility_pair_resamples_by_month() {
        let start = date(2015, 1, 1);
        let rows: Vec<StockRow> = (0..60)
            .map(|i| {
                let close = 100.0 + ((i % 3) as f64) * (1.0 + i as f64 / 10.0);
                let volume = 1_000.0 + ((i % 2) as f64) * 50.0;
                StockRow::new(start + Duration::days(i), close, volume)
            })
            .collect();
        let stock = StockNormalizer::prepare(rows);

        let pair = VolatilityPair::from_stock(&stock, DEFAULT_VOLATILITY_WINDOW, Cadence::MonthEnd);

        assert_eq!(pair.price.dates(), vec![date(2015, 1, 31), date(2015, 2, 28), date(2015, 3, 31)]);
        assert!(pair.price.points.iter().all(|p| p.value.map_or(true, |v| v >= 0.0)));
        assert!(pair.volume.get(date(2015, 2, 28)).is_some());
    }

    #[test]
    fn test_monthly_spread() {
        let stock = StockNormalizer::prepare(vec![
            StockRow::new(date(2015, 1, 2), 10.0, 1.0).with_range(11.0, 9.0),
            StockRow::new(date(2015, 1, 5), 10.0, 1.0).with_range(14.0, 9.5),
            StockRow::new(date(2015, 2, 2), 10.0, 1.0),
        ]);

        let spread = stock.monthly_spread();
        assert_eq!(spread.get(date(2015, 1, 31)), Some(5.0));
        assert_eq!(spread.get(date(2015, 2, 28)), None);
    }
}
