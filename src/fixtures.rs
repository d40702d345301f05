//! Shared test data

use crate::types::{ActivityRecord, SimilarCommunity, StockRow};
use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Daily rows whose close and volume swing with a month-dependent amplitude,
/// so monthly volatility differs from month to month.
pub(crate) fn oscillating_stock(start: NaiveDate, days: i64, phase: u32) -> Vec<StockRow> {
    (0..days)
        .map(|i| {
            let day = start + Duration::days(i);
            let month = day.month0() + phase;
            let price_amp = 0.01 * (1 + month % 4) as f64;
            let volume_amp = 0.05 * (1 + (month * 3) % 5) as f64;
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            StockRow::new(
                day,
                100.0 * (1.0 + price_amp * sign),
                1_000_000.0 * (1.0 + volume_amp * sign),
            )
            .with_range(100.0 * (1.0 + price_amp), 100.0 * (1.0 - price_amp))
        })
        .collect()
}

/// Two links per month from `community`, with features that vary by month
pub(crate) fn monthly_activity(community: &str, year: i32, months: u32) -> Vec<ActivityRecord> {
    (0..months)
        .flat_map(|m| {
            let anger = 0.1 * (1 + (m * 2) % 5) as f64;
            let posemo = 0.2 + 0.05 * m as f64;
            let sentiment = if m % 3 == 0 { -1.0 } else { 1.0 };
            [5, 20].into_iter().map(move |day| {
                let ts = Utc.with_ymd_and_hms(year, m + 1, day, 12, 0, 0).unwrap();
                ActivityRecord::new(community, "askreddit", ts, sentiment)
                    .with_feature("LIWC_Anger", anger)
                    .with_feature("LIWC_Posemo", posemo)
                    .with_feature("vader_compound", sentiment * 0.4 + day as f64 / 100.0)
                    .with_feature("vader_neg", if sentiment < 0.0 { 0.3 } else { 0.05 })
            })
        })
        .collect()
}

/// One positive and one negative link touching `community`, a month apart
pub(crate) fn two_month_links(community: &str) -> Vec<ActivityRecord> {
    vec![
        ActivityRecord::new(community, "askreddit", Utc.with_ymd_and_hms(2015, 1, 10, 12, 0, 0).unwrap(), 1.0),
        ActivityRecord::new("askreddit", community, Utc.with_ymd_and_hms(2015, 2, 10, 12, 0, 0).unwrap(), -1.0),
    ]
}

/// In-memory similarity map from (brand, community) pairs
pub(crate) fn similar_map(pairs: &[(&str, &str)]) -> HashMap<String, Vec<SimilarCommunity>> {
    let mut map: HashMap<String, Vec<SimilarCommunity>> = HashMap::new();
    for (brand, community) in pairs {
        map.entry(brand.to_string())
            .or_default()
            .push(SimilarCommunity::new(*community, 1.0));
    }
    map
}

/// Write rows as `<dir>/<ticker>.csv`
pub(crate) fn write_stock_csv(dir: &Path, ticker: &str, rows: &[StockRow]) {
    let mut csv = String::from("Date,High,Low,Close,Volume\n");
    for row in rows {
        writeln!(
            csv,
            "{},{},{},{},{}",
            row.date,
            row.high.unwrap_or(row.close),
            row.low.unwrap_or(row.close),
            row.close,
            row.volume
        )
        .unwrap();
    }
    std::fs::write(dir.join(format!("{}.csv", ticker)), csv).unwrap();
}
