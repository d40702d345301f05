//! Generate an aggregate report from synthetic data

use brandpulse::types::{ActivityRecord, ActivityTable, SimilarCommunity, StockRow};
use brandpulse::{AnalysisConfig, BrandTicker, CrossBrandAggregator, ReportEncoder, ReportFormat};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use std::collections::HashMap;

fn stock(seed: f64) -> Vec<StockRow> {
    let Some(start) = NaiveDate::from_ymd_opt(2015, 1, 1) else {
        return Vec::new();
    };
    (0..365)
        .map(|i| {
            let swing = 0.01 + seed * ((i / 30) % 4) as f64 / 100.0;
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            StockRow::new(
                start + Duration::days(i),
                100.0 * (1.0 + swing * sign),
                1e6 * (1.0 + 2.0 * swing * sign),
            )
        })
        .collect()
}

fn activity(community: &str) -> Vec<ActivityRecord> {
    (1..=12)
        .filter_map(|month| {
            let ts = Utc.with_ymd_and_hms(2015, month, 15, 12, 0, 0).single()?;
            let anger = (month % 4) as f64 / 10.0;
            Some(
                ActivityRecord::new(community, "askreddit", ts, if month % 3 == 0 { -1.0 } else { 1.0 })
                    .with_feature("LIWC_Anger", anger)
                    .with_feature("LIWC_Posemo", 0.5 - anger / 2.0 + month as f64 / 100.0),
            )
        })
        .collect()
}

fn main() {
    let brands = vec![
        BrandTicker::new("amazon", "AMZN"),
        BrandTicker::new("apple", "AAPL"),
    ];

    let mut similar: HashMap<String, Vec<SimilarCommunity>> = HashMap::new();
    let mut stocks: HashMap<String, Vec<StockRow>> = HashMap::new();
    let mut records = Vec::new();
    for (i, brand) in brands.iter().enumerate() {
        similar.insert(brand.brand.clone(), vec![SimilarCommunity::new(&brand.brand, 1.0)]);
        stocks.insert(brand.ticker.clone(), stock(1.0 + i as f64));
        records.extend(activity(&brand.brand));
    }

    let config = AnalysisConfig::default().with_brands(brands.clone());
    let report = CrossBrandAggregator::new(&similar, &stocks, &config)
        .aggregate(&brands, &ActivityTable::from_records(records));

    match ReportEncoder::new().encode_aggregation(&report, ReportFormat::Markdown) {
        Ok(markdown) => print!("{markdown}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
