//! Stock price table reader
//!
//! Expects a CSV header with `Date`, `Close` and `Volume`; `Open`, `High` and
//! `Low` are optional and extra columns such as `Adj Close` are ignored.

use crate::error::AnalysisError;
use crate::types::StockRow;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RawStockRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open", default)]
    open: Option<f64>,
    #[serde(rename = "High", default)]
    high: Option<f64>,
    #[serde(rename = "Low", default)]
    low: Option<f64>,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume")]
    volume: f64,
}

/// Parse the date part of `2015-01-02`, `2015-01-02 00:00:00` or `2015-01-02T00:00:00Z`
pub fn parse_stock_date(raw: &str) -> Result<NaiveDate, AnalysisError> {
    let day = raw.trim().split(|c| c == ' ' || c == 'T').next().unwrap_or("");
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| AnalysisError::DateParseError(format!("'{}': {}", raw, e)))
}

/// Read raw stock rows from any reader
pub fn read_stock_rows<R: Read>(input: R) -> Result<Vec<StockRow>, AnalysisError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(input);

    let mut rows = Vec::new();
    for raw in reader.deserialize::<RawStockRow>() {
        let raw = raw?;
        rows.push(StockRow {
            date: parse_stock_date(&raw.date)?,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume,
        });
    }
    Ok(rows)
}

/// Read raw stock rows from a CSV file
pub fn read_stock_file(path: &Path) -> Result<Vec<StockRow>, AnalysisError> {
    let file = File::open(path)?;
    read_stock_rows(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_yahoo_style_csv() {
        let csv = "Date,Open,High,Low,Close,Adj Close,Volume\n\
                   2015-01-02,312.58,314.75,306.96,308.52,308.52,2783200\n\
                   2015-01-05 00:00:00,307.01,308.38,300.85,302.19,302.19,2774200\n";

        let rows = read_stock_rows(csv.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2015, 1, 2).unwrap());
        assert_eq!(rows[0].high, Some(314.75));
        assert_eq!(rows[1].date, NaiveDate::from_ymd_opt(2015, 1, 5).unwrap());
        assert_eq!(rows[1].volume, 2774200.0);
    }

    #[test]
    fn test_optional_columns_may_be_absent() {
        let csv = "Date,Close,Volume\n2015-01-02,10.5,1000\n";
        let rows = read_stock_rows(csv.as_bytes()).unwrap();

        assert_eq!(rows[0].high, None);
        assert_eq!(rows[0].close, 10.5);
    }

    #[test]
    fn test_bad_date_is_an_error() {
        let csv = "Date,Close,Volume\n01/02/2015,10.5,1000\n";
        assert!(matches!(
            read_stock_rows(csv.as_bytes()),
            Err(AnalysisError::DateParseError(_))
        ));
    }
}
