//! CSV stock directory source

use super::StockSource;
use crate::error::AnalysisError;
use crate::schema::read_stock_file;
use crate::types::{BrandTicker, StockRow};
use std::path::{Path, PathBuf};

/// Loads `<root>/<TICKER>.csv`; a missing file means no data
#[derive(Debug, Clone)]
pub struct CsvStockSource {
    root: PathBuf,
}

impl CsvStockSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding the rows of `ticker`
    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.root.join(format!("{}.csv", ticker))
    }
}

impl StockSource for CsvStockSource {
    fn load(&self, brand: &BrandTicker) -> Result<Vec<StockRow>, AnalysisError> {
        let path = self.path_for(&brand.ticker);
        if !path.is_file() {
            tracing::debug!(brand = %brand.brand, path = %path.display(), "no stock file");
            return Ok(Vec::new());
        }
        read_stock_file(&path).map_err(|e| {
            AnalysisError::StockSource(format!("{}: {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_loads_ticker_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("AMZN.csv"),
            "Date,Close,Volume\n2015-01-02,308.52,2783200\n",
        )
        .unwrap();

        let source = CsvStockSource::new(dir.path());
        let rows = source.load(&BrandTicker::new("amazon", "AMZN")).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvStockSource::new(dir.path());

        let rows = source.load(&BrandTicker::new("netflix", "NFLX")).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("AAPL.csv"), "Date,Close,Volume\nbad,1,1\n").unwrap();

        let source = CsvStockSource::new(dir.path());
        let err = source.load(&BrandTicker::new("apple", "AAPL")).unwrap_err();
        assert!(matches!(err, AnalysisError::StockSource(_)));
    }
}
