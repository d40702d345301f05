//! Stock table normalization
//!
//! This module turns raw stock rows into a canonical date-indexed table:
//! - rows sorted by date
//! - duplicate dates dropped (first row wins)
//! - optional inclusive date window applied
//! - rows with non-finite close or volume dropped

use crate::types::{StockRow, StockTable};
use chrono::NaiveDate;

/// Normalizer for converting raw stock rows into a prepared [`StockTable`]
pub struct StockNormalizer;

impl StockNormalizer {
    /// Prepare rows over their full date range
    pub fn prepare(rows: Vec<StockRow>) -> StockTable {
        Self::prepare_within(rows, None, None)
    }

    /// Prepare rows, keeping only dates in `[start, end]` when bounds are given
    pub fn prepare_within(
        rows: Vec<StockRow>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> StockTable {
        let mut rows: Vec<StockRow> = rows
            .into_iter()
            .filter(|row| row.close.is_finite() && row.volume.is_finite())
            .filter(|row| start.map_or(true, |s| row.date >= s))
            .filter(|row| end.map_or(true, |e| row.date <= e))
            .collect();

        // Stable sort keeps the original order among equal dates, so dedup keeps the first
        rows.sort_by_key(|row| row.date);
        rows.dedup_by_key(|row| row.date);

        StockTable { rows }
    }
}
