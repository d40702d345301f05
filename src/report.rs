//! Report encoding
//!
//! Renders aggregation reports, per-brand outcomes and session snapshots as
//! JSON, CSV or a markdown summary. An empty aggregate table is a valid
//! result and renders as [`NO_DATA_PLACEHOLDER`].

use crate::error::AnalysisError;
use crate::series::TimeSeries;
use crate::session::{AnalysisSession, BrandSeries};
use crate::types::{AggregateTable, AggregationReport, BrandOutcome, FeatureCorrelationTable};
use crate::{PRODUCER_NAME, VERSION};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Text shown in place of an empty aggregate table
pub const NO_DATA_PLACEHOLDER: &str = "No aggregate data available";

/// Column headers of the aggregate table
pub const AGGREGATE_COLUMNS: [&str; 11] = [
    "Feature",
    "Avg Price Corr",
    "Avg Volume Corr",
    "Avg Overall Corr",
    "Std Price Corr",
    "Std Volume Corr",
    "Max Price Corr",
    "Max Volume Corr",
    "Brands Analyzed",
    "Consistency",
    "Abs Avg Overall",
];

/// Default number of rows shown in markdown tables
pub const DEFAULT_TOP_N: usize = 15;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportFormat {
    Json,
    JsonPretty,
    Csv,
    Markdown,
}

#[derive(Debug, Serialize)]
struct Producer {
    name: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct StockSummary {
    rows: usize,
    first_date: Option<String>,
    last_date: Option<String>,
}

/// Serializable snapshot of a session
#[derive(Debug, Serialize)]
struct SessionReport<'a> {
    producer: Producer,
    session_id: String,
    computed_at: String,
    active_brand: &'a str,
    brands: &'a [String],
    activity_records: usize,
    brand_activity_records: usize,
    stock: StockSummary,
    series: &'a BrandSeries,
    aggregation: Option<&'a AggregationReport>,
}

impl<'a> From<&'a AnalysisSession> for SessionReport<'a> {
    fn from(session: &'a AnalysisSession) -> Self {
        let stock = session.stock();
        Self {
            producer: Producer {
                name: PRODUCER_NAME,
                version: VERSION,
            },
            session_id: session.session_id().to_string(),
            computed_at: session.computed_at().to_rfc3339(),
            active_brand: session.active_brand(),
            brands: session.brands(),
            activity_records: session.activity().len(),
            brand_activity_records: session.brand_activity().len(),
            stock: StockSummary {
                rows: stock.len(),
                first_date: stock.first_date().map(|d| d.to_string()),
                last_date: stock.last_date().map(|d| d.to_string()),
            },
            series: session.series(),
            aggregation: session.aggregation(),
        }
    }
}

/// Encoder for analysis results
pub struct ReportEncoder {
    top_n: usize,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    pub fn new() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }

    /// Limit markdown tables to `top_n` rows
    pub fn with_top_n(top_n: usize) -> Self {
        Self { top_n }
    }

    /// Encode a cross-brand report
    pub fn encode_aggregation(
        &self,
        report: &AggregationReport,
        format: ReportFormat,
    ) -> Result<String, AnalysisError> {
        match format {
            ReportFormat::Json => Ok(serde_json::to_string(report)?),
            ReportFormat::JsonPretty => Ok(serde_json::to_string_pretty(report)?),
            ReportFormat::Csv => aggregate_csv(&report.table),
            ReportFormat::Markdown => Ok(self.aggregation_markdown(report)),
        }
    }

    /// Encode one brand's outcome
    pub fn encode_brand(
        &self,
        outcome: &BrandOutcome,
        format: ReportFormat,
    ) -> Result<String, AnalysisError> {
        match format {
            ReportFormat::Json => Ok(serde_json::to_string(outcome)?),
            ReportFormat::JsonPretty => Ok(serde_json::to_string_pretty(outcome)?),
            ReportFormat::Csv => match outcome {
                BrandOutcome::Analyzed(result) => correlation_csv(&result.table),
                BrandOutcome::Skipped(skip) => {
                    let mut writer = csv::Writer::from_writer(Vec::new());
                    writer.write_record(["brand", "ticker", "reason"])?;
                    writer.write_record([
                        skip.brand.as_str(),
                        skip.ticker.as_str(),
                        skip.reason.to_string().as_str(),
                    ])?;
                    finish(writer)
                }
            },
            ReportFormat::Markdown => Ok(self.brand_markdown(outcome)),
        }
    }

    /// Encode a session snapshot. CSV carries the aggregate table only.
    pub fn encode_session(
        &self,
        session: &AnalysisSession,
        format: ReportFormat,
    ) -> Result<String, AnalysisError> {
        match format {
            ReportFormat::Json => Ok(serde_json::to_string(&SessionReport::from(session))?),
            ReportFormat::JsonPretty => {
                Ok(serde_json::to_string_pretty(&SessionReport::from(session))?)
            }
            ReportFormat::Csv => aggregate_csv(session.aggregate_table()),
            ReportFormat::Markdown => Ok(self.session_markdown(session)),
        }
    }

    fn aggregation_markdown(&self, report: &AggregationReport) -> String {
        let mut output = String::new();

        let _ = writeln!(output, "# Brand Sentiment vs. Stock Volatility");
        let _ = writeln!(
            output,
            "Analyzed {} brands, skipped {}.",
            report.analyzed.len(),
            report.skipped.len()
        );
        let _ = writeln!(output);
        self.write_aggregate_section(&mut output, report);

        output
    }

    fn write_aggregate_section(&self, output: &mut String, report: &AggregationReport) {
        let table = &report.table;

        let _ = writeln!(output, "## Top Features");
        if table.is_empty() {
            let _ = writeln!(output, "{}", NO_DATA_PLACEHOLDER);
        } else {
            let _ = writeln!(
                output,
                "| Feature | Avg Price Corr | Avg Volume Corr | Avg Overall Corr | Brands Analyzed | Consistency |"
            );
            let _ = writeln!(output, "|---|---:|---:|---:|---:|---:|");
            for row in table.top(self.top_n) {
                let _ = writeln!(
                    output,
                    "| {} | {:.3} | {:.3} | {:.3} | {} | {:.0}% |",
                    row.feature,
                    row.avg_price_corr,
                    row.avg_volume_corr,
                    row.avg_overall_corr,
                    row.brands_analyzed,
                    row.consistency * 100.0
                );
            }

            let _ = writeln!(output);
            let _ = writeln!(output, "## Strongest Price Correlations");
            for row in table.top_by_price(5) {
                let _ = writeln!(output, "- {}: {:.3}", row.feature, row.avg_price_corr);
            }

            let _ = writeln!(output);
            let _ = writeln!(output, "## Strongest Volume Correlations");
            for row in table.top_by_volume(5) {
                let _ = writeln!(output, "- {}: {:.3}", row.feature, row.avg_volume_corr);
            }
        }

        if !report.analyzed.is_empty() {
            let _ = writeln!(output);
            let _ = writeln!(output, "## Analyzed Brands");
            for brand in &report.analyzed {
                let _ = writeln!(
                    output,
                    "- {} ({}): {} communities, {} links, {} features",
                    brand.brand,
                    brand.ticker,
                    brand.community_count,
                    brand.activity_count,
                    brand.feature_count
                );
            }
        }

        if !report.skipped.is_empty() {
            let _ = writeln!(output);
            let _ = writeln!(output, "## Skipped Brands");
            for skip in &report.skipped {
                let _ = writeln!(output, "- {} ({}): {}", skip.brand, skip.ticker, skip.reason);
            }
        }
    }

    fn brand_markdown(&self, outcome: &BrandOutcome) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "# {} ({})", outcome.brand(), outcome.ticker());

        match outcome {
            BrandOutcome::Analyzed(result) => {
                let _ = writeln!(
                    output,
                    "{} similar communities, {} links.",
                    result.community_count, result.activity_count
                );
                let _ = writeln!(output);
                let _ = writeln!(output, "| Feature | r (price) | r (volume) | r (avg) |");
                let _ = writeln!(output, "|---|---:|---:|---:|");
                for row in result.table.top(self.top_n) {
                    let _ = writeln!(
                        output,
                        "| {} | {:.3} | {:.3} | {:.3} |",
                        row.feature, row.r_price, row.r_volume, row.r_avg
                    );
                }
            }
            BrandOutcome::Skipped(skip) => {
                let _ = writeln!(output, "Skipped: {}", skip.reason);
            }
        }

        output
    }

    fn session_markdown(&self, session: &AnalysisSession) -> String {
        let mut output = String::new();
        let stock = session.stock();
        let series = session.series();

        let _ = writeln!(output, "# Analysis Session: {}", session.active_brand());
        let _ = writeln!(
            output,
            "Session {} computed at {}",
            session.session_id(),
            session.computed_at().to_rfc3339()
        );
        let _ = writeln!(output);
        let _ = writeln!(output, "## Brand Activity");
        let _ = writeln!(
            output,
            "- {} of {} links touch {}",
            session.brand_activity().len(),
            session.activity().len(),
            session.brands().join(", ")
        );
        match (stock.first_date(), stock.last_date()) {
            (Some(first), Some(last)) => {
                let _ = writeln!(output, "- {} stock rows from {} to {}", stock.len(), first, last);
            }
            _ => {
                let _ = writeln!(output, "- No stock rows in range");
            }
        }
        let _ = writeln!(
            output,
            "- Monthly sentiment: total {:.1}, negativity {:.1} over {} months",
            series_total(&series.monthly_sentiment),
            series_total(&series.monthly_negativity),
            series.monthly_sentiment.len()
        );
        let _ = writeln!(output);

        match session.aggregation() {
            Some(report) => self.write_aggregate_section(&mut output, report),
            None => {
                let _ = writeln!(output, "## Top Features");
                let _ = writeln!(output, "{}", NO_DATA_PLACEHOLDER);
            }
        }

        output
    }
}

fn series_total(series: &TimeSeries) -> f64 {
    series.points.iter().filter_map(|p| p.value).sum()
}

fn aggregate_csv(table: &AggregateTable) -> Result<String, AnalysisError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if table.is_empty() {
        writer.write_record(AGGREGATE_COLUMNS)?;
    }
    for row in &table.rows {
        writer.serialize(row)?;
    }
    finish(writer)
}

fn correlation_csv(table: &FeatureCorrelationTable) -> Result<String, AnalysisError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if table.is_empty() {
        writer.write_record(["Feature", "r_price", "r_volume", "r_avg"])?;
    }
    for row in &table.rows {
        writer.serialize(row)?;
    }
    finish(writer)
}

fn finish(mut writer: csv::Writer<Vec<u8>>) -> Result<String, AnalysisError> {
    writer.flush()?;
    let bytes = writer
        .into_inner()
        .map_err(|e| AnalysisError::InvalidInput(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AnalysisError::InvalidInput(e.to_string()))
}
