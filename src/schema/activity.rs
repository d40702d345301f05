//! Hyperlink activity table reader
//!
//! Reads a delimited file with a header row. The four core columns are
//! required; a `PROPERTIES` cell expands into the named property columns;
//! every other column is treated as a numeric feature.

use crate::error::AnalysisError;
use crate::features::PROPERTY_COLUMNS;
use crate::types::{ActivityRecord, ActivityTable, LINK_SENTIMENT};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const SOURCE_COLUMN: &str = "SOURCE_SUBREDDIT";
pub const TARGET_COLUMN: &str = "TARGET_SUBREDDIT";
pub const TIMESTAMP_COLUMN: &str = "TIMESTAMP";
pub const POST_ID_COLUMN: &str = "POST_ID";
pub const PROPERTIES_COLUMN: &str = "PROPERTIES";

/// Parse a timestamp in RFC 3339, `%Y-%m-%d %H:%M:%S` or `%Y-%m-%d` form
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, AnalysisError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(ts.and_utc());
    }
    if let Some(ts) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(ts.and_utc());
    }
    Err(AnalysisError::DateParseError(format!(
        "unrecognized timestamp '{}'",
        raw
    )))
}

/// Where a feature value comes from in a row
enum FeatureSource {
    Column(usize),
    Properties(usize),
}

/// Reader for hyperlink activity tables
pub struct ActivityReader {
    delimiter: u8,
}

impl Default for ActivityReader {
    fn default() -> Self {
        Self::new(b'\t')
    }
}

impl ActivityReader {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Reader for a configured delimiter, which must be a single ASCII character
    pub fn with_delimiter(delimiter: char) -> Result<Self, AnalysisError> {
        u8::try_from(delimiter)
            .ok()
            .filter(u8::is_ascii)
            .map(Self::new)
            .ok_or_else(|| {
                AnalysisError::InvalidConfig(format!(
                    "delimiter {:?} is not an ASCII character",
                    delimiter
                ))
            })
    }

    /// Read an activity table from a file
    pub fn read_path(&self, path: &Path) -> Result<ActivityTable, AnalysisError> {
        let file = File::open(path)?;
        self.read(file)
    }

    /// Read an activity table from any reader
    pub fn read<R: Read>(&self, input: R) -> Result<ActivityTable, AnalysisError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_reader(input);

        let headers = reader.headers()?.clone();
        let index: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim(), i))
            .collect();

        let column = |name: &str| {
            index
                .get(name)
                .copied()
                .ok_or_else(|| AnalysisError::MissingField(name.to_string()))
        };
        let source_idx = column(SOURCE_COLUMN)?;
        let target_idx = column(TARGET_COLUMN)?;
        let timestamp_idx = column(TIMESTAMP_COLUMN)?;
        let sentiment_idx = column(LINK_SENTIMENT)?;
        let post_id_idx = index.get(POST_ID_COLUMN).copied();
        let properties_idx = index.get(PROPERTIES_COLUMN).copied();

        let core: HashSet<usize> = [Some(source_idx), Some(target_idx), Some(timestamp_idx), Some(sentiment_idx), post_id_idx]
            .into_iter()
            .flatten()
            .collect();

        let mut feature_names = Vec::new();
        let mut feature_sources = Vec::new();
        for (i, name) in headers.iter().enumerate() {
            if core.contains(&i) {
                continue;
            }
            if Some(i) == properties_idx {
                for (p, property) in PROPERTY_COLUMNS.iter().enumerate() {
                    feature_names.push(property.to_string());
                    feature_sources.push(FeatureSource::Properties(p));
                }
            } else {
                feature_names.push(name.trim().to_string());
                feature_sources.push(FeatureSource::Column(i));
            }
        }

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            let field = |idx: usize| row.get(idx).unwrap_or("").trim();

            let timestamp = parse_timestamp(field(timestamp_idx)).map_err(|e| {
                AnalysisError::ParseError(format!("line {}: {}", line, e))
            })?;
            let link_sentiment: f64 = field(sentiment_idx).parse().map_err(|_| {
                AnalysisError::ParseError(format!(
                    "line {}: invalid {} '{}'",
                    line,
                    LINK_SENTIMENT,
                    field(sentiment_idx)
                ))
            })?;

            let properties: Vec<&str> = match properties_idx {
                Some(idx) => {
                    let cells: Vec<&str> = field(idx).split(',').collect();
                    if cells.len() != PROPERTY_COLUMNS.len() {
                        return Err(AnalysisError::ParseError(format!(
                            "line {}: expected {} properties, found {}",
                            line,
                            PROPERTY_COLUMNS.len(),
                            cells.len()
                        )));
                    }
                    cells
                }
                None => Vec::new(),
            };

            let mut record = ActivityRecord::new(
                field(source_idx),
                field(target_idx),
                timestamp,
                link_sentiment,
            );
            record.post_id = post_id_idx
                .map(|idx| field(idx).to_string())
                .filter(|id| !id.is_empty());

            for (name, source) in feature_names.iter().zip(&feature_sources) {
                let cell = match source {
                    FeatureSource::Column(idx) => field(*idx),
                    FeatureSource::Properties(p) => properties[*p].trim(),
                };
                if let Some(value) = cell.parse::<f64>().ok().filter(|v| v.is_finite()) {
                    record.features.insert(name.clone(), value);
                }
            }

            records.push(record);
        }

        Ok(ActivityTable::new(records, feature_names))
    }
}

/// Overview of an ingested activity table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub records: usize,
    pub communities: usize,
    pub negative_links: usize,
    pub feature_columns: usize,
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
}

impl ActivitySummary {
    pub fn of(table: &ActivityTable) -> Self {
        let records = table.records();
        let communities: HashSet<String> = records
            .iter()
            .flat_map(|r| [r.source.to_lowercase(), r.target.to_lowercase()])
            .collect();

        Self {
            records: records.len(),
            communities: communities.len(),
            negative_links: records.iter().filter(|r| r.link_sentiment < 0.0).count(),
            feature_columns: table.feature_names().len(),
            first_timestamp: records.iter().map(|r| r.timestamp).min(),
            last_timestamp: records.iter().map(|r| r.timestamp).max(),
        }
    }
}
