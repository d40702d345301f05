//! Community embedding table reader
//!
//! Headerless CSV: the first field is the community name, the rest are the
//! vector components. Every row must have the same dimension.

use crate::error::AnalysisError;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Community vectors keyed by lowercase name, in file order
#[derive(Debug, Clone, Default)]
pub struct EmbeddingTable {
    names: Vec<String>,
    vectors: Vec<Vec<f64>>,
    index: HashMap<String, usize>,
}

impl EmbeddingTable {
    /// Build a table, rejecting mismatched dimensions
    pub fn new(entries: Vec<(String, Vec<f64>)>) -> Result<Self, AnalysisError> {
        let mut table = Self::default();
        let mut dimension: Option<usize> = None;

        for (name, vector) in entries {
            match dimension {
                Some(dim) if dim != vector.len() => {
                    return Err(AnalysisError::InvalidInput(format!(
                        "embedding for '{}' has {} components, expected {}",
                        name,
                        vector.len(),
                        dim
                    )));
                }
                None => dimension = Some(vector.len()),
                _ => {}
            }

            let key = name.to_lowercase();
            match table.index.get(&key) {
                Some(&idx) => table.vectors[idx] = vector,
                None => {
                    table.index.insert(key.clone(), table.names.len());
                    table.names.push(key);
                    table.vectors.push(vector);
                }
            }
        }

        Ok(table)
    }

    /// Read a table from a headerless CSV source
    pub fn read<R: Read>(input: R) -> Result<Self, AnalysisError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(input);

        let mut entries = Vec::new();
        for row in reader.records() {
            let row = row?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            let mut fields = row.iter();
            let name = fields
                .next()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| {
                    AnalysisError::ParseError(format!("line {}: missing community name", line))
                })?;

            let vector = fields
                .map(|cell| {
                    cell.trim().parse::<f64>().map_err(|_| {
                        AnalysisError::ParseError(format!(
                            "line {}: invalid component '{}'",
                            line, cell
                        ))
                    })
                })
                .collect::<Result<Vec<f64>, _>>()?;

            entries.push((name.to_string(), vector));
        }

        Self::new(entries)
    }

    /// Read a table from a CSV file
    pub fn read_path(path: &Path) -> Result<Self, AnalysisError> {
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Vector of `name` (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.index
            .get(&name.to_lowercase())
            .map(|&idx| self.vectors[idx].as_slice())
    }

    /// (name, vector) pairs in file order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.vectors.iter().map(Vec::as_slice))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.vectors.first().map(Vec::len)
    }
}
