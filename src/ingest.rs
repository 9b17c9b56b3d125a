//! Input table loading and numeric coercion.
//!
//! Posts arrive as an untyped grid of strings (a CSV export or a JSON array of
//! records). This module looks up the required columns by name and coerces
//! the metric columns into a fresh set of [`PostRecord`]s, leaving the source
//! table untouched.

use crate::error::{Result, StatsError};
use crate::models::PostRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Names of the columns the aggregation reads.
pub mod columns {
    pub const CHANNEL: &str = "Channel";
    pub const FACEBOOK_IMPRESSIONS: &str = "Facebook - Post Impressions - Organic";
    pub const LINKEDIN_IMPRESSIONS: &str = "Linkedin - Post Impressions";
    pub const TWITTER_IMPRESSIONS: &str = "Twitter - Post Impressions - Advanced";
    pub const LINK_CLICKS: &str = "Post Link Shortener Clicks";
    pub const ENGAGEMENTS: &str = "ENG";
    pub const WEIGHTED_ENGAGEMENTS: &str = "wENG";

    /// Columns coerced to numbers.
    pub const METRICS: [&str; 6] = [
        FACEBOOK_IMPRESSIONS,
        LINKEDIN_IMPRESSIONS,
        TWITTER_IMPRESSIONS,
        LINK_CLICKS,
        ENGAGEMENTS,
        WEIGHTED_ENGAGEMENTS,
    ];
}

/// Format of the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Csv,
    /// Array of objects, one per post.
    Json,
}

impl InputFormat {
    /// Guess the format from a file extension. Anything but `.json` is read as CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::Json,
            _ => InputFormat::Csv,
        }
    }
}

/// An untyped table of string cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Read a table from a file in the given format.
    pub fn load(path: &Path, format: InputFormat) -> Result<Self> {
        debug!("Loading {:?} table from {}", format, path.display());
        match format {
            InputFormat::Csv => Self::from_csv_reader(std::fs::File::open(path)?),
            InputFormat::Json => Self::from_json_str(&std::fs::read_to_string(path)?),
        }
    }

    /// Parse CSV with a header row. Short rows are padded with empty cells.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(String::from).collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(String::from).collect();
            if row.len() < headers.len() {
                row.resize(headers.len(), String::new());
            }
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// Parse a JSON array of objects. Headers are the union of all keys;
    /// absent keys and nulls become empty cells.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        let Value::Array(items) = value else {
            return Err(StatsError::InvalidJsonShape(
                "top-level value is not an array".to_string(),
            ));
        };

        let mut headers: Vec<String> = Vec::new();
        let mut objects = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            let Value::Object(map) = item else {
                return Err(StatsError::InvalidJsonShape(format!(
                    "element {} is not an object",
                    i
                )));
            };
            for key in map.keys() {
                if !headers.iter().any(|h| h == key) {
                    headers.push(key.clone());
                }
            }
            objects.push(map);
        }

        let rows = objects
            .iter()
            .map(|map| {
                headers
                    .iter()
                    .map(|h| map.get(h).map(json_cell).unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(Self { headers, rows })
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact header name.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| StatsError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// All values of a column, top to bottom.
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self.column_index(name)?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
            .collect())
    }
}

fn json_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Parse a cell as a number. Empty, unparseable and NaN cells are missing.
pub fn coerce_numeric(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Coerce a whole column.
pub fn coerce_column(values: &[&str]) -> Vec<Option<f64>> {
    values.iter().map(|v| coerce_numeric(v)).collect()
}

/// Build typed post records from a raw table.
///
/// Every required column is looked up before any row is read, so a missing
/// column fails the whole call.
pub fn to_records(table: &RawTable) -> Result<Vec<PostRecord>> {
    let channels = table.column(columns::CHANNEL)?;

    let mut metrics: Vec<Vec<Option<f64>>> = Vec::with_capacity(columns::METRICS.len());
    for name in columns::METRICS {
        let raw = table.column(name)?;
        let coerced = coerce_column(&raw);
        let missing = coerced.iter().filter(|v| v.is_none()).count();
        if missing > 0 {
            debug!("Column '{}': {} of {} cells missing or non-numeric", name, missing, raw.len());
        }
        metrics.push(coerced);
    }

    let records = channels
        .iter()
        .enumerate()
        .map(|(i, channel)| PostRecord {
            channel: channel.to_string(),
            facebook_impressions: metrics[0][i],
            linkedin_impressions: metrics[1][i],
            twitter_impressions: metrics[2][i],
            link_clicks: metrics[3][i],
            engagements: metrics[4][i],
            weighted_engagements: metrics[5][i],
        })
        .collect();

    Ok(records)
}
