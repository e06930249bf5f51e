//! Dataset loading
//!
//! Reads the engagement CSV once at startup into an immutable, ordered
//! collection of records. Every recompute borrows it read-only.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Column names the input file must carry, in canonical order
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "Date",
    "Platform",
    "Content_Type",
    "Action",
    "Post_ID",
    "Engagement_Count",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// One engagement event (a post-action row)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngagementRecord {
    pub date: NaiveDate,
    pub platform: String,
    pub content_type: String,
    pub action: String,
    pub post_id: String,
    pub engagement_count: u64,
}

/// What to do with a row whose Date or Engagement_Count will not parse.
///
/// The choice applies to the whole load; rows are never handled inconsistently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowPolicy {
    /// Fail the load on the first bad row
    #[default]
    Abort,
    /// Drop bad rows and keep going
    Skip,
}

/// Error type for dataset loading
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("line {line}: cannot parse {column} value {value:?}")]
    Parse {
        line: u64,
        column: &'static str,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, LoadError>;

/// The full, immutable dataset
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<EngagementRecord>,
    skipped_rows: usize,
}

/// Positions of the required columns within the header row
struct ColumnIndex {
    date: usize,
    platform: usize,
    content_type: usize,
    action: usize,
    post_id: usize,
    engagement_count: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|&c| find(c).is_none())
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::MissingColumns(missing));
        }

        // All present, checked above
        let at = |name: &str| find(name).unwrap_or_default();
        Ok(Self {
            date: at("Date"),
            platform: at("Platform"),
            content_type: at("Content_Type"),
            action: at("Action"),
            post_id: at("Post_ID"),
            engagement_count: at("Engagement_Count"),
        })
    }
}

impl Dataset {
    /// Build a dataset from records already in memory
    pub fn from_records(records: Vec<EngagementRecord>) -> Self {
        Self {
            records,
            skipped_rows: 0,
        }
    }

    /// Load a dataset from a CSV file
    pub fn load(path: impl AsRef<Path>, policy: RowPolicy) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let dataset = Self::from_reader(file, policy)?;
        info!(
            path = %path.display(),
            rows = dataset.len(),
            skipped = dataset.skipped_rows,
            "dataset loaded"
        );
        Ok(dataset)
    }

    /// Load a dataset from any CSV source with a header row
    pub fn from_reader<R: std::io::Read>(reader: R, policy: RowPolicy) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns = ColumnIndex::from_headers(csv_reader.headers()?)?;

        let mut records = Vec::new();
        let mut skipped_rows = 0;
        for row in csv_reader.records() {
            let row = row?;
            match parse_row(&row, &columns) {
                Ok(record) => records.push(record),
                Err(e) => match policy {
                    RowPolicy::Abort => return Err(e),
                    RowPolicy::Skip => {
                        warn!("skipping row: {}", e);
                        skipped_rows += 1;
                    }
                },
            }
        }

        Ok(Self {
            records,
            skipped_rows,
        })
    }

    pub fn records(&self) -> &[EngagementRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows dropped under [`RowPolicy::Skip`]
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }
}

fn parse_row(row: &csv::StringRecord, columns: &ColumnIndex) -> Result<EngagementRecord> {
    let line = row.position().map(|p| p.line()).unwrap_or_default();
    let field = |idx: usize| row.get(idx).unwrap_or("");

    let raw_date = field(columns.date);
    let date = parse_date(raw_date).ok_or_else(|| LoadError::Parse {
        line,
        column: "Date",
        value: raw_date.to_string(),
    })?;

    let raw_count = field(columns.engagement_count);
    let engagement_count = parse_count(raw_count).ok_or_else(|| LoadError::Parse {
        line,
        column: "Engagement_Count",
        value: raw_count.to_string(),
    })?;

    Ok(EngagementRecord {
        date,
        platform: field(columns.platform).to_string(),
        content_type: field(columns.content_type).to_string(),
        action: field(columns.action).to_string(),
        post_id: field(columns.post_id).to_string(),
        engagement_count,
    })
}

/// Parse a calendar date, accepting a few common spellings.
/// Datetimes are truncated to their date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
}

/// Parse a non-negative integer count. `"12.0"` is accepted as 12.
pub fn parse_count(s: &str) -> Option<u64> {
    let s = s.trim();
    if let Ok(n) = s.parse::<u64>() {
        return Some(n);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}
