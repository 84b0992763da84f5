//! Core data model for the pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::LookupError;

/// One input row: an id plus whatever extra columns the source carried
///
/// Records are immutable once loaded; their order is the input file order,
/// which the rest of the pipeline preserves end to end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowRecord {
    /// Unique join key driving the remote lookup
    pub id: String,

    /// Remaining columns keyed by header name; carried along but ignored by
    /// the fetch stage
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl RowRecord {
    /// Create a record with no extra columns
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            extra: Map::new(),
        }
    }
}

/// The JSON object returned by one successful lookup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupResult {
    /// Response fields keyed by JSON field name
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl LookupResult {
    /// Build a result from an already-parsed JSON object
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Look up a single response field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Per-row lookup state tracked by the fetch coordinator
///
/// Every dispatched row ends in exactly one non-pending outcome; `Pending`
/// exists only while outcomes are being collected.
#[derive(Debug)]
pub enum TaskOutcome {
    /// Outcome not yet resolved
    Pending,
    /// Lookup succeeded with a parsed result
    Succeeded(LookupResult),
    /// Lookup failed terminally (retries exhausted, malformed body, or cancelled)
    Failed(LookupError),
}

impl TaskOutcome {
    /// Whether the outcome is still unresolved
    pub fn is_pending(&self) -> bool {
        matches!(self, TaskOutcome::Pending)
    }

    /// Whether the lookup succeeded
    pub fn is_succeeded(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded(_))
    }
}

/// Ordered collection of lookup results; the single output artifact of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedDataset {
    rows: Vec<LookupResult>,
}

impl AggregatedDataset {
    /// Build a dataset from an ordered sequence of results
    pub fn new(rows: Vec<LookupResult>) -> Self {
        Self { rows }
    }

    /// The results in aggregation order
    pub fn rows(&self) -> &[LookupResult] {
        &self.rows
    }

    /// Number of rows in the dataset
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset holds no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Union of field names across all rows
    ///
    /// This is the column set of the exported artifact; rows missing a column
    /// are filled with `null` on write.
    pub fn columns(&self) -> BTreeSet<String> {
        self.rows
            .iter()
            .flat_map(|row| row.fields.keys().cloned())
            .collect()
    }
}

/// Summary of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Number of rows loaded from the input
    pub rows_loaded: usize,

    /// Number of rows written to the output (0 for dry runs)
    pub rows_written: usize,

    /// Path of the written artifact, if one was produced
    pub output: Option<PathBuf>,

    /// When the run started (UTC)
    pub started_at: DateTime<Utc>,

    /// Wall-clock duration of the run
    pub elapsed: Duration,

    /// Whether this was a dry run (stopped after loading)
    pub dry_run: bool,
}
