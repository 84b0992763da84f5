//! Input loading: tabular CSV file to ordered row records

use crate::error::LoadError;
use crate::types::RowRecord;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

/// Load the ordered sequence of row records from a CSV file
///
/// The file must carry a header row containing an `id` column. Remaining
/// columns are kept on each record as extra fields; the fetch stage ignores
/// them. Record order is file order.
///
/// # Errors
///
/// Fails if the file cannot be read or parsed, if the `id` column is missing,
/// or if any row carries an empty or duplicate id (the id is the unique join
/// key between input rows and lookup results).
pub fn load_rows(path: &Path) -> Result<Vec<RowRecord>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| LoadError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

    let headers = reader
        .headers()
        .map_err(|e| LoadError::Read {
            path: path.to_path_buf(),
            source: e,
        })?
        .clone();

    let id_index = headers
        .iter()
        .position(|h| h == "id")
        .ok_or_else(|| LoadError::MissingIdColumn {
            path: path.to_path_buf(),
        })?;

    let mut seen_ids = HashSet::new();
    let mut rows = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let row = index + 1;
        let record = record.map_err(|e| LoadError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let id = record.get(id_index).unwrap_or_default();
        if id.is_empty() {
            return Err(LoadError::EmptyId { row });
        }
        if !seen_ids.insert(id.to_string()) {
            return Err(LoadError::DuplicateId {
                id: id.to_string(),
                row,
            });
        }

        let mut extra = Map::new();
        for (i, field) in record.iter().enumerate() {
            if i == id_index {
                continue;
            }
            // Fields beyond the header width have no name to key them by
            if let Some(name) = headers.get(i) {
                extra.insert(name.to_string(), Value::String(field.to_string()));
            }
        }

        rows.push(RowRecord {
            id: id.to_string(),
            extra,
        });
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "loaded input rows");
    Ok(rows)
}
