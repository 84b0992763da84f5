//! Output persistence: aggregated dataset to a JSON document
//!
//! The dataset is exported as an array of flat records whose field set is the
//! union of keys across all rows; rows missing a column are filled with
//! `null`. Writes go through a sibling temporary file followed by an atomic
//! rename, so a crash mid-write never leaves a partial document at the
//! output path.

use crate::error::{Error, Result};
use crate::types::AggregatedDataset;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Serialize the dataset and persist it at `path`
///
/// Overwrites any existing file at the path. The temporary file is created in
/// the same directory so the final rename stays on one filesystem.
pub async fn write_dataset(dataset: &AggregatedDataset, path: &Path) -> Result<()> {
    let columns = dataset.columns();

    let records: Vec<Value> = dataset
        .rows()
        .iter()
        .map(|row| {
            let mut record = Map::new();
            for column in &columns {
                let value = row.get(column).cloned().unwrap_or(Value::Null);
                record.insert(column.clone(), value);
            }
            Value::Object(record)
        })
        .collect();

    let body = serde_json::to_vec(&records)?;

    let tmp_path = temp_path(path)?;
    tokio::fs::write(&tmp_path, &body)
        .await
        .map_err(|e| Error::Write {
            path: tmp_path.clone(),
            source: e,
        })?;

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        // Best effort: don't leave the temp file behind on failure
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(Error::Write {
            path: path.to_path_buf(),
            source: e,
        });
    }

    tracing::info!(path = %path.display(), rows = dataset.len(), "wrote output dataset");
    Ok(())
}

/// Sibling temporary path: `/dir/out.json` becomes `/dir/.out.json.tmp`
fn temp_path(path: &Path) -> Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| Error::Write {
        path: path.to_path_buf(),
        source: std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "output path has no file name",
        ),
    })?;

    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(".tmp");
    Ok(path.with_file_name(tmp_name))
}
