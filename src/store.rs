//! File-backed persistence collaborator.
//!
//! Each module gets `<module>.csv` under the store root, with the catalog's
//! field keys as header. Rows missing a required value or repeating a unique
//! value are rejected individually; the rest of the batch is still written.
//! Every batch appends a summary line to `<module>.batches.jsonl`.
//!
//! A batch either fails as a whole and leaves the module file untouched, or
//! its accepted rows and its batch log line are both written.

use std::{
    collections::{HashMap, HashSet},
    fs::{self, File, OpenOptions},
    io::{BufReader, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    catalog::{FieldCatalog, TargetField},
    executor::{BatchReport, Record, RecordStore, RowFailure},
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error on {path:?}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Failed to serialize batch log entry")]
    Json(#[from] serde_json::Error),
    #[error("Catalog lookup failed for module '{module}': {message}")]
    Catalog { module: String, message: String },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn csv_err(path: &Path) -> impl FnOnce(csv::Error) -> StoreError + '_ {
    move |source| StoreError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Serialize)]
struct BatchLogEntry<'a> {
    batch_id: Uuid,
    imported_at: DateTime<Utc>,
    module_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mapping: Option<&'a str>,
    total: usize,
    success: usize,
    errors: usize,
}

pub struct CsvRecordStore<C> {
    root: PathBuf,
    catalog: C,
}

impl<C: FieldCatalog> CsvRecordStore<C> {
    pub fn new(root: impl Into<PathBuf>, catalog: C) -> Self {
        Self {
            root: root.into(),
            catalog,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn module_path(&self, module_id: &str) -> PathBuf {
        self.root.join(format!("{module_id}.csv"))
    }

    pub fn batch_log_path(&self, module_id: &str) -> PathBuf {
        self.root.join(format!("{module_id}.batches.jsonl"))
    }

    fn existing_unique_values(
        &self,
        path: &Path,
        fields: &[TargetField],
    ) -> Result<HashMap<String, HashSet<String>>, StoreError> {
        let mut seen: HashMap<String, HashSet<String>> = fields
            .iter()
            .filter(|f| f.unique)
            .map(|f| (f.key.clone(), HashSet::new()))
            .collect();
        if seen.is_empty() || !path.exists() {
            return Ok(seen);
        }

        let file = File::open(path).map_err(io_err(path))?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(BufReader::new(file));
        let headers = reader.headers().map_err(csv_err(path))?.clone();
        let positions = headers
            .iter()
            .enumerate()
            .filter(|(_, name)| seen.contains_key(*name))
            .map(|(idx, name)| (idx, name.to_string()))
            .collect::<Vec<_>>();
        for record in reader.records() {
            let record = record.map_err(csv_err(path))?;
            for (idx, key) in &positions {
                if let Some(value) = record.get(*idx).and_then(significant)
                    && let Some(values) = seen.get_mut(key)
                {
                    values.insert(value.to_string());
                }
            }
        }
        Ok(seen)
    }

    /// Appends `rows` to the module file in one write. On failure the file is
    /// truncated back to its previous length.
    fn append_rows(&self, path: &Path, rows: &[u8]) -> Result<u64, StoreError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(io_err(path))?;
        let original_len = file.seek(SeekFrom::End(0)).map_err(io_err(path))?;
        if let Err(source) = file.write_all(rows).and_then(|()| file.flush()) {
            rollback(path, original_len);
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
        Ok(original_len)
    }

    fn append_batch_log(&self, module_id: &str, entry: &BatchLogEntry<'_>) -> Result<(), StoreError> {
        let path = self.batch_log_path(module_id);
        let line = serde_json::to_string(entry)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err(&path))?;
        writeln!(file, "{line}").map_err(io_err(&path))
    }
}

fn rollback(path: &Path, len: u64) {
    let truncated = OpenOptions::new()
        .write(true)
        .open(path)
        .and_then(|file| file.set_len(len));
    if let Err(err) = truncated {
        warn!("Could not roll back {path:?} to {len} byte(s): {err}");
    }
}

/// Trimmed value, or `None` when it is blank.
fn significant(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|v| !v.is_empty())
}

/// Checks one record against required and unique constraints.
///
/// Accepted unique values are added to `seen` so later rows in the same batch
/// are checked against them too.
pub fn validate_record(
    record: &Record,
    fields: &[TargetField],
    seen: &mut HashMap<String, HashSet<String>>,
) -> Result<(), String> {
    for field in fields.iter().filter(|f| f.required) {
        if record.get(&field.key).and_then(|v| significant(v)).is_none() {
            return Err(format!("missing required field '{}'", field.key));
        }
    }
    for field in fields.iter().filter(|f| f.unique) {
        let Some(value) = record.get(&field.key).and_then(|v| significant(v)) else {
            continue;
        };
        if seen
            .get(&field.key)
            .is_some_and(|values| values.contains(value))
        {
            return Err(format!(
                "duplicate value '{value}' for unique field '{}'",
                field.key
            ));
        }
    }
    for field in fields.iter().filter(|f| f.unique) {
        if let Some(value) = record.get(&field.key).and_then(|v| significant(v)) {
            seen.entry(field.key.clone())
                .or_default()
                .insert(value.to_string());
        }
    }
    Ok(())
}

impl<C: FieldCatalog> RecordStore for CsvRecordStore<C> {
    type Error = StoreError;

    fn import_records(
        &self,
        module_id: &str,
        records: &[Record],
        saved_mapping_name: Option<&str>,
    ) -> Result<BatchReport, StoreError> {
        let fields = self
            .catalog
            .fields(module_id)
            .map_err(|err| StoreError::Catalog {
                module: module_id.to_string(),
                message: err.to_string(),
            })?;
        fs::create_dir_all(&self.root).map_err(io_err(&self.root))?;

        let path = self.module_path(module_id);
        let mut seen = self.existing_unique_values(&path, &fields)?;
        let write_header = fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        if write_header {
            writer
                .write_record(fields.iter().map(|f| f.key.as_str()))
                .map_err(csv_err(&path))?;
        }

        let mut report = BatchReport {
            total: records.len(),
            ..BatchReport::default()
        };
        for (idx, record) in records.iter().enumerate() {
            match validate_record(record, &fields, &mut seen) {
                Ok(()) => {
                    writer
                        .write_record(
                            fields
                                .iter()
                                .map(|f| record.get(&f.key).map(String::as_str).unwrap_or("")),
                        )
                        .map_err(csv_err(&path))?;
                    report.success += 1;
                }
                Err(message) => {
                    debug!("Row {} rejected: {message}", idx + 1);
                    report.errors += 1;
                    report.failures.push(RowFailure {
                        row: idx + 1,
                        message,
                    });
                }
            }
        }
        let rows = writer
            .into_inner()
            .map_err(|err| StoreError::Io {
                path: path.clone(),
                source: err.into_error(),
            })?;

        let original_len = self.append_rows(&path, &rows)?;
        let logged = self.append_batch_log(
            module_id,
            &BatchLogEntry {
                batch_id: Uuid::new_v4(),
                imported_at: Utc::now(),
                module_id,
                mapping: saved_mapping_name,
                total: report.total,
                success: report.success,
                errors: report.errors,
            },
        );
        if let Err(err) = logged {
            rollback(&path, original_len);
            return Err(err);
        }
        info!(
            "Stored {} of {} record(s) in {:?}",
            report.success, report.total, path
        );
        Ok(report)
    }
}
