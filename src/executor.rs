//! Batch import execution.
//!
//! The executor turns every row into a record keyed by target field, submits
//! the whole set to a [`RecordStore`] as one batch, and folds the per-row
//! outcomes into an [`ImportResult`]. It never validates records itself.
//!
//! Only one batch may be in flight per executor. Progress is a two-state
//! signal; any smooth percentage belongs to the presentation layer.

use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicBool, Ordering},
};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{error::ImportError, mapping::MappingSet, parser::RawTable};

/// A record ready for persistence: field key -> value.
pub type Record = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    /// 1-based data row number (the header is not counted).
    pub row: usize,
    pub message: String,
}

/// What the persistence collaborator reports for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub success: usize,
    pub errors: usize,
    #[serde(default)]
    pub failures: Vec<RowFailure>,
}

/// The persistence collaborator.
///
/// Implementations validate required fields and uniqueness, tolerate partial
/// failure, and only return `Err` when the batch as a whole could not be
/// processed.
pub trait RecordStore {
    type Error: std::error::Error + Send + Sync + 'static;

    fn import_records(
        &self,
        module_id: &str,
        records: &[Record],
        saved_mapping_name: Option<&str>,
    ) -> Result<BatchReport, Self::Error>;
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    type Error = S::Error;

    fn import_records(
        &self,
        module_id: &str,
        records: &[Record],
        saved_mapping_name: Option<&str>,
    ) -> Result<BatchReport, Self::Error> {
        (**self).import_records(module_id, records, saved_mapping_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub total: usize,
    pub success: usize,
    pub errors: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<RowFailure>,
}

impl ImportResult {
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

#[derive(Debug, Error)]
#[error(
    "Store reported {success} success + {errors} error(s) = {reported_total} for a batch of {submitted} record(s)"
)]
pub struct InconsistentReport {
    pub submitted: usize,
    pub reported_total: usize,
    pub success: usize,
    pub errors: usize,
}

impl TryFrom<(usize, BatchReport)> for ImportResult {
    type Error = InconsistentReport;

    fn try_from((submitted, report): (usize, BatchReport)) -> Result<Self, Self::Error> {
        if report.total != submitted || report.success + report.errors != report.total {
            return Err(InconsistentReport {
                submitted,
                reported_total: report.total,
                success: report.success,
                errors: report.errors,
            });
        }
        Ok(ImportResult {
            total: report.total,
            success: report.success,
            errors: report.errors,
            failures: report.failures,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportProgress {
    InFlight,
    Done,
}

impl ImportProgress {
    pub fn percent(&self) -> u8 {
        match self {
            ImportProgress::InFlight => 0,
            ImportProgress::Done => 100,
        }
    }
}

pub trait ProgressSink {
    fn report(&self, progress: ImportProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(ImportProgress),
{
    fn report(&self, progress: ImportProgress) {
        self(progress)
    }
}

/// A sink that discards progress.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _progress: ImportProgress) {}
}

/// Builds one record per row from the columns that carry a target field.
///
/// When two columns target the same field the later header position wins.
pub fn build_records(table: &RawTable, mapping: &MappingSet) -> Vec<Record> {
    let mut bindings = mapping.bindings(table);
    bindings.sort_by_key(|binding| binding.position);
    table
        .rows
        .iter()
        .map(|row| {
            bindings
                .iter()
                .map(|binding| {
                    let value = row.get(binding.position).cloned().unwrap_or_default();
                    (binding.target_field.to_string(), value)
                })
                .collect()
        })
        .collect()
}

pub struct ImportExecutor<S> {
    store: S,
    in_flight: AtomicBool,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: RecordStore> ImportExecutor<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn execute(
        &self,
        table: &RawTable,
        mapping: &MappingSet,
        module_id: &str,
        saved_mapping_name: Option<&str>,
        progress: &dyn ProgressSink,
    ) -> Result<ImportResult, ImportError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ImportError::ImportInProgress);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let records = build_records(table, mapping);
        debug!(
            "Built {} record(s) from {} mapped column(s)",
            records.len(),
            mapping.active().count()
        );
        info!(
            "Submitting {} record(s) to module '{module_id}'",
            records.len()
        );

        progress.report(ImportProgress::InFlight);
        let outcome = self
            .store
            .import_records(module_id, &records, saved_mapping_name);
        progress.report(ImportProgress::Done);

        let report = outcome.map_err(|err| ImportError::ImportExecution {
            module: module_id.to_string(),
            source: Box::new(err),
        })?;
        let result = ImportResult::try_from((records.len(), report)).map_err(|err| {
            ImportError::ImportExecution {
                module: module_id.to_string(),
                source: Box::new(err),
            }
        })?;

        if result.has_errors() {
            warn!(
                "Imported {} of {} record(s) into '{module_id}'; {} rejected",
                result.success, result.total, result.errors
            );
        } else {
            info!(
                "Imported {} record(s) into '{module_id}'",
                result.success
            );
        }
        Ok(result)
    }
}
