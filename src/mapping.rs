//! Column-to-field mapping state.
//!
//! One [`ColumnMapping`] per distinct source column. `auto_mapped` records
//! provenance: it is true only while the target still comes from the resolver,
//! and any call to [`MappingSet::set_target`] clears it for good, even when the
//! user re-selects the suggested field.
//!
//! Two columns may target the same field. That is reported through
//! [`MappingSet::duplicate_targets`] but not prevented.

use std::fmt;

use itertools::Itertools;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    catalog::{TargetField, find_field},
    error::ImportError,
    parser::RawTable,
    resolver::FieldMatcher,
    templates::MappingTemplate,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub source_column: String,
    /// `None` means the column is skipped downstream.
    pub target_field: Option<String>,
    pub auto_mapped: bool,
}

impl ColumnMapping {
    pub fn is_skipped(&self) -> bool {
        self.target_field.is_none()
    }

    pub fn provenance(&self) -> Provenance {
        match (&self.target_field, self.auto_mapped) {
            (None, _) => Provenance::Skipped,
            (Some(_), true) => Provenance::Auto,
            (Some(_), false) => Provenance::Manual,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnBinding<'a> {
    pub position: usize,
    pub source_column: &'a str,
    pub target_field: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Auto,
    Manual,
    Skipped,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Provenance::Auto => "auto",
            Provenance::Manual => "manual",
            Provenance::Skipped => "skip",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingSet {
    entries: Vec<ColumnMapping>,
}

impl MappingSet {
    /// Runs the resolver over every header, in header order.
    ///
    /// Duplicate header names share a single entry, keyed by the first
    /// occurrence.
    pub fn seed(table: &RawTable, catalog: &[TargetField], matcher: &FieldMatcher) -> Self {
        let mut entries: Vec<ColumnMapping> = Vec::with_capacity(table.headers.len());
        for header in &table.headers {
            if entries.iter().any(|e| &e.source_column == header) {
                debug!("Header '{header}' repeats; keeping the first mapping entry");
                continue;
            }
            let resolved = matcher.resolve_with_stage(header, catalog);
            match resolved {
                Some((field, stage)) => {
                    info!("Auto-mapped '{header}' -> '{}' ({stage} match)", field.key)
                }
                None => debug!("No field matched '{header}'; column will be skipped"),
            }
            let target_field = resolved.map(|(field, _)| field.key.clone());
            entries.push(ColumnMapping {
                source_column: header.clone(),
                auto_mapped: target_field.is_some(),
                target_field,
            });
        }
        Self { entries }
    }

    pub fn from_entries(entries: Vec<ColumnMapping>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .unique_by(|e| e.source_column.clone())
                .collect(),
        }
    }

    pub fn entries(&self) -> &[ColumnMapping] {
        &self.entries
    }

    pub fn get(&self, source_column: &str) -> Option<&ColumnMapping> {
        self.entries
            .iter()
            .find(|e| e.source_column == source_column)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries that carry a target field, in mapping order.
    pub fn active(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|e| {
            e.target_field
                .as_deref()
                .map(|target| (e.source_column.as_str(), target))
        })
    }

    /// Header positions of `table` bound to a target field, in mapping order.
    ///
    /// A repeated header name expands to every position carrying it.
    pub fn bindings<'a>(&'a self, table: &RawTable) -> Vec<ColumnBinding<'a>> {
        self.active()
            .flat_map(|(column, target)| {
                table
                    .headers
                    .iter()
                    .enumerate()
                    .filter(move |(_, header)| header.as_str() == column)
                    .map(move |(position, _)| ColumnBinding {
                        position,
                        source_column: column,
                        target_field: target,
                    })
            })
            .collect()
    }

    /// Replaces the target for `source_column`; always marks the entry manual.
    pub fn set_target(
        &mut self,
        source_column: &str,
        target_field: Option<&str>,
    ) -> Result<(), ImportError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.source_column == source_column)
            .ok_or_else(|| ImportError::UnknownColumn(source_column.to_string()))?;
        entry.target_field = target_field.map(str::to_string);
        entry.auto_mapped = false;
        match target_field {
            Some(key) => info!("Mapped '{source_column}' -> '{key}' (manual)"),
            None => info!("Skipping column '{source_column}'"),
        }
        Ok(())
    }

    /// Like [`MappingSet::set_target`] but rejects keys missing from `catalog`.
    pub fn set_target_checked(
        &mut self,
        source_column: &str,
        target_field: Option<&str>,
        catalog: &[TargetField],
    ) -> Result<(), ImportError> {
        if self.get(source_column).is_none() {
            return Err(ImportError::UnknownColumn(source_column.to_string()));
        }
        if let Some(key) = target_field
            && find_field(catalog, key).is_none()
        {
            return Err(ImportError::UnknownField(key.to_string()));
        }
        self.set_target(source_column, target_field)
    }

    /// Field keys targeted by more than one source column, with those columns.
    pub fn duplicate_targets(&self) -> Vec<(String, Vec<String>)> {
        self.active()
            .into_group_map_by(|(_, target)| target.to_string())
            .into_iter()
            .filter(|(_, columns)| columns.len() > 1)
            .map(|(target, columns)| {
                (
                    target,
                    columns.into_iter().map(|(c, _)| c.to_string()).collect(),
                )
            })
            .sorted()
            .collect()
    }

    /// Required fields no column targets, in catalog order.
    pub fn unmapped_required<'a>(&self, catalog: &'a [TargetField]) -> Vec<&'a TargetField> {
        catalog
            .iter()
            .filter(|field| field.required)
            .filter(|field| !self.active().any(|(_, target)| target == field.key))
            .collect()
    }

    /// Applies a saved template. Returns how many entries it changed.
    pub fn apply_template(&mut self, template: &MappingTemplate, catalog: &[TargetField]) -> usize {
        let mut applied = 0usize;
        for (column, key) in &template.columns {
            if self.get(column).is_none() {
                debug!(
                    "Template '{}' names column '{column}' which is not in this upload",
                    template.name
                );
                continue;
            }
            let target = if key.is_empty() { None } else { Some(key.as_str()) };
            match self.set_target_checked(column, target, catalog) {
                Ok(()) => applied += 1,
                Err(err) => warn!("Template '{}': {err}; entry ignored", template.name),
            }
        }
        applied
    }

    pub fn to_template(&self, name: &str, module_id: &str) -> MappingTemplate {
        let columns = self
            .entries
            .iter()
            .map(|e| {
                (
                    e.source_column.clone(),
                    e.target_field.clone().unwrap_or_default(),
                )
            })
            .collect();
        MappingTemplate::new(name, module_id, columns)
    }

    pub fn log_warnings(&self, catalog: &[TargetField]) {
        for (target, columns) in self.duplicate_targets() {
            warn!(
                "Field '{target}' is targeted by {} columns ({}); the last one wins",
                columns.len(),
                columns.join(", ")
            );
        }
        for field in self.unmapped_required(catalog) {
            warn!("Required field '{}' ({}) is not mapped", field.key, field.label);
        }
    }
}
