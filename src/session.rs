//! The import session state machine.
//!
//! ```text
//! SelectingModule -> AwaitingUpload -> Mapping <-> Previewing -> Importing -> Completed
//!                                                      ^             |
//!                                                      +-- failure --+
//! Completed -> SelectingModule (reset)
//! ```
//!
//! Each session owns its own table and mapping; nothing is shared between
//! sessions.

use std::fmt;

use log::{info, warn};

use crate::{
    catalog::{FieldCatalog, TargetField},
    error::ImportError,
    executor::{ImportExecutor, ImportResult, ProgressSink, RecordStore},
    mapping::MappingSet,
    parser::{RawTable, parse_table},
    projection::{PreviewRow, preview},
    resolver::FieldMatcher,
    templates::MappingTemplate,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    SelectingModule,
    AwaitingUpload,
    Mapping,
    Previewing,
    Importing,
    Completed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::SelectingModule => "selecting a module",
            SessionState::AwaitingUpload => "awaiting an upload",
            SessionState::Mapping => "mapping",
            SessionState::Previewing => "previewing",
            SessionState::Importing => "importing",
            SessionState::Completed => "completed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct ImportSession {
    state: SessionState,
    matcher: FieldMatcher,
    module_id: Option<String>,
    catalog: Vec<TargetField>,
    table: Option<RawTable>,
    mapping: MappingSet,
    result: Option<ImportResult>,
}

impl Default for ImportSession {
    fn default() -> Self {
        Self::new(FieldMatcher::default())
    }
}

impl ImportSession {
    pub fn new(matcher: FieldMatcher) -> Self {
        Self {
            state: SessionState::SelectingModule,
            matcher,
            module_id: None,
            catalog: Vec::new(),
            table: None,
            mapping: MappingSet::default(),
            result: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn module_id(&self) -> Option<&str> {
        self.module_id.as_deref()
    }

    pub fn catalog(&self) -> &[TargetField] {
        &self.catalog
    }

    pub fn table(&self) -> Option<&RawTable> {
        self.table.as_ref()
    }

    pub fn mapping(&self) -> &MappingSet {
        &self.mapping
    }

    pub fn result(&self) -> Option<&ImportResult> {
        self.result.as_ref()
    }

    fn expect_state(&self, expected: SessionState, action: &'static str) -> Result<(), ImportError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ImportError::InvalidTransition {
                from: self.state,
                action,
            })
        }
    }

    fn discard(&mut self) {
        self.module_id = None;
        self.catalog.clear();
        self.table = None;
        self.mapping = MappingSet::default();
        self.result = None;
        self.state = SessionState::SelectingModule;
    }

    pub fn select_module(
        &mut self,
        catalog: &dyn FieldCatalog,
        module_id: &str,
    ) -> Result<(), ImportError> {
        self.expect_state(SessionState::SelectingModule, "select a module")?;
        let fields = catalog.fields(module_id)?;
        info!(
            "Selected module '{module_id}' with {} field(s)",
            fields.len()
        );
        self.module_id = Some(module_id.to_string());
        self.catalog = fields;
        self.state = SessionState::AwaitingUpload;
        Ok(())
    }

    /// Parses the upload and seeds the mapping. On `EmptyInput` the session
    /// keeps waiting for another upload.
    pub fn upload(&mut self, text: &str) -> Result<&MappingSet, ImportError> {
        self.expect_state(SessionState::AwaitingUpload, "accept an upload")?;
        let table = parse_table(text)?;
        self.mapping = MappingSet::seed(&table, &self.catalog, &self.matcher);
        self.mapping.log_warnings(&self.catalog);
        self.table = Some(table);
        self.state = SessionState::Mapping;
        Ok(&self.mapping)
    }

    /// Edits one mapping entry. An unknown column means the session is out of
    /// step with its upload, so the session is discarded.
    pub fn set_target(
        &mut self,
        source_column: &str,
        target_field: Option<&str>,
    ) -> Result<(), ImportError> {
        self.expect_state(SessionState::Mapping, "edit the mapping")?;
        match self
            .mapping
            .set_target_checked(source_column, target_field, &self.catalog)
        {
            Err(err @ ImportError::UnknownColumn(_)) => {
                warn!("{err}; discarding the session");
                self.discard();
                Err(err)
            }
            other => other,
        }
    }

    pub fn apply_template(&mut self, template: &MappingTemplate) -> Result<usize, ImportError> {
        self.expect_state(SessionState::Mapping, "apply a template")?;
        Ok(self.mapping.apply_template(template, &self.catalog))
    }

    pub fn begin_preview(&mut self) -> Result<(), ImportError> {
        self.expect_state(SessionState::Mapping, "preview")?;
        self.mapping.log_warnings(&self.catalog);
        self.state = SessionState::Previewing;
        Ok(())
    }

    pub fn back_to_mapping(&mut self) -> Result<(), ImportError> {
        self.expect_state(SessionState::Previewing, "return to mapping")?;
        self.state = SessionState::Mapping;
        Ok(())
    }

    pub fn preview(&self, limit: usize) -> Result<Vec<PreviewRow>, ImportError> {
        self.expect_state(SessionState::Previewing, "render a preview")?;
        let table = self.loaded_table("render a preview")?;
        Ok(preview(table, &self.mapping, &self.catalog, limit))
    }

    fn loaded_table(&self, action: &'static str) -> Result<&RawTable, ImportError> {
        self.table.as_ref().ok_or(ImportError::InvalidTransition {
            from: self.state,
            action,
        })
    }

    /// Runs the batch import. A backend failure returns the session to
    /// `Previewing` with its data intact so the user can retry.
    pub fn execute<S: RecordStore>(
        &mut self,
        executor: &ImportExecutor<S>,
        saved_mapping_name: Option<&str>,
        progress: &dyn ProgressSink,
    ) -> Result<&ImportResult, ImportError> {
        self.expect_state(SessionState::Previewing, "start an import")?;
        let module_id = self
            .module_id
            .clone()
            .ok_or(ImportError::InvalidTransition {
                from: self.state,
                action: "start an import",
            })?;
        let Some(table) = self.table.as_ref() else {
            return Err(ImportError::InvalidTransition {
                from: self.state,
                action: "start an import",
            });
        };
        self.state = SessionState::Importing;

        let outcome = executor.execute(
            table,
            &self.mapping,
            &module_id,
            saved_mapping_name,
            progress,
        );
        match outcome {
            Ok(result) => {
                self.state = SessionState::Completed;
                Ok(self.result.insert(result))
            }
            Err(err) => {
                warn!("Import failed: {err}; returning to preview");
                self.state = SessionState::Previewing;
                Err(err)
            }
        }
    }

    pub fn reset(&mut self) -> Result<(), ImportError> {
        self.expect_state(SessionState::Completed, "reset")?;
        self.discard();
        Ok(())
    }
}
