mod common;

use common::CONTACTS_CATALOG;
use crm_import::{
    ImportError, ImportExecutor, ImportSession, RecordStore, SessionState,
    catalog::YamlFieldCatalog,
    executor::{BatchReport, NoProgress, Record},
};
use std::cell::Cell;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("connection reset")]
struct ConnectionReset;

/// Fails the first `failures` batches, then accepts everything.
struct FlakyStore {
    failures: Cell<usize>,
}

impl RecordStore for FlakyStore {
    type Error = ConnectionReset;

    fn import_records(
        &self,
        _module_id: &str,
        records: &[Record],
        _saved_mapping_name: Option<&str>,
    ) -> Result<BatchReport, ConnectionReset> {
        if self.failures.get() > 0 {
            self.failures.set(self.failures.get() - 1);
            return Err(ConnectionReset);
        }
        Ok(BatchReport {
            total: records.len(),
            success: records.len(),
            errors: 0,
            failures: Vec::new(),
        })
    }
}

const UPLOAD: &str = "First Name,Email,Phone\nJane,jane@x.com,555-1234\n";

fn mapping_session() -> ImportSession {
    let catalog = YamlFieldCatalog::from_yaml_str(CONTACTS_CATALOG).expect("catalog");
    let mut session = ImportSession::default();
    session.select_module(&catalog, "contacts").expect("module");
    session.upload(UPLOAD).expect("upload");
    session
}

#[test]
fn happy_path_walks_every_state() {
    let catalog = YamlFieldCatalog::from_yaml_str(CONTACTS_CATALOG).expect("catalog");
    let mut session = ImportSession::default();
    assert_eq!(session.state(), SessionState::SelectingModule);
    session.select_module(&catalog, "contacts").expect("module");
    assert_eq!(session.state(), SessionState::AwaitingUpload);
    session.upload(UPLOAD).expect("upload");
    assert_eq!(session.state(), SessionState::Mapping);
    session.begin_preview().expect("preview");
    assert_eq!(session.preview(5).expect("rows").len(), 1);

    let executor = ImportExecutor::new(FlakyStore {
        failures: Cell::new(0),
    });
    let result = session
        .execute(&executor, None, &NoProgress)
        .expect("import")
        .clone();
    assert_eq!((result.total, result.success, result.errors), (1, 1, 0));
    assert_eq!(session.state(), SessionState::Completed);
    assert_eq!(session.result(), Some(&result));

    session.reset().expect("reset");
    assert_eq!(session.state(), SessionState::SelectingModule);
    assert!(session.table().is_none());
    assert!(session.mapping().is_empty());
}

#[test]
fn unknown_module_keeps_selecting() {
    let catalog = YamlFieldCatalog::from_yaml_str(CONTACTS_CATALOG).expect("catalog");
    let mut session = ImportSession::default();
    let err = session.select_module(&catalog, "leads").expect_err("unknown");
    assert!(matches!(err, ImportError::UnknownModule(_)));
    assert_eq!(session.state(), SessionState::SelectingModule);
}

#[test]
fn empty_upload_keeps_awaiting_upload() {
    let catalog = YamlFieldCatalog::from_yaml_str(CONTACTS_CATALOG).expect("catalog");
    let mut session = ImportSession::default();
    session.select_module(&catalog, "contacts").expect("module");
    let err = session.upload("First Name\n").expect_err("header only");
    assert!(matches!(err, ImportError::EmptyInput { .. }));
    assert!(err.is_recoverable());
    assert_eq!(session.state(), SessionState::AwaitingUpload);
    session.upload(UPLOAD).expect("second upload");
    assert_eq!(session.state(), SessionState::Mapping);
}

#[test]
fn mapping_and_preview_are_mutually_reachable() {
    let mut session = mapping_session();
    session.begin_preview().expect("preview");
    let err = session.set_target("Phone", None).expect_err("edit in preview");
    assert!(matches!(err, ImportError::InvalidTransition { from: SessionState::Previewing, .. }));
    session.back_to_mapping().expect("back");
    session.set_target("Phone", None).expect("edit");
    session.begin_preview().expect("preview again");
    let rows = session.preview(5).expect("rows");
    assert!(rows.iter().all(|row| row.get("Phone").is_none()));
}

#[test]
fn unknown_column_discards_the_session() {
    let mut session = mapping_session();
    let err = session.set_target("Fax", Some("phone")).expect_err("unknown");
    assert!(matches!(err, ImportError::UnknownColumn(_)));
    assert!(!err.is_recoverable());
    assert_eq!(session.state(), SessionState::SelectingModule);
    assert!(session.table().is_none());
}

#[test]
fn unknown_field_leaves_mapping_untouched() {
    let mut session = mapping_session();
    let err = session.set_target("Phone", Some("fax")).expect_err("unknown field");
    assert!(matches!(err, ImportError::UnknownField(_)));
    assert_eq!(session.state(), SessionState::Mapping);
    assert!(session.mapping().get("Phone").expect("entry").auto_mapped);
}

#[test]
fn execution_failure_returns_to_preview_and_can_retry() {
    let mut session = mapping_session();
    session.set_target("Phone", None).expect("skip");
    session.begin_preview().expect("preview");
    let mapping_before = session.mapping().clone();

    let executor = ImportExecutor::new(FlakyStore {
        failures: Cell::new(1),
    });
    let err = session
        .execute(&executor, None, &NoProgress)
        .expect_err("first attempt fails");
    assert!(matches!(err, ImportError::ImportExecution { .. }));
    assert_eq!(session.state(), SessionState::Previewing);
    assert_eq!(session.mapping(), &mapping_before);
    assert!(session.table().is_some());
    assert!(session.result().is_none());

    let result = session.execute(&executor, None, &NoProgress).expect("retry");
    assert_eq!(result.success, 1);
    assert_eq!(session.state(), SessionState::Completed);
}

#[test]
fn execute_requires_preview_state() {
    let mut session = mapping_session();
    let executor = ImportExecutor::new(FlakyStore {
        failures: Cell::new(0),
    });
    let err = session
        .execute(&executor, None, &NoProgress)
        .expect_err("not previewing");
    assert!(matches!(err, ImportError::InvalidTransition { from: SessionState::Mapping, .. }));
    assert!(session.reset().is_err());
}
