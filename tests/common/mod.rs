#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crm_import::TargetField;
use tempfile::{TempDir, tempdir};

pub const CONTACTS_CATALOG: &str = r#"
modules:
  - id: contacts
    name: Contacts
    fields:
      - key: first_name
        label: First Name
        required: true
      - key: last_name
        label: Last Name
      - key: email
        label: Email
        unique: true
      - key: phone
        label: Phone
      - key: mailing_zip
        label: Mailing Zip
  - id: accounts
    fields:
      - key: account_name
        label: Account Name
        required: true
"#;

/// The `contacts` module fields, in catalog order.
pub fn contact_fields() -> Vec<TargetField> {
    vec![
        TargetField::new("first_name", "First Name").required(),
        TargetField::new("last_name", "Last Name"),
        TargetField::new("email", "Email").unique(),
        TargetField::new("phone", "Phone"),
        TargetField::new("mailing_zip", "Mailing Zip"),
    ]
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}
