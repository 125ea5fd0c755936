mod common;

use std::fs;

use assert_cmd::Command;
use common::{CONTACTS_CATALOG, TestWorkspace};
use predicates::str::contains;

const UPLOAD: &str = "First Name,Email,Phone,Postal Code\n\
Jane,jane@x.com,555-1234,90210\n\
Bo,,555-9999,10001\n\
,cy@x.com,555-0000,30301\n";

fn command() -> Command {
    Command::cargo_bin("crm-import").expect("binary exists")
}

fn setup() -> (TestWorkspace, String, String) {
    let workspace = TestWorkspace::new();
    let catalog = workspace.write("catalog.yml", CONTACTS_CATALOG);
    let input = workspace.write("contacts.csv", UPLOAD);
    (
        workspace,
        catalog.to_str().unwrap().to_string(),
        input.to_str().unwrap().to_string(),
    )
}

#[test]
fn fields_lists_modules_and_fields() {
    let (_workspace, catalog, _) = setup();
    command()
        .args(["fields", "--catalog", &catalog])
        .assert()
        .success()
        .stdout(contains("contacts"))
        .stdout(contains("accounts"));

    command()
        .args(["fields", "--catalog", &catalog, "--module", "contacts"])
        .assert()
        .success()
        .stdout(contains("mailing_zip"))
        .stdout(contains("Mailing Zip"));
}

#[test]
fn map_shows_auto_and_manual_entries() {
    let (_workspace, catalog, input) = setup();
    let assert = command()
        .args([
            "map", "-i", &input, "--catalog", &catalog, "--module", "contacts", "--set",
            "Phone=",
        ])
        .assert()
        .success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let postal = out
        .lines()
        .find(|line| line.starts_with("Postal Code"))
        .expect("postal code row");
    assert!(postal.contains("mailing_zip"));
    assert!(postal.trim_end().ends_with("auto"));
    let phone = out
        .lines()
        .find(|line| line.starts_with("Phone"))
        .expect("phone row");
    assert!(phone.trim_end().ends_with("skip"));
}

#[test]
fn map_rejects_unknown_override_column() {
    let (_workspace, catalog, input) = setup();
    command()
        .args([
            "map", "-i", &input, "--catalog", &catalog, "--module", "contacts", "--set",
            "Fax=phone",
        ])
        .assert()
        .failure()
        .stderr(contains("Unknown source column 'Fax'"));
}

#[test]
fn preview_limits_rows_and_hides_skipped_columns() {
    let (_workspace, catalog, input) = setup();
    let assert = command()
        .args([
            "preview", "-i", &input, "--catalog", &catalog, "--module", "contacts", "--set",
            "Phone=", "--rows", "2",
        ])
        .assert()
        .success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    assert!(out.contains("Jane"));
    assert!(out.contains("Bo"));
    assert!(!out.contains("cy@x.com"));
    assert!(!out.contains("555-1234"));
}

#[test]
fn header_only_upload_fails() {
    let (workspace, catalog, _) = setup();
    let empty = workspace.write("empty.csv", "First Name,Email\n");
    command()
        .args([
            "map",
            "-i",
            empty.to_str().unwrap(),
            "--catalog",
            &catalog,
            "--module",
            "contacts",
        ])
        .assert()
        .failure()
        .stderr(contains("at least one data row"));
}

#[test]
fn import_reports_json_result_and_writes_store() {
    let (workspace, catalog, input) = setup();
    let store = workspace.path().join("store");
    let templates = workspace.path().join("templates.yml");
    let assert = command()
        .args([
            "import",
            "-i",
            &input,
            "--catalog",
            &catalog,
            "--module",
            "contacts",
            "--store",
            store.to_str().unwrap(),
            "--templates",
            templates.to_str().unwrap(),
            "--save-template",
            "default",
            "--json",
        ])
        .assert()
        .success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let result: serde_json::Value = serde_json::from_str(&out).expect("json result");
    assert_eq!(result["total"], 3);
    assert_eq!(result["success"], 2);
    assert_eq!(result["errors"], 1);
    assert_eq!(result["failures"][0]["row"], 3);

    let written = fs::read_to_string(store.join("contacts.csv")).expect("module file");
    assert!(written.contains("Jane,,jane@x.com,555-1234,90210"));
    let saved = fs::read_to_string(&templates).expect("templates");
    assert!(saved.contains("default"));
    assert!(saved.contains("Postal Code"));
}

#[test]
fn import_reuses_saved_template() {
    let (workspace, catalog, input) = setup();
    let store = workspace.path().join("store");
    let templates = workspace.path().join("templates.yml");
    let base = [
        "import",
        "-i",
        input.as_str(),
        "--catalog",
        catalog.as_str(),
        "--module",
        "contacts",
        "--store",
        store.to_str().unwrap(),
        "--templates",
        templates.to_str().unwrap(),
        "--no-progress",
    ];
    command()
        .args(base)
        .args(["--set", "Phone=", "--save-template", "no-phone"])
        .assert()
        .success()
        .stdout(contains("Imported 2 of 3 record(s)"));

    let other = workspace.write("second.csv", "First Name,Email,Phone\nDee,dee@x.com,555-7777\n");
    command()
        .args([
            "import",
            "-i",
            other.to_str().unwrap(),
            "--catalog",
            &catalog,
            "--module",
            "contacts",
            "--store",
            store.to_str().unwrap(),
            "--templates",
            templates.to_str().unwrap(),
            "--template",
            "no-phone",
            "--no-progress",
        ])
        .assert()
        .success()
        .stdout(contains("Imported 1 of 1 record(s)"));

    let written = fs::read_to_string(store.join("contacts.csv")).expect("module file");
    assert!(written.contains("Dee,,dee@x.com,,"));
    assert!(!written.contains("555-7777"));
}

#[test]
fn failed_import_does_not_save_template() {
    let (workspace, catalog, input) = setup();
    let store = workspace.write("store", "a file, not a directory");
    let templates = workspace.path().join("templates.yml");
    command()
        .args([
            "import",
            "-i",
            input.as_str(),
            "--catalog",
            catalog.as_str(),
            "--module",
            "contacts",
            "--store",
            store.to_str().unwrap(),
            "--templates",
            templates.to_str().unwrap(),
            "--save-template",
            "default",
            "--no-progress",
        ])
        .assert()
        .failure()
        .stderr(contains("error:"));
    assert!(!templates.exists());
}
