mod common;

use common::contact_fields;
use crm_import::{
    FieldMatcher, MappingSet, parse_table,
    projection::preview,
    table::{render_mapping, render_preview, render_table},
};

#[test]
fn render_table_aligns_columns() {
    let headers = vec!["id".to_string(), "name".to_string()];
    let rows = vec![
        vec!["1".to_string(), "Alice".to_string()],
        vec!["2".to_string(), "Bob".to_string()],
    ];

    let rendered = render_table(&headers, &rows);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines, vec!["id  name", "---  -----", "1   Alice", "2   Bob"]);
}

#[test]
fn render_table_flattens_control_characters() {
    let headers = vec!["note".to_string()];
    let rows = vec![vec!["line1\nline2\tvalue".to_string()]];

    let rendered = render_table(&headers, &rows);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2], "line1 line2 value");
}

#[test]
fn render_mapping_shows_provenance() {
    let table = parse_table("Email,Shoe Size\na@x.com,9\n").expect("table");
    let catalog = contact_fields();
    let mut mapping = MappingSet::seed(&table, &catalog, &FieldMatcher::default());
    mapping.set_target("Shoe Size", Some("phone")).expect("set");

    let rendered = render_mapping(&mapping, &catalog);
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines[0], "column     field  label  source");
    assert_eq!(lines[2], "Email      email  Email  auto");
    assert_eq!(lines[3], "Shoe Size  phone  Phone  manual");
}

#[test]
fn render_preview_uses_labels_as_headers() {
    let table = parse_table("First Name,Email\nJane,jane@x.com\n").expect("table");
    let catalog = contact_fields();
    let mapping = MappingSet::seed(&table, &catalog, &FieldMatcher::default());
    let rendered = render_preview(&preview(&table, &mapping, &catalog, 5));
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines[0], "First Name  Email");
    assert_eq!(lines[2], "Jane        jane@x.com");
}
