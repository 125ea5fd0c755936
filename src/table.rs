use std::borrow::Cow;
use std::fmt::Write as _;

use crate::{catalog::TargetField, mapping::MappingSet, projection::PreviewRow};

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(cell));
        }
    }
    for width in &mut widths {
        *width = (*width).max(1);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let rule = widths
        .iter()
        .map(|w| "-".repeat((*w).max(3)))
        .collect::<Vec<_>>();
    let rule_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&rule, &rule_widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

/// One line per source column: column, target key, target label, provenance.
pub fn render_mapping(mapping: &MappingSet, catalog: &[TargetField]) -> String {
    let headers = ["column", "field", "label", "source"]
        .map(str::to_string)
        .to_vec();
    let rows = mapping
        .entries()
        .iter()
        .map(|entry| {
            let key = entry.target_field.clone().unwrap_or_default();
            let label = catalog
                .iter()
                .find(|f| Some(&f.key) == entry.target_field.as_ref())
                .map(|f| f.label.clone())
                .unwrap_or_default();
            vec![
                entry.source_column.clone(),
                key,
                label,
                entry.provenance().to_string(),
            ]
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}

pub fn render_preview(rows: &[PreviewRow]) -> String {
    let (headers, cells) = crate::projection::to_grid(rows);
    render_table(&headers, &cells)
}

pub fn render_fields(fields: &[TargetField]) -> String {
    let headers = ["key", "label", "required", "unique"]
        .map(str::to_string)
        .to_vec();
    let flag = |value: bool| (if value { "yes" } else { "" }).to_string();
    let rows = fields
        .iter()
        .map(|f| vec![f.key.clone(), f.label.clone(), flag(f.required), flag(f.unique)])
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let sanitized = sanitize_cell(value);
            let padding = width.saturating_sub(display_width(&sanitized));
            format!("{sanitized}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
