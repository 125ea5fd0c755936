//! Read-only preview of mapped rows, keyed by target field label.

use crate::{
    catalog::{TargetField, find_field},
    mapping::MappingSet,
    parser::RawTable,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewCell {
    pub label: String,
    pub value: String,
}

/// One projected row. Labels are unique; a repeated label keeps its first
/// position and takes the later value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewRow {
    cells: Vec<PreviewCell>,
}

impl PreviewRow {
    fn insert(&mut self, label: &str, value: &str) {
        match self.cells.iter_mut().find(|cell| cell.label == label) {
            Some(cell) => cell.value = value.to_string(),
            None => self.cells.push(PreviewCell {
                label: label.to_string(),
                value: value.to_string(),
            }),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|cell| cell.label == label)
            .map(|cell| cell.value.as_str())
    }

    pub fn cells(&self) -> &[PreviewCell] {
        &self.cells
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|cell| cell.label.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|cell| cell.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Projects the first `limit` rows through `mapping`. Skipped columns never
/// appear; labels come from `catalog`, falling back to the field key.
pub fn preview(
    table: &RawTable,
    mapping: &MappingSet,
    catalog: &[TargetField],
    limit: usize,
) -> Vec<PreviewRow> {
    let label_of = |target: &str| -> String {
        find_field(catalog, target)
            .map(|field| field.label.clone())
            .unwrap_or_else(|| target.to_string())
    };
    let ordered = mapping
        .bindings(table)
        .into_iter()
        .map(|binding| (binding.position, label_of(binding.target_field)))
        .collect::<Vec<_>>();
    // Values resolve by header position so the preview agrees with the records
    // the executor submits.
    let mut by_position = ordered.clone();
    by_position.sort_by_key(|(position, _)| *position);

    table
        .rows
        .iter()
        .take(limit)
        .map(|row| {
            let mut projected = PreviewRow::default();
            for (_, label) in &ordered {
                projected.insert(label, "");
            }
            for (position, label) in &by_position {
                let value = row.get(*position).map(String::as_str).unwrap_or("");
                projected.insert(label, value);
            }
            projected
        })
        .collect()
}

/// Flattens preview rows into a header line and string rows for rendering.
pub fn to_grid(rows: &[PreviewRow]) -> (Vec<String>, Vec<Vec<String>>) {
    let headers = rows
        .first()
        .map(|row| row.labels().map(str::to_string).collect())
        .unwrap_or_default();
    let cells = rows
        .iter()
        .map(|row| row.values().map(str::to_string).collect())
        .collect();
    (headers, cells)
}
