//! Delimited-text parsing for uploaded files.
//!
//! This is deliberately not an RFC 4180 reader: a `"` toggles quoting and is
//! never emitted, so doubled quotes inside a quoted field are not supported.
//! Short rows are padded with empty strings and long rows are truncated to
//! the header width.

use log::debug;

use crate::error::ImportError;

/// A parsed upload: positional headers and rows of exactly `headers.len()` cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            other => current.push(other),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

pub fn parse_table(text: &str) -> Result<RawTable, ImportError> {
    let lines = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>();
    if lines.len() < 2 {
        return Err(ImportError::EmptyInput { lines: lines.len() });
    }

    let headers = parse_line(lines[0]);
    let width = headers.len();
    let rows = lines[1..]
        .iter()
        .map(|line| {
            let mut values = parse_line(line);
            values.resize(width, String::new());
            values
        })
        .collect::<Vec<_>>();

    debug!(
        "Parsed {} column(s) and {} data row(s)",
        headers.len(),
        rows.len()
    );
    Ok(RawTable { headers, rows })
}
