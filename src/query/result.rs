//! Result sets and their canonical text form

use rusqlite::types::ValueRef;
use serde::{Deserialize, Serialize};

/// Separator between columns in the canonical form
pub const CANONICAL_SEPARATOR: &str = " | ";

/// Placeholder for SQL NULL, distinct from the empty string
pub const NULL_TOKEN: &str = "NULL";

/// One column value; `None` is SQL NULL
pub type Cell = Option<String>;

/// Columns plus rows, both in the order the engine produced them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Deterministic header + rows serialization used as the comparison key.
    ///
    /// Row order, column order and value text all take part in the key.
    pub fn canonical(&self) -> String {
        let mut out = self.columns.join(CANONICAL_SEPARATOR);
        out.push('\n');
        for row in &self.rows {
            let line: Vec<&str> = row.iter().map(|c| display_cell(c)).collect();
            out.push_str(&line.join(CANONICAL_SEPARATOR));
            out.push('\n');
        }
        out
    }
}

/// Text shown for a cell, `NULL` for SQL NULL
pub fn display_cell(cell: &Cell) -> &str {
    cell.as_deref().unwrap_or(NULL_TOKEN)
}

/// Render a raw SQLite value the way SQLite casts it to text
pub fn render_value(value: ValueRef<'_>) -> Cell {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(render_real(f)),
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => {
            let hex: String = b.iter().map(|byte| format!("{:02X}", byte)).collect();
            Some(format!("X'{}'", hex))
        }
    }
}

fn render_real(f: f64) -> String {
    let text = f.to_string();
    if f.is_finite() && !text.contains(['.', 'e', 'E']) {
        format!("{}.0", text)
    } else {
        text
    }
}
