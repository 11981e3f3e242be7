//! Ad-hoc query execution

use rusqlite::Connection;
use crate::{Error, Result};
use super::result::{render_value, ResultSet};

/// Run one statement and capture its columns and rows in iteration order.
///
/// The cursor is exhausted and dropped before returning.
pub fn run_query(conn: &Connection, sql: &str) -> Result<ResultSet> {
    if sql.trim().is_empty() {
        return Err(Error::Query("empty query".to_string()));
    }

    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();
    let mut result = ResultSet::new(columns);

    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(width);
        for i in 0..width {
            cells.push(render_value(row.get_ref(i)?));
        }
        result.rows.push(cells);
    }

    tracing::debug!("query returned {} rows x {} columns", result.row_count(), width);
    Ok(result)
}
