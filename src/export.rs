//! Delimited-text export of query results

use std::io::Write;
use std::path::{Path, PathBuf};
use crate::query::ResultSet;
use crate::{Error, Result};

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Tsv,
}

impl ExportFormat {
    pub fn delimiter(&self) -> char {
        match self {
            ExportFormat::Csv => ',',
            ExportFormat::Tsv => '\t',
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
        }
    }

    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "tsv" | "tab" => Some(ExportFormat::Tsv),
            _ => None,
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "tsv" => Ok(ExportFormat::Tsv),
            _ => Err(Error::Export(format!("unsupported export format: {}", s))),
        }
    }
}

/// Render a result set as delimited text. Nulls become empty fields.
pub fn to_delimited(result: &ResultSet, delimiter: char) -> String {
    let mut out = String::new();
    push_record(&mut out, result.columns.iter().map(String::as_str), delimiter);
    for row in &result.rows {
        push_record(&mut out, row.iter().map(|c| c.as_deref().unwrap_or("")), delimiter);
    }
    out
}

/// Write a result set to `path`, returning the path written.
///
/// A path without an extension gets the format's extension.
pub fn export_delimited(result: &ResultSet, path: &Path, format: ExportFormat) -> Result<PathBuf> {
    if result.columns.is_empty() {
        return Err(Error::Export("nothing to export: the query returned no columns".to_string()));
    }
    let path = if path.extension().is_none() {
        path.with_extension(format.extension())
    } else {
        path.to_path_buf()
    };
    let path = path.as_path();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = std::fs::File::create(path)?;
    file.write_all(to_delimited(result, format.delimiter()).as_bytes())?;
    file.flush()?;

    tracing::info!("exported {} rows to {:?}", result.row_count(), path);
    Ok(path.to_path_buf())
}

fn push_record<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>, delimiter: char) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(delimiter);
        }
        if field.contains(delimiter) || field.contains('"') || field.contains('\n') || field.contains('\r') {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
}
