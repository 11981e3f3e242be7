//! Slide decks shipped alongside the datasets

use std::path::{Path, PathBuf};
use serde::Serialize;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deck {
    pub title: String,
    pub path: PathBuf,
}

/// Readable title from a deck file name
pub fn deck_title(file_name: &str) -> String {
    file_name
        .strip_suffix(".pdf")
        .unwrap_or(file_name)
        .replace('_', " ")
        .trim()
        .to_string()
}

/// All `*.pdf` decks directly under `dir`, sorted by file name
pub fn list_decks(dir: &Path) -> Result<Vec<Deck>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let dir_str = dir
        .to_str()
        .ok_or_else(|| Error::Parse(format!("non UTF-8 slides path: {:?}", dir)))?;
    let pattern = format!("{}/*.pdf", glob::Pattern::escape(dir_str));

    let mut decks = Vec::new();
    for entry in glob::glob(&pattern).map_err(|e| Error::Parse(e.to_string()))? {
        let path = entry.map_err(|e| Error::Io(e.into()))?;
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            decks.push(Deck { title: deck_title(name), path: path.clone() });
        }
    }
    decks.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(decks)
}
