//! Graded exercises
//!
//! Exercises live in a flat document collection keyed by the exercise id
//! rendered as a string:
//!
//! ```json
//! { "1": { "id": 1, "title": "...", "description": "...",
//!          "solutionQuery": "SELECT ...", "category": "Basics" } }
//! ```
//!
//! The collection is read-only here and re-read on every call.

use std::collections::BTreeMap;
use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use crate::assets::BUNDLED_EXERCISES;
use crate::query::Comparison;
use crate::storage::DatasetStore;
use crate::{Error, Result};

/// One exercise document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Exercise {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Reference query whose result is the correct answer
    pub solution_query: String,
    pub category: String,
}

/// Read-only access to the exercise collection
pub trait ExerciseCatalog {
    /// All exercises, sorted by id
    fn list(&self) -> Result<Vec<Exercise>>;

    fn get(&self, id: i64) -> Result<Option<Exercise>> {
        Ok(self.list()?.into_iter().find(|e| e.id == id))
    }
}

/// Where a document collection is read from
#[derive(Debug, Clone)]
pub enum CatalogSource {
    File(PathBuf),
    Bundled,
}

/// Exercise collection stored as one JSON document map
#[derive(Debug, Clone)]
pub struct DocumentCatalog {
    source: CatalogSource,
}

impl DocumentCatalog {
    pub fn new(source: CatalogSource) -> Self {
        Self { source }
    }

    pub fn bundled() -> Self {
        Self::new(CatalogSource::Bundled)
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self::new(CatalogSource::File(path.into()))
    }

    fn fetch(&self) -> Result<String> {
        match &self.source {
            CatalogSource::Bundled => Ok(BUNDLED_EXERCISES.to_string()),
            CatalogSource::File(path) => std::fs::read_to_string(path)
                .map_err(|e| Error::Catalog(format!("cannot read {}: {}", path.display(), e))),
        }
    }
}

impl ExerciseCatalog for DocumentCatalog {
    fn list(&self) -> Result<Vec<Exercise>> {
        parse_collection(&self.fetch()?)
    }
}

/// Exercises held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    exercises: Vec<Exercise>,
}

impl MemoryCatalog {
    pub fn new(mut exercises: Vec<Exercise>) -> Self {
        exercises.sort_by_key(|e| e.id);
        Self { exercises }
    }
}

impl ExerciseCatalog for MemoryCatalog {
    fn list(&self) -> Result<Vec<Exercise>> {
        Ok(self.exercises.clone())
    }
}

/// Decode a document collection, skipping documents that do not fit
pub fn parse_collection(text: &str) -> Result<Vec<Exercise>> {
    let docs: BTreeMap<String, serde_json::Value> = serde_json::from_str(text)
        .map_err(|e| Error::Catalog(format!("malformed exercise collection: {}", e)))?;

    let mut exercises = Vec::with_capacity(docs.len());
    for (key, value) in docs {
        let exercise: Exercise = match serde_json::from_value(value) {
            Ok(ex) => ex,
            Err(e) => {
                tracing::warn!("skipping exercise document {}: {}", key, e);
                continue;
            }
        };
        if exercise.id.to_string() != key {
            tracing::warn!("skipping exercise document {}: id field is {}", key, exercise.id);
            continue;
        }
        exercises.push(exercise);
    }

    exercises.sort_by_key(|e| e.id);
    Ok(exercises)
}

/// Distinct categories in first-seen order
pub fn categories(exercises: &[Exercise]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for ex in exercises {
        if !seen.contains(&ex.category.as_str()) {
            seen.push(&ex.category);
        }
    }
    seen
}

/// Grade a user query against the exercise's reference query
pub fn grade(store: &DatasetStore, dataset: &str, exercise: &Exercise, user_sql: &str) -> Comparison {
    tracing::debug!("grading exercise {} on {}", exercise.id, dataset);
    store.compare(dataset, user_sql, &exercise.solution_query)
}
