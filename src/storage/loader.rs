//! Script-to-Database Initializer
//!
//! Loading is best-effort: a statement that fails is recorded and skipped,
//! the rest of the script still runs. Nothing here returns `Err`; callers get
//! a [`LoadOutcome`] and an optional [`LoadObserver`] sees each event.

use std::path::Path;
use rusqlite::Connection;
use serde::Serialize;
use crate::assets::ScriptSource;
use crate::script::{split_script, SplitMode};

/// A statement that the engine rejected during loading
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementFailure {
    /// Position of the statement in the script, starting at 0
    pub index: usize,
    pub sql: String,
    pub message: String,
}

/// Summary of a completed load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub statements: usize,
    pub executed: usize,
    pub failures: Vec<StatementFailure>,
    /// Unterminated text at the end of the script (not executed)
    pub trailing: Option<String>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.trailing.is_none()
    }
}

/// What `ensure` did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    /// Backing file already existed; nothing was executed
    AlreadyPresent,
    /// A fresh database was created and the script replayed into it
    Loaded(LoadReport),
    /// The script or the database could not be opened
    Aborted { reason: String },
}

impl LoadOutcome {
    pub fn is_aborted(&self) -> bool {
        matches!(self, LoadOutcome::Aborted { .. })
    }

    pub fn report(&self) -> Option<&LoadReport> {
        match self {
            LoadOutcome::Loaded(report) => Some(report),
            _ => None,
        }
    }
}

/// Side channel for load events
pub trait LoadObserver {
    fn statement_failed(&self, _dataset: &str, _failure: &StatementFailure) {}
    fn loaded(&self, _dataset: &str, _report: &LoadReport) {}
    fn aborted(&self, _dataset: &str, _reason: &str) {}
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl LoadObserver for SilentObserver {}

/// Observer that writes events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl LoadObserver for TracingObserver {
    fn statement_failed(&self, dataset: &str, failure: &StatementFailure) {
        tracing::error!(
            "[{}] statement {} failed: {}\n{}",
            dataset,
            failure.index,
            failure.message,
            failure.sql
        );
    }

    fn loaded(&self, dataset: &str, report: &LoadReport) {
        tracing::info!(
            "[{}] created: {}/{} statements executed",
            dataset,
            report.executed,
            report.statements
        );
        if let Some(rest) = &report.trailing {
            tracing::warn!("[{}] ignoring unterminated text at end of script: {}", dataset, rest);
        }
    }

    fn aborted(&self, dataset: &str, reason: &str) {
        tracing::error!("[{}] initialization aborted: {}", dataset, reason);
    }
}

/// Create `db_path` and replay the script into it, unless it already exists
pub(crate) fn load_into(
    dataset: &str,
    db_path: &Path,
    source: &dyn ScriptSource,
    script_id: &str,
    mode: SplitMode,
    observer: &dyn LoadObserver,
) -> LoadOutcome {
    if db_path.exists() {
        tracing::debug!("[{}] {:?} already present", dataset, db_path);
        return LoadOutcome::AlreadyPresent;
    }

    let abort = |reason: String| {
        observer.aborted(dataset, &reason);
        LoadOutcome::Aborted { reason }
    };

    // Read first so an unreadable script never leaves an empty file behind
    let text = match source.read_script(script_id) {
        Ok(text) => text,
        Err(e) => return abort(format!("cannot read script {}: {}", script_id, e)),
    };

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                return abort(format!("cannot create {}: {}", parent.display(), e));
            }
        }
    }

    let conn = match Connection::open(db_path) {
        Ok(conn) => conn,
        Err(e) => return abort(format!("cannot open {}: {}", db_path.display(), e)),
    };

    let report = replay(&conn, dataset, &text, mode, observer);
    drop(conn);

    observer.loaded(dataset, &report);
    LoadOutcome::Loaded(report)
}

/// Execute every statement of `text` in order, skipping failures
pub fn replay(
    conn: &Connection,
    dataset: &str,
    text: &str,
    mode: SplitMode,
    observer: &dyn LoadObserver,
) -> LoadReport {
    let split = split_script(text, mode);
    let mut report = LoadReport {
        statements: split.statements.len(),
        trailing: split.trailing,
        ..Default::default()
    };

    for (index, sql) in split.statements.into_iter().enumerate() {
        match conn.execute_batch(&sql) {
            Ok(()) => report.executed += 1,
            Err(e) => {
                let failure = StatementFailure {
                    index,
                    sql,
                    message: e.to_string(),
                };
                observer.statement_failed(dataset, &failure);
                report.failures.push(failure);
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Recorder {
        failed: RefCell<Vec<usize>>,
        loaded: RefCell<usize>,
        aborted: RefCell<Vec<String>>,
    }

    impl LoadObserver for Recorder {
        fn statement_failed(&self, _dataset: &str, failure: &StatementFailure) {
            self.failed.borrow_mut().push(failure.index);
        }
        fn loaded(&self, _dataset: &str, _report: &LoadReport) {
            *self.loaded.borrow_mut() += 1;
        }
        fn aborted(&self, _dataset: &str, reason: &str) {
            self.aborted.borrow_mut().push(reason.to_string());
        }
    }

    fn scripts(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_replay_in_order() {
        let conn = Connection::open_in_memory().unwrap();
        let text = "CREATE TABLE log(n INTEGER);\nINSERT INTO log VALUES (1);\nINSERT INTO log VALUES (2);\nINSERT INTO log VALUES (3);\n";
        let report = replay(&conn, "t", text, SplitMode::Lines, &SilentObserver);
        assert_eq!(report.statements, 4);
        assert_eq!(report.executed, 4);
        assert!(report.is_clean());

        let order: Vec<i64> = conn
            .prepare("SELECT n FROM log ORDER BY rowid")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_replay_skips_failing_statement() {
        let conn = Connection::open_in_memory().unwrap();
        let recorder = Recorder::default();
        let text = "CREATE TABLE t(x INTEGER);\nINSERT INTO missing_table VALUES (1);\nINSERT INTO t VALUES (1);\n";
        let report = replay(&conn, "t", text, SplitMode::Lines, &recorder);

        assert_eq!(report.executed, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert!(report.failures[0].message.contains("missing_table"));
        assert_eq!(*recorder.failed.borrow(), vec![1]);

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0)).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_select_in_script_is_not_a_failure() {
        let conn = Connection::open_in_memory().unwrap();
        let report = replay(&conn, "t", "CREATE TABLE t(x);\nSELECT * FROM t;\n", SplitMode::Lines, &SilentObserver);
        assert_eq!(report.executed, 2);
    }

    #[test]
    fn test_load_into_creates_once() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("demo.db");
        let source = scripts(&[("demo.sql", "CREATE TABLE t(x INTEGER);\nINSERT INTO t VALUES (1);\n")]);
        let recorder = Recorder::default();

        let first = load_into("demo", &path, &source, "demo.sql", SplitMode::Lines, &recorder);
        assert_eq!(first.report().unwrap().executed, 2);
        assert!(path.exists());

        let second = load_into("demo", &path, &source, "demo.sql", SplitMode::Lines, &recorder);
        assert_eq!(second, LoadOutcome::AlreadyPresent);
        assert_eq!(*recorder.loaded.borrow(), 1);
    }

    #[test]
    fn test_unreadable_script_leaves_no_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("demo.db");
        let recorder = Recorder::default();

        let outcome = load_into("demo", &path, &scripts(&[]), "demo.sql", SplitMode::Lines, &recorder);
        assert!(outcome.is_aborted());
        assert!(!path.exists());
        assert_eq!(recorder.aborted.borrow().len(), 1);
    }
}
