//! Named datasets backed by `<name>.db` files

use std::path::{Path, PathBuf};
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use crate::{Error, Result};
use crate::assets::ScriptSource;
use crate::query::{self, Comparison, ResultSet};
use crate::script::SplitMode;
use super::loader::{self, LoadObserver, LoadOutcome};
use super::meta::META_DB_NAME;

/// File extension of dataset databases
pub const DB_EXTENSION: &str = "db";

/// Directory of independently initialized datasets
#[derive(Debug, Clone)]
pub struct DatasetStore {
    root: PathBuf,
}

impl DatasetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Backing file for a dataset name
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(format!("{}.{}", name, DB_EXTENSION)))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).map(|p| p.exists()).unwrap_or(false)
    }

    /// Names of datasets whose backing file is present, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DB_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Make sure the dataset exists, creating it from the script if needed.
    ///
    /// Safe to call on every entry: an existing file is left untouched.
    pub fn ensure(
        &self,
        name: &str,
        source: &dyn ScriptSource,
        script_id: &str,
        mode: SplitMode,
        observer: &dyn LoadObserver,
    ) -> LoadOutcome {
        let path = match self.path_for(name) {
            Ok(path) => path,
            Err(e) => {
                let reason = e.to_string();
                observer.aborted(name, &reason);
                return LoadOutcome::Aborted { reason };
            }
        };
        loader::load_into(name, &path, source, script_id, mode, observer)
    }

    /// Remove the backing file so the next `ensure` replays the script
    pub fn reset(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path)?;
        tracing::info!("[{}] removed {:?}", name, path);
        Ok(true)
    }

    /// Open an existing dataset read/write. Never creates the file.
    pub fn open(&self, name: &str) -> Result<Connection> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Err(Error::DatasetNotFound(name.to_string()));
        }
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(conn)
    }

    /// Run one ad-hoc statement against a dataset
    pub fn run(&self, name: &str, sql: &str) -> Result<ResultSet> {
        let conn = self.open(name)?;
        query::run_query(&conn, sql)
    }

    /// Grade `user_sql` against `reference_sql` on a dataset
    pub fn compare(&self, name: &str, user_sql: &str, reference_sql: &str) -> Comparison {
        match self.open(name) {
            Ok(conn) => query::compare(&conn, user_sql, reference_sql),
            Err(e) => Comparison::failed(e.to_string()),
        }
    }

    /// Tables and row counts of a dataset
    pub fn stats(&self, name: &str) -> Result<DatasetStats> {
        let conn = self.open(name)?;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;

        let mut counts = Vec::with_capacity(tables.len());
        for table in tables {
            let sql = format!("SELECT COUNT(*) FROM \"{}\"", table.replace('"', "\"\""));
            let rows: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
            counts.push(TableCount { table, rows: rows as usize });
        }

        Ok(DatasetStats {
            name: name.to_string(),
            tables: counts,
        })
    }
}

/// Row count of one table
#[derive(Debug, Clone, Serialize)]
pub struct TableCount {
    pub table: String,
    pub rows: usize,
}

/// Dataset statistics
#[derive(Debug, Clone, Serialize)]
pub struct DatasetStats {
    pub name: String,
    pub tables: Vec<TableCount>,
}

impl std::fmt::Display for DatasetStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Dataset {}:", self.name)?;
        for t in &self.tables {
            writeln!(f, "  {}: {} rows", t.table, t.rows)?;
        }
        Ok(())
    }
}

/// Stem of the metadata database, never usable as a dataset name
fn reserved_stem() -> &'static str {
    META_DB_NAME.strip_suffix(".db").unwrap_or(META_DB_NAME)
}

fn validate_name(name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && !name.eq_ignore_ascii_case(reserved_stem())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidDatasetName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Verdict;
    use crate::storage::loader::SilentObserver;
    use std::collections::HashMap;

    const SCRIPT: &str = "CREATE TABLE t(x INTEGER);\nINSERT INTO t VALUES (1);\nINSERT INTO t VALUES (2);\n";

    fn store_with(script: &str) -> (tempfile::TempDir, DatasetStore, HashMap<String, String>) {
        let tmp = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(tmp.path().join("data"));
        let mut scripts = HashMap::new();
        scripts.insert("demo.sql".to_string(), script.to_string());
        (tmp, store, scripts)
    }

    #[test]
    fn test_path_for_validates_name() {
        let store = DatasetStore::new("/data");
        assert_eq!(store.path_for("rent_a_house").unwrap(), PathBuf::from("/data/rent_a_house.db"));
        assert!(matches!(store.path_for("../evil"), Err(Error::InvalidDatasetName(_))));
        assert!(store.path_for("").is_err());
    }

    #[test]
    fn test_scenario_correct_and_incorrect() {
        let (_tmp, store, scripts) = store_with(SCRIPT);
        let outcome = store.ensure("demo", &scripts, "demo.sql", SplitMode::Lines, &SilentObserver);
        assert_eq!(outcome.report().unwrap().executed, 3);

        let same = store.compare("demo", "SELECT x FROM t ORDER BY x", "SELECT x FROM t ORDER BY x");
        assert_eq!(same.verdict, Verdict::Correct);

        let reversed = store.compare("demo", "SELECT x FROM t ORDER BY x", "SELECT x FROM t ORDER BY x DESC");
        assert_eq!(reversed.verdict, Verdict::Incorrect);
    }

    #[test]
    fn test_scenario_bad_statement_skipped() {
        let script = "CREATE TABLE t(x INTEGER);\nINSERT INTO missing_table VALUES (1);\nINSERT INTO t VALUES (1);\n";
        let (_tmp, store, scripts) = store_with(script);
        let outcome = store.ensure("demo", &scripts, "demo.sql", SplitMode::Lines, &SilentObserver);

        let report = outcome.report().unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(store.exists("demo"));
        assert_eq!(store.run("demo", "SELECT x FROM t").unwrap().rows, vec![vec![Some("1".to_string())]]);
    }

    #[test]
    fn test_ensure_idempotent_byte_identical() {
        let (_tmp, store, scripts) = store_with(SCRIPT);
        store.ensure("demo", &scripts, "demo.sql", SplitMode::Lines, &SilentObserver);
        let path = store.path_for("demo").unwrap();
        let before = std::fs::read(&path).unwrap();

        let again = store.ensure("demo", &scripts, "demo.sql", SplitMode::Lines, &SilentObserver);
        assert_eq!(again, LoadOutcome::AlreadyPresent);
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_missing_dataset() {
        let (_tmp, store, _) = store_with(SCRIPT);
        assert!(matches!(store.run("nope", "SELECT 1"), Err(Error::DatasetNotFound(_))));
        assert!(!store.compare("nope", "SELECT 1", "SELECT 1").is_correct());
        assert!(!store.exists("nope"));
        // open must not create the file
        assert!(!store.path_for("nope").unwrap().exists());
    }

    #[test]
    fn test_invalid_name_aborts() {
        let (_tmp, store, scripts) = store_with(SCRIPT);
        let outcome = store.ensure("a/b", &scripts, "demo.sql", SplitMode::Lines, &SilentObserver);
        assert!(outcome.is_aborted());
    }

    #[test]
    fn test_list_reset_and_stats() {
        let (_tmp, store, scripts) = store_with(SCRIPT);
        assert!(store.list().unwrap().is_empty());

        store.ensure("demo", &scripts, "demo.sql", SplitMode::Lines, &SilentObserver);
        assert_eq!(store.list().unwrap(), vec!["demo"]);

        let stats = store.stats("demo").unwrap();
        assert_eq!(stats.tables.len(), 1);
        assert_eq!(stats.tables[0].table, "t");
        assert_eq!(stats.tables[0].rows, 2);

        assert!(store.reset("demo").unwrap());
        assert!(!store.reset("demo").unwrap());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_metadata_database_not_a_dataset() {
        use crate::auth::{AuthProvider, Credentials, LocalAuthProvider};
        use crate::config::SqlPracticeConfig;

        let tmp = tempfile::tempdir().unwrap();
        let config = SqlPracticeConfig {
            data_dir: tmp.path().to_string_lossy().into_owned(),
            ..Default::default()
        };
        let auth = LocalAuthProvider::open(&config.meta_db_path()).unwrap();
        auth.create_account(&Credentials::new("ana@example.com", "secret1").unwrap()).unwrap();

        let store = DatasetStore::new(config.data_path());
        assert!(store.list().unwrap().is_empty());
        assert!(!store.exists("app_meta"));
        assert!(matches!(store.run("app_meta", "SELECT * FROM accounts"), Err(Error::InvalidDatasetName(_))));
        assert!(matches!(store.reset("app_meta"), Err(Error::InvalidDatasetName(_))));
        assert!(store.reset("APP_META").is_err());
        assert!(!store.compare("app_meta", "DELETE FROM session", "SELECT 1").is_correct());

        // a stray copy in the dataset root is still skipped
        std::fs::copy(config.meta_db_path(), tmp.path().join(META_DB_NAME)).unwrap();
        assert!(store.list().unwrap().is_empty());
        assert!(store.run("app_meta", "SELECT * FROM accounts").is_err());

        assert!(auth.current_identity().unwrap().is_some());
    }

    #[test]
    fn test_adhoc_write_persists() {
        let (_tmp, store, scripts) = store_with(SCRIPT);
        store.ensure("demo", &scripts, "demo.sql", SplitMode::Lines, &SilentObserver);
        store.run("demo", "INSERT INTO t VALUES (3)").unwrap();
        assert_eq!(store.run("demo", "SELECT COUNT(*) AS n FROM t").unwrap().canonical(), "n\n3\n");
    }
}
