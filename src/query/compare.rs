//! Grading a query against a reference query

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use super::result::ResultSet;
use super::runner::run_query;
use crate::Result;

/// Outcome of comparing a user query with a reference query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "message", rename_all = "snake_case")]
pub enum Verdict {
    /// Canonical forms are byte-identical
    Correct,
    /// Both queries ran, the canonical forms differ
    Incorrect,
    /// Nothing to compare: blank input, or one side failed to execute
    Failed(String),
}

impl Verdict {
    pub fn is_correct(&self) -> bool {
        matches!(self, Verdict::Correct)
    }

    /// One-line feedback for the user
    pub fn message(&self) -> String {
        match self {
            Verdict::Correct => "Correct!".to_string(),
            Verdict::Incorrect => "Incorrect, check your query.".to_string(),
            Verdict::Failed(msg) => format!("Error: {}", msg),
        }
    }
}

/// Verdict plus whatever each side produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub verdict: Verdict,
    pub user: Option<ResultSet>,
    pub reference: Option<ResultSet>,
}

impl Comparison {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Failed(message.into()),
            user: None,
            reference: None,
        }
    }

    pub fn is_correct(&self) -> bool {
        self.verdict.is_correct()
    }
}

/// Run both queries and compare their canonical forms.
///
/// Each query runs in its own transaction that is rolled back afterwards,
/// so a statement that writes changes neither the reference run nor later
/// comparisons. Never fails: execution errors become [`Verdict::Failed`].
pub fn compare(conn: &Connection, user_sql: &str, reference_sql: &str) -> Comparison {
    if user_sql.trim().is_empty() {
        return Comparison::failed("write a query first");
    }

    let user = match run_isolated(conn, user_sql) {
        Ok(rs) => rs,
        Err(e) => {
            tracing::debug!("user query failed: {}", e);
            return Comparison::failed(format!("your query failed: {}", e));
        }
    };

    let reference = match run_isolated(conn, reference_sql) {
        Ok(rs) => rs,
        Err(e) => {
            tracing::warn!("reference query failed: {}", e);
            return Comparison {
                verdict: Verdict::Failed(format!("reference query failed: {}", e)),
                user: Some(user),
                reference: None,
            };
        }
    };

    let verdict = if user.canonical() == reference.canonical() {
        Verdict::Correct
    } else {
        Verdict::Incorrect
    };

    Comparison {
        verdict,
        user: Some(user),
        reference: Some(reference),
    }
}

/// Run one query inside a transaction that is always rolled back
fn run_isolated(conn: &Connection, sql: &str) -> Result<ResultSet> {
    let tx = conn.unchecked_transaction()?;
    let result = run_query(&tx, sql);
    if let Err(e) = tx.rollback() {
        tracing::warn!("rollback after comparison failed: {}", e);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t(x INTEGER);
             INSERT INTO t VALUES (1);
             INSERT INTO t VALUES (2);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_identical_queries_correct() {
        let conn = sample_db();
        let cmp = compare(&conn, "SELECT x FROM t ORDER BY x", "SELECT x FROM t ORDER BY x");
        assert_eq!(cmp.verdict, Verdict::Correct);
        assert!(cmp.is_correct());
    }

    #[test]
    fn test_row_order_matters() {
        let conn = sample_db();
        let cmp = compare(&conn, "SELECT x FROM t ORDER BY x", "SELECT x FROM t ORDER BY x DESC");
        assert_eq!(cmp.verdict, Verdict::Incorrect);
        assert_eq!(cmp.user.unwrap().canonical(), "x\n1\n2\n");
        assert_eq!(cmp.reference.unwrap().canonical(), "x\n2\n1\n");
    }

    #[test]
    fn test_column_order_and_names_matter() {
        let conn = sample_db();
        let swapped = compare(&conn, "SELECT x, x + 1 AS y FROM t", "SELECT x + 1 AS y, x FROM t");
        assert_eq!(swapped.verdict, Verdict::Incorrect);

        let renamed = compare(&conn, "SELECT x AS a FROM t", "SELECT x FROM t");
        assert_eq!(renamed.verdict, Verdict::Incorrect);
    }

    #[test]
    fn test_single_cell_difference() {
        let conn = sample_db();
        let cmp = compare(
            &conn,
            "SELECT x FROM t ORDER BY x",
            "SELECT CASE x WHEN 2 THEN 3 ELSE x END AS x FROM t ORDER BY x",
        );
        assert_eq!(cmp.verdict, Verdict::Incorrect);
    }

    #[test]
    fn test_equivalent_text_different_sql_is_correct() {
        let conn = sample_db();
        let cmp = compare(&conn, "SELECT x FROM t WHERE x >= 1 ORDER BY x", "SELECT x FROM t ORDER BY x");
        assert!(cmp.is_correct());
    }

    #[test]
    fn test_invalid_syntax_fails_with_message() {
        let conn = sample_db();
        let cmp = compare(&conn, "SELEC * FROM t", "SELECT x FROM t");
        match &cmp.verdict {
            Verdict::Failed(msg) => {
                assert!(msg.starts_with("your query failed: "), "{}", msg);
                assert!(msg.contains("syntax error"), "{}", msg);
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(!cmp.is_correct());
        assert!(cmp.user.is_none());
    }

    #[test]
    fn test_reference_failure_reported() {
        let conn = sample_db();
        let cmp = compare(&conn, "SELECT x FROM t", "SELECT nope FROM t");
        match &cmp.verdict {
            Verdict::Failed(msg) => assert!(msg.starts_with("reference query failed")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(cmp.user.is_some());
    }

    #[test]
    fn test_blank_query_not_executed() {
        let conn = sample_db();
        let cmp = compare(&conn, "  \n", "SELECT x FROM t");
        assert_eq!(cmp.verdict, Verdict::Failed("write a query first".into()));
        assert!(cmp.user.is_none());
    }

    #[test]
    fn test_writes_are_rolled_back() {
        let conn = sample_db();
        let first = compare(&conn, "DELETE FROM t", "SELECT x FROM t");
        assert_eq!(first.verdict, Verdict::Incorrect);

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0)).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_user_write_not_visible_to_reference() {
        let conn = sample_db();
        let cmp = compare(&conn, "DELETE FROM t", "SELECT x FROM t ORDER BY x");
        assert_eq!(cmp.reference.unwrap().canonical(), "x\n1\n2\n");

        let cmp = compare(&conn, "UPDATE t SET x = x * 10", "SELECT SUM(x) AS s FROM t");
        assert_eq!(cmp.reference.unwrap().canonical(), "s\n3\n");
    }

    #[test]
    fn test_deterministic() {
        let conn = sample_db();
        let a = compare(&conn, "SELECT x FROM t", "SELECT x FROM t ORDER BY x DESC");
        let b = compare(&conn, "SELECT x FROM t", "SELECT x FROM t ORDER BY x DESC");
        assert_eq!(a.verdict, b.verdict);
    }

    #[test]
    fn test_verdict_messages() {
        assert_eq!(Verdict::Correct.message(), "Correct!");
        assert_eq!(Verdict::Failed("boom".into()).message(), "Error: boom");
    }
}
