//! SQLite store for local accounts and the current session

use std::path::Path;
use rusqlite::{Connection, params, OptionalExtension};
use crate::Result;
use super::schema;

/// File name of the metadata database
pub const META_DB_NAME: &str = "app_meta.db";

/// SQLite-backed storage for accounts
pub struct MetaStore {
    conn: Connection,
}

impl MetaStore {
    /// Open a database file (creates it and its directory if missing)
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON")?;
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== Account Operations ==========

    /// Insert a new account, returning its id
    pub fn insert_account(&self, email: &str, salt: &str, password_hash: &str, created_at: &str) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO accounts (email, salt, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![email, salt, password_hash, created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get an account by email (case-insensitive)
    pub fn find_account(&self, email: &str) -> Result<Option<AccountRow>> {
        self.conn
            .query_row(
                "SELECT id, email, salt, password_hash, created_at FROM accounts WHERE email = ?1",
                [email],
                |row| self.row_to_account(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Count all accounts
    pub fn count_accounts(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Helper to convert a row to an AccountRow
    fn row_to_account(&self, row: &rusqlite::Row) -> rusqlite::Result<AccountRow> {
        Ok(AccountRow {
            id: row.get(0)?,
            email: row.get(1)?,
            salt: row.get(2)?,
            password_hash: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    // ========== Session Operations ==========

    /// Mark an account as signed in, replacing any previous session
    pub fn set_session(&self, account_id: i64, signed_in_at: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO session (slot, account_id, signed_in_at) VALUES (0, ?1, ?2)",
            params![account_id, signed_in_at],
        )?;
        Ok(())
    }

    /// Current session as (email, signed_in_at)
    pub fn current_session(&self) -> Result<Option<(String, String)>> {
        self.conn
            .query_row(
                "SELECT a.email, s.signed_in_at FROM session s JOIN accounts a ON a.id = s.account_id WHERE s.slot = 0",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Clear the session
    pub fn clear_session(&self) -> Result<()> {
        self.conn.execute("DELETE FROM session", [])?;
        Ok(())
    }

    // ========== Password Reset Operations ==========

    /// Record a password reset request
    pub fn insert_reset(&self, token: &str, account_id: i64, requested_at: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO password_resets (token, account_id, requested_at) VALUES (?1, ?2, ?3)",
            params![token, account_id, requested_at],
        )?;
        Ok(())
    }

    /// Count reset requests for an account
    pub fn count_resets(&self, account_id: i64) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM password_resets WHERE account_id = ?1",
            [account_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

/// Stored account
#[derive(Debug, Clone)]
pub struct AccountRow {
    pub id: i64,
    pub email: String,
    pub salt: String,
    pub password_hash: String,
    pub created_at: String,
}
