//! Metadata database schema

/// SQL to create the accounts table
pub const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    salt TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
)
"#;

/// SQL to create the session table
/// Holds at most one row: the identity that is currently signed in
pub const CREATE_SESSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS session (
    slot INTEGER PRIMARY KEY CHECK (slot = 0),
    account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    signed_in_at TEXT NOT NULL
)
"#;

/// SQL to create the password_resets table
pub const CREATE_PASSWORD_RESETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS password_resets (
    token TEXT PRIMARY KEY,
    account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    requested_at TEXT NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_resets_account ON password_resets(account_id)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_ACCOUNTS_TABLE,
        CREATE_SESSION_TABLE,
        CREATE_PASSWORD_RESETS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
