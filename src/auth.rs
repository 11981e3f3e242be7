//! Authentication boundary
//!
//! Screens that need an identity receive an [`AuthProvider`] explicitly.
//! [`LocalAuthProvider`] keeps accounts in the metadata database so the
//! tool works without a hosted identity service.
//!
//! Passwords are stored as a per-account random salt plus a blake3 digest of
//! salt and password. blake3 is a fast hash, not a password KDF: the digests
//! resist casual disclosure but not offline brute force, which is acceptable
//! only because the metadata database is a local, single-user file.

use std::path::Path;
use std::sync::OnceLock;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use crate::storage::MetaStore;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// Authentication failures, worded for the user
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Enter an email and a password.")]
    MissingCredentials,

    #[error("Enter a valid email address.")]
    MissingEmail,

    #[error("The email address is not valid.")]
    InvalidEmail,

    #[error("The password is too weak (use 6 or more characters).")]
    WeakPassword,

    #[error("This email is already registered.")]
    EmailInUse,

    #[error("No account is associated with this email.")]
    UserNotFound,

    #[error("The password is incorrect.")]
    WrongPassword,

    #[error("Not signed in. Run `sqlpractice auth login` first.")]
    NotSignedIn,

    #[error("Authentication storage error: {0}")]
    Storage(#[from] crate::Error),
}

impl From<rusqlite::Error> for AuthError {
    fn from(e: rusqlite::Error) -> Self {
        AuthError::Storage(e.into())
    }
}

/// Email/password pair. The email is trimmed, the password never is.
#[derive(Debug, Clone)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    pub fn new(email: &str, password: &str) -> Result<Self, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        Ok(Self {
            email: email.to_string(),
            password: password.to_string(),
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

/// Who is signed in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub email: String,
    pub signed_in_at: DateTime<Utc>,
}

/// Capability set the practice screens depend on
pub trait AuthProvider {
    fn sign_in(&self, credentials: &Credentials) -> Result<Identity, AuthError>;
    /// Create an account and sign it in
    fn create_account(&self, credentials: &Credentials) -> Result<Identity, AuthError>;
    /// Request a password reset; returns the confirmation shown to the user
    fn send_password_reset(&self, email: &str) -> Result<String, AuthError>;
    fn sign_out(&self) -> Result<(), AuthError>;
    fn current_identity(&self) -> Result<Option<Identity>, AuthError>;

    /// Current identity, or `NotSignedIn`
    fn require_identity(&self) -> Result<Identity, AuthError> {
        self.current_identity()?.ok_or(AuthError::NotSignedIn)
    }
}

/// Accounts stored in the local metadata database
pub struct LocalAuthProvider {
    store: MetaStore,
}

impl LocalAuthProvider {
    pub fn open(path: &Path) -> Result<Self, AuthError> {
        Ok(Self { store: MetaStore::open(path)? })
    }

    pub fn new(store: MetaStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &MetaStore {
        &self.store
    }

    fn start_session(&self, account_id: i64, email: String) -> Result<Identity, AuthError> {
        let now = Utc::now();
        self.store.set_session(account_id, &now.to_rfc3339())?;
        tracing::info!("signed in as {}", email);
        Ok(Identity { email, signed_in_at: now })
    }
}

impl AuthProvider for LocalAuthProvider {
    fn sign_in(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let account = self
            .store
            .find_account(credentials.email())?
            .ok_or(AuthError::UserNotFound)?;

        let expected = blake3::Hash::from_hex(&account.password_hash)
            .map_err(|_| AuthError::Storage(crate::Error::Auth("corrupt password hash".into())))?;
        // blake3::Hash equality is constant-time
        if hash_password(&account.salt, &credentials.password) != expected {
            tracing::debug!("wrong password for {}", account.email);
            return Err(AuthError::WrongPassword);
        }

        self.start_session(account.id, account.email)
    }

    fn create_account(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        if !is_valid_email(credentials.email()) {
            return Err(AuthError::InvalidEmail);
        }
        if credentials.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        if self.store.find_account(credentials.email())?.is_some() {
            return Err(AuthError::EmailInUse);
        }

        let salt = uuid::Uuid::new_v4().simple().to_string();
        let hash = hash_password(&salt, &credentials.password);
        let id = self.store.insert_account(
            credentials.email(),
            &salt,
            &hash.to_hex(),
            &Utc::now().to_rfc3339(),
        )?;
        tracing::info!("created account {}", credentials.email());

        self.start_session(id, credentials.email().to_string())
    }

    fn send_password_reset(&self, email: &str) -> Result<String, AuthError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::MissingEmail);
        }
        if !is_valid_email(email) {
            return Err(AuthError::InvalidEmail);
        }

        let account = self.store.find_account(email)?.ok_or(AuthError::UserNotFound)?;
        let token = uuid::Uuid::new_v4().to_string();
        self.store.insert_reset(&token, account.id, &Utc::now().to_rfc3339())?;
        tracing::info!("password reset requested for {} (token {})", account.email, token);

        Ok("We sent you a link to reset your password. Check your inbox and spam folder.".to_string())
    }

    fn sign_out(&self) -> Result<(), AuthError> {
        self.store.clear_session()?;
        tracing::info!("signed out");
        Ok(())
    }

    fn current_identity(&self) -> Result<Option<Identity>, AuthError> {
        let Some((email, at)) = self.store.current_session()? else {
            return Ok(None);
        };
        let signed_in_at = DateTime::parse_from_rfc3339(&at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| AuthError::Storage(crate::Error::Auth(format!("bad session timestamp: {}", e))))?;
        Ok(Some(Identity { email, signed_in_at }))
    }
}

fn hash_password(salt: &str, password: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize()
}

/// Loose shape check: something@domain.tld
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex"))
        .is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> LocalAuthProvider {
        LocalAuthProvider::new(MetaStore::open_in_memory().unwrap())
    }

    fn creds(email: &str, password: &str) -> Credentials {
        Credentials::new(email, password).unwrap()
    }

    #[test]
    fn test_credentials_trim_email_only() {
        let c = Credentials::new("  ana@example.com ", " secret ").unwrap();
        assert_eq!(c.email(), "ana@example.com");
        assert_eq!(c.password, " secret ");
        assert!(matches!(Credentials::new("   ", "x"), Err(AuthError::MissingCredentials)));
        assert!(matches!(Credentials::new("a@b.c", ""), Err(AuthError::MissingCredentials)));
    }

    #[test]
    fn test_register_then_sign_in() {
        let auth = provider();
        let created = auth.create_account(&creds("ana@example.com", "secret1")).unwrap();
        assert_eq!(created.email, "ana@example.com");
        assert_eq!(auth.current_identity().unwrap().unwrap().email, "ana@example.com");

        auth.sign_out().unwrap();
        assert!(auth.current_identity().unwrap().is_none());
        assert!(matches!(auth.require_identity(), Err(AuthError::NotSignedIn)));

        let identity = auth.sign_in(&creds("ana@example.com", "secret1")).unwrap();
        assert_eq!(identity.email, "ana@example.com");
    }

    #[test]
    fn test_register_validation() {
        let auth = provider();
        assert!(matches!(auth.create_account(&creds("not-an-email", "secret1")), Err(AuthError::InvalidEmail)));
        assert!(matches!(auth.create_account(&creds("ana@example.com", "12345")), Err(AuthError::WeakPassword)));

        auth.create_account(&creds("ana@example.com", "secret1")).unwrap();
        assert!(matches!(auth.create_account(&creds("ana@example.com", "secret2")), Err(AuthError::EmailInUse)));
    }

    #[test]
    fn test_sign_in_failures() {
        let auth = provider();
        assert!(matches!(auth.sign_in(&creds("ghost@example.com", "secret1")), Err(AuthError::UserNotFound)));

        auth.create_account(&creds("ana@example.com", "secret1")).unwrap();
        auth.sign_out().unwrap();
        assert!(matches!(auth.sign_in(&creds("ana@example.com", "Secret1")), Err(AuthError::WrongPassword)));
        assert!(auth.current_identity().unwrap().is_none());
    }

    #[test]
    fn test_password_reset() {
        let auth = provider();
        assert!(matches!(auth.send_password_reset("  "), Err(AuthError::MissingEmail)));
        assert!(matches!(auth.send_password_reset("ghost@example.com"), Err(AuthError::UserNotFound)));

        auth.create_account(&creds("ana@example.com", "secret1")).unwrap();
        let msg = auth.send_password_reset(" ana@example.com ").unwrap();
        assert!(msg.contains("reset"));

        let account = auth.store().find_account("ana@example.com").unwrap().unwrap();
        assert_eq!(auth.store().count_resets(account.id).unwrap(), 1);
    }

    #[test]
    fn test_session_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("app_meta.db");
        {
            let auth = LocalAuthProvider::open(&path).unwrap();
            auth.create_account(&creds("ana@example.com", "secret1")).unwrap();
        }
        let auth = LocalAuthProvider::open(&path).unwrap();
        assert_eq!(auth.require_identity().unwrap().email, "ana@example.com");
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("a@b.cl"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.d"));
    }
}
