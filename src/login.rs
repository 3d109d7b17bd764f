use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File, create_dir_all};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use std::time::{Duration, SystemTime};
use thiserror::Error;
use uuid::Uuid;

const USERS_FILE: &str = "users.json";

/// Longest accepted login lifetime
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

lazy_static! {
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]{1,32}$").unwrap();
}

/// Account errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username, email and password cannot be empty")]
    EmptyField,

    #[error("Username may only contain letters, digits, '-' and '_' (max 32)")]
    InvalidUsername,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Email address is already registered")]
    EmailTaken,

    #[error("Password hashing failed")]
    Hashing,

    #[error("Failed to access user database: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse users data: {0}")]
    Json(#[from] serde_json::Error),
}

/// User data structure representing a registered application user
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    /// Username (unique identifier for the user, also their directory name)
    pub username: String,

    /// Email address
    pub email: String,

    /// Argon2 hash of the user's password
    pub password_hash: String,
}

/// Credential data for login and registration
#[derive(Debug, Serialize, Deserialize)]
pub struct UserCredentials {
    pub username: String,

    /// Email address (ignored for login, required for registration)
    #[serde(default)]
    pub email: String,

    /// Password in plaintext (only transmitted, never stored)
    pub password: String,
}

/// An authenticated session
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub expires_at: SystemTime,
}

/// Accounts and live sessions of one server
///
/// The session table lives here rather than in a global so that each server
/// (and each test) has its own.
pub struct AuthState {
    database_dir: PathBuf,
    session_ttl: Duration,
    sessions: RwLock<HashMap<String, Session>>,
    users_lock: Mutex<()>,
}

impl AuthState {
    /// Create the account state; `session_ttl` is capped at [`MAX_SESSION_TTL`]
    pub fn new(database_dir: impl AsRef<Path>, session_ttl: Duration) -> Self {
        AuthState {
            database_dir: database_dir.as_ref().to_path_buf(),
            session_ttl: session_ttl.min(MAX_SESSION_TTL),
            sessions: RwLock::new(HashMap::new()),
            users_lock: Mutex::new(()),
        }
    }

    pub fn database_dir(&self) -> &Path {
        &self.database_dir
    }

    fn users_path(&self) -> PathBuf {
        self.database_dir.join(USERS_FILE)
    }

    /// Initialize the database structure
    ///
    /// Creates the database directory and users file if they don't exist.
    pub fn init(&self) -> std::io::Result<()> {
        if !self.database_dir.exists() {
            create_dir_all(&self.database_dir)?;
        }

        let users_path = self.users_path();
        if !users_path.exists() {
            let mut file = File::create(users_path)?;
            file.write_all(b"{}")?;
        }

        Ok(())
    }

    /// Get all registered users
    pub fn get_users(&self) -> Result<HashMap<String, User>, AuthError> {
        let mut file = File::open(self.users_path())?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save the users map to disk
    ///
    /// The map is written to a temporary file first and renamed over the old
    /// one, so readers never see a partial file.
    pub fn save_users(&self, users: &HashMap<String, User>) -> Result<(), AuthError> {
        let json = serde_json::to_string_pretty(users)?;
        let path = self.users_path();
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Register a new user
    ///
    /// The password is hashed before storage and the user's directory is
    /// created under the database directory.
    ///
    /// # Errors
    /// * Returns an error if any field is empty or the username is malformed
    /// * Returns an error if the username or email is already in use
    pub fn register_user(&self, username: &str, email: &str, password: &str) -> Result<(), AuthError> {
        if username.is_empty() || password.is_empty() || email.is_empty() {
            return Err(AuthError::EmptyField);
        }
        if !USERNAME_REGEX.is_match(username) {
            return Err(AuthError::InvalidUsername);
        }

        // held across read, check and write so concurrent signups don't drop each other
        let _guard = self.users_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut users = self.get_users()?;
        if users.contains_key(username) {
            return Err(AuthError::UsernameTaken);
        }
        if users.values().any(|user| user.email == email) {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(password)?;
        create_dir_all(self.database_dir.join(username))?;

        users.insert(
            username.to_string(),
            User {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            },
        );
        self.save_users(&users)?;

        tracing::info!(user = username, "registered new user");
        Ok(())
    }

    /// Check whether the username and password match a registered user
    pub fn verify_user(&self, username: &str, password: &str) -> Result<bool, AuthError> {
        let users = self.get_users()?;

        match users.get(username) {
            Some(user) => Ok(verify_password(password, &user.password_hash)),
            None => Ok(false),
        }
    }

    /// Create a new session and return its id
    pub fn create_session(&self, username: &str) -> String {
        let session_id = Uuid::new_v4().to_string();
        let session = Session {
            user_id: username.to_string(),
            expires_at: SystemTime::now() + self.session_ttl,
        };

        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.insert(session_id.clone(), session);

        session_id
    }

    /// Return the username for a live session
    ///
    /// Expired sessions are dropped from the table.
    pub fn validate_session(&self, session_id: &str) -> Option<String> {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());

        match sessions.get(session_id) {
            Some(session) if session.expires_at > SystemTime::now() => Some(session.user_id.clone()),
            Some(_) => {
                sessions.remove(session_id);
                None
            }
            None => None,
        }
    }

    pub fn end_session(&self, session_id: &str) {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.remove(session_id);
    }
}

/// Hash a password using Argon2id
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::Hashing)
}

/// Check a plaintext password against a stored Argon2 hash
///
/// A malformed stored hash counts as a mismatch.
fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => {
            tracing::warn!("stored password hash has an invalid format");
            false
        }
    }
}
