//! User registration and password authentication.
//!
//! Passwords are never stored or compared in plain text. Hashing is delegated to a [`CredentialHasher`]; the default
//! is [`Argon2Hasher`]. Hashing is slow, so it runs on tokio's blocking pool rather than on the task
//! that awaits it.
use std::fmt::Debug;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use log::*;
use regex::Regex;

use crate::{
    db_types::{NewUser, User},
    traits::{AuthApiError, AuthManagement},
};

const LOGIN_PATTERN: &str = r"^[A-Za-z0-9_.@-]{1,64}$";
const MAX_PASSWORD_LENGTH: usize = 256;

/// The secure-hash contract for stored credentials.
pub trait CredentialHasher {
    /// Produces a self-describing hash string (algorithm, parameters and salt included).
    fn hash(&self, password: &str) -> Result<String, AuthApiError>;

    /// Returns false for a wrong password. Errors are reserved for hashes that cannot be parsed.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthApiError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, AuthApiError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthApiError::CredentialError(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthApiError> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthApiError::CredentialError(e.to_string()))?;
        Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
    }
}

/// A user whose password has just been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub login: String,
}

impl From<User> for AuthenticatedUser {
    fn from(user: User) -> Self {
        Self { id: user.id, login: user.login }
    }
}

pub struct AuthApi<B, H = Argon2Hasher> {
    db: B,
    hasher: H,
}

impl<B: Debug, H> Debug for AuthApi<B, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl<B> AuthApi<B, Argon2Hasher>
where B: AuthManagement
{
    pub fn new(db: B) -> Self {
        Self { db, hasher: Argon2Hasher }
    }
}

impl<B, H> AuthApi<B, H>
where
    B: AuthManagement,
    H: CredentialHasher + Clone + Send + 'static,
{
    pub fn with_hasher(db: B, hasher: H) -> Self {
        Self { db, hasher }
    }

    /// Creates a user with a zero balance. The login must be 1 to 64 characters from `[A-Za-z0-9_.@-]` and the
    /// password must not be empty.
    pub async fn register_user(&self, login: &str, password: &str) -> Result<AuthenticatedUser, AuthApiError> {
        validate_login(login)?;
        validate_password(password)?;
        let hasher = self.hasher.clone();
        let password = password.to_string();
        let password_hash = off_thread(move || hasher.hash(&password)).await?;
        let user = self.db.create_user(NewUser { login: login.to_string(), password_hash }).await?;
        info!("🔑️ Registered new user #{} ({})", user.id, user.login);
        Ok(user.into())
    }

    /// Checks the password for `login`. An unknown login and a wrong password produce the same error.
    pub async fn authenticate_user(&self, login: &str, password: &str) -> Result<AuthenticatedUser, AuthApiError> {
        let Some(creds) = self.db.fetch_credentials(login).await? else {
            debug!("🔑️ Login attempt for unknown user {login}");
            return Err(AuthApiError::InvalidCredentials);
        };
        let hasher = self.hasher.clone();
        let password = password.to_string();
        let hash = creds.password_hash.clone();
        if off_thread(move || hasher.verify(&password, &hash)).await? {
            debug!("🔑️ User #{} authenticated", creds.user_id);
            Ok(AuthenticatedUser { id: creds.user_id, login: creds.login })
        } else {
            debug!("🔑️ Wrong password for user #{}", creds.user_id);
            Err(AuthApiError::InvalidCredentials)
        }
    }
}

async fn off_thread<T, F>(f: F) -> Result<T, AuthApiError>
where
    F: FnOnce() -> Result<T, AuthApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| AuthApiError::CredentialError(e.to_string()))?
}

fn validate_login(login: &str) -> Result<(), AuthApiError> {
    let re = Regex::new(LOGIN_PATTERN).map_err(|e| AuthApiError::InvalidLogin(e.to_string()))?;
    if re.is_match(login) {
        Ok(())
    } else {
        Err(AuthApiError::InvalidLogin(format!(
            "'{login}' must be 1 to 64 letters, digits or any of _ . @ -"
        )))
    }
}

fn validate_password(password: &str) -> Result<(), AuthApiError> {
    if password.is_empty() {
        return Err(AuthApiError::InvalidPassword("The password cannot be empty".into()));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AuthApiError::InvalidPassword(format!("The password is longer than {MAX_PASSWORD_LENGTH} bytes")));
    }
    Ok(())
}
