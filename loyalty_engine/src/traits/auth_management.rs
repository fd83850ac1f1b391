use thiserror::Error;

use crate::db_types::{NewUser, User, UserCredentials};

#[allow(async_fn_in_trait)]
pub trait AuthManagement {
    /// Stores a new user together with a zeroed balance record. Fails with [`AuthApiError::UserAlreadyExists`] if
    /// the login is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, AuthApiError>;

    /// Fetches the stored credential for `login`, if the login exists.
    async fn fetch_credentials(&self, login: &str) -> Result<Option<UserCredentials>, AuthApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("The storage operation did not complete within {0} ms")]
    Timeout(u128),
    #[error("The login '{0}' is already registered")]
    UserAlreadyExists(String),
    #[error("Invalid login name. {0}")]
    InvalidLogin(String),
    #[error("Invalid password. {0}")]
    InvalidPassword(String),
    #[error("The login or password is incorrect")]
    InvalidCredentials,
    #[error("Could not hash or verify the credential. {0}")]
    CredentialError(String),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}
