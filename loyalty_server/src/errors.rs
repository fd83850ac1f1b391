use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::{error, warn};
use loyalty_engine::{AccountApiError, AuthApiError, LedgerError, OrderFlowError, WithdrawalError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("{0}")]
    InvalidOrderNumber(String),
    #[error("{0}")]
    InvalidAmount(String),
    #[error("{0}")]
    InvalidCredentialFormat(String),
    #[error("Order {0} has already been uploaded by another user")]
    OrderOwnedByOther(String),
    #[error("{0}")]
    LoginTaken(String),
    #[error("{0}")]
    InsufficientBalance(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentialFormat(_) => StatusCode::BAD_REQUEST,
            Self::InvalidOrderNumber(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidAmount(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::OrderOwnedByOther(_) => StatusCode::CONFLICT,
            Self::LoginTaken(_) => StatusCode::CONFLICT,
            Self::InsufficientBalance(_) => StatusCode::PAYMENT_REQUIRED,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided. Log in first.")]
    MissingToken,
    #[error("Access token is not valid. {0}")]
    ValidationError(String),
    #[error("The login or password is incorrect.")]
    InvalidCredentials,
    #[error("Could not issue an access token. {0}")]
    CouldNotIssueToken(String),
    #[error("The account behind this access token no longer exists. Log in again.")]
    UnknownUser(i64),
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::UserAlreadyExists(_) => Self::LoginTaken(e.to_string()),
            AuthApiError::InvalidLogin(_) | AuthApiError::InvalidPassword(_) => {
                Self::InvalidCredentialFormat(e.to_string())
            },
            AuthApiError::InvalidCredentials => Self::AuthenticationError(AuthError::InvalidCredentials),
            AuthApiError::DatabaseError(_) | AuthApiError::Timeout(_) | AuthApiError::CredentialError(_) => {
                error!("🔑️ Authentication backend failure. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::UserNotFound(id) => {
                warn!("💻️ A valid access token names user #{id}, who does not exist");
                AuthError::UnknownUser(id).into()
            },
            e => {
                error!("💻️ Could not read account data. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientBalance { .. } => Self::InsufficientBalance(e.to_string()),
            LedgerError::UserNotFound(id) => {
                warn!("💻️ A valid access token names user #{id}, who does not exist");
                AuthError::UnknownUser(id).into()
            },
            e => {
                error!("💻️ Ledger failure. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::InvalidOrderNumber(e) => Self::InvalidOrderNumber(e.to_string()),
            OrderFlowError::Ledger(e) => e.into(),
        }
    }
}

impl From<WithdrawalError> for ServerError {
    fn from(e: WithdrawalError) -> Self {
        match e {
            WithdrawalError::InvalidOrderNumber(e) => Self::InvalidOrderNumber(e.to_string()),
            WithdrawalError::InvalidAmount(_) => Self::InvalidAmount(e.to_string()),
            WithdrawalError::InsufficientBalance { .. } => Self::InsufficientBalance(e.to_string()),
            WithdrawalError::Ledger(e) => e.into(),
        }
    }
}
