//! Access tokens.
//!
//! Users exchange a login and password for an HS256-signed JWT. The token is sent back on every request, either as
//! `Authorization: Bearer <token>` or in the [`ACCESS_TOKEN_COOKIE`] cookie, and is checked by the [`JwtClaims`]
//! extractor. Handlers that take a `JwtClaims` argument are therefore only reachable with a valid token.
use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use chrono::{DateTime, Utc};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use loyalty_engine::AuthenticatedUser;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const ACCESS_TOKEN_COOKIE: &str = "lpg_access_token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id, as a decimal string.
    pub sub: String,
    pub login: String,
    pub iat: i64,
    pub exp: i64,
}

impl JwtClaims {
    pub fn new(user_id: i64, login: &str, issued_at: DateTime<Utc>, expiry: DateTime<Utc>) -> Self {
        Self { sub: user_id.to_string(), login: login.to_string(), iat: issued_at.timestamp(), exp: expiry.timestamp() }
    }

    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub.parse::<i64>().map_err(|_| AuthError::ValidationError(format!("'{}' is not a user id", self.sub)))
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let issuer = req
        .app_data::<web::Data<TokenIssuer>>()
        .ok_or_else(|| ServerError::ConfigurationError("No token issuer has been registered".into()))?;
    let token = bearer_token(req)
        .or_else(|| req.cookie(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_string()))
        .ok_or(AuthError::MissingToken)?;
    let claims = issuer.validate_token(&token)?;
    claims.user_id()?;
    Ok(claims)
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").or_else(|| value.strip_prefix("bearer "))?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: chrono::Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.reveal().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            lifetime: config.token_lifetime,
        }
    }

    /// Issue a new access token for a user whose credentials have already been checked.
    pub fn issue_token(&self, user: &AuthenticatedUser) -> Result<String, AuthError> {
        self.issue_token_with_expiry(user, Utc::now() + self.lifetime)
    }

    pub fn issue_token_with_expiry(
        &self,
        user: &AuthenticatedUser,
        expiry: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = JwtClaims::new(user.id, &user.login, Utc::now(), expiry);
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::CouldNotIssueToken(e.to_string()))?;
        trace!("🔑️ Issued access token for user #{} valid until {expiry}", user.id);
        Ok(token)
    }

    pub fn validate_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256)).map_err(|e| {
            debug!("🔑️ Rejected access token. {e}");
            AuthError::ValidationError(e.to_string())
        })?;
        Ok(data.claims)
    }
}
