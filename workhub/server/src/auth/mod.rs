use axum::extract::MatchedPath;
use jsonwebtoken::encode;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tower_http::trace::MakeSpan;
use tracing::Span;
use workhub_core::{Actor, EmployeeId, Role};

use crate::config::Config;

pub mod api;

/// Represents the currently authenticated employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: EmployeeId,
    pub role: Role,
}

impl CurrentUser {
    /// Creates a new CurrentUser instance.
    pub fn new(id: EmployeeId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }
}

/// Authentication state containing the JWT secret.
#[derive(Clone)]
pub struct AuthState {
    pub jwt_secret: String,
}

impl AuthState {
    /// Creates a new AuthState from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct Claims {
    pub exp: usize,       // Expiry time of the token
    pub iat: usize,       // Issued at time of the token
    pub sub: String,      // Id of the employee the token was issued to
    pub role: String,     // Role at the time of issue
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("JWT operation failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Token carries an unknown role")]
    UnknownRole(#[from] workhub_core::UnknownRole),
    #[error("Token subject '{0}' is not an employee id")]
    InvalidSubject(String),
}

pub fn encode_jwt(
    employee_id: EmployeeId,
    role: Role,
    jwt_secret: &str,
) -> Result<String, AuthError> {
    let now = chrono::Utc::now();
    let expire = chrono::Duration::hours(24);
    let exp = (now + expire).timestamp() as usize;
    let iat = now.timestamp() as usize;
    let claims = Claims {
        exp,
        iat,
        sub: employee_id.to_string(),
        role: role.to_string(),
    };
    let jwt = encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(jwt_secret.as_bytes()),
    )?;
    Ok(jwt)
}

/// Decodes a token and resolves the identity it was issued to.
pub fn decode_jwt(token: &str, jwt_secret: &str) -> Result<CurrentUser, AuthError> {
    let token_data = jsonwebtoken::decode::<Claims>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(jwt_secret.as_bytes()),
        &jsonwebtoken::Validation::default(),
    )?;
    let claims = token_data.claims;
    let id = claims
        .sub
        .parse::<EmployeeId>()
        .map_err(|_| AuthError::InvalidSubject(claims.sub.clone()))?;
    let role = claims.role.parse::<Role>()?;
    Ok(CurrentUser::new(id, role))
}

/// Returns a fresh random salt for password hashing.
pub fn new_salt() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compares in constant time for hashes of equal length.
pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    let actual = hash_password(password, salt);
    if actual.len() != expected_hash.len() {
        return false;
    }
    bool::from(actual.as_bytes().ct_eq(expected_hash.as_bytes()))
}

/// Custom span maker that keeps credentials out of request spans.
/// Login requests never record headers or bodies.
#[derive(Clone, Debug)]
pub struct FilteredMakeSpan;

impl<B> MakeSpan<B> for FilteredMakeSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let uri = request.uri();
        let method = request.method();
        let matched_path = request
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str);

        if uri.path().ends_with("/login") {
            tracing::info_span!(
                "request",
                method = %method,
                uri = %uri,
                matched_path,
                sensitive_route = true,
            )
        } else {
            tracing::info_span!(
                "request",
                method = %method,
                uri = %uri,
                matched_path,
            )
        }
    }
}
