//! JWT issuing, verification, and the bearer-token extractor.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::AppError;
use super::state::AppState;
use crate::config::AuthConfig;
use crate::models::{Role, User};

/// Token claims carried by issued JWTs.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Username
    pub name: String,
    /// Role name
    pub role: String,
    pub iss: String,
    pub aud: String,
    /// Expiry as unix seconds
    pub exp: i64,
}

/// Issue an HS256 token for `user`.
pub fn issue_token(user: &User, auth: &AuthConfig) -> Result<String, AppError> {
    let expires_at = Utc::now() + chrono::Duration::seconds(auth.token_ttl_secs as i64);
    let claims = Claims {
        sub: user.id.to_string(),
        name: user.username.clone(),
        role: user.role.as_str().to_string(),
        iss: auth.issuer.clone(),
        aud: auth.audience.clone(),
        exp: expires_at.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token encoding failed: {}", e)))
}

/// Verify a token's signature, expiry, issuer, and audience.
pub fn decode_token(token: &str, auth: &AuthConfig) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&auth.issuer]);
    validation.set_audience(&[&auth.audience]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("invalid or expired token".to_string()))
}

/// Authenticated caller, extracted from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing Authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("expected Bearer token".to_string()))?;

        let claims = decode_token(token, &state.config.auth)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("invalid subject claim".to_string()))?;
        let role = Role::parse(&claims.role).unwrap_or(Role::User);

        Ok(AuthUser {
            user_id,
            username: claims.name,
            role,
        })
    }
}
