use actix_web_httpauth::extractors::bearer::BearerAuth;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::config::AppConfig;
use crate::models::auth::Claims;
use crate::models::user::User;
use crate::models::UserId;
use crate::utils::errors::ServiceError;

/// Resolves the viewer's user id from a bearer token.
pub fn viewer_id(credentials: &BearerAuth, config: &AppConfig) -> Result<UserId, ServiceError> {
    let claims = decode::<Claims>(
        credentials.token(),
        &DecodingKey::from_secret(config.jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        log::warn!("JWT validation error: {}", e);
        ServiceError::Unauthorized("Invalid token".to_string())
    })?;

    claims
        .claims
        .sub
        .parse()
        .map_err(|_| ServiceError::Unauthorized("Invalid user ID in token".to_string()))
}

/// Signs a token for `user`. Credentials are verified by the login service
/// before it calls this.
pub fn issue_token(
    user: &User,
    secret: &str,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<String, ServiceError> {
    let exp = now
        .checked_add_signed(ttl)
        .ok_or_else(|| ServiceError::InternalError("Token expiry overflow".to_string()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        name: user.full_name.clone(),
        exp,
        iat: now.timestamp() as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?)
}
