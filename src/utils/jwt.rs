use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;

/// Tokens expire this many hours after issuance.
const TOKEN_TTL_HOURS: i64 = 3;

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    /// Unique token id
    pub jti: String,
    /// User ID
    pub uid: i32,
    /// One entry per assigned role
    pub roles: Vec<String>,
    pub iss: String,
    pub aud: String,
    /// Expiration timestamp (seconds)
    pub exp: i64,
}

/// A freshly signed token together with its expiry instant.
pub struct SignedToken {
    pub token: String,
    pub expiration: DateTime<Utc>,
}

/// Sign a new JWT token for a user.
pub fn sign(
    user_id: i32,
    username: &str,
    roles: Vec<String>,
    auth: &AuthConfig,
) -> Result<SignedToken, jsonwebtoken::errors::Error> {
    let expiration = Utc::now() + Duration::hours(TOKEN_TTL_HOURS);

    let claims = Claims {
        sub: username.to_owned(),
        jti: Uuid::new_v4().to_string(),
        uid: user_id,
        roles,
        iss: auth.issuer.clone(),
        aud: auth.audience.clone(),
        exp: expiration.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )?;

    Ok(SignedToken { token, expiration })
}

/// Verify and decode a JWT token, checking signature, expiry, issuer and audience.
pub fn verify(token: &str, auth: &AuthConfig) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.set_issuer(&[&auth.issuer]);
    validation.set_audience(&[&auth.audience]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}
