use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::Claims;
use crate::error::AppError;

const ACCESS_TOKEN_TTL_SECS: i64 = 12 * 60 * 60;

/// Mint a HS256 access token binding a player identity to a display name.
pub fn mint_access_token(
    secret: &[u8],
    subject: &str,
    name: &str,
    now: SystemTime,
) -> Result<String, AppError> {
    let iat = now
        .duration_since(UNIX_EPOCH)
        .map_err(|_| AppError::internal("Failed to get current time"))?
        .as_secs() as i64;

    let claims = Claims {
        sub: subject.to_string(),
        name: name.to_string(),
        iat,
        exp: iat + ACCESS_TOKEN_TTL_SECS,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AppError::internal(format!("Failed to encode JWT: {e}")))
}

/// Verify a HS256 token and return its claims. Expiry is checked by the
/// default validation; the algorithm is pinned.
pub fn verify_access_token(secret: &[u8], token: &str) -> Result<Claims, AppError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::AuthRequired)
}
