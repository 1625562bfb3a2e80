use serde::{Deserialize, Serialize};

/// Claims carried by backend-issued access tokens. `sub` is the stable
/// player identity a seat binds to; rejoin must present the same subject.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    /// Issued-at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}
