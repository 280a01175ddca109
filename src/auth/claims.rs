use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload used for authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,     // account ID
    pub email: String, // account email at issue time
    pub iat: i64,      // issued at (unix timestamp)
    pub exp: i64,      // expires at (unix timestamp)
    pub iss: String,   // issuer
    pub aud: String,   // audience
}

/// Authenticated caller, attached to the request once the bearer token checks out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub account_id: Uuid,
    pub email: String,
}

impl From<Claims> for Identity {
    fn from(c: Claims) -> Self {
        Self {
            account_id: c.sub,
            email: c.email,
        }
    }
}
