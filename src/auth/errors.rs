use thiserror::Error;

/// Why a bearer token was rejected by the token service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
}

/// Authentication failures. All of them surface as 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing Authorization header")]
    MissingHeader,
    #[error("malformed Authorization header")]
    MalformedHeader,
    #[error("invalid token: {0}")]
    InvalidToken(#[from] TokenError),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account no longer exists")]
    UnknownAccount,
}

impl AuthError {
    /// Message returned to the client.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "Missing Authorization header",
            AuthError::MalformedHeader => "Invalid Authorization header",
            AuthError::InvalidToken(_) | AuthError::UnknownAccount => "Invalid or expired token",
            AuthError::InvalidCredentials => "Invalid credentials",
        }
    }
}
