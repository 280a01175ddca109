use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use super::{claims::Identity, errors::AuthError, jwt::TokenService};
use crate::error::AppError;

/// Pulls the token out of `Authorization: Bearer <token>`.
///
/// A missing header and a header that does not follow the bearer shape are
/// reported separately; neither reaches the token service.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MalformedHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedHeader);
    }

    let token = token.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}

/// Resolves request headers to the caller's identity.
pub fn authenticate_headers(headers: &HeaderMap, tokens: &TokenService) -> Result<Identity, AuthError> {
    let token = bearer_token(headers)?;
    let claims = tokens.verify(token)?;
    Ok(Identity::from(claims))
}

/// Gate for protected handlers. On success the identity is also stored in
/// the request extensions; on failure the handler never runs.
pub struct AuthUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(AuthUser(identity.clone()));
        }

        let tokens = TokenService::from_ref(state);
        let identity = authenticate_headers(&parts.headers, &tokens)?;
        parts.extensions.insert(identity.clone());
        Ok(AuthUser(identity))
    }
}
