use std::sync::Arc;

use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::{claims::Claims, errors::TokenError};
use crate::{
    config::{AppConfig, JwtConfig},
    state::AppState,
};

/// Issues and verifies HS256 identity tokens.
///
/// Holds only a shared, read-only handle on the process configuration; the
/// signing secret is loaded once at startup and never changes afterwards.
/// Tokens cannot be revoked before they expire since no session table exists.
#[derive(Clone)]
pub struct TokenService {
    config: Arc<AppConfig>,
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.config.clone())
    }
}

impl TokenService {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }

    fn jwt(&self) -> &JwtConfig {
        &self.config.jwt
    }

    pub fn ttl(&self) -> Duration {
        Duration::minutes(self.jwt().ttl_minutes)
    }

    pub fn issue(&self, account_id: Uuid, email: &str) -> anyhow::Result<String> {
        self.issue_at(account_id, email, OffsetDateTime::now_utc())
    }

    /// Issues a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        account_id: Uuid,
        email: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let exp = now + self.ttl();
        let claims = Claims {
            sub: account_id,
            email: email.to_string(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.jwt().issuer.clone(),
            aud: self.jwt().audience.clone(),
        };
        let key = EncodingKey::from_secret(self.jwt().secret.as_bytes());
        let token = encode(&Header::new(Algorithm::HS256), &claims, &key)?;
        debug!(account_id = %account_id, "jwt signed");
        Ok(token)
    }

    /// Signature is checked before expiry, so a tampered expired token
    /// reports `InvalidSignature`.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.jwt().audience));
        validation.set_issuer(std::slice::from_ref(&self.jwt().issuer));
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        let key = DecodingKey::from_secret(self.jwt().secret.as_bytes());
        let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        })?;
        debug!(account_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_tokens(secret: &str, issuer: &str, audience: &str) -> TokenService {
        let mut config = (*AppState::fake().config).clone();
        config.jwt = JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 60 * 24,
        };
        TokenService::new(Arc::new(config))
    }

    fn tamper_signature(token: &str) -> String {
        let (head, sig) = token.rsplit_once('.').expect("three segments");
        // first char of the signature carries six full bits, so this stays valid base64
        let mut chars: Vec<char> = sig.chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        format!("{head}.{}", chars.into_iter().collect::<String>())
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let tokens = make_tokens("dev-secret", "test-issuer", "test-aud");
        let id = Uuid::new_v4();
        let token = tokens.issue(id, "a@example.com").expect("issue");
        let claims = tokens.verify(&token).expect("verify");
        assert_eq!(claims.sub, id);
        assert_eq!(claims.email, "a@example.com");
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = make_tokens("dev-secret", "iss", "aud");
        let issued = OffsetDateTime::now_utc() - tokens.ttl() - Duration::minutes(1);
        let token = tokens.issue_at(Uuid::new_v4(), "a@example.com", issued).unwrap();
        assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn token_still_valid_just_before_expiry() {
        let tokens = make_tokens("dev-secret", "iss", "aud");
        let issued = OffsetDateTime::now_utc() - tokens.ttl() + Duration::minutes(1);
        let token = tokens.issue_at(Uuid::new_v4(), "a@example.com", issued).unwrap();
        assert!(tokens.verify(&token).is_ok());
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let tokens = make_tokens("dev-secret", "iss", "aud");
        let token = tokens.issue(Uuid::new_v4(), "a@example.com").unwrap();
        let forged = tamper_signature(&token);
        assert_ne!(forged, token);
        assert_eq!(tokens.verify(&forged), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn tampered_and_expired_reports_signature() {
        let tokens = make_tokens("dev-secret", "iss", "aud");
        let issued = OffsetDateTime::now_utc() - Duration::days(3);
        let token = tokens.issue_at(Uuid::new_v4(), "a@example.com", issued).unwrap();
        assert_eq!(
            tokens.verify(&tamper_signature(&token)),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let ours = make_tokens("secret-one", "iss", "aud");
        let theirs = make_tokens("secret-two", "iss", "aud");
        let token = theirs.issue(Uuid::new_v4(), "a@example.com").unwrap();
        assert_eq!(ours.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let tokens = make_tokens("dev-secret", "iss", "aud");
        for bad in ["", "abc", "a.b", "a.b.c", "not a token at all"] {
            assert_eq!(tokens.verify(bad), Err(TokenError::Malformed), "{bad}");
        }
    }

    #[test]
    fn wrong_issuer_or_audience_is_rejected() {
        let good = make_tokens("same-secret", "good-iss", "good-aud");
        let bad = make_tokens("same-secret", "bad-iss", "bad-aud");
        let token = good.issue(Uuid::new_v4(), "a@example.com").unwrap();
        assert_eq!(bad.verify(&token), Err(TokenError::Malformed));
    }
}
