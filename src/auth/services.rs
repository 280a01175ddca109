use anyhow::Context;
use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    claims::Identity,
    dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
    errors::AuthError,
    jwt::TokenService,
    password::{hash_password, verify_password},
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    store::StoreError,
};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const PASSWORD_SPECIALS: &[char] = &['?', '!', '@', '%', '$', '£'];

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    // verified against when the email is unknown, so both failures cost one argon2 run
    static ref DUMMY_HASH: String = hash_password("Dummy!pass1").unwrap_or_default();
}

/// Builds the dummy hash up front so the first unknown-email login is not
/// slower than the rest.
pub fn prepare_login() {
    lazy_static::initialize(&DUMMY_HASH);
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Length is counted in characters, not bytes.
pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(&c);
    if !password.chars().all(allowed) {
        return Err(AppError::validation(
            "Password may only contain letters, digits and ? ! @ % $ £",
        ));
    }
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(&c));
    if !(has_lower && has_upper && has_digit && has_special) {
        return Err(AppError::validation(
            "Password must contain a lowercase letter, an uppercase letter, a digit and one of ? ! @ % $ £",
        ));
    }
    Ok(())
}

fn issue_response(state: &AppState, id: uuid::Uuid, email: String) -> AppResult<AuthResponse> {
    let token = TokenService::from_ref(state)
        .issue(id, &email)
        .context("sign token")?;
    Ok(AuthResponse {
        token,
        user: PublicUser { id, email },
    })
}

pub async fn register(state: &AppState, payload: RegisterRequest) -> AppResult<AuthResponse> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        return Err(AppError::validation("Invalid email"));
    }
    validate_password(&payload.password)?;
    if payload.password != payload.confirm_password {
        return Err(AppError::validation("Passwords don't match"));
    }

    // fast path only; the store's unique constraint decides races
    if state.accounts.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password = payload.password;
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("hash task")??;

    let account = match state.accounts.create(&email, &hash).await {
        Ok(a) => a,
        Err(StoreError::UniqueViolation(_)) => {
            warn!(email = %email, "email registered concurrently");
            return Err(AppError::Conflict("Email already registered".into()));
        }
        Err(e) => return Err(e.into()),
    };

    info!(account_id = %account.id, email = %account.email, "account registered");
    issue_response(state, account.id, account.email)
}

/// Unknown email and wrong password produce the same error so that the
/// endpoint cannot be used to probe for registered addresses.
pub async fn authenticate(state: &AppState, payload: LoginRequest) -> AppResult<AuthResponse> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::validation("Some required fields are missing"));
    }

    let account = state.accounts.find_by_email(&email).await?;
    let stored_hash = account
        .as_ref()
        .map(|a| a.password_hash.clone())
        .unwrap_or_else(|| DUMMY_HASH.clone());

    let password = payload.password;
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .context("verify task")?;

    let account = match account {
        Some(a) if verified => a,
        Some(a) => {
            warn!(account_id = %a.id, "login invalid password");
            return Err(AuthError::InvalidCredentials.into());
        }
        None => {
            warn!(email = %email, "login unknown email");
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    info!(account_id = %account.id, "account logged in");
    issue_response(state, account.id, account.email)
}

pub async fn current_user(state: &AppState, identity: &Identity) -> AppResult<PublicUser> {
    let account = state
        .accounts
        .find_by_id(identity.account_id)
        .await?
        .ok_or(AuthError::UnknownAccount)?;
    Ok(PublicUser {
        id: account.id,
        email: account.email,
    })
}

/// Public profile of any account, for an authenticated caller.
pub async fn find_user(state: &AppState, id: uuid::Uuid) -> AppResult<PublicUser> {
    let account = state
        .accounts
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(PublicUser {
        id: account.id,
        email: account.email,
    })
}
