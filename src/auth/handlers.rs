use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        extractors::AuthUser,
        services,
    },
    error::AppResult,
    extract::{ApiJson, ApiPath},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(get_me))
        .route("/users/:id", get(get_user))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    services::register(&state, payload).await.map(Json)
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    services::authenticate(&state, payload).await.map(Json)
}

#[instrument(skip(state, identity), fields(account_id = %identity.account_id))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> AppResult<Json<PublicUser>> {
    services::current_user(&state, &identity).await.map(Json)
}

#[instrument(skip(state, identity), fields(account_id = %identity.account_id))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<PublicUser>> {
    services::find_user(&state, id).await.map(Json)
}

#[cfg(test)]
mod me_tests {
    use super::*;

    #[test]
    fn public_user_serialization() {
        let response = PublicUser {
            id: uuid::Uuid::new_v4(),
            email: "test@example.com".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("id"));
        assert!(!json.contains("password"));
    }
}
