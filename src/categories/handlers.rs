use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::repo_types::Category;
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    extract::{ApiJson, ApiPath},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CategoryInput {
    pub name: String,
}

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/:id", get(get_category))
}

#[instrument(skip(state, _identity))]
pub async fn list_categories(
    State(state): State<AppState>,
    AuthUser(_identity): AuthUser,
) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(state.categories.list().await?))
}

#[instrument(skip(state, _identity))]
pub async fn get_category(
    State(state): State<AppState>,
    AuthUser(_identity): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Category>> {
    state
        .categories
        .get(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Category"))
}

#[instrument(skip(state, identity), fields(account_id = %identity.account_id))]
pub async fn create_category(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiJson(body): ApiJson<CategoryInput>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    let category = state.categories.create(name).await?;
    info!(category_id = %category.id, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}
