use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::AppointmentInput,
    query::{ListParams, ListQuery, Page},
    repo_types::Appointment,
    services,
};
use crate::{
    auth::extractors::AuthUser,
    error::AppResult,
    extract::{ApiJson, ApiPath, ApiQuery},
    state::AppState,
};

pub fn owned_routes() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(list_appointments).post(create_appointment))
        .route(
            "/appointments/:id",
            get(get_appointment)
                .put(update_appointment)
                .delete(delete_appointment),
        )
}

/// Every account's appointments. Only mounted when the deployment opts in.
pub fn global_routes() -> Router<AppState> {
    Router::new().route("/admin/appointments", get(list_all_appointments))
}

#[instrument(skip(state, identity), fields(account_id = %identity.account_id))]
pub async fn list_appointments(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiQuery(params): ApiQuery<ListParams>,
) -> AppResult<Json<Page<Appointment>>> {
    let query = ListQuery::try_from(params)?;
    services::list_owned(&state, &identity, query).await.map(Json)
}

#[instrument(skip(state, identity), fields(account_id = %identity.account_id))]
pub async fn list_all_appointments(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiQuery(params): ApiQuery<ListParams>,
) -> AppResult<Json<Page<Appointment>>> {
    let query = ListQuery::try_from(params)?;
    services::list_global(&state, &identity, query).await.map(Json)
}

#[instrument(skip(state, identity), fields(account_id = %identity.account_id))]
pub async fn get_appointment(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Appointment>> {
    services::get_owned(&state, &identity, id).await.map(Json)
}

#[instrument(skip(state, identity, body), fields(account_id = %identity.account_id))]
pub async fn create_appointment(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiJson(body): ApiJson<AppointmentInput>,
) -> AppResult<impl IntoResponse> {
    let appointment = services::create(&state, &identity, body).await?;
    let location = format!("/api/v1/appointments/{}", appointment.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(appointment),
    ))
}

#[instrument(skip(state, identity, body), fields(account_id = %identity.account_id))]
pub async fn update_appointment(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<AppointmentInput>,
) -> AppResult<Json<Appointment>> {
    services::update_owned(&state, &identity, id, body).await.map(Json)
}

#[instrument(skip(state, identity), fields(account_id = %identity.account_id))]
pub async fn delete_appointment(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    services::delete_owned(&state, &identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
