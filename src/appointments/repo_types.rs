use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Appointment record in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub description: String,
    pub completed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub creation_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub update_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    pub category_id: Option<Uuid>,
    pub owner_id: Uuid,
}

/// Everything needed for a single insert. `owner_id` always comes from the
/// authenticated identity.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub description: String,
    pub completed: bool,
    pub due_date: Option<OffsetDateTime>,
    pub category_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub now: OffsetDateTime,
}

/// Full replacement of the mutable fields.
#[derive(Debug, Clone)]
pub struct AppointmentChanges {
    pub description: String,
    pub completed: bool,
    pub due_date: Option<OffsetDateTime>,
    pub category_id: Option<Uuid>,
    pub now: OffsetDateTime,
}
