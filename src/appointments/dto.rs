use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// Body for create and update (full replacement). Unknown fields such as
/// `ownerId` or `authorId` are ignored: the owner always comes from the token.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentInput {
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
}
