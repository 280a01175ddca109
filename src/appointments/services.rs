//! Ownership rules for appointments.
//!
//! Listings come in two named shapes: `list_owned` (the caller's rows) and
//! `list_global` (every row, mounted only when explicitly enabled). Single
//! record operations check ownership before acting and then write with the
//! owner in the store predicate, so a concurrent change cannot slip through.

use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::AppointmentInput,
    query::{ListQuery, Page, Scope},
    repo_types::{Appointment, AppointmentChanges, NewAppointment},
};
use crate::{
    auth::claims::Identity,
    error::{AppError, AppResult},
    state::AppState,
};

const ENTITY: &str = "Appointment";

async fn list_scoped(state: &AppState, scope: Scope, query: ListQuery) -> AppResult<Page<Appointment>> {
    let (total, data) = tokio::try_join!(
        state.appointments.count(scope),
        state.appointments.list(scope, &query),
    )?;
    Ok(Page {
        total,
        page: query.page,
        limit: query.limit,
        data,
    })
}

pub async fn list_owned(
    state: &AppState,
    identity: &Identity,
    query: ListQuery,
) -> AppResult<Page<Appointment>> {
    list_scoped(state, Scope::Owner(identity.account_id), query).await
}

pub async fn list_global(
    state: &AppState,
    identity: &Identity,
    query: ListQuery,
) -> AppResult<Page<Appointment>> {
    info!(account_id = %identity.account_id, "global appointment listing");
    list_scoped(state, Scope::All, query).await
}

fn ensure_owner(appointment: &Appointment, identity: &Identity) -> AppResult<()> {
    if appointment.owner_id != identity.account_id {
        warn!(
            appointment_id = %appointment.id,
            account_id = %identity.account_id,
            "appointment owned by another account"
        );
        return Err(AppError::Forbidden(ENTITY));
    }
    Ok(())
}

async fn load_owned(state: &AppState, identity: &Identity, id: Uuid) -> AppResult<Appointment> {
    let appointment = state
        .appointments
        .get(id)
        .await?
        .ok_or(AppError::NotFound(ENTITY))?;
    ensure_owner(&appointment, identity)?;
    Ok(appointment)
}

fn validated_description(raw: &str) -> AppResult<String> {
    let description = raw.trim();
    if description.is_empty() {
        return Err(AppError::validation("Description is required"));
    }
    Ok(description.to_string())
}

pub async fn get_owned(state: &AppState, identity: &Identity, id: Uuid) -> AppResult<Appointment> {
    load_owned(state, identity, id).await
}

pub async fn create(
    state: &AppState,
    identity: &Identity,
    input: AppointmentInput,
) -> AppResult<Appointment> {
    let new = NewAppointment {
        description: validated_description(&input.description)?,
        completed: input.completed,
        due_date: input.due_date,
        category_id: input.category_id,
        owner_id: identity.account_id,
        now: OffsetDateTime::now_utc(),
    };
    let appointment = state.appointments.create(new).await?;
    info!(appointment_id = %appointment.id, account_id = %identity.account_id, "appointment created");
    Ok(appointment)
}

pub async fn update_owned(
    state: &AppState,
    identity: &Identity,
    id: Uuid,
    input: AppointmentInput,
) -> AppResult<Appointment> {
    let changes = AppointmentChanges {
        description: validated_description(&input.description)?,
        completed: input.completed,
        due_date: input.due_date,
        category_id: input.category_id,
        now: OffsetDateTime::now_utc(),
    };
    load_owned(state, identity, id).await?;

    let appointment = state
        .appointments
        .update(id, identity.account_id, changes)
        .await?
        .ok_or(AppError::NotFound(ENTITY))?;
    info!(appointment_id = %id, "appointment updated");
    Ok(appointment)
}

pub async fn delete_owned(state: &AppState, identity: &Identity, id: Uuid) -> AppResult<()> {
    load_owned(state, identity, id).await?;
    if !state.appointments.delete(id, identity.account_id).await? {
        return Err(AppError::NotFound(ENTITY));
    }
    info!(appointment_id = %id, "appointment deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointments::query::{SortField, SortOrder};

    fn identity() -> Identity {
        let id = Uuid::new_v4();
        Identity {
            account_id: id,
            email: format!("{id}@example.com"),
        }
    }

    fn input(description: &str) -> AppointmentInput {
        AppointmentInput {
            description: description.into(),
            completed: false,
            due_date: None,
            category_id: None,
        }
    }

    fn page(page: u32, limit: u32) -> ListQuery {
        ListQuery {
            page,
            limit,
            ..ListQuery::default()
        }
    }

    async fn seed(state: &AppState, who: &Identity, n: usize) -> Vec<Appointment> {
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            out.push(create(state, who, input(&format!("item {i:02}"))).await.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn pagination_windows_over_fifteen() {
        let state = AppState::fake();
        let alice = identity();
        seed(&state, &alice, 15).await;

        let first = list_owned(&state, &alice, page(1, 10)).await.unwrap();
        assert_eq!(first.total, 15);
        assert_eq!(first.data.len(), 10);

        let second = list_owned(&state, &alice, page(2, 10)).await.unwrap();
        assert_eq!(second.total, 15);
        assert_eq!(second.data.len(), 5);
        assert_eq!((second.page, second.limit), (2, 10));

        let overlap = first
            .data
            .iter()
            .filter(|a| second.data.iter().any(|b| b.id == a.id))
            .count();
        assert_eq!(overlap, 0);

        let beyond = list_owned(&state, &alice, page(3, 10)).await.unwrap();
        assert!(beyond.data.is_empty());
        assert_eq!(beyond.total, 15);
    }

    #[tokio::test]
    async fn owned_listing_never_leaks_other_accounts() {
        let state = AppState::fake();
        let alice = identity();
        let bob = identity();
        seed(&state, &alice, 4).await;
        seed(&state, &bob, 7).await;

        for field in [SortField::Description, SortField::DueDate, SortField::CategoryId] {
            for order in [SortOrder::Asc, SortOrder::Desc] {
                for p in 1..=3 {
                    let q = ListQuery { page: p, limit: 3, sort_by: field, order };
                    let result = list_owned(&state, &alice, q).await.unwrap();
                    assert_eq!(result.total, 4);
                    assert!(result.data.iter().all(|a| a.owner_id == alice.account_id));
                }
            }
        }

        let global = list_global(&state, &alice, page(1, 100)).await.unwrap();
        assert_eq!(global.total, 11);
        assert_eq!(global.data.len(), 11);
    }

    #[tokio::test]
    async fn default_sort_is_creation_date_ascending() {
        let state = AppState::fake();
        let alice = identity();
        seed(&state, &alice, 5).await;

        let result = list_owned(&state, &alice, ListQuery::default()).await.unwrap();
        let dates: Vec<_> = result.data.iter().map(|a| a.creation_date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
    }

    #[tokio::test]
    async fn owner_comes_from_identity() {
        let state = AppState::fake();
        let alice = identity();
        let created = create(&state, &alice, input("dentist")).await.unwrap();
        assert_eq!(created.owner_id, alice.account_id);
        assert_eq!(created.creation_date, created.update_date);
    }

    #[tokio::test]
    async fn blank_description_is_rejected() {
        let state = AppState::fake();
        let err = create(&state, &identity(), input("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_category_is_a_validation_error() {
        let state = AppState::fake();
        let mut body = input("gym");
        body.category_id = Some(Uuid::new_v4());
        let err = create(&state, &identity(), body).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn foreign_update_and_delete_are_refused() {
        let state = AppState::fake();
        let alice = identity();
        let bob = identity();
        let mine = create(&state, &alice, input("mine")).await.unwrap();

        let err = update_owned(&state, &bob, mine.id, input("hijacked")).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let err = delete_owned(&state, &bob, mine.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let err = get_owned(&state, &bob, mine.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let unchanged = get_owned(&state, &alice, mine.id).await.unwrap();
        assert_eq!(unchanged, mine);
    }

    #[tokio::test]
    async fn update_replaces_fields_and_bumps_update_date() {
        let state = AppState::fake();
        let alice = identity();
        let mine = create(&state, &alice, input("before")).await.unwrap();

        let mut body = input("after");
        body.completed = true;
        let updated = update_owned(&state, &alice, mine.id, body).await.unwrap();
        assert_eq!(updated.description, "after");
        assert!(updated.completed);
        assert_eq!(updated.creation_date, mine.creation_date);
        assert!(updated.update_date >= mine.update_date);
        assert_eq!(updated.owner_id, alice.account_id);
    }

    #[tokio::test]
    async fn missing_records_are_not_found() {
        let state = AppState::fake();
        let alice = identity();
        let id = Uuid::new_v4();
        assert!(matches!(get_owned(&state, &alice, id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            update_owned(&state, &alice, id, input("x")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(delete_owned(&state, &alice, id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_removes_the_record() {
        let state = AppState::fake();
        let alice = identity();
        let mine = create(&state, &alice, input("bye")).await.unwrap();
        delete_owned(&state, &alice, mine.id).await.unwrap();
        assert!(matches!(get_owned(&state, &alice, mine.id).await, Err(AppError::NotFound(_))));
        assert_eq!(list_owned(&state, &alice, ListQuery::default()).await.unwrap().total, 0);
    }
}
