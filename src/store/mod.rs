//! Persistence contracts used by the services.
//!
//! Every write is a single call so a cancelled request never leaves a
//! half-applied change behind. Uniqueness of account emails and category
//! names is enforced here, not by the services' pre-checks.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    appointments::{
        query::{ListQuery, Scope},
        repo_types::{Appointment, AppointmentChanges, NewAppointment},
    },
    auth::repo_types::Account,
    categories::repo_types::Category,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} already exists")]
    UniqueViolation(&'static str),
    #[error("referenced {0} does not exist")]
    ForeignKeyViolation(&'static str),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>>;
    /// Fails with `UniqueViolation` when the email is taken.
    async fn create(&self, email: &str, password_hash: &str) -> StoreResult<Account>;
}

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn create(&self, new: NewAppointment) -> StoreResult<Appointment>;
    async fn get(&self, id: Uuid) -> StoreResult<Option<Appointment>>;
    async fn list(&self, scope: Scope, query: &ListQuery) -> StoreResult<Vec<Appointment>>;
    async fn count(&self, scope: Scope) -> StoreResult<u64>;
    /// Applies only when `owner_id` still owns the row.
    async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        changes: AppointmentChanges,
    ) -> StoreResult<Option<Appointment>>;
    /// Returns whether a row owned by `owner_id` was removed.
    async fn delete(&self, id: Uuid, owner_id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn create(&self, name: &str) -> StoreResult<Category>;
    async fn get(&self, id: Uuid) -> StoreResult<Option<Category>>;
    async fn list(&self) -> StoreResult<Vec<Category>>;
}
