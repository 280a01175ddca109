//! In-process store for development and tests. Mirrors the constraints of the
//! Postgres schema: unique emails and category names, category references
//! must exist, and listings order nulls last with ties broken by id.

use std::{cmp::Ordering, collections::HashMap};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AccountStore, AppointmentStore, CategoryStore, StoreError, StoreResult};
use crate::{
    appointments::{
        query::{ListQuery, Scope, SortField, SortOrder},
        repo_types::{Appointment, AppointmentChanges, NewAppointment},
    },
    auth::repo_types::Account,
    categories::repo_types::Category,
};

#[derive(Default)]
pub struct InMemoryStore {
    accounts: RwLock<HashMap<Uuid, Account>>,
    // locked before `appointments` whenever both are held
    categories: RwLock<HashMap<Uuid, Category>>,
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn in_scope(a: &Appointment, scope: Scope) -> bool {
    match scope {
        Scope::Owner(owner) => a.owner_id == owner,
        Scope::All => true,
    }
}

fn directed(ord: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ord,
        SortOrder::Desc => ord.reverse(),
    }
}

fn nulls_last<T: Ord>(a: &Option<T>, b: &Option<T>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => directed(x.cmp(y), order),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare(a: &Appointment, b: &Appointment, query: &ListQuery) -> Ordering {
    let primary = match query.sort_by {
        SortField::Description => directed(a.description.cmp(&b.description), query.order),
        SortField::CreationDate => directed(a.creation_date.cmp(&b.creation_date), query.order),
        SortField::UpdateDate => directed(a.update_date.cmp(&b.update_date), query.order),
        SortField::DueDate => nulls_last(&a.due_date, &b.due_date, query.order),
        SortField::CategoryId => nulls_last(&a.category_id, &b.category_id, query.order),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

fn check_category(
    categories: &HashMap<Uuid, Category>,
    category_id: Option<Uuid>,
) -> StoreResult<()> {
    match category_id {
        Some(id) if !categories.contains_key(&id) => Err(StoreError::ForeignKeyViolation("Category")),
        _ => Ok(()),
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn create(&self, email: &str, password_hash: &str) -> StoreResult<Account> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email == email) {
            return Err(StoreError::UniqueViolation("Account"));
        }
        let account = Account {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        accounts.insert(account.id, account.clone());
        Ok(account)
    }
}

#[async_trait]
impl AppointmentStore for InMemoryStore {
    async fn create(&self, new: NewAppointment) -> StoreResult<Appointment> {
        let categories = self.categories.read().await;
        check_category(&categories, new.category_id)?;

        let appointment = Appointment {
            id: Uuid::new_v4(),
            description: new.description,
            completed: new.completed,
            creation_date: new.now,
            update_date: new.now,
            due_date: new.due_date,
            category_id: new.category_id,
            owner_id: new.owner_id,
        };
        self.appointments
            .write()
            .await
            .insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        Ok(self.appointments.read().await.get(&id).cloned())
    }

    async fn list(&self, scope: Scope, query: &ListQuery) -> StoreResult<Vec<Appointment>> {
        let appointments = self.appointments.read().await;
        let mut rows: Vec<&Appointment> =
            appointments.values().filter(|a| in_scope(a, scope)).collect();
        rows.sort_by(|a, b| compare(a, b, query));
        Ok(rows
            .into_iter()
            .skip(query.skip() as usize)
            .take(query.take() as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, scope: Scope) -> StoreResult<u64> {
        let appointments = self.appointments.read().await;
        Ok(appointments.values().filter(|a| in_scope(a, scope)).count() as u64)
    }

    async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        changes: AppointmentChanges,
    ) -> StoreResult<Option<Appointment>> {
        let categories = self.categories.read().await;
        let mut appointments = self.appointments.write().await;
        let Some(row) = appointments.get_mut(&id).filter(|a| a.owner_id == owner_id) else {
            return Ok(None);
        };
        check_category(&categories, changes.category_id)?;

        row.description = changes.description;
        row.completed = changes.completed;
        row.due_date = changes.due_date;
        row.category_id = changes.category_id;
        row.update_date = changes.now;
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> StoreResult<bool> {
        let mut appointments = self.appointments.write().await;
        match appointments.get(&id) {
            Some(a) if a.owner_id == owner_id => {
                appointments.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl CategoryStore for InMemoryStore {
    async fn create(&self, name: &str) -> StoreResult<Category> {
        let mut categories = self.categories.write().await;
        if categories.values().any(|c| c.name == name) {
            return Err(StoreError::UniqueViolation("Category"));
        }
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Category>> {
        Ok(self.categories.read().await.get(&id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Category>> {
        let mut rows: Vec<Category> = self.categories.read().await.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }
}
