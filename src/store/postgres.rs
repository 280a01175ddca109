use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use super::{AccountStore, AppointmentStore, CategoryStore, StoreError, StoreResult};
use crate::{
    appointments::{
        query::{ListQuery, Scope},
        repo_types::{Appointment, AppointmentChanges, NewAppointment},
    },
    auth::repo_types::Account,
    categories::repo_types::Category,
};

const APPOINTMENT_COLUMNS: &str =
    "id, description, completed, creation_date, update_date, due_date, category_id, owner_id";

#[derive(Clone)]
pub struct PgStore {
    pub db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")
    }
}

fn classify(e: sqlx::Error, unique: &'static str) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::UniqueViolation(unique);
        }
        if db.is_foreign_key_violation() {
            if let Some(entity) = foreign_key_entity(db.constraint()) {
                return StoreError::ForeignKeyViolation(entity);
            }
        }
    }
    StoreError::Database(e)
}

/// Client-facing foreign keys. A broken `owner_id` reference is a server fault.
fn foreign_key_entity(constraint: Option<&str>) -> Option<&'static str> {
    match constraint? {
        "appointments_category_id_fkey" => Some("Category"),
        _ => None,
    }
}

fn owner_filter(scope: Scope) -> Option<Uuid> {
    match scope {
        Scope::Owner(id) => Some(id),
        Scope::All => None,
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"SELECT id, email, password_hash, created_at FROM accounts WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn create(&self, email: &str, password_hash: &str) -> StoreResult<Account> {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| classify(e, "Account"))
    }
}

#[async_trait]
impl AppointmentStore for PgStore {
    async fn create(&self, new: NewAppointment) -> StoreResult<Appointment> {
        let sql = format!(
            r#"
            INSERT INTO appointments
                (id, description, completed, creation_date, update_date, due_date, category_id, owner_id)
            VALUES ($1, $2, $3, $4, $4, $5, $6, $7)
            RETURNING {APPOINTMENT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Appointment>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.description)
            .bind(new.completed)
            .bind(new.now)
            .bind(new.due_date)
            .bind(new.category_id)
            .bind(new.owner_id)
            .fetch_one(&self.db)
            .await
            .map_err(|e| classify(e, "Appointment"))
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1");
        let row = sqlx::query_as::<_, Appointment>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn list(&self, scope: Scope, query: &ListQuery) -> StoreResult<Vec<Appointment>> {
        // column and direction come from closed enums, never from raw input
        let sql = format!(
            r#"
            SELECT {APPOINTMENT_COLUMNS}
            FROM appointments
            WHERE ($1::uuid IS NULL OR owner_id = $1)
            ORDER BY {col} {dir} NULLS LAST, id ASC
            LIMIT $2 OFFSET $3
            "#,
            col = query.sort_by.column(),
            dir = query.order.sql(),
        );
        let rows = sqlx::query_as::<_, Appointment>(&sql)
            .bind(owner_filter(scope))
            .bind(query.take() as i64)
            .bind(query.skip() as i64)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn count(&self, scope: Scope) -> StoreResult<u64> {
        let total: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM appointments WHERE ($1::uuid IS NULL OR owner_id = $1)"#,
        )
        .bind(owner_filter(scope))
        .fetch_one(&self.db)
        .await?;
        Ok(total.max(0) as u64)
    }

    async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        changes: AppointmentChanges,
    ) -> StoreResult<Option<Appointment>> {
        let sql = format!(
            r#"
            UPDATE appointments
               SET description = $3, completed = $4, due_date = $5,
                   category_id = $6, update_date = $7
             WHERE id = $1 AND owner_id = $2
            RETURNING {APPOINTMENT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Appointment>(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(&changes.description)
            .bind(changes.completed)
            .bind(changes.due_date)
            .bind(changes.category_id)
            .bind(changes.now)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| classify(e, "Appointment"))
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> StoreResult<bool> {
        let done = sqlx::query(r#"DELETE FROM appointments WHERE id = $1 AND owner_id = $2"#)
            .bind(id)
            .bind(owner_id)
            .execute(&self.db)
            .await?;
        Ok(done.rows_affected() > 0)
    }
}

#[async_trait]
impl CategoryStore for PgStore {
    async fn create(&self, name: &str) -> StoreResult<Category> {
        sqlx::query_as::<_, Category>(
            r#"INSERT INTO categories (id, name) VALUES ($1, $2) RETURNING id, name"#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.db)
        .await
        .map_err(|e| classify(e, "Category"))
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(r#"SELECT id, name FROM categories WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn list(&self) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(r#"SELECT id, name FROM categories ORDER BY name ASC"#)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }
}
