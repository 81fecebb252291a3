use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::{Reading, Role, User};

use super::{NewReading, NewUser, ProfileChanges, ReadingStore, StoreError, UserStore};

#[derive(Debug, Clone)]
pub struct PgReadingStore {
    pool: PgPool,
}

impl PgReadingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadingStore for PgReadingStore {
    async fn insert(&self, new: NewReading) -> Result<Reading, StoreError> {
        let reading = sqlx::query_as::<_, Reading>(
            r#"
            INSERT INTO readings (device_id, user_id, cholesterol, sugar, fever, alert)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, device_id, user_id, cholesterol, sugar, fever, recorded_at, alert
            "#,
        )
        .bind(&new.device_id)
        .bind(&new.user_id)
        .bind(new.cholesterol)
        .bind(new.sugar)
        .bind(new.fever)
        .bind(new.alert)
        .fetch_one(&self.pool)
        .await?;

        Ok(reading)
    }

    async fn latest_for_user(&self, user_id: &str) -> Result<Option<Reading>, StoreError> {
        let reading = sqlx::query_as::<_, Reading>(
            r#"
            SELECT id, device_id, user_id, cholesterol, sugar, fever, recorded_at, alert
            FROM readings
            WHERE user_id = $1
            ORDER BY recorded_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reading)
    }
}

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, role)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, role, auto_save, poll_interval_secs, created_at
            "#,
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(new.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &new.email))?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, role, auto_save, poll_interval_secs, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, role, auto_save, poll_interval_secs, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<User>, StoreError> {
        let email = changes.email.clone().unwrap_or_default();
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username           = COALESCE($2, username),
                email              = COALESCE($3, email),
                auto_save          = COALESCE($4, auto_save),
                poll_interval_secs = COALESCE($5, poll_interval_secs)
            WHERE id = $1
            RETURNING id, username, email, role, auto_save, poll_interval_secs, created_at
            "#,
        )
        .bind(id)
        .bind(&changes.username)
        .bind(&changes.email)
        .bind(changes.auto_save)
        .bind(changes.poll_interval_secs)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &email))?;

        Ok(user)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
            .bind(id)
            .bind(role)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, role, auto_save, poll_interval_secs, created_at
            FROM users
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}

fn map_unique_violation(e: sqlx::Error, email: &str) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::DuplicateEmail(email.to_owned())
        }
        _ => StoreError::Database(e),
    }
}
