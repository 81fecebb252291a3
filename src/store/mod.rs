//! Storage traits for readings and users.
//!
//! Handlers receive `Arc<dyn ReadingStore>` / `Arc<dyn UserStore>` through
//! shared state, so the Postgres implementations can be swapped for
//! in-memory fakes in tests.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::db::models::{Reading, Role, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// A validated, flagged reading ready for insertion. The store assigns the
/// id and the `recorded_at` timestamp.
#[derive(Debug, Clone)]
pub struct NewReading {
    pub device_id: String,
    pub user_id: Option<String>,
    pub cholesterol: f64,
    pub sugar: f64,
    pub fever: f64,
    pub alert: bool,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// Partial profile update; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub auto_save: Option<bool>,
    pub poll_interval_secs: Option<i32>,
}

#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Append one reading. Existing rows are never touched.
    async fn insert(&self, new: NewReading) -> Result<Reading, StoreError>;

    /// The reading with the maximum `recorded_at` among those owned by
    /// `user_id`, ties broken by maximum `id` so exactly one row wins.
    async fn latest_for_user(&self, user_id: &str) -> Result<Option<Reading>, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new: NewUser) -> Result<User, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Returns the updated user, or `None` if `id` no longer resolves.
    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<User>, StoreError>;

    async fn set_role(&self, id: Uuid, role: Role) -> Result<(), StoreError>;

    async fn list(&self) -> Result<Vec<User>, StoreError>;
}
