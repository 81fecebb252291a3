use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Substituted for `device_id` when a submission omits it.
pub const UNKNOWN_DEVICE_ID: &str = "unknown-device";

/// Mirrors the `user_role` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::User => "user",
            Role::Admin => "admin",
        })
    }
}

/// One immutable health-reading submission.
///
/// `alert` is derived from the three measurements at insertion time and
/// stored alongside them; rows are never updated after creation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Reading {
    pub id: Uuid,
    pub device_id: String,
    /// Opaque reference to the owning user. No referential integrity:
    /// absent or stale values are stored as-is.
    pub user_id: Option<String>,
    pub cholesterol: f64,
    pub sugar: f64,
    pub fever: f64,
    /// Server-assigned at insertion, monotonically non-decreasing in
    /// insertion order. Not globally unique.
    pub recorded_at: DateTime<Utc>,
    pub alert: bool,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub auto_save: bool,
    /// Client polling interval preference, in seconds.
    pub poll_interval_secs: i32,
    pub created_at: DateTime<Utc>,
}
