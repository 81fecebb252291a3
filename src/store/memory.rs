//! In-memory store used by handler tests in place of Postgres.
//!
//! Mirrors the SQL implementations' observable behavior, including the
//! latest-reading tie-break on `(recorded_at, id)`.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::db::models::{Reading, Role, User};

use super::{NewReading, NewUser, ProfileChanges, ReadingStore, StoreError, UserStore};

#[derive(Default)]
pub struct MemoryStore {
    readings: Mutex<Vec<Reading>>,
    users: Mutex<Vec<User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a fully-formed reading, bypassing timestamp assignment. Lets
    /// tests construct timestamp collisions.
    pub fn push_reading(&self, reading: Reading) {
        self.readings.lock().unwrap().push(reading);
    }

    pub fn readings_snapshot(&self) -> Vec<Reading> {
        self.readings.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn insert(&self, new: NewReading) -> Result<Reading, StoreError> {
        let reading = Reading {
            id: Uuid::new_v4(),
            device_id: new.device_id,
            user_id: new.user_id,
            cholesterol: new.cholesterol,
            sugar: new.sugar,
            fever: new.fever,
            recorded_at: Utc::now(),
            alert: new.alert,
        };
        self.readings.lock().unwrap().push(reading.clone());
        Ok(reading)
    }

    async fn latest_for_user(&self, user_id: &str) -> Result<Option<Reading>, StoreError> {
        let readings = self.readings.lock().unwrap();
        Ok(readings
            .iter()
            .filter(|r| r.user_id.as_deref() == Some(user_id))
            .max_by_key(|r| (r.recorded_at, r.id))
            .cloned())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::DuplicateEmail(new.email));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            role: new.role,
            auto_save: false,
            poll_interval_secs: 5,
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.lock().unwrap();
        if let Some(email) = &changes.email {
            if users.iter().any(|u| u.id != id && u.email == *email) {
                return Err(StoreError::DuplicateEmail(email.clone()));
            }
        }
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(auto_save) = changes.auto_save {
            user.auto_save = auto_save;
        }
        if let Some(interval) = changes.poll_interval_secs {
            user.poll_interval_secs = interval;
        }
        Ok(Some(user.clone()))
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<(), StoreError> {
        if let Some(user) = self.users.lock().unwrap().iter_mut().find(|u| u.id == id) {
            user.role = role;
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.lock().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn make_reading(user_id: &str, id: Uuid, recorded_at: chrono::DateTime<Utc>) -> Reading {
        Reading {
            id,
            device_id: "dev1".to_owned(),
            user_id: Some(user_id.to_owned()),
            cholesterol: 150.0,
            sugar: 90.0,
            fever: 36.5,
            recorded_at,
            alert: false,
        }
    }

    #[tokio::test]
    async fn latest_is_none_for_unknown_user() {
        let store = MemoryStore::new();
        assert!(store.latest_for_user("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn latest_picks_maximum_timestamp() {
        let store = MemoryStore::new();
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        store.push_reading(make_reading("u1", Uuid::new_v4(), t0));
        let newest = Uuid::new_v4();
        store.push_reading(make_reading("u1", newest, t2));
        store.push_reading(make_reading("u1", Uuid::new_v4(), t1));

        let latest = store.latest_for_user("u1").await.unwrap().unwrap();
        assert_eq!(latest.id, newest);
        assert_eq!(latest.recorded_at, t2);
    }

    #[tokio::test]
    async fn identical_timestamps_break_ties_by_max_id() {
        let store = MemoryStore::new();
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let low = Uuid::from_u128(1);
        let high = Uuid::from_u128(2);
        store.push_reading(make_reading("u1", high, t));
        store.push_reading(make_reading("u1", low, t));

        let latest = store.latest_for_user("u1").await.unwrap().unwrap();
        assert_eq!(latest.id, high, "tie on recorded_at resolves to max id");
    }

    #[tokio::test]
    async fn latest_ignores_other_users_and_anonymous_readings() {
        let store = MemoryStore::new();
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        store.push_reading(make_reading("u2", Uuid::new_v4(), t));
        let mut anonymous = make_reading("u1", Uuid::new_v4(), t);
        anonymous.user_id = None;
        store.push_reading(anonymous);

        assert!(store.latest_for_user("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        store
            .create(NewUser {
                username: "ana".to_owned(),
                email: "ana@example.com".to_owned(),
                role: Role::User,
            })
            .await
            .unwrap();

        let err = store
            .create(NewUser {
                username: "ana2".to_owned(),
                email: "ana@example.com".to_owned(),
                role: Role::User,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail(_)));
    }
}
