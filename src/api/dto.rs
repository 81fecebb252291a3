use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::{Reading, Role, User};

use super::errors::ApiError;

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// Request body for `POST /api/readings`.
///
/// Devices submit loosely-typed payloads: each measurement may arrive as a
/// JSON number or as a numeric string. Coercion happens in
/// [`NewReadingRequest::measurements`]; anything else is rejected whole.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct NewReadingRequest {
    pub device_id: Option<String>,
    pub user_id: Option<String>,
    #[schema(value_type = Option<Value>)]
    pub cholesterol: Option<Value>,
    #[schema(value_type = Option<Value>)]
    pub sugar: Option<Value>,
    #[schema(value_type = Option<Value>)]
    pub fever: Option<Value>,
}

impl NewReadingRequest {
    /// Coerce the three measurement fields to `f64`.
    ///
    /// All three are required; a missing or non-coercible field fails the
    /// whole request, with no partial acceptance.
    pub fn measurements(&self) -> Result<(f64, f64, f64), ApiError> {
        match (
            coerce_f64(self.cholesterol.as_ref()),
            coerce_f64(self.sugar.as_ref()),
            coerce_f64(self.fever.as_ref()),
        ) {
            (Some(c), Some(s), Some(f)) => Ok((c, s, f)),
            _ => Err(ApiError::InvalidInput),
        }
    }
}

fn coerce_f64(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Response for `POST /api/readings`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IngestResponse {
    pub message: String,
    /// The alert flag assigned to the stored reading.
    pub alert: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReadingDto {
    pub id: Uuid,
    pub device_id: String,
    pub user_id: Option<String>,
    pub cholesterol: f64,
    pub sugar: f64,
    pub fever: f64,
    /// RFC 3339 timestamp assigned by the server at insertion.
    pub timestamp: DateTime<Utc>,
    pub alert: bool,
}

impl From<Reading> for ReadingDto {
    fn from(r: Reading) -> Self {
        Self {
            id: r.id,
            device_id: r.device_id,
            user_id: r.user_id,
            cholesterol: r.cholesterol,
            sugar: r.sugar,
            fever: r.fever,
            timestamp: r.recorded_at,
            alert: r.alert,
        }
    }
}

/// Response for `GET /api/latest_reading`: the caller's most recent reading,
/// or an informational message when none exist yet. The empty case is not
/// an error.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum LatestReadingResponse {
    Reading(ReadingDto),
    NoReadings { message: String },
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Request body for `POST /api/users`. Credentials are handled by the
/// external session collaborator and never pass through this service.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NewUserRequest {
    pub username: String,
    pub email: String,
}

/// Request body for `PUT /api/profile`. Omitted fields keep their current
/// value.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub auto_save: Option<bool>,
    pub poll_interval_secs: Option<i32>,
}

/// Request body for `POST /api/make_admin`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PromoteRequest {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub auto_save: bool,
    pub poll_interval_secs: i32,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            role: u.role,
            auto_save: u.auto_save,
            poll_interval_secs: u.poll_interval_secs,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn request(cholesterol: Value, sugar: Value, fever: Value) -> NewReadingRequest {
        NewReadingRequest {
            cholesterol: Some(cholesterol),
            sugar: Some(sugar),
            fever: Some(fever),
            ..Default::default()
        }
    }

    #[test]
    fn numbers_coerce() {
        let (c, s, f) = request(json!(150), json!(90.5), json!(36.5))
            .measurements()
            .unwrap();
        assert_eq!((c, s, f), (150.0, 90.5, 36.5));
    }

    #[test]
    fn numeric_strings_coerce() {
        let (c, s, f) = request(json!("150"), json!(" 90.5 "), json!("36.5"))
            .measurements()
            .unwrap();
        assert_eq!((c, s, f), (150.0, 90.5, 36.5));
    }

    #[test]
    fn non_numeric_string_is_rejected() {
        let err = request(json!("abc"), json!(90), json!(36.5))
            .measurements()
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput));
    }

    #[test]
    fn missing_measurement_is_rejected() {
        let req = NewReadingRequest {
            cholesterol: Some(json!(150)),
            sugar: Some(json!(90)),
            ..Default::default()
        };
        assert!(matches!(req.measurements(), Err(ApiError::InvalidInput)));
    }

    #[test]
    fn booleans_and_objects_are_rejected() {
        assert!(request(json!(true), json!(90), json!(36.5))
            .measurements()
            .is_err());
        assert!(request(json!({ "value": 150 }), json!(90), json!(36.5))
            .measurements()
            .is_err());
        assert!(request(json!(null), json!(90), json!(36.5))
            .measurements()
            .is_err());
    }
}
