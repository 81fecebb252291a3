use axum::{extract::State, http::StatusCode, Json};
use tracing::info;
use utoipa::OpenApi;

use crate::{
    alert,
    db::models::{Role, User, UNKNOWN_DEVICE_ID},
    store::{NewReading, NewUser, ProfileChanges},
};

use super::{
    auth::Caller,
    dto::{
        IngestResponse, LatestReadingResponse, MessageResponse, NewReadingRequest, NewUserRequest,
        PromoteRequest, ReadingDto, UpdateProfileRequest, UserDto,
    },
    errors::ApiError,
    AppState,
};

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// Ingest one reading submitted by a device.
///
/// Coerces the measurements, evaluates the alert flag, and appends the
/// flagged record. A missing `device_id` falls back to the sentinel value;
/// `user_id` is stored as-is, without checking it resolves to an account.
#[utoipa::path(
    post,
    path = "/api/readings",
    request_body = NewReadingRequest,
    responses(
        (status = 201, description = "Reading stored", body = IngestResponse),
        (status = 400, description = "Measurements not numeric-coercible"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "readings"
)]
pub async fn create_reading(
    State(state): State<AppState>,
    Json(payload): Json<NewReadingRequest>,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    let (cholesterol, sugar, fever) = payload.measurements()?;
    let device_id = payload
        .device_id
        .unwrap_or_else(|| UNKNOWN_DEVICE_ID.to_owned());

    let alert = alert::evaluate(cholesterol, sugar, fever);

    let reading = state
        .readings
        .insert(NewReading {
            device_id,
            user_id: payload.user_id,
            cholesterol,
            sugar,
            fever,
            alert,
        })
        .await?;

    info!(device_id = %reading.device_id, alert, "Reading stored");

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            message: "reading saved".to_owned(),
            alert,
        }),
    ))
}

/// Fetch the most recent reading owned by the caller.
///
/// Zero matching readings is not an error: the response carries an
/// informational message instead.
#[utoipa::path(
    get,
    path = "/api/latest_reading",
    params(
        ("x-caller-id" = String, Header, description = "Resolved caller identity"),
    ),
    responses(
        (status = 200, description = "Latest reading, or a no-readings-yet message", body = LatestReadingResponse),
        (status = 401, description = "No caller identity"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "readings"
)]
pub async fn latest_reading(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<LatestReadingResponse>, ApiError> {
    let latest = state.readings.latest_for_user(&caller.0).await?;

    Ok(Json(match latest {
        Some(reading) => LatestReadingResponse::Reading(ReadingDto::from(reading)),
        None => LatestReadingResponse::NoReadings {
            message: "No readings yet".to_owned(),
        },
    }))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Provision an account. The configured superadmin email registers directly
/// as an administrator; everyone else starts as a regular user.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = NewUserRequest,
    responses(
        (status = 201, description = "Account created", body = UserDto),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<NewUserRequest>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let role = if payload.email == state.superadmin_email {
        Role::Admin
    } else {
        Role::User
    };

    let user = state
        .users
        .create(NewUser {
            username: payload.username,
            email: payload.email,
            role,
        })
        .await?;

    info!(user_id = %user.id, role = %user.role, "Account created");

    Ok((StatusCode::CREATED, Json(UserDto::from(user))))
}

/// Update the caller's profile preferences. Omitted fields are left as-is.
#[utoipa::path(
    put,
    path = "/api/profile",
    request_body = UpdateProfileRequest,
    params(
        ("x-caller-id" = String, Header, description = "Resolved caller identity"),
    ),
    responses(
        (status = 200, description = "Profile updated", body = MessageResponse),
        (status = 401, description = "No caller identity, or identity does not resolve to an account"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "users"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user_id = caller.user_id()?;

    let changes = ProfileChanges {
        username: payload.username,
        email: payload.email,
        auto_save: payload.auto_save,
        poll_interval_secs: payload.poll_interval_secs,
    };

    state
        .users
        .update_profile(user_id, changes)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    Ok(Json(MessageResponse {
        message: "profile updated".to_owned(),
    }))
}

/// Promote an account to administrator. Only the superadmin may call this.
#[utoipa::path(
    post,
    path = "/api/make_admin",
    request_body = PromoteRequest,
    params(
        ("x-caller-id" = String, Header, description = "Resolved caller identity"),
    ),
    responses(
        (status = 200, description = "Account promoted", body = MessageResponse),
        (status = 401, description = "No caller identity"),
        (status = 403, description = "Caller is not the superadmin"),
        (status = 404, description = "No account with that email"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "users"
)]
pub async fn make_admin(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<PromoteRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let account = require_account(&state, &caller).await?;
    if account.email != state.superadmin_email {
        return Err(ApiError::Forbidden);
    }

    let target = state
        .users
        .find_by_email(&payload.email)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    state.users.set_role(target.id, Role::Admin).await?;

    info!(email = %payload.email, "Account promoted to admin");

    Ok(Json(MessageResponse {
        message: format!("{} is now an administrator", payload.email),
    }))
}

/// List every account. Requires the `admin` role.
#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("x-caller-id" = String, Header, description = "Resolved caller identity"),
    ),
    responses(
        (status = 200, description = "All accounts", body = Vec<UserDto>),
        (status = 401, description = "No caller identity"),
        (status = 403, description = "Caller is not an admin"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<UserDto>>, ApiError> {
    let account = require_account(&state, &caller).await?;
    if account.role != Role::Admin {
        return Err(ApiError::Forbidden);
    }

    let users = state.users.list().await?;
    Ok(Json(users.into_iter().map(UserDto::from).collect()))
}

/// Resolve the caller to an account, rejecting identities that no longer
/// exist.
async fn require_account(state: &AppState, caller: &Caller) -> Result<User, ApiError> {
    let user_id = caller.user_id()?;
    state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(ApiError::Unauthenticated)
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        create_reading,
        latest_reading,
        create_user,
        update_profile,
        make_admin,
        list_users,
        health,
    ),
    components(schemas(
        NewReadingRequest,
        IngestResponse,
        ReadingDto,
        LatestReadingResponse,
        NewUserRequest,
        UpdateProfileRequest,
        PromoteRequest,
        UserDto,
        MessageResponse,
        Role,
    )),
    tags(
        (name = "readings", description = "Health reading ingestion and queries"),
        (name = "users",    description = "Account management"),
        (name = "system",   description = "System endpoints"),
    ),
    info(
        title = "Sensor Health API",
        version = "0.1.0",
        description = "REST API for sensor-derived health readings"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
