pub mod auth;
pub mod dto;
pub mod errors;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::store::{ReadingStore, UserStore};

use handlers::ApiDoc;

/// Shared handler dependencies. Stores are trait objects so tests can swap
/// the Postgres implementations for in-memory fakes.
#[derive(Clone)]
pub struct AppState {
    pub readings: Arc<dyn ReadingStore>,
    pub users: Arc<dyn UserStore>,
    pub superadmin_email: String,
}

pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/api/readings", post(handlers::create_reading))
        .route("/api/latest_reading", get(handlers::latest_reading))
        .route(
            "/api/users",
            post(handlers::create_user).get(handlers::list_users),
        )
        .route("/api/profile", put(handlers::update_profile))
        .route("/api/make_admin", post(handlers::make_admin))
        .with_state(state)
        .split_for_parts();

    router
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
}
