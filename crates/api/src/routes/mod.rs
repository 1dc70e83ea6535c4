//! API routes

pub mod auth;

use axum::{
    routing::{delete, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create all API routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/auths/sign-up", post(auth::sign_up))
        .route("/auths/sign-in", post(auth::sign_in))
        .route("/auths/modify-password", post(auth::modify_password))
        .route("/auths/sign-out", delete(auth::sign_out))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
