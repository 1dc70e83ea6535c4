//! Gatehouse API Library
//!
//! Session-backed authentication service: credential registration and
//! verification, session identity resolution, and session termination.

pub mod auth;
pub mod config;
pub mod error;
pub mod messages;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
