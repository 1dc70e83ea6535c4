//! Authentication routes

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use gatehouse_shared::{PublicUser, User};

use crate::{
    auth::{
        clear_session_cookie, hash_password_blocking, session_cookie, AuthSession,
        VerificationOutcome, VerificationStrategy,
    },
    error::{ApiError, ApiResult},
    messages,
    state::AppState,
};

// =============================================================================
// Request Types
// =============================================================================

// Fields are optional so a missing field surfaces as the contract's
// `non_field_errors` response instead of a body-deserialization rejection.

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ModifyPasswordRequest {
    pub password: Option<String>,
}

fn require(field: Option<String>) -> ApiResult<String> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ApiError::Validation),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new user and establish a session for them.
///
/// Validation and the duplicate-email check run before anything is written,
/// so a rejected sign-up mutates nothing. The directory's uniqueness
/// constraint still backs the up-front check against concurrent sign-ups.
pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> ApiResult<Response> {
    let username = require(req.username)?;
    let password = require(req.password)?;
    let email = require(req.email)?;

    if state.directory.find_by_email(&email).await?.is_some() {
        tracing::warn!(email = %email, "sign_up: email already registered");
        return Err(ApiError::DuplicateEmail);
    }

    let password_hash = hash_password_blocking(password).await?;
    let user = state
        .directory
        .save(&User::new(username, email, password_hash))
        .await?;

    let identity = state.codec().serialize(&user);
    let token = state.sessions.create(&identity, state.session_ttl()).await?;

    tracing::info!(user_id = %user.id, "sign_up: user registered");

    Ok((
        StatusCode::OK,
        [(
            header::SET_COOKIE,
            session_cookie(&token, state.session_ttl()),
        )],
        messages::OK,
    )
        .into_response())
}

/// Sign in with an identifier (username or email) and password.
///
/// Responses take a minimum of 500ms so response timing cannot be used to
/// tell an unknown identifier from a wrong password.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> ApiResult<Response> {
    let start = std::time::Instant::now();
    const MIN_RESPONSE_TIME: std::time::Duration = std::time::Duration::from_millis(500);

    let result = sign_in_inner(&state, req).await;

    let elapsed = start.elapsed();
    if elapsed < MIN_RESPONSE_TIME {
        tokio::time::sleep(MIN_RESPONSE_TIME - elapsed).await;
    }

    result
}

async fn sign_in_inner(state: &AppState, req: SignInRequest) -> ApiResult<Response> {
    let identifier = require(req.username)?;
    let password = require(req.password)?;

    let user = match state.strategy().authenticate(&identifier, &password).await? {
        VerificationOutcome::Verified(user) => user,
        // Distinct reasons were already logged by the strategy; the client
        // gets one indistinguishable response for both.
        VerificationOutcome::UnknownIdentifier | VerificationOutcome::WrongPassword => {
            return Err(ApiError::InvalidCredentials);
        }
    };

    let identity = state.codec().serialize(&user);
    let token = state.sessions.create(&identity, state.session_ttl()).await?;

    tracing::info!(user_id = %user.id, "sign_in: session established");

    Ok((
        StatusCode::OK,
        [(
            header::SET_COOKIE,
            session_cookie(&token, state.session_ttl()),
        )],
        Json(PublicUser::from(&user)),
    )
        .into_response())
}

/// Change the password of the currently authenticated user.
///
/// The hash is written onto the authenticated user's own record; the next
/// guard resolution re-fetches that record, so the change is live on the
/// very next request.
pub async fn modify_password(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(req): Json<ModifyPasswordRequest>,
) -> ApiResult<Response> {
    if !auth.is_authenticated() {
        return Err(ApiError::NotAuthenticated);
    }
    let password = require(req.password)?;

    let mut user = auth.into_user().ok_or(ApiError::NotAuthenticated)?;
    user.password_hash = hash_password_blocking(password).await?;
    user.stamps.touch();

    let saved = state.directory.save(&user).await?;

    tracing::info!(user_id = %saved.id, "modify_password: password updated");

    Ok((StatusCode::OK, messages::OK).into_response())
}

/// Destroy the current session.
///
/// The destroy is awaited and its failure surfaced; success is never
/// reported while the store still holds a usable token.
pub async fn sign_out(State(state): State<AppState>, auth: AuthSession) -> ApiResult<Response> {
    if !auth.is_authenticated() {
        return Err(ApiError::NotAuthenticated);
    }
    let token = auth.token().ok_or(ApiError::NotAuthenticated)?;

    state.sessions.destroy(token).await?;

    tracing::info!("sign_out: session destroyed");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, clear_session_cookie())],
        messages::OK,
    )
        .into_response())
}
