//! Per-request authentication guard
//!
//! Resolves the session cookie into an [`AuthStatus`] before any handler
//! logic runs. The status is computed fresh on every request; nothing is
//! cached across requests.

use std::time::Duration;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use gatehouse_shared::User;

use crate::{error::ApiError, state::AppState};

use super::session::SessionToken;

/// Cookie carrying the opaque session token.
pub const SESSION_COOKIE: &str = "gh_session";

/// Authentication status of one request.
#[derive(Debug)]
pub enum AuthStatus {
    Anonymous,
    Authenticated(User),
}

/// Guard exposed to the routing layer: the resolved status plus the token it
/// was resolved from (present only while the session is live).
#[derive(Debug)]
pub struct AuthSession {
    token: Option<SessionToken>,
    status: AuthStatus,
}

impl AuthSession {
    pub fn anonymous() -> Self {
        Self {
            token: None,
            status: AuthStatus::Anonymous,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.status, AuthStatus::Authenticated(_))
    }

    pub fn current_user(&self) -> Option<&User> {
        match &self.status {
            AuthStatus::Authenticated(user) => Some(user),
            AuthStatus::Anonymous => None,
        }
    }

    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    pub fn into_user(self) -> Option<User> {
        match self.status {
            AuthStatus::Authenticated(user) => Some(user),
            AuthStatus::Anonymous => None,
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = ApiError;

    /// A missing, destroyed, or expired token resolves to Anonymous; only a
    /// store or directory failure rejects the request. Resolution completes
    /// before the handler sees the request, so no handler ever acts on a
    /// partially-resolved identity.
    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(header::COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| cookie_value(h, SESSION_COOKIE));

        let Some(raw) = raw else {
            return Ok(Self::anonymous());
        };
        let token = SessionToken::from(raw);

        let Some(identity) = state.sessions.get(&token).await? else {
            return Ok(Self::anonymous());
        };

        match state.codec().deserialize(&identity).await? {
            Some(user) => Ok(Self {
                token: Some(token),
                status: AuthStatus::Authenticated(user),
            }),
            // Session exists but the backing user is gone: no session.
            None => Ok(Self::anonymous()),
        }
    }
}

/// `Set-Cookie` value establishing a session.
pub fn session_cookie(token: &SessionToken, ttl: Duration) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ttl.as_secs()
    )
}

/// `Set-Cookie` value expiring the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_value_finds_the_right_pair() {
        let header = "theme=dark; gh_session=abc123; lang=en";
        assert_eq!(cookie_value(header, SESSION_COOKIE), Some("abc123"));
        assert_eq!(cookie_value(header, "lang"), Some("en"));
        assert_eq!(cookie_value(header, "missing"), None);
    }

    #[test]
    fn anonymous_guard_has_no_user_or_token() {
        let guard = AuthSession::anonymous();
        assert!(!guard.is_authenticated());
        assert!(guard.current_user().is_none());
        assert!(guard.token().is_none());
    }
}
