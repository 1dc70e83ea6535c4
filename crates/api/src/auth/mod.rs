//! Authentication core for Gatehouse

pub mod guard;
pub mod identity;
pub mod password;
pub mod session;
pub mod strategy;

pub use guard::{
    clear_session_cookie, session_cookie, AuthSession, AuthStatus, SESSION_COOKIE,
};
pub use identity::{IdentityCodec, SerializedIdentity};
pub use password::{
    hash_password, hash_password_blocking, verify_password, verify_password_blocking,
    PasswordError,
};
pub use session::{
    MemorySessionStore, RedisSessionStore, SessionStore, SessionStoreError, SessionToken,
};
pub use strategy::{PasswordStrategy, StrategyError, VerificationOutcome, VerificationStrategy};
