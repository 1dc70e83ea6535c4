//! Shared application state
//!
//! Collaborators are injected here as trait objects; the codec and strategy
//! are built from them on demand instead of being registered globally.

use std::sync::Arc;
use std::time::Duration;

use gatehouse_shared::UserDirectory;

use crate::{
    auth::{IdentityCodec, PasswordStrategy, SessionStore},
    config::Config,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub directory: Arc<dyn UserDirectory>,
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        directory: Arc<dyn UserDirectory>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            directory,
            sessions,
        }
    }

    pub fn codec(&self) -> IdentityCodec {
        IdentityCodec::new(self.directory.clone())
    }

    pub fn strategy(&self) -> PasswordStrategy {
        PasswordStrategy::new(self.directory.clone())
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.config.session_ttl_seconds)
    }
}
