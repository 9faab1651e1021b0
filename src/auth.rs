//! Auth Gateway: login, logout and the startup authentication check.
//!
//! The gateway is the only writer of the session. None of its operations fail past their own
//! boundary: network trouble becomes an `AuthError`, a best-effort no-op, or "logged out".

use tracing::{error, info, warn};

use crate::api::ApiClient;
use crate::error::AuthError;
use crate::session::{Session, SessionStore};

#[derive(Clone)]
pub struct AuthGateway {
    api: ApiClient,
    session: SessionStore,
}

impl AuthGateway {
    pub fn new(api: ApiClient, session: SessionStore) -> Self { Self { api, session } }

    /// Exchange credentials for a session. The store is left untouched on failure.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        match self.api.login(username, password).await {
            Ok(session) => {
                info!(target: "signup::auth", user = %session.username, "login succeeded");
                self.session.set(Some(session.clone()));
                Ok(session)
            }
            Err(e @ AuthError::InvalidCredentials { .. }) => {
                warn!(target: "signup::auth", user = %username, code = e.code_str(), "login rejected: {}", e);
                Err(e)
            }
            Err(e) => {
                error!(target: "signup::auth", code = e.code_str(), "error logging in: {}", e);
                Err(e)
            }
        }
    }

    /// Tell the server (best effort) and always drop the local session.
    pub async fn logout(&self) {
        if let Some(token) = self.session.token() {
            if let Err(e) = self.api.logout(&token).await {
                error!(target: "signup::auth", code = e.code_str(), "error logging out: {}", e);
            }
        }
        self.session.clear();
        info!(target: "signup::auth", "logged out");
    }

    /// Validate a restored session once at startup. Without a session no request is made;
    /// an invalid token or any failure clears the session.
    pub async fn verify(&self) -> bool {
        let Some(token) = self.session.token() else { return false };
        match self.api.check(&token).await {
            Ok(true) => true,
            Ok(false) => {
                info!(target: "signup::auth", "persisted session no longer valid");
                self.session.clear();
                false
            }
            Err(e) => {
                error!(target: "signup::auth", code = e.code_str(), "error checking authentication: {}", e);
                self.session.clear();
                false
            }
        }
    }
}
