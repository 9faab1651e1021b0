//! Mutation Controller: gated register/unregister followed by a roster re-fetch.
//!
//! Protocol for both operations:
//! 1. gate on the session (no token: error notice, nothing sent),
//! 2. issue the call with the bearer token,
//! 3. on success show the server message and re-fetch the roster; on failure show the
//!    server detail (or a fallback) and leave the roster alone.
//!
//! The roster is never patched locally.

use tracing::{error, info, warn};

use crate::api::ApiClient;
use crate::config::timings;
use crate::error::MutationError;
use crate::notifier::{Notification, Notifier, Slot};
use crate::roster::RosterSynchronizer;
use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Register,
    Unregister,
}

impl MutationKind {
    pub fn gate_text(self) -> &'static str {
        match self {
            MutationKind::Register => "Please login to register students.",
            MutationKind::Unregister => "Please login to unregister students.",
        }
    }

    pub fn network_text(self) -> &'static str {
        match self {
            MutationKind::Register => "Failed to sign up. Please try again.",
            MutationKind::Unregister => "Failed to unregister. Please try again.",
        }
    }

    fn verb(self) -> &'static str {
        match self {
            MutationKind::Register => "signup",
            MutationKind::Unregister => "unregister",
        }
    }
}

#[derive(Clone)]
pub struct MutationController {
    api: ApiClient,
    session: SessionStore,
    roster: RosterSynchronizer,
    notifier: Notifier,
}

impl MutationController {
    pub fn new(api: ApiClient, session: SessionStore, roster: RosterSynchronizer, notifier: Notifier) -> Self {
        Self { api, session, roster, notifier }
    }

    /// Sign `email` up for `activity`. Capacity is the server's call.
    pub async fn register(&self, activity: &str, email: &str) -> Result<String, MutationError> {
        self.run(MutationKind::Register, activity, email).await
    }

    /// Remove `email` from `activity`.
    pub async fn unregister(&self, activity: &str, email: &str) -> Result<String, MutationError> {
        self.run(MutationKind::Unregister, activity, email).await
    }

    async fn run(&self, kind: MutationKind, activity: &str, email: &str) -> Result<String, MutationError> {
        // gate runs before the first await so the notice lands in the caller's turn
        let Some(token) = self.session.token() else {
            info!(target: "signup::mutation", op = kind.verb(), "blocked: not logged in");
            self.notifier.show(Slot::Main, Notification::error(kind.gate_text(), timings::SHORT));
            return Err(MutationError::NotLoggedIn);
        };

        let result = match kind {
            MutationKind::Register => self.api.signup(&token, activity, email).await,
            MutationKind::Unregister => self.api.unregister(&token, activity, email).await,
        };

        match result {
            Ok(message) => {
                info!(target: "signup::mutation", op = kind.verb(), activity = %activity, "applied");
                self.notifier.show(Slot::Main, Notification::success(message.clone(), timings::LONG));
                // failures here are already rendered as the roster placeholder
                let _ = self.roster.refresh().await;
                Ok(message)
            }
            Err(e) => {
                let text = match &e {
                    MutationError::Network(_) => {
                        error!(target: "signup::mutation", op = kind.verb(), "request failed: {}", e);
                        kind.network_text().to_string()
                    }
                    _ => {
                        warn!(target: "signup::mutation", op = kind.verb(), code = e.code_str(), "rejected: {}", e);
                        e.to_string()
                    }
                };
                self.notifier.show(Slot::Main, Notification::error(text, timings::LONG));
                Err(e)
            }
        }
    }
}
