//! Wiring and the command/dispatch interface.
//!
//! [`App`] owns one of each component, all sharing the same [`SessionStore`] and [`SharedUi`].
//! Front ends turn user actions into [`Command`]s and call [`App::dispatch`]; they never touch
//! the components directly.

use tracing::info;

use crate::api::ApiClient;
use crate::auth::AuthGateway;
use crate::config::{timings, ClientConfig};
use crate::error::{AuthError, FetchError, MutationError};
use crate::mutation::MutationController;
use crate::notifier::{Notification, Notifier, Slot};
use crate::roster::RosterSynchronizer;
use crate::session::{FileStorage, MemoryStorage, Session, SessionStorage, SessionStore};
use crate::view::{SharedUi, UiState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { username: String, password: String },
    Logout,
    Register { activity: String, email: String },
    Unregister { activity: String, email: String },
    Refresh,
    OpenLogin,
    CloseLogin,
    ToggleUserMenu,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    LoggedIn(Session),
    LoginFailed(AuthError),
    LoggedOut,
    Registered { message: String },
    Unregistered { message: String },
    /// Mutation blocked at the gate; nothing was sent.
    Gated,
    MutationFailed(MutationError),
    Refreshed { activities: usize },
    RefreshFailed(FetchError),
    /// UI-only command, no network involved.
    UiUpdated,
}

#[derive(Clone)]
pub struct App {
    pub session: SessionStore,
    pub ui: SharedUi,
    pub notifier: Notifier,
    pub auth: AuthGateway,
    pub roster: RosterSynchronizer,
    pub mutations: MutationController,
}

impl App {
    /// Build from configuration, using file-backed storage unless persistence is off.
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let storage: Box<dyn SessionStorage> = match &config.session_file {
            Some(path) => Box::new(FileStorage::new(path.clone())),
            None => Box::new(MemoryStorage::new()),
        };
        Self::with_storage(config, storage)
    }

    pub fn with_storage(config: &ClientConfig, storage: Box<dyn SessionStorage>) -> Result<Self, reqwest::Error> {
        let api = ApiClient::new(config)?;
        let session = SessionStore::open(storage);
        let ui = SharedUi::new();

        // auth reflection runs after every session change
        let ui_for_auth = ui.clone();
        session.subscribe(move |s| ui_for_auth.apply_auth(s));
        ui.apply_auth(session.get().as_ref());

        let notifier = Notifier::new(ui.clone());
        let auth = AuthGateway::new(api.clone(), session.clone());
        let roster = RosterSynchronizer::new(api.clone(), session.clone(), ui.clone());
        let mutations = MutationController::new(api, session.clone(), roster.clone(), notifier.clone());
        Ok(Self { session, ui, notifier, auth, roster, mutations })
    }

    /// Startup sequence: validate any persisted session, then the initial roster fetch.
    pub async fn start(&self) -> Outcome {
        let valid = self.auth.verify().await;
        info!(target: "signup::app", authenticated = valid, "startup session check done");
        self.refresh().await
    }

    pub fn snapshot(&self) -> UiState { self.ui.snapshot() }

    pub async fn dispatch(&self, command: Command) -> Outcome {
        match command {
            Command::Login { username, password } => self.login(&username, &password).await,
            Command::Logout => {
                self.auth.logout().await;
                self.ui.update(|s| s.user_menu_open = false);
                Outcome::LoggedOut
            }
            Command::Register { activity, email } => match self.mutations.register(&activity, &email).await {
                Ok(message) => {
                    self.ui.update(|s| s.signup.reset());
                    Outcome::Registered { message }
                }
                Err(e) => mutation_failure(e),
            },
            Command::Unregister { activity, email } => match self.mutations.unregister(&activity, &email).await {
                Ok(message) => Outcome::Unregistered { message },
                Err(e) => mutation_failure(e),
            },
            Command::Refresh => self.refresh().await,
            Command::OpenLogin => {
                self.ui.update(|s| {
                    s.login_modal.open = true;
                    s.user_menu_open = false;
                });
                Outcome::UiUpdated
            }
            Command::CloseLogin => {
                self.ui.update(|s| s.login_modal.open = false);
                self.notifier.hide(Slot::Login);
                Outcome::UiUpdated
            }
            Command::ToggleUserMenu => {
                self.ui.update(|s| s.user_menu_open = !s.user_menu_open);
                Outcome::UiUpdated
            }
        }
    }

    async fn login(&self, username: &str, password: &str) -> Outcome {
        match self.auth.login(username, password).await {
            Ok(session) => {
                self.ui.update(|s| s.login_modal.open = false);
                self.notifier.hide(Slot::Login);
                self.notifier.show(
                    Slot::Main,
                    Notification::success(
                        format!("Welcome, {}! You can now register students.", session.username),
                        timings::SHORT,
                    ),
                );
                Outcome::LoggedIn(session)
            }
            Err(e) => {
                self.notifier.show(Slot::Login, Notification::sticky_error(e.message()));
                Outcome::LoginFailed(e)
            }
        }
    }

    async fn refresh(&self) -> Outcome {
        match self.roster.refresh().await {
            Ok(r) => Outcome::Refreshed { activities: r.len() },
            Err(e) => Outcome::RefreshFailed(e),
        }
    }
}

fn mutation_failure(e: MutationError) -> Outcome {
    match e {
        MutationError::NotLoggedIn => Outcome::Gated,
        other => Outcome::MutationFailed(other),
    }
}
