//! Presentation-neutral UI state.
//!
//! Everything a front end needs to draw the page lives in [`UiState`]: the logged-in/logged-out
//! blocks, the signup form, the activity cards, the login modal and the two message slots.
//! Front ends read snapshots; only the core components write.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::app::Command;
use crate::notifier::{Notification, Slot};
use crate::roster::Roster;
use crate::session::Session;

pub const LOADING_TEXT: &str = "Loading activities...";
pub const FETCH_FAILED_TEXT: &str = "Failed to load activities. Please try again later.";
pub const NO_PARTICIPANTS_TEXT: &str = "No participants yet";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthView {
    /// `true` shows the logged-in block and hides the logged-out one.
    pub logged_in: bool,
    pub username_display: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    /// Submit control state; mirrors authentication.
    pub enabled: bool,
    pub email: String,
    pub activity: Option<String>,
    /// Activity choices in roster order.
    pub choices: Vec<String>,
}

impl SignupForm {
    pub fn reset(&mut self) {
        self.email.clear();
        self.activity = None;
    }
}

/// Credentials travel in `Command::Login`; the modal itself only tracks visibility.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginModal {
    pub open: bool,
}

/// Per-participant delete control. Carries the exact (activity, email) it unregisters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteAffordance {
    pub activity: String,
    pub email: String,
    pub visible: bool,
}

impl DeleteAffordance {
    pub fn command(&self) -> Command {
        Command::Unregister { activity: self.activity.clone(), email: self.email.clone() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRow {
    pub email: String,
    pub delete: DeleteAffordance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityCard {
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub spots_left: i64,
    /// Empty means the card shows [`NO_PARTICIPANTS_TEXT`].
    pub participants: Vec<ParticipantRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterView {
    Loading,
    Loaded(Vec<ActivityCard>),
    /// Single placeholder, no cards.
    Failed(String),
}

impl Default for RosterView {
    fn default() -> Self { RosterView::Loading }
}

impl RosterView {
    pub fn cards(&self) -> &[ActivityCard] {
        match self {
            RosterView::Loaded(cards) => cards,
            _ => &[],
        }
    }

    pub fn card(&self, name: &str) -> Option<&ActivityCard> { self.cards().iter().find(|c| c.name == name) }

    /// Every delete affordance currently rendered, card by card.
    pub fn affordances(&self) -> impl Iterator<Item = &DeleteAffordance> {
        self.cards().iter().flat_map(|c| c.participants.iter().map(|p| &p.delete))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    pub auth: AuthView,
    pub signup: SignupForm,
    pub roster: RosterView,
    pub login_modal: LoginModal,
    pub user_menu_open: bool,
    pub main_message: Option<Notification>,
    pub login_message: Option<Notification>,
}

impl UiState {
    pub fn message(&self, slot: Slot) -> Option<&Notification> {
        match slot {
            Slot::Main => self.main_message.as_ref(),
            Slot::Login => self.login_message.as_ref(),
        }
    }

    pub fn message_mut(&mut self, slot: Slot) -> &mut Option<Notification> {
        match slot {
            Slot::Main => &mut self.main_message,
            Slot::Login => &mut self.login_message,
        }
    }

    /// Reflect authentication into every auth-dependent control, including the delete
    /// affordances currently rendered.
    pub fn apply_auth(&mut self, session: Option<&Session>) {
        let logged_in = session.is_some();
        self.auth.logged_in = logged_in;
        self.auth.username_display = session.map(|s| s.username.clone());
        self.signup.enabled = logged_in;
        if let RosterView::Loaded(cards) = &mut self.roster {
            for row in cards.iter_mut().flat_map(|c| c.participants.iter_mut()) {
                row.delete.visible = logged_in;
            }
        }
    }
}

fn build_cards(roster: &Roster) -> Vec<ActivityCard> {
    roster
        .activities()
        .iter()
        .map(|a| ActivityCard {
            name: a.name.clone(),
            description: a.description.clone(),
            schedule: a.schedule.clone(),
            spots_left: a.spots_left(),
            participants: a
                .participants
                .iter()
                .map(|email| ParticipantRow {
                    email: email.clone(),
                    delete: DeleteAffordance { activity: a.name.clone(), email: email.clone(), visible: false },
                })
                .collect(),
        })
        .collect()
}

/// Shared handle to the UI state.
#[derive(Clone, Default)]
pub struct SharedUi(pub Arc<Mutex<UiState>>);

impl SharedUi {
    pub fn new() -> Self { Self::default() }

    pub fn snapshot(&self) -> UiState { self.0.lock().clone() }

    /// Run `f` with the state locked. Do not await inside.
    pub fn update<R>(&self, f: impl FnOnce(&mut UiState) -> R) -> R {
        let mut guard = self.0.lock();
        f(&mut guard)
    }

    pub fn apply_auth(&self, session: Option<&Session>) { self.update(|s| s.apply_auth(session)) }

    /// Replace the cards wholesale and re-apply auth state to the fresh affordances.
    pub fn render_roster(&self, roster: &Roster, session: Option<&Session>) {
        let cards = build_cards(roster);
        let names = roster.names();
        self.update(|s| {
            s.roster = RosterView::Loaded(cards);
            if let Some(sel) = &s.signup.activity {
                if !names.contains(sel) { s.signup.activity = None; }
            }
            s.signup.choices = names;
            s.apply_auth(session);
        })
    }

    pub fn render_roster_failure(&self) {
        self.update(|s| s.roster = RosterView::Failed(FETCH_FAILED_TEXT.to_string()))
    }
}
