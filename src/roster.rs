//! Roster model and the Roster Synchronizer.
//!
//! The roster is rebuilt wholesale on every fetch and kept in the order the API returned it.
//! A failed fetch discards the previous roster; there is no stale-data mode.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use crate::api::ApiClient;
use crate::error::FetchError;
use crate::session::SessionStore;
use crate::view::SharedUi;

/// Activity details as the API sends them, keyed by name in the enclosing mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDetails {
    pub description: String,
    pub schedule: String,
    pub max_participants: u32,
    #[serde(default)]
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub max_participants: u32,
    pub participants: Vec<String>,
}

impl Activity {
    fn from_details(name: String, d: ActivityDetails) -> Self {
        Self {
            name,
            description: d.description,
            schedule: d.schedule,
            max_participants: d.max_participants,
            participants: d.participants,
        }
    }

    /// Display-only; may go negative if the server over-admits. Signups are never blocked here.
    pub fn spots_left(&self) -> i64 {
        i64::from(self.max_participants) - self.participants.len() as i64
    }

    pub fn has_participant(&self, email: &str) -> bool {
        self.participants.iter().any(|p| p == email)
    }
}

/// Activities in API order. Names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    activities: Vec<Activity>,
}

impl Roster {
    /// Decode the `GET /activities` body: an object mapping activity name to details.
    pub fn from_json(value: Value) -> Result<Self, FetchError> {
        let map: Map<String, Value> = match value {
            Value::Object(m) => m,
            other => return Err(FetchError::Decode(format!("expected object, got {}", kind_of(&other)))),
        };
        let mut activities = Vec::with_capacity(map.len());
        for (name, details) in map {
            let d: ActivityDetails = serde_json::from_value(details)
                .map_err(|e| FetchError::Decode(format!("activity '{}': {}", name, e)))?;
            activities.push(Activity::from_details(name, d));
        }
        Ok(Self { activities })
    }

    pub fn activities(&self) -> &[Activity] { &self.activities }

    pub fn get(&self, name: &str) -> Option<&Activity> { self.activities.iter().find(|a| a.name == name) }

    pub fn names(&self) -> Vec<String> { self.activities.iter().map(|a| a.name.clone()).collect() }

    pub fn len(&self) -> usize { self.activities.len() }

    pub fn is_empty(&self) -> bool { self.activities.is_empty() }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Owns the roster; the only writer of roster state and of the roster part of the view.
#[derive(Clone)]
pub struct RosterSynchronizer {
    api: ApiClient,
    session: SessionStore,
    ui: SharedUi,
    current: Arc<RwLock<Option<Roster>>>,
}

impl RosterSynchronizer {
    pub fn new(api: ApiClient, session: SessionStore, ui: SharedUi) -> Self {
        Self { api, session, ui, current: Arc::new(RwLock::new(None)) }
    }

    /// Last successfully fetched roster, `None` before the first fetch or after a failure.
    pub fn current(&self) -> Option<Roster> { self.current.read().clone() }

    /// Fetch the full roster, replace local state and regenerate the view. Concurrent calls are
    /// not fenced: whichever response lands last is what the view shows.
    pub async fn refresh(&self) -> Result<Roster, FetchError> {
        debug!(target: "signup::roster", "fetching roster");
        match self.api.activities().await {
            Ok(roster) => {
                *self.current.write() = Some(roster.clone());
                let session = self.session.get();
                self.ui.render_roster(&roster, session.as_ref());
                info!(target: "signup::roster", activities = roster.len(), "roster refreshed");
                Ok(roster)
            }
            Err(e) => {
                error!(target: "signup::roster", code = e.code_str(), "error fetching activities: {}", e);
                *self.current.write() = None;
                self.ui.render_roster_failure();
                Err(e)
            }
        }
    }
}
