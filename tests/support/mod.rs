//! In-process mock of the signup API, bound to an ephemeral localhost port.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use tokio::task::JoinHandle;

use signup_client::session::{MemoryStorage, Session, SessionStorage};
use signup_client::{App, ClientConfig};

#[derive(Debug, Clone)]
pub struct MockActivity {
    pub description: String,
    pub schedule: String,
    pub max_participants: u32,
    pub participants: Vec<String>,
}

#[derive(Default)]
pub struct Hits {
    pub login: AtomicUsize,
    pub logout: AtomicUsize,
    pub check: AtomicUsize,
    pub activities: AtomicUsize,
    pub signup: AtomicUsize,
    pub unregister: AtomicUsize,
}

impl Hits {
    pub fn get(counter: &AtomicUsize) -> usize { counter.load(Ordering::SeqCst) }
}

#[derive(Default)]
struct Inner {
    activities: Vec<(String, MockActivity)>,
    /// username -> (password, token issued on login)
    users: HashMap<String, (String, String)>,
    /// live token -> username
    tokens: HashMap<String, String>,
}

#[derive(Clone, Default)]
pub struct MockState {
    inner: Arc<Mutex<Inner>>,
    pub hits: Arc<Hits>,
    pub fail_activities: Arc<AtomicBool>,
    /// Flip `fail_activities` on as soon as a mutation lands.
    pub fail_activities_after_mutation: Arc<AtomicBool>,
}

impl MockState {
    pub fn participants(&self, activity: &str) -> Vec<String> {
        let inner = self.inner.lock();
        inner.activities.iter().find(|(n, _)| n == activity).map(|(_, a)| a.participants.clone()).unwrap_or_default()
    }

    pub fn token_live(&self, token: &str) -> bool { self.inner.lock().tokens.contains_key(token) }

    pub fn add_activity(&self, name: &str, max: u32, participants: &[&str]) {
        self.inner.lock().activities.push((
            name.to_string(),
            MockActivity {
                description: format!("{} description", name),
                schedule: "Fridays, 3:30 PM - 5:00 PM".to_string(),
                max_participants: max,
                participants: participants.iter().map(|s| s.to_string()).collect(),
            },
        ));
    }

    pub fn set_failing(&self, failing: bool) { self.fail_activities.store(failing, Ordering::SeqCst); }

    pub fn fail_after_next_mutation(&self) { self.fail_activities_after_mutation.store(true, Ordering::SeqCst); }

    fn mutation_landed(&self) {
        if self.fail_activities_after_mutation.swap(false, Ordering::SeqCst) {
            self.set_failing(true);
        }
    }
}

pub struct MockApi {
    pub addr: SocketAddr,
    pub state: MockState,
    handle: JoinHandle<()>,
}

impl Drop for MockApi {
    fn drop(&mut self) { self.handle.abort(); }
}

impl MockApi {
    /// Default fixture: user rick/validpw (token "abc"), token "abc" already live,
    /// three activities with Chess Club holding a@b.com.
    pub async fn start() -> MockApi {
        let state = MockState::default();
        {
            let mut inner = state.inner.lock();
            inner.users.insert("rick".into(), ("validpw".into(), "abc".into()));
            inner.tokens.insert("abc".into(), "rick".into());
        }
        state.add_activity("Chess Club", 12, &["a@b.com", "daniel@mergington.edu"]);
        state.add_activity("Programming Class", 20, &["emma@mergington.edu"]);
        state.add_activity("Gym Class", 1, &["john@mergington.edu"]);
        Self::start_with(state).await
    }

    pub async fn start_with(state: MockState) -> MockApi {
        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/logout", post(logout))
            .route("/auth/check", get(check))
            .route("/activities", get(activities))
            .route("/activities/{name}/signup", post(signup))
            .route("/activities/{name}/unregister", delete(unregister))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind 127.0.0.1:0");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("mock api task error: {e:?}");
            }
        });
        MockApi { addr, state, handle }
    }

    pub fn config(&self) -> ClientConfig { config_for(&format!("http://{}", self.addr)) }

    pub fn app(&self) -> App { self.app_with(Box::new(MemoryStorage::new())) }

    pub fn app_logged_in(&self) -> App {
        self.app_with(Box::new(MemoryStorage::with_session(&Session::new("abc", "rick"))))
    }

    pub fn app_with(&self, storage: Box<dyn SessionStorage>) -> App {
        App::with_storage(&self.config(), storage).expect("build app")
    }
}

pub fn config_for(base: &str) -> ClientConfig {
    let mut cfg = ClientConfig::default();
    cfg.api_base = reqwest::Url::parse(base).expect("base url");
    cfg.session_file = None;
    cfg.request_timeout = Duration::from_secs(5);
    cfg
}

/// Base URL nothing listens on.
pub fn dead_base() -> String {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).expect("bind 127.0.0.1:0");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener); // free it; tiny race window but acceptable for tests
    format!("http://127.0.0.1:{}", port)
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers.get("authorization").and_then(|v| v.to_str().ok()).map(|s| s.to_string())
}

fn authed(state: &MockState, headers: &HeaderMap) -> bool {
    bearer(headers).map(|t| state.token_live(&t)).unwrap_or(false)
}

fn detail(status: StatusCode, text: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "detail": text })))
}

async fn login(State(state): State<MockState>, Query(q): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    state.hits.login.fetch_add(1, Ordering::SeqCst);
    let username = q.get("username").cloned().unwrap_or_default();
    let password = q.get("password").cloned().unwrap_or_default();
    let mut inner = state.inner.lock();
    let token = match inner.users.get(&username) {
        Some((pw, token)) if *pw == password => token.clone(),
        _ => return detail(StatusCode::UNAUTHORIZED, "Invalid username or password"),
    };
    inner.tokens.insert(token.clone(), username.clone());
    (StatusCode::OK, Json(json!({ "token": token, "username": username })))
}

async fn logout(State(state): State<MockState>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    state.hits.logout.fetch_add(1, Ordering::SeqCst);
    if let Some(t) = bearer(&headers) {
        state.inner.lock().tokens.remove(&t);
    }
    (StatusCode::OK, Json(json!({ "message": "Logged out" })))
}

async fn check(State(state): State<MockState>, headers: HeaderMap) -> Json<Value> {
    state.hits.check.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "authenticated": authed(&state, &headers) }))
}

async fn activities(State(state): State<MockState>) -> (StatusCode, Json<Value>) {
    state.hits.activities.fetch_add(1, Ordering::SeqCst);
    if state.fail_activities.load(Ordering::SeqCst) {
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }
    let inner = state.inner.lock();
    let mut map = Map::new();
    for (name, a) in &inner.activities {
        map.insert(
            name.clone(),
            json!({
                "description": a.description,
                "schedule": a.schedule,
                "max_participants": a.max_participants,
                "participants": a.participants,
            }),
        );
    }
    (StatusCode::OK, Json(Value::Object(map)))
}

async fn signup(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Query(q): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    state.hits.signup.fetch_add(1, Ordering::SeqCst);
    if !authed(&state, &headers) {
        return detail(StatusCode::UNAUTHORIZED, "Authentication required");
    }
    let email = q.get("email").cloned().unwrap_or_default();
    let mut inner = state.inner.lock();
    let Some((_, a)) = inner.activities.iter_mut().find(|(n, _)| *n == name) else {
        return detail(StatusCode::NOT_FOUND, "Activity not found");
    };
    if a.participants.contains(&email) {
        return detail(StatusCode::BAD_REQUEST, "Student is already signed up");
    }
    if a.participants.len() >= a.max_participants as usize {
        return detail(StatusCode::BAD_REQUEST, "Activity is full");
    }
    a.participants.push(email.clone());
    drop(inner);
    state.mutation_landed();
    (StatusCode::OK, Json(json!({ "message": format!("Signed up {} for {}", email, name) })))
}

async fn unregister(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Query(q): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    state.hits.unregister.fetch_add(1, Ordering::SeqCst);
    if !authed(&state, &headers) {
        return detail(StatusCode::UNAUTHORIZED, "Authentication required");
    }
    let email = q.get("email").cloned().unwrap_or_default();
    let mut inner = state.inner.lock();
    let Some((_, a)) = inner.activities.iter_mut().find(|(n, _)| *n == name) else {
        return detail(StatusCode::NOT_FOUND, "Activity not found");
    };
    let Some(pos) = a.participants.iter().position(|p| *p == email) else {
        return detail(StatusCode::BAD_REQUEST, "Student is not signed up for this activity");
    };
    a.participants.remove(pos);
    drop(inner);
    state.mutation_landed();
    (StatusCode::OK, Json(json!({ "message": "Removed" })))
}
