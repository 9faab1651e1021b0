//! Error taxonomy for the signup client.
//! Every error is caught at the component that issued the network call and turned into a
//! user-visible notification; these types carry the code and text for that conversion.

use thiserror::Error;

/// Fallback text when the server rejects a mutation without a `detail`.
pub const GENERIC_DETAIL: &str = "An error occurred";
/// Fallback text when the server rejects a login without a `detail`.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("{detail}")]
    InvalidCredentials { detail: String },
    #[error("auth request failed: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("roster fetch returned HTTP {0}")]
    Status(u16),
    #[error("roster fetch failed: {0}")]
    Network(String),
    #[error("roster payload malformed: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MutationError {
    /// Gate rejection: no session, nothing was sent.
    #[error("not logged in")]
    NotLoggedIn,
    /// The server answered with a non-2xx status.
    #[error("{detail}")]
    Rejected { status: u16, detail: String },
    #[error("mutation request failed: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("session storage io: {0}")]
    Io(#[from] std::io::Error),
    #[error("session storage encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl AuthError {
    pub fn code_str(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials { .. } => "invalid_credentials",
            AuthError::Network(_) => "auth_network",
        }
    }

    /// Text shown in the login-modal slot.
    pub fn message(&self) -> &str {
        match self {
            AuthError::InvalidCredentials { detail } => detail.as_str(),
            AuthError::Network(_) => "Login failed. Please try again.",
        }
    }
}

impl FetchError {
    pub fn code_str(&self) -> &'static str {
        match self {
            FetchError::Status(_) => "fetch_status",
            FetchError::Network(_) => "fetch_network",
            FetchError::Decode(_) => "fetch_decode",
        }
    }
}

impl MutationError {
    pub fn code_str(&self) -> &'static str {
        match self {
            MutationError::NotLoggedIn => "login_required",
            MutationError::Rejected { status: 404, .. } => "not_found",
            MutationError::Rejected { .. } => "rejected",
            MutationError::Network(_) => "mutation_network",
        }
    }

    pub fn is_network(&self) -> bool { matches!(self, MutationError::Network(_)) }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() { FetchError::Decode(err.to_string()) } else { FetchError::Network(err.to_string()) }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self { AuthError::Network(err.to_string()) }
}

impl From<reqwest::Error> for MutationError {
    fn from(err: reqwest::Error) -> Self { MutationError::Network(err.to_string()) }
}
