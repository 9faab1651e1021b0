pub mod config;
pub mod error;
pub mod session;
pub mod api;
pub mod auth;
pub mod roster;
pub mod view;
pub mod notifier;
pub mod mutation;
pub mod app;
pub mod cli;

pub use app::{App, Command, Outcome};
pub use config::ClientConfig;
pub use session::{Session, SessionStore};
