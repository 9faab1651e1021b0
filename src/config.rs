//! Client configuration: built-in defaults, then `SIGNUP_*` environment variables, then
//! command-line flags.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Url;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Notification lifetimes used by the core.
pub mod timings {
    use std::time::Duration;

    /// Gate rejections and the post-login welcome.
    pub const SHORT: Duration = Duration::from_millis(3000);
    /// Register/unregister outcomes.
    pub const LONG: Duration = Duration::from_millis(5000);
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base: Url,
    /// `None` keeps the session in memory only.
    pub session_file: Option<PathBuf>,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            session_file: Some(default_session_file()),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

// DEFAULT_API_URL is a fixed literal, covered by `defaults_are_usable`
fn default_api_base() -> Url {
    Url::parse(DEFAULT_API_URL).expect("DEFAULT_API_URL parses")
}

/// Endpoint paths are joined relative to the base, so its path must end in `/`.
pub fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn default_session_file() -> PathBuf {
    let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")).ok();
    match home {
        Some(h) if !h.is_empty() => PathBuf::from(h).join(".signup_client").join("session.json"),
        _ => PathBuf::from(".signup_session.json"),
    }
}

impl ClientConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(url) = lookup("SIGNUP_API_URL").filter(|s| !s.trim().is_empty()) {
            cfg.api_base = parse_base(&url).context("SIGNUP_API_URL")?;
        }
        if let Some(path) = lookup("SIGNUP_SESSION_FILE").filter(|s| !s.trim().is_empty()) {
            cfg.session_file = Some(PathBuf::from(path));
        }
        if let Some(ms) = lookup("SIGNUP_HTTP_TIMEOUT_MS").filter(|s| !s.trim().is_empty()) {
            cfg.request_timeout = parse_timeout(&ms).context("SIGNUP_HTTP_TIMEOUT_MS")?;
        }
        Ok(cfg)
    }

    /// Apply command-line flags on top of `self`. Returns `Ok(false)` when `--help` was given.
    pub fn apply_args(&mut self, args: &[String]) -> Result<bool> {
        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--api" => {
                    let v = flag_value(args, i, "--api")?;
                    self.api_base = parse_base(v)?;
                    i += 2;
                }
                "--session-file" => {
                    let v = flag_value(args, i, "--session-file")?;
                    self.session_file = Some(PathBuf::from(v));
                    i += 2;
                }
                "--timeout-ms" => {
                    let v = flag_value(args, i, "--timeout-ms")?;
                    self.request_timeout = parse_timeout(v)?;
                    i += 2;
                }
                "--no-persist" => { self.session_file = None; i += 1; }
                "-h" | "--help" => return Ok(false),
                unk => return Err(anyhow!("unrecognized argument: {}", unk)),
            }
        }
        Ok(true)
    }
}

fn flag_value<'a>(args: &'a [String], i: usize, name: &str) -> Result<&'a str> {
    args.get(i + 1).map(|s| s.as_str()).ok_or_else(|| anyhow!("{} requires a value", name))
}

fn parse_base(s: &str) -> Result<Url> {
    let url = Url::parse(s.trim()).with_context(|| format!("invalid API base URL '{}'", s))?;
    match url.scheme() {
        "http" | "https" => Ok(with_trailing_slash(url)),
        other => Err(anyhow!("unsupported API scheme '{}'", other)),
    }
}

fn parse_timeout(s: &str) -> Result<Duration> {
    let ms: u64 = s.trim().parse().with_context(|| format!("invalid timeout '{}'", s))?;
    if ms == 0 { return Err(anyhow!("timeout must be greater than zero")); }
    Ok(Duration::from_millis(ms))
}
