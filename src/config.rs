use std::time::Duration;

use crate::error::{ClientError, Result};
use crate::session::DEFAULT_SESSION_COOKIE;

pub const DEFAULT_LOGIN_PATH: &str = "Login";
pub const DEFAULT_IDENTITY_PATH: &str = "Claims";
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client configuration: where the remote lives, how it names its session
/// cookie, and how long calls may take.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Session token to start with, e.g. one restored by the embedding app.
    pub token: Option<String>,
    pub session_cookie: String,
    pub login_path: String,
    pub identity_path: String,
    pub login_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: None,
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            identity_path: DEFAULT_IDENTITY_PATH.to_string(),
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Default::default() }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_session_cookie(mut self, name: impl Into<String>) -> Self {
        self.session_cookie = name.into();
        self
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn with_identity_path(mut self, path: impl Into<String>) -> Self {
        self.identity_path = path.into();
        self
    }

    pub fn with_login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Load from `TAGONE_*` environment variables. Only `TAGONE_BASE_URL` is required.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("TAGONE_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ClientError::Config("TAGONE_BASE_URL is not set".into()))?;
        let mut cfg = Self::new(base_url);
        cfg.token = lookup("TAGONE_SESSION_TOKEN").filter(|v| !v.is_empty());
        if let Some(name) = lookup("TAGONE_SESSION_COOKIE").filter(|v| !v.is_empty()) {
            cfg.session_cookie = name;
        }
        if let Some(secs) = lookup("TAGONE_LOGIN_TIMEOUT_SECS") {
            cfg.login_timeout = parse_secs("TAGONE_LOGIN_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = lookup("TAGONE_REQUEST_TIMEOUT_SECS") {
            cfg.request_timeout = parse_secs("TAGONE_REQUEST_TIMEOUT_SECS", &secs)?;
        }
        Ok(cfg)
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ClientError::Config(format!("{key}={raw:?}: {e}")))
}
