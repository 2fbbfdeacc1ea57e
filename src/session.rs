use parking_lot::RwLock;
use reqwest::header::{HeaderMap, SET_COOKIE};

/// Opaque session cookie value, already in `Cookie` header form.
pub type SessionToken = String;

/// Session cookie name the remote issues on login.
pub const DEFAULT_SESSION_COOKIE: &str = "TagoneCookie";

/// Holder for the current session token of one client instance.
///
/// Only a successful login writes it; every authenticated request reads it.
/// Implementations must be safe to share across tasks, but the client does
/// not order a login against requests already in flight.
pub trait SessionStore: Send + Sync {
    fn get(&self) -> Option<SessionToken>;
    fn set(&self, token: SessionToken);
    fn clear(&self);
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: RwLock<Option<SessionToken>>,
}

impl MemorySessionStore {
    pub fn new(initial: Option<SessionToken>) -> Self {
        Self { token: RwLock::new(initial.filter(|t| !t.is_empty())) }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<SessionToken> { self.token.read().clone() }

    fn set(&self, token: SessionToken) { *self.token.write() = Some(token); }

    fn clear(&self) { *self.token.write() = None; }
}

/// Build the session token from a response's `Set-Cookie` headers.
///
/// Every header value may hold several comma-separated cookies. Entries whose
/// name is `cookie_name` are kept with their attributes (everything after the
/// first `;`) stripped, then joined with `;`. Returns `None` when no entry with
/// a non-empty value matches.
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<SessionToken> {
    let mut kept: Vec<String> = Vec::new();
    for val in headers.get_all(SET_COOKIE).iter() {
        let Ok(s) = val.to_str() else { continue; };
        for entry in s.split(',') {
            // name=value before first ';'
            let nv = entry.split(';').next().unwrap_or("").trim();
            let Some((name, value)) = nv.split_once('=') else { continue; };
            if name.trim() == cookie_name && !value.trim().is_empty() {
                kept.push(nv.to_string());
            }
        }
    }
    if kept.is_empty() { None } else { Some(kept.join(";")) }
}
