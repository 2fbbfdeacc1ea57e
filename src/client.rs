//!
//! Remote session client
//! ---------------------
//! [`Client`] binds one logical session against the remote service: the
//! configuration, the transport, the session store and the cached identity
//! claims. Authentication lives in `auth`, the request wrapper in `executor`,
//! and collection listing in `pagination`; all of them are methods on `Client`.
//!
//! One instance is one session. Cloning shares the session; for independent
//! sessions in the same process create independent clients.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::Url;
use tracing::warn;

use crate::auth::Claims;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::session::{MemorySessionStore, SessionStore, SessionToken};
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

#[derive(Clone)]
pub struct Client {
    pub(crate) config: Arc<ClientConfig>,
    base: Url,
    transport: Arc<dyn Transport>,
    pub(crate) session: Arc<dyn SessionStore>,
    pub(crate) claims: Arc<RwLock<Option<Claims>>>,
}

impl Client {
    /// Client over the default reqwest transport and an in-memory session.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new()?;
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        Self::with_session_store(config, transport, Arc::new(MemorySessionStore::default()))
    }

    /// Full injection. A token in `config` is written into `session`.
    pub fn with_session_store(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        let base = normalize_base(&config.base_url)?;
        if let Some(token) = config.token.clone().filter(|t| !t.is_empty()) {
            session.set(token);
        }
        Ok(Self {
            config: Arc::new(config),
            base,
            transport,
            session,
            claims: Arc::new(RwLock::new(None)),
        })
    }

    pub fn config(&self) -> &ClientConfig { &self.config }

    pub fn base_url(&self) -> &Url { &self.base }

    pub fn session_token(&self) -> Option<SessionToken> { self.session.get() }

    pub fn is_authenticated(&self) -> bool {
        self.session.get().map(|t| !t.is_empty()).unwrap_or(false)
    }

    /// Claims cached by the last successful login or identity fetch.
    pub fn claims(&self) -> Option<Claims> { self.claims.read().clone() }

    /// Forget the session locally: token and cached claims. The remote is not told.
    pub fn clear_session(&self) {
        self.session.clear();
        *self.claims.write() = None;
    }

    /// Resolve a relative path (optionally carrying a query string) against the base URL.
    pub fn url_for(&self, path: &str) -> Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Send through the transport, bounded by `limit`.
    pub(crate) async fn round_trip(&self, operation: &str, limit: Duration, req: HttpRequest) -> Result<HttpResponse> {
        match tokio::time::timeout(limit, self.transport.send(req)).await {
            Ok(res) => res,
            Err(_) => {
                warn!(target: "tagone", "{} timed out after {:?}", operation, limit);
                Err(ClientError::Timeout { operation: operation.to_string(), after: limit })
            }
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never print the token
        f.debug_struct("Client")
            .field("base", &self.base.as_str())
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

fn normalize_base(base: &str) -> Result<Url> {
    let trimmed = base.trim();
    if trimmed.is_empty() {
        return Err(ClientError::Config("base url is empty".into()));
    }
    let with_slash = format!("{}/", trimmed.trim_end_matches('/'));
    Url::parse(&with_slash).map_err(|e| ClientError::InvalidUrl(format!("{trimmed}: {e}")))
}
