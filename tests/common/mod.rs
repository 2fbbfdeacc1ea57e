//! Shared test harness: a scripted in-memory transport and log setup.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderValue, SET_COOKIE};

use tagone_client::{Client, ClientConfig, ClientError, HttpRequest, HttpResponse, Transport};

pub const BASE: &str = "http://backoffice.test/api";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

enum Step {
    Respond(HttpResponse),
    Fail(String),
    Hang,
}

/// Replays canned responses in order and records every request it receives.
#[derive(Default)]
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    pub fn respond(&self, status: u16, body: &str) -> &Self {
        self.respond_with(status, HeaderMap::new(), body)
    }

    pub fn respond_json(&self, status: u16, body: serde_json::Value) -> &Self {
        self.respond(status, &body.to_string())
    }

    pub fn respond_with(&self, status: u16, headers: HeaderMap, body: &str) -> &Self {
        self.steps.lock().push_back(Step::Respond(HttpResponse { status, headers, body: body.to_string() }));
        self
    }

    /// A successful login carrying the given raw `Set-Cookie` values.
    pub fn respond_login(&self, set_cookies: &[&str]) -> &Self {
        let mut h = HeaderMap::new();
        for c in set_cookies {
            h.append(SET_COOKIE, HeaderValue::from_str(c).unwrap());
        }
        self.respond_with(200, h, r#"{"status":"ok"}"#)
    }

    pub fn fail(&self, message: &str) -> &Self {
        self.steps.lock().push_back(Step::Fail(message.to_string()));
        self
    }

    /// Never answers; used to trip client-side timeouts.
    pub fn hang(&self) -> &Self {
        self.steps.lock().push_back(Step::Hang);
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> { self.requests.lock().clone() }

    pub fn request(&self, idx: usize) -> HttpRequest { self.requests.lock()[idx].clone() }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse, ClientError> {
        self.requests.lock().push(req);
        let step = self.steps.lock().pop_front();
        match step {
            Some(Step::Respond(r)) => Ok(r),
            Some(Step::Fail(m)) => Err(ClientError::transport(m)),
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ClientError::transport("unreachable"))
            }
            None => panic!("scripted transport ran out of responses"),
        }
    }
}

pub fn client_with(transport: Arc<ScriptedTransport>, config: ClientConfig) -> Client {
    init_tracing();
    Client::with_transport(config, transport).expect("client")
}

pub fn client(transport: Arc<ScriptedTransport>) -> Client {
    client_with(transport, ClientConfig::new(BASE))
}

pub fn cookie_of(req: &HttpRequest) -> Option<String> {
    req.headers.get(reqwest::header::COOKIE).and_then(|v| v.to_str().ok()).map(|s| s.to_string())
}
