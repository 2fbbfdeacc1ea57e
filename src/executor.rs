//! Authenticated request wrapper.
//!
//! Every call carries the stored session cookie and a JSON content type.
//! Statuses >= 400 become [`ClientError::Remote`] with a short body excerpt;
//! a success status with a body that is not JSON becomes
//! [`ClientError::ResponseDecode`]. Nothing is retried.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, COOKIE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::Client;
use crate::error::{ClientError, Result};
use crate::transport::{HttpRequest, HttpResponse};

/// One call relative to the client's base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Relative path, may already carry a query string.
    pub path: String,
    pub body: Option<Value>,
    /// Overrides the default headers. The session cookie is always added.
    pub headers: HeaderMap,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), body: None, headers: HeaderMap::new() }
    }

    pub fn get(path: impl Into<String>) -> Self { Self::new(Method::GET, path) }

    pub fn post(path: impl Into<String>, body: Value) -> Self { Self::new(Method::POST, path).with_body(body) }

    pub fn put(path: impl Into<String>, body: Value) -> Self { Self::new(Method::PUT, path).with_body(body) }

    pub fn patch(path: impl Into<String>, body: Value) -> Self { Self::new(Method::PATCH, path).with_body(body) }

    pub fn delete(path: impl Into<String>) -> Self { Self::new(Method::DELETE, path) }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }
}

impl Client {
    /// Perform one authenticated call and return the decoded JSON body.
    ///
    /// Requires a stored session token; never triggers a login itself.
    pub async fn execute(&self, req: ApiRequest) -> Result<Value> {
        let token = self.session.get().filter(|t| !t.is_empty()).ok_or(ClientError::MissingSession)?;
        let url = self.url_for(&req.path)?;
        let headers = build_headers(&req.headers, &token)?;
        debug!(target: "tagone", "request: {} {}", req.method, req.path);

        let http = HttpRequest { method: req.method, url, headers, body: req.body };
        let resp = self.round_trip(&req.path, self.config.request_timeout, http).await?;
        debug!(target: "tagone", "response: {} status={}", req.path, resp.status);
        decode_response(resp)
    }

    /// GET `path` and deserialize the body into `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.execute(ApiRequest::get(path)).await?;
        decode_value(&value)
    }

    /// Send `body` with `method` to `path` and deserialize the answer into `T`.
    pub async fn send_json<T: DeserializeOwned>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T> {
        let mut req = ApiRequest::new(method, path);
        req.body = body;
        let value = self.execute(req).await?;
        decode_value(&value)
    }
}

fn build_headers(overrides: &HeaderMap, token: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    for name in overrides.keys() {
        headers.remove(name);
        for value in overrides.get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    let cookie = match headers.get(COOKIE).and_then(|v| v.to_str().ok()) {
        Some(existing) if !existing.is_empty() => format!("{existing}; {token}"),
        _ => token.to_string(),
    };
    let cookie = HeaderValue::from_str(&cookie).map_err(ClientError::transport)?;
    headers.insert(COOKIE, cookie);
    Ok(headers)
}

/// Map a raw response to JSON or to a typed failure.
pub(crate) fn decode_response(resp: HttpResponse) -> Result<Value> {
    if resp.status >= 400 {
        warn!(target: "tagone", "remote error: status={} body_len={}", resp.status, resp.body.len());
        return Err(ClientError::remote(resp.status, &resp.body));
    }
    if resp.status == 204 {
        return Ok(Value::Null);
    }
    match serde_json::from_str(&resp.body) {
        Ok(v) => Ok(v),
        Err(e) => Err(ClientError::decode(resp.body, e)),
    }
}

/// Deserialize an already-parsed body, keeping the JSON text on failure.
pub(crate) fn decode_value<T: DeserializeOwned>(value: &Value) -> Result<T> {
    T::deserialize(value).map_err(|e| ClientError::decode(value.to_string(), e))
}
