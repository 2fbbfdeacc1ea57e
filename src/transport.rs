//! HTTP transport capability.
//! The client performs all I/O through [`Transport`]; [`ReqwestTransport`] is the
//! production implementation, tests substitute scripted ones.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, Url};
use serde_json::Value;
use tracing::debug;

use crate::error::{ClientError, Result, BODY_EXCERPT_CHARS};

/// Bytes read from an error response; enough for the excerpt in any encoding.
const ERROR_BODY_LIMIT: usize = BODY_EXCERPT_CHARS * 4;

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Multi-valued headers are preserved (`Set-Cookie`).
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// One request/response round trip. Fails only when no response was received.
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse>;
}

/// [`Transport`] over a `reqwest::Client`. Cookies are not stored by reqwest;
/// the session cookie travels in explicit headers.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().build().map_err(ClientError::transport)?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self { Self { client } }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse> {
        let HttpRequest { method, url, headers, body } = req;
        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(b) = body {
            builder = builder.body(serde_json::to_vec(&b).map_err(ClientError::transport)?);
        }
        let resp = builder.send().await.map_err(ClientError::transport)?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = if status >= 400 {
            read_capped(resp, ERROR_BODY_LIMIT).await?
        } else {
            resp.text().await.map_err(ClientError::transport)?
        };
        debug!(target: "tagone", "transport: status={} body_len={}", status, body.len());
        Ok(HttpResponse { status, headers, body })
    }
}

/// Read at most `limit` bytes of the body, dropping the rest unread.
async fn read_capped(mut resp: reqwest::Response, limit: usize) -> Result<String> {
    let mut buf: Vec<u8> = Vec::new();
    while buf.len() < limit {
        match resp.chunk().await.map_err(ClientError::transport)? {
            Some(chunk) => buf.extend_from_slice(&chunk),
            None => break,
        }
    }
    buf.truncate(limit);
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
