//! Unified client error model.
//! Every failure in the client becomes one of these variants and is returned to
//! the immediate caller; nothing here is retried or swallowed.

use std::time::Duration;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Max characters of a remote error body kept for diagnostics.
pub const BODY_EXCERPT_CHARS: usize = 50;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Credentials rejected or the login call returned a non-success status.
    #[error("authentication failed: HTTP {status}")]
    Authentication { status: u16 },

    /// Login succeeded at the HTTP level but carried no usable session cookie.
    #[error("login response carried no usable '{cookie}' session cookie")]
    SessionExtraction { cookie: String },

    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    /// Authenticated call returned a status >= 400.
    #[error("remote error: HTTP {status}: {body_excerpt}")]
    Remote { status: u16, body_excerpt: String },

    /// Transport succeeded (< 400) but the payload was not the expected JSON.
    #[error("response body is not valid JSON: {source}")]
    ResponseDecode {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// An authenticated call was attempted with no session token stored.
    #[error("no session token; login first")]
    MissingSession,

    #[error("transport failure: {0}")]
    Transport(#[source] BoxError),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    pub fn code_str(&self) -> &'static str {
        match self {
            ClientError::Authentication { .. } => "authentication_failed",
            ClientError::SessionExtraction { .. } => "session_extraction_failed",
            ClientError::Timeout { .. } => "timeout",
            ClientError::Remote { .. } => "remote_error",
            ClientError::ResponseDecode { .. } => "response_decode_failed",
            ClientError::MissingSession => "missing_session",
            ClientError::Transport(_) => "transport_error",
            ClientError::InvalidUrl(_) => "invalid_url",
            ClientError::Config(_) => "invalid_config",
        }
    }

    /// HTTP status carried by the error, if the remote produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Authentication { status } | ClientError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for 401/403 remote failures, i.e. the session is gone or not
    /// allowed. Re-authenticating is left to the caller.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Remote { status: 401 | 403, .. })
    }

    pub fn transport<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        ClientError::Transport(err.into())
    }

    pub(crate) fn remote(status: u16, body: &str) -> Self {
        ClientError::Remote { status, body_excerpt: excerpt(body) }
    }

    pub(crate) fn decode(body: String, source: serde_json::Error) -> Self {
        ClientError::ResponseDecode { body, source }
    }
}

/// First `BODY_EXCERPT_CHARS` characters of `body`, never splitting a char.
pub fn excerpt(body: &str) -> String {
    match body.char_indices().nth(BODY_EXCERPT_CHARS) {
        Some((idx, _)) => body[..idx].to_string(),
        None => body.to_string(),
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_mapping() {
        assert_eq!(ClientError::Authentication { status: 401 }.code_str(), "authentication_failed");
        assert_eq!(ClientError::SessionExtraction { cookie: "c".into() }.code_str(), "session_extraction_failed");
        assert_eq!(ClientError::MissingSession.code_str(), "missing_session");
        assert_eq!(ClientError::remote(500, "boom").code_str(), "remote_error");
        assert_eq!(ClientError::Config("x".into()).code_str(), "invalid_config");
    }

    #[test]
    fn unauthorized_detection() {
        assert!(ClientError::remote(401, "").is_unauthorized());
        assert!(ClientError::remote(403, "").is_unauthorized());
        assert!(!ClientError::remote(404, "").is_unauthorized());
        // a rejected login is its own variant, not a remote 401
        assert!(!ClientError::Authentication { status: 401 }.is_unauthorized());
        assert_eq!(ClientError::Authentication { status: 401 }.status(), Some(401));
        assert_eq!(ClientError::MissingSession.status(), None);
    }

    #[test]
    fn excerpt_truncates_on_char_boundary() {
        assert_eq!(excerpt("not found"), "not found");
        let long = "x".repeat(120);
        assert_eq!(excerpt(&long).len(), BODY_EXCERPT_CHARS);
        let wide = "é".repeat(60);
        let cut = excerpt(&wide);
        assert_eq!(cut.chars().count(), BODY_EXCERPT_CHARS);
    }

    #[test]
    fn remote_display_includes_status_and_excerpt() {
        let e = ClientError::remote(404, "not found");
        assert_eq!(e.to_string(), "remote error: HTTP 404: not found");
        match e {
            ClientError::Remote { status, body_excerpt } => {
                assert_eq!(status, 404);
                assert_eq!(body_excerpt, "not found");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
