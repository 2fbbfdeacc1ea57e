//! Login handshake and identity claims.
//!
//! `login` exchanges credentials for the session cookie, stores it, then loads
//! the claims of the authenticated identity. The identity endpoint answers with
//! two parallel arrays (`Keys`, `Values`) which are zipped into [`Claims`].

use std::collections::BTreeMap;

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::error::{ClientError, Result};
use crate::executor::{decode_value, ApiRequest};
use crate::session::extract_session_token;
use crate::transport::HttpRequest;

/// Claim name -> claim value for the authenticated identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(BTreeMap<String, String>);

impl Claims {
    /// Zip parallel name/value arrays. Stops at the shorter array; pairs with a
    /// missing, null or empty name are skipped. Null values become `""`.
    pub fn from_parallel(keys: &[Value], values: &[Value]) -> Self {
        if keys.len() != values.len() {
            debug!(target: "tagone", "claims: keys={} values={} (zipping the shorter)", keys.len(), values.len());
        }
        let mut map = BTreeMap::new();
        for (idx, (k, v)) in keys.iter().zip(values.iter()).enumerate() {
            let name = match k {
                Value::String(s) if !s.is_empty() => s.clone(),
                _ => {
                    debug!(target: "tagone", "claims: skipping index {} with unusable key {}", idx, k);
                    continue;
                }
            };
            let value = match v {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            map.insert(name, value);
        }
        Claims(map)
    }

    pub fn get(&self, name: &str) -> Option<&str> { self.0.get(name).map(String::as_str) }

    pub fn contains(&self, name: &str) -> bool { self.0.contains_key(name) }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> BTreeMap<String, String> { self.0 }
}

#[derive(Debug, Deserialize)]
struct IdentityResponse {
    #[serde(rename = "Keys", alias = "keys", default)]
    keys: Vec<Value>,
    #[serde(rename = "Values", alias = "values", default)]
    values: Vec<Value>,
}

impl Client {
    /// Authenticate and return the identity claims.
    ///
    /// Credentials travel in the login path's query string. On success the
    /// extracted session token replaces any stored one. A rejected login leaves
    /// the session store untouched.
    pub async fn login(&self, username: &str, password: &str) -> Result<Claims> {
        let path = format!(
            "{}?username={}&password={}",
            self.config.login_path,
            urlencoding::encode(username),
            urlencoding::encode(password)
        );
        let req = HttpRequest { method: Method::GET, url: self.url_for(&path)?, headers: HeaderMap::new(), body: None };
        debug!(target: "tagone", "login: user={}", username);

        let resp = self.round_trip("login", self.config.login_timeout, req).await?;
        if !resp.is_success() {
            warn!(target: "tagone", "login rejected: user={} status={}", username, resp.status);
            return Err(ClientError::Authentication { status: resp.status });
        }
        let cookie = &self.config.session_cookie;
        let Some(token) = extract_session_token(&resp.headers, cookie) else {
            warn!(target: "tagone", "login: status={} but no '{}' cookie", resp.status, cookie);
            return Err(ClientError::SessionExtraction { cookie: cookie.clone() });
        };
        info!(target: "tagone", "login ok: user={} token_len={}", username, token.len());
        // claims belong to the session that produced them
        self.session.set(token);
        *self.claims.write() = None;

        self.get_identity().await
    }

    /// Fetch the claims of the current session and refresh the cache.
    pub async fn get_identity(&self) -> Result<Claims> {
        let value = self.execute(ApiRequest::get(self.config.identity_path.clone())).await?;
        let identity: IdentityResponse = decode_value(&value)?;
        let claims = Claims::from_parallel(&identity.keys, &identity.values);
        debug!(target: "tagone", "identity: {} claims", claims.len());
        *self.claims.write() = Some(claims.clone());
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vals(v: Value) -> Vec<Value> { v.as_array().cloned().unwrap_or_default() }

    #[test]
    fn zips_equal_length_arrays() {
        let c = Claims::from_parallel(&vals(json!(["name", "role"])), &vals(json!(["ada", "admin"])));
        assert_eq!(c.len(), 2);
        assert_eq!(c.get("name"), Some("ada"));
        assert_eq!(c.get("role"), Some("admin"));
    }

    #[test]
    fn stops_at_shorter_array() {
        let c = Claims::from_parallel(&vals(json!(["a", "b", "c"])), &vals(json!(["1"])));
        assert_eq!(c.len(), 1);
        assert_eq!(c.get("a"), Some("1"));
        let c = Claims::from_parallel(&vals(json!(["a"])), &vals(json!(["1", "2", "3"])));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn skips_missing_and_empty_keys() {
        let c = Claims::from_parallel(
            &vals(json!(["a", null, "", "d", 7])),
            &vals(json!(["1", "2", "3", null, "5"])),
        );
        assert_eq!(c.iter().collect::<Vec<_>>(), vec![("a", "1"), ("d", "")]);
    }

    #[test]
    fn non_string_values_are_rendered() {
        let c = Claims::from_parallel(&vals(json!(["id", "active"])), &vals(json!([42, true])));
        assert_eq!(c.get("id"), Some("42"));
        assert_eq!(c.get("active"), Some("true"));
    }

    #[test]
    fn identity_response_tolerates_missing_arrays() {
        let r: IdentityResponse = serde_json::from_value(json!({ "Keys": ["a"] })).unwrap();
        assert!(Claims::from_parallel(&r.keys, &r.values).is_empty());
        let r: IdentityResponse = serde_json::from_value(json!({ "keys": ["a"], "values": ["b"] })).unwrap();
        assert_eq!(Claims::from_parallel(&r.keys, &r.values).get("a"), Some("b"));
    }
}
