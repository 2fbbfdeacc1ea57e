//! End-to-end run of the reqwest transport against an in-process axum service
//! bound to an ephemeral localhost port.

mod common;

use std::collections::HashMap;

use anyhow::Result;
use axum::extract::Query;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use tagone_client::{Client, ClientConfig, ClientError, PageRequest, QueryDescription};

const TOKEN: &str = "srv-token-123";
const TOTAL_ORDERS: u64 = 95;

fn has_session(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split(';').any(|p| p.trim() == format!("TagoneCookie={TOKEN}")))
        .unwrap_or(false)
}

async fn login(Query(params): Query<HashMap<String, String>>) -> Response {
    let ok = params.get("username").map(String::as_str) == Some("ada")
        && params.get("password").map(String::as_str) == Some("love lace&1");
    if !ok {
        return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
    }
    let mut headers = HeaderMap::new();
    headers.append(header::SET_COOKIE, HeaderValue::from_str(&format!("TagoneCookie={TOKEN}; HttpOnly; Path=/")).unwrap());
    headers.append(header::SET_COOKIE, HeaderValue::from_static("OtherCookie=zzz; Path=/"));
    (StatusCode::OK, headers, Json(json!({"status": "ok"}))).into_response()
}

async fn claims(headers: HeaderMap) -> Response {
    if !has_session(&headers) {
        return (StatusCode::UNAUTHORIZED, "no session").into_response();
    }
    Json(json!({ "Keys": ["name", "role", ""], "Values": ["ada", "admin"] })).into_response()
}

async fn orders(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Response {
    if !has_session(&headers) {
        return (StatusCode::UNAUTHORIZED, "no session").into_response();
    }
    if params.get("$count").map(String::as_str) != Some("true") {
        return (StatusCode::BAD_REQUEST, "count required").into_response();
    }
    let skip: u64 = params.get("$skip").and_then(|s| s.parse().ok()).unwrap_or(0);
    let top: u64 = params.get("$top").and_then(|s| s.parse().ok()).unwrap_or(TOTAL_ORDERS);
    let rows: Vec<Value> = (1..=TOTAL_ORDERS)
        .skip(skip as usize)
        .take(top as usize)
        .map(|id| json!({ "Id": id, "Filter": params.get("$filter") }))
        .collect();
    Json(json!({ "value": rows, "@odata.count": TOTAL_ORDERS })).into_response()
}

async fn broken() -> &'static str { "definitely not json" }

async fn exploded() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "stack frame\n".repeat(100_000)).into_response()
}

async fn start_server() -> Result<(JoinHandle<()>, String)> {
    let app = Router::new()
        .route("/api/Login", get(login))
        .route("/api/Claims", get(claims))
        .route("/api/Orders", get(orders))
        .route("/api/Broken", get(broken))
        .route("/api/Exploded", get(exploded));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("test server error: {e:?}");
        }
    });
    Ok((handle, format!("http://{addr}/api")))
}

struct Guard(JoinHandle<()>);
impl Drop for Guard {
    fn drop(&mut self) { self.0.abort(); }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn login_list_and_errors_over_http() -> Result<()> {
    common::init_tracing();
    let (srv, base) = start_server().await?;
    let _g = Guard(srv);

    let client = Client::new(ClientConfig::new(&base))?;

    let err = client.login("ada", "wrong").await.unwrap_err();
    assert!(matches!(err, ClientError::Authentication { status: 401 }), "{err:?}");

    let claims = client.login("ada", "love lace&1").await?;
    assert_eq!(claims.get("name"), Some("ada"));
    assert_eq!(claims.get("role"), Some("admin"));
    assert_eq!(claims.len(), 2);
    assert_eq!(client.session_token().as_deref(), Some("TagoneCookie=srv-token-123"));

    let q = QueryDescription::new().filter("Id gt 0").order_by("Id asc");
    let page = client.list::<Value>("Orders", Some(q.clone()), PageRequest::new(5, 20u32)).await?;
    assert_eq!(page.meta.count, TOTAL_ORDERS);
    assert_eq!(page.meta.pages, 5);
    assert_eq!(page.meta.page, 5);
    assert_eq!(page.data.len(), 15);
    assert_eq!(page.data[0]["Id"], 81);
    assert_eq!(page.data[0]["Filter"], "Id gt 0");
    assert_eq!(page.meta.filter, q.filter);

    let all: Vec<Value> = client.get_all("Orders", None).await?;
    assert_eq!(all.len() as u64, TOTAL_ORDERS);

    let err = client.execute(tagone_client::ApiRequest::get("Missing")).await.unwrap_err();
    assert_eq!(err.status(), Some(404));

    let err = client.execute(tagone_client::ApiRequest::get("Broken")).await.unwrap_err();
    assert!(matches!(err, ClientError::ResponseDecode { ref body, .. } if body == "definitely not json"), "{err:?}");

    match client.execute(tagone_client::ApiRequest::get("Exploded")).await {
        Err(ClientError::Remote { status, body_excerpt }) => {
            assert_eq!(status, 500);
            assert_eq!(body_excerpt.chars().count(), 50);
            assert!(body_excerpt.starts_with("stack frame\n"));
        }
        other => panic!("unexpected {other:?}"),
    }

    client.clear_session();
    let err = client.execute(tagone_client::ApiRequest::get("Orders")).await.unwrap_err();
    assert!(matches!(err, ClientError::MissingSession));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stale_token_is_rejected_by_remote() -> Result<()> {
    let (srv, base) = start_server().await?;
    let _g = Guard(srv);

    let client = Client::new(ClientConfig::new(&base).with_token("TagoneCookie=stale"))?;
    let err = client.get_identity().await.unwrap_err();
    assert!(err.is_unauthorized(), "{err:?}");
    Ok(())
}
