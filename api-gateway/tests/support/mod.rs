//! Fake backend services for the gateway tests

use std::sync::Arc;

use api_gateway::config::GatewayConfig;
use api_gateway::{router, AppState};
use axum::body::Body;
use axum::extract::{Path, RawQuery};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use common::envelope::Envelope;
use common::error::Error;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;
use uuid::Uuid;

pub const SECRET: &str = "gateway-test-secret";
pub const PASSWORD: &str = "secret-password";
pub const ACCOUNT_ID: Uuid = Uuid::from_u128(0x6f1c_2a44_9b1e_4d0f_8a6e_1c3b_5d7e_9f01);

/// Nothing listens on the discard port
pub const UNREACHABLE: &str = "http://127.0.0.1:9";

pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn ok(status: StatusCode, payload: Value) -> Response {
    (status, Json(Envelope::ok(status.as_u16(), payload))).into_response()
}

fn failed(err: Error) -> Response {
    let envelope = Envelope::from_error(&err);
    (StatusCode::from_u16(envelope.http_code).unwrap(), Json(envelope)).into_response()
}

fn request_id(headers: &HeaderMap) -> Value {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|v| Value::String(v.to_string()))
        .unwrap_or(Value::Null)
}

/// Account service double: echoes what it was asked so tests can see the
/// path, query and body the gateway forwarded
pub fn fake_account_service() -> Router {
    Router::new()
        .route(
            "/v1/account",
            post(|Json(body): Json<Value>| async move {
                ok(StatusCode::CREATED, json!({"id": ACCOUNT_ID, "login": body["login"], "roles": ["user"]}))
            }),
        )
        .route(
            "/v1/account/login",
            post(|Json(body): Json<Value>| async move {
                if body["password"] == PASSWORD {
                    ok(StatusCode::OK, json!({"account_id": ACCOUNT_ID, "roles": ["user"]}))
                } else {
                    failed(Error::InvalidCredentials)
                }
            }),
        )
        .route(
            "/v1/account/:id",
            get(|Path(id): Path<String>, headers: HeaderMap| async move {
                ok(StatusCode::OK, json!({"id": id, "request_id": request_id(&headers)}))
            })
            .delete(|Path(id): Path<String>| async move { ok(StatusCode::OK, json!({"deleted": id})) }),
        )
        .route(
            "/v1/account/:id/balance",
            get(|Path(id): Path<String>, RawQuery(query): RawQuery| async move {
                ok(StatusCode::OK, json!({"account_id": id, "query": query}))
            })
            .put(|Path(id): Path<String>, RawQuery(query): RawQuery| async move {
                ok(StatusCode::OK, json!({"account_id": id, "query": query}))
            }),
        )
        .route(
            "/v1/account/:id/activity",
            get(|Path(id): Path<String>, RawQuery(query): RawQuery| async move {
                ok(StatusCode::OK, json!({"account_id": id, "query": query}))
            })
            .post(|Path(id): Path<String>, Json(body): Json<Value>| async move {
                if body["price"] == json!(1_000_000) {
                    return failed(Error::InsufficientBalance("Account has 15000 USD".to_string()));
                }
                ok(StatusCode::OK, json!({"account_id": id, "side": "buy", "body": body}))
            })
            .delete(|Path(id): Path<String>, Json(body): Json<Value>| async move {
                ok(StatusCode::OK, json!({"account_id": id, "side": "sell", "body": body}))
            }),
        )
}

/// Crypto service double. `symbol=BROKEN` answers with a non-envelope body.
pub fn fake_crypto_service() -> Router {
    Router::new()
        .route(
            "/v1/crypto/prices",
            get(|RawQuery(query): RawQuery| async move {
                match query.as_deref() {
                    Some(q) if q.contains("symbol=BROKEN") => (StatusCode::OK, "not an envelope").into_response(),
                    Some(q) if q.contains("symbol=BTC") => ok(StatusCode::OK, json!({"Prices": {"USD": 50000.5}})),
                    _ => failed(Error::BadRequest("Missing query parameter: symbol".to_string())),
                }
            }),
        )
        .route(
            "/v1/crypto/history",
            get(|RawQuery(query): RawQuery| async move { ok(StatusCode::OK, json!({"query": query})) }),
        )
        .route(
            "/v1/crypto/diff",
            get(|RawQuery(query): RawQuery| async move { ok(StatusCode::OK, json!({"query": query})) }),
        )
}

/// Gateway in front of both doubles
pub async fn gateway() -> (Router, Arc<AppState>) {
    let account_url = serve(fake_account_service()).await;
    let crypto_url = serve(fake_crypto_service()).await;
    gateway_for(&account_url, &crypto_url)
}

pub fn gateway_for(account_url: &str, crypto_url: &str) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(GatewayConfig::new(account_url, crypto_url, SECRET)).unwrap());
    (router(state.clone()), state)
}

/// Send one request through the router
pub async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, headers, body)
}

/// Token for the test account, obtained through the login route
pub async fn login(app: &Router) -> String {
    let (status, _, body) = call(
        app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"login": "alice", "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["token"].as_str().unwrap().to_string()
}
