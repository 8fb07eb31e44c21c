//! API gateway for the crypto app
//!
//! Public entry point of the system: authenticates clients with HS256
//! tokens, routes calls to the account and crypto services and reshapes
//! their envelopes into one response format.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod upstream;

use std::sync::Arc;

use axum::http::{HeaderValue, Request};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use common::error::Result;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::{require_auth, JwtKeys};
use crate::config::GatewayConfig;
use crate::upstream::UpstreamClient;

/// App state shared across handlers
pub struct AppState {
    /// Gateway configuration
    pub config: GatewayConfig,
    /// Client for the backend services
    pub upstream: UpstreamClient,
    /// Token keys
    pub jwt: JwtKeys,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let upstream = UpstreamClient::new(&config)?;
        let jwt = JwtKeys::new(&config.jwt_secret, config.jwt_ttl);
        Ok(Self { config, upstream, jwt })
    }
}

/// Fresh v4 UUID for requests that arrive without an id
#[derive(Clone, Copy, Default)]
struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Full gateway router
pub fn router(state: Arc<AppState>) -> Router {
    let account_routes = Router::new()
        .route("/", get(api::account::get_account).delete(api::account::delete_account))
        .route("/balance", get(api::account::get_balance).put(api::account::deposit))
        .route(
            "/activity",
            get(api::account::list_activities)
                .post(api::account::buy)
                .delete(api::account::sell),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let api_routes = Router::new()
        .route("/auth/signup", post(api::auth::signup))
        .route("/auth/login", post(api::auth::login))
        .route("/crypto/prices", get(api::crypto::prices))
        .route("/crypto/history", get(api::crypto::history))
        .route("/crypto/diff", get(api::crypto::diff))
        .nest("/account", account_routes);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(api::health))
        .nest("/api/v1", api_routes)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
