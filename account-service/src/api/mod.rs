//! HTTP API of the account service
//!
//! Every route lives under `/v1/account` and answers with the service
//! envelope, errors included.

pub mod account;
pub mod activity;
pub mod response;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::service::AccountService;

pub use response::{ApiError, ApiResponse, ApiResult};

/// Router for the account service
pub fn router(service: Arc<AccountService>) -> Router {
    let routes = Router::new()
        .route("/", post(account::create_account))
        .route("/login", get(account::login_query).post(account::login_body))
        .route("/:id", get(account::get_account).delete(account::delete_account))
        .route("/:id/balance", get(account::get_balance).put(account::deposit))
        .route(
            "/:id/activity",
            get(activity::list).post(activity::buy).delete(activity::sell),
        );

    Router::new()
        .nest("/v1/account", routes)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
