//! Account API handlers
//!
//! Handles endpoints related to account management:
//! - Create, get and delete an account
//! - Login
//! - Balance and deposits

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use common::decimal::Amount;
use common::model::account::{AccountView, Balance};
use serde::Deserialize;
use uuid::Uuid;

use super::response::{ApiError, ApiResponse, ApiResult};
use crate::service::{AccountService, BalanceSummary, LoginOutcome};

/// Create account request
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub login: String,
    pub password: String,
    pub email: String,
}

/// Login by login or email
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    #[serde(default, rename = "fetchActivity")]
    pub fetch_activity: bool,
}

#[derive(Debug, Deserialize)]
pub struct DepositQuery {
    pub deposit: Amount,
}

/// Create a new account
pub async fn create_account(
    State(service): State<Arc<AccountService>>,
    body: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> ApiResult<AccountView> {
    let Json(request) = body.map_err(ApiError::rejected)?;
    let account = service
        .create_account(&request.login, &request.password, &request.email)
        .await?;
    Ok(ApiResponse::created(account))
}

/// Login with query parameters
pub async fn login_query(
    State(service): State<Arc<AccountService>>,
    query: Result<Query<LoginRequest>, QueryRejection>,
) -> ApiResult<LoginOutcome> {
    let Query(request) = query.map_err(ApiError::rejected)?;
    login(&service, request).await
}

/// Login with a JSON body
pub async fn login_body(
    State(service): State<Arc<AccountService>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginOutcome> {
    let Json(request) = body.map_err(ApiError::rejected)?;
    login(&service, request).await
}

async fn login(service: &AccountService, request: LoginRequest) -> ApiResult<LoginOutcome> {
    let outcome = service
        .login(&request.login, &request.password, &request.email)
        .await?;
    Ok(ApiResponse::ok(outcome))
}

/// Get an account by ID
pub async fn get_account(
    State(service): State<Arc<AccountService>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<AccountView> {
    let Path(id) = id.map_err(ApiError::rejected)?;
    Ok(ApiResponse::ok(service.get_account(id).await?))
}

/// Delete an account with everything it owns
pub async fn delete_account(
    State(service): State<Arc<AccountService>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = id.map_err(ApiError::rejected)?;
    service.delete_account(id).await?;
    Ok(ApiResponse::ok(()))
}

/// Get the balance, optionally with the value of all holdings
pub async fn get_balance(
    State(service): State<Arc<AccountService>>,
    id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<BalanceQuery>, QueryRejection>,
) -> ApiResult<BalanceSummary> {
    let Path(id) = id.map_err(ApiError::rejected)?;
    let Query(query) = query.map_err(ApiError::rejected)?;
    let summary = service.get_balance_summary(id, query.fetch_activity).await?;
    Ok(ApiResponse::ok(summary))
}

/// Deposit USD
pub async fn deposit(
    State(service): State<Arc<AccountService>>,
    id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<DepositQuery>, QueryRejection>,
) -> ApiResult<Balance> {
    let Path(id) = id.map_err(ApiError::rejected)?;
    let Query(query) = query.map_err(ApiError::rejected)?;
    let balance = service.fake_deposit(id, query.deposit).await?;
    Ok(ApiResponse::ok(balance))
}
