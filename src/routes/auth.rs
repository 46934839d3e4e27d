//! Login, logout, account details and home screen counters.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{api_error, ApiError};
use crate::models::ApiResponse;
use crate::services::account::AuthError;
use crate::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub username: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp_date: Option<String>,
    pub max_connections: u32,
}

fn auth_error(e: AuthError) -> ApiError {
    let status = match &e {
        AuthError::MissingFields => StatusCode::BAD_REQUEST,
        AuthError::Inactive { .. } | AuthError::NotLoggedIn => StatusCode::UNAUTHORIZED,
        AuthError::EmptyResponse | AuthError::Upstream(_) => StatusCode::BAD_GATEWAY,
        AuthError::Storage(err) => {
            tracing::error!("Credential storage error: {:#}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    api_error(status, e.to_string())
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let auth = state
        .accounts
        .login(&req.host, &req.username, &req.password)
        .await
        .map_err(auth_error)?;

    let info = auth.user_info;
    Ok(Json(ApiResponse::success(LoginData {
        max_connections: info.max_connections(),
        username: info.username,
        status: info.status,
        exp_date: info.exp_date,
    })))
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    state.accounts.logout().await.map_err(auth_error)?;
    Ok(Json(ApiResponse::success(serde_json::json!({"loggedOut": true}))))
}

/// GET /api/account
pub async fn account_info(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let info = state.accounts.account_info().await.map_err(auth_error)?;
    Ok(Json(info))
}

/// GET /api/home/counters
pub async fn home_counters(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let counters = state.accounts.counters().await.map_err(auth_error)?;
    Ok(Json(counters))
}
