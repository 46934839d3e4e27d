pub mod auth;
pub mod health;
pub mod livetv;
pub mod player;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::models::ApiResponse;
use crate::services::xtream::XtreamCredentials;
use crate::AppState;

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<serde_json::Value>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    let body = ApiResponse::<()>::error(message);
    (
        status,
        Json(serde_json::to_value(body).unwrap_or_else(|_| serde_json::json!({"success": false}))),
    )
}

/// Credentials of the logged-in account, or 401
pub(crate) fn require_login(state: &AppState) -> Result<XtreamCredentials, ApiError> {
    state
        .accounts
        .current_user()
        .map(|user| user.xtream())
        .map_err(|e| api_error(StatusCode::UNAUTHORIZED, e.to_string()))
}

/// All endpoints, without middleware
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health endpoints
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .route("/ready", get(health::ready))
        .route("/live", get(health::live))
        // Account
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/account", get(auth::account_info))
        .route("/api/home/counters", get(auth::home_counters))
        // Live TV catalog
        .route("/api/live/categories", get(livetv::get_categories))
        .route(
            "/api/live/categories/:category_id/channels",
            get(livetv::get_channels),
        )
        .route("/api/live/refresh", post(livetv::refresh))
        .route("/api/live/stream-url", get(livetv::get_stream_url))
        // Player sessions
        .route("/api/player/sessions", post(player::create_session))
        .route(
            "/api/player/sessions/:id",
            get(player::get_session).delete(player::dispose_session),
        )
        .route("/api/player/sessions/:id/stream", get(player::stream_session))
        .route("/api/player/sessions/:id/command", post(player::send_command))
        .route("/api/player/sessions/:id/events", post(player::post_engine_event))
        .route(
            "/api/player/sessions/:id/engine-commands",
            get(player::drain_engine_commands),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_state, FakeCatalogApi};
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn logged_in_app() -> (Router, Arc<FakeCatalogApi>) {
        let api = Arc::new(FakeCatalogApi::new());
        let app = router(test_state(api.clone()).await);
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/auth/login",
            Some(json!({"host": "http://tv.example.com:80", "username": "alice", "password": "secret"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        (app, api)
    }

    #[tokio::test]
    async fn test_catalog_requires_login() {
        let app = router(test_state(Arc::new(FakeCatalogApi::new())).await);
        let (status, body) = call(&app, Method::GET, "/api/live/categories", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_login_then_browse_then_stream_url() {
        let (app, api) = logged_in_app().await;

        let (status, body) = call(&app, Method::GET, "/api/live/categories", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["categories"][0]["id"], "1");
        assert_eq!(body["categories"][0]["name"], "Sports");

        let (status, body) =
            call(&app, Method::GET, "/api/live/categories/1/channels", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(body["channels"][0]["streamId"], 1001);

        // second read within the TTL is served from memory
        call(&app, Method::GET, "/api/live/categories/1/channels", None).await;
        assert_eq!(api.channel_calls("1"), 1);

        let (status, body) = call(
            &app,
            Method::GET,
            "/api/live/stream-url?stream_id=1001",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["url"],
            "http://tv.example.com:80/live/alice/secret/1001.m3u8"
        );
    }

    #[tokio::test]
    async fn test_channel_search_and_refresh() {
        let (app, api) = logged_in_app().await;

        let (_, body) = call(
            &app,
            Method::GET,
            "/api/live/categories/1/channels?q=channel%201-2",
            None,
        )
        .await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["channels"][0]["name"], "Channel 1-2");

        call(&app, Method::GET, "/api/live/categories", None).await;
        let (status, _) = call(&app, Method::POST, "/api/live/refresh", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(api.category_calls(), 2);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_bad_gateway() {
        let (app, api) = logged_in_app().await;
        api.fail_with(Some(crate::services::xtream::XtreamError::Http(500)));

        let (status, body) = call(&app, Method::GET, "/api/live/categories", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "server error 500");
    }

    #[tokio::test]
    async fn test_inactive_login_is_unauthorized() {
        let api = Arc::new(FakeCatalogApi::new());
        api.set_account_status("Banned");
        let app = router(test_state(api).await);

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/auth/login",
            Some(json!({"host": "http://tv", "username": "alice", "password": "secret"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Usuario inactivo o credenciales inválidas");
    }

    #[tokio::test]
    async fn test_player_session_lifecycle() {
        let (app, _api) = logged_in_app().await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/player/sessions",
            Some(json!({"deviceId": "tv-1", "categoryId": "1", "streamId": 1001})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["snapshot"]["channelName"], "Channel 1-1");
        assert_eq!(
            body["snapshot"]["streamUrl"],
            "http://tv.example.com:80/live/alice/secret/1001.m3u8"
        );
        let id = body["id"].as_str().unwrap().to_string();

        let (_, body) = call(
            &app,
            Method::GET,
            &format!("/api/player/sessions/{}/engine-commands", id),
            None,
        )
        .await;
        assert_eq!(body["commands"][0]["op"], "set_media");

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/player/sessions/{}/events", id),
            Some(json!({"type": "error", "code": 2001})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["kind"], "error");
        assert_eq!(body["errorMessage"], "Error de conexión de red");

        let (_, body) = call(
            &app,
            Method::POST,
            &format!("/api/player/sessions/{}/command", id),
            Some(json!({"command": "retry"})),
        )
        .await;
        assert_eq!(body["state"]["kind"], "buffering");

        let (status, body) = call(
            &app,
            Method::DELETE,
            &format!("/api/player/sessions/{}", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let commands = body["commands"].as_array().unwrap();
        assert_eq!(commands.last().unwrap()["op"], "release");

        let (status, _) = call(
            &app,
            Method::GET,
            &format!("/api/player/sessions/{}", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bad_session_id() {
        let (app, _api) = logged_in_app().await;
        let (status, _) = call(&app, Method::GET, "/api/player/sessions/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _api) = logged_in_app().await;
        let (status, body) = call(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["loggedIn"], true);
        assert_eq!(body["playerSessions"], 0);
    }
}
