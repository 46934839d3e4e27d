//! Xtream Codes API Types
//!
//! Type definitions for Xtream Codes Player API v2 requests and responses.

use serde::{Deserialize, Serialize};

use crate::models::lenient;

/// Panel location and login for one account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XtreamCredentials {
    /// Server base URL without trailing slash (e.g., "http://example.com:8080")
    pub server: String,
    /// Username for authentication
    pub username: String,
    /// Password for authentication
    pub password: String,
}

impl XtreamCredentials {
    /// Build credentials, trimming the host and stripping any trailing slash
    pub fn new(host: &str, username: &str, password: &str) -> Self {
        Self {
            server: host.trim().trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Build the player_api.php base URL
    pub fn api_url(&self) -> String {
        format!(
            "{}/player_api.php?username={}&password={}",
            self.server,
            urlencoding::encode(&self.username),
            urlencoding::encode(&self.password)
        )
    }

    /// Build playback URL for live streams
    pub fn live_url(&self, stream_id: i64, extension: &str) -> String {
        format!(
            "{}/live/{}/{}/{}.{}",
            self.server, self.username, self.password, stream_id, extension
        )
    }

    /// Build playback URL for VOD
    pub fn vod_url(&self, stream_id: i64, extension: &str) -> String {
        format!(
            "{}/movie/{}/{}/{}.{}",
            self.server, self.username, self.password, stream_id, extension
        )
    }

    /// Build playback URL for series episodes
    pub fn series_url(&self, episode_id: i64, extension: &str) -> String {
        format!(
            "{}/series/{}/{}/{}.{}",
            self.server, self.username, self.password, episode_id, extension
        )
    }
}

// ============================================================================
// Authentication Response Types
// ============================================================================

/// Main authentication response from player_api.php (no action)
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct XtreamAuthResponse {
    pub user_info: XtreamUserInfo,
    #[serde(default)]
    pub server_info: XtreamServerInfo,
}

/// User account information
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct XtreamUserInfo {
    #[serde(default, deserialize_with = "lenient::string")]
    pub username: String,
    #[serde(default)]
    pub message: Option<String>,
    pub status: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub exp_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub is_trial: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub active_cons: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub max_connections: Option<String>,
    #[serde(default)]
    pub allowed_output_formats: Option<Vec<String>>,
}

impl XtreamUserInfo {
    /// Check if account is active
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }

    /// Check if trial account
    pub fn is_trial_account(&self) -> bool {
        self.is_trial.as_deref() == Some("1")
    }

    pub fn active_connections(&self) -> u32 {
        self.active_cons
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }
}

/// Server information
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct XtreamServerInfo {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub port: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub https_port: Option<String>,
    #[serde(default)]
    pub server_protocol: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub timestamp_now: Option<i64>,
}

// ============================================================================
// VOD / Series Types
// ============================================================================

/// VOD (movie) stream information
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct XtreamVodStream {
    #[serde(default, deserialize_with = "lenient::opt_i32")]
    pub num: Option<i32>,
    pub name: String,
    #[serde(deserialize_with = "lenient::i64")]
    pub stream_id: i64,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub stream_icon: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub rating: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub container_extension: Option<String>,
}

/// Series information from get_series
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct XtreamSeries {
    #[serde(deserialize_with = "lenient::i64")]
    pub series_id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub cover: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub rating: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub category_id: Option<String>,
}
