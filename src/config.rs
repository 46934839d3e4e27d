use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    pub app_env: String,

    // Xtream panel
    pub fetch_timeout_ms: u64,
    pub user_agent: String,
    pub default_stream_extension: String,

    // Storage
    pub credentials_file: String,

    // Player
    pub max_player_sessions: usize,
    pub player_idle_timeout_secs: u64,
    pub cleanup_interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            // Server
            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .unwrap_or(3001),
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),

            // Xtream panel
            fetch_timeout_ms: env::var("FETCH_TIMEOUT_MS")
                .unwrap_or_else(|_| "30000".to_string())
                .parse()
                .unwrap_or(30_000), // 30 seconds

            // Some panels block unknown clients, so look like a stock player
            user_agent: env::var("USER_AGENT")
                .unwrap_or_else(|_| "VLC/3.0.20 LibVLC/3.0.20".to_string()),

            default_stream_extension: env::var("DEFAULT_STREAM_EXTENSION")
                .unwrap_or_else(|_| crate::models::DEFAULT_STREAM_EXTENSION.to_string()),

            // Storage
            credentials_file: env::var("CREDENTIALS_FILE")
                .unwrap_or_else(|_| ".iptv/credentials.json".to_string()),

            // Player
            max_player_sessions: env::var("MAX_PLAYER_SESSIONS")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .unwrap_or(8),
            player_idle_timeout_secs: env::var("PLAYER_IDLE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap_or(120), // 2 minutes
            cleanup_interval_secs: env::var("CLEANUP_INTERVAL_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
