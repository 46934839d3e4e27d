//! Xtream Codes API Client
//!
//! HTTP client for making requests to Xtream Codes Player API v2.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use super::types::*;
use crate::models::{Category, ChannelDetail};
use crate::services::metrics;

/// Remote catalog operations the rest of the server depends on.
///
/// `XtreamClient` is the production implementation; tests substitute
/// in-memory fakes.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Account + server info (player_api.php without action)
    async fn authenticate(&self, creds: &XtreamCredentials)
        -> Result<XtreamAuthResponse, XtreamError>;

    async fn live_categories(&self, creds: &XtreamCredentials)
        -> Result<Vec<Category>, XtreamError>;

    async fn live_streams(&self, creds: &XtreamCredentials)
        -> Result<Vec<ChannelDetail>, XtreamError>;

    async fn live_streams_by_category(
        &self,
        creds: &XtreamCredentials,
        category_id: &str,
    ) -> Result<Vec<ChannelDetail>, XtreamError>;

    async fn vod_streams(&self, creds: &XtreamCredentials)
        -> Result<Vec<XtreamVodStream>, XtreamError>;

    async fn series(&self, creds: &XtreamCredentials) -> Result<Vec<XtreamSeries>, XtreamError>;
}

/// Xtream API Client
///
/// One client (and one connection pool) is shared by every account; the
/// credentials travel with each call.
pub struct XtreamClient {
    http: Client,
    user_agent: String,
}

impl XtreamClient {
    /// Create a new Xtream client
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, XtreamError> {
        let http = Client::builder()
            .timeout(timeout)
            // Many Xtream servers have self-signed certs
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| XtreamError::Network(e.to_string()))?;

        Ok(Self {
            http,
            user_agent: user_agent.to_string(),
        })
    }

    fn action_url(creds: &XtreamCredentials, action: &str) -> String {
        if action.is_empty() {
            creds.api_url()
        } else {
            format!("{}&action={}", creds.api_url(), action)
        }
    }

    /// GET the endpoint and return the raw body
    async fn get_text(&self, creds: &XtreamCredentials, action: &str) -> Result<String, XtreamError> {
        let url = Self::action_url(creds, action);
        let label = if action.is_empty() { "auth" } else { action };

        debug!("Xtream API request: {}", label);
        metrics::UPSTREAM_REQUESTS.with_label_values(&[label]).inc();

        let result = async {
            let response = self
                .http
                .get(&url)
                .header("User-Agent", &self.user_agent)
                .send()
                .await
                .map_err(|e| XtreamError::Network(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(XtreamError::Http(status.as_u16()));
            }

            response
                .text()
                .await
                .map_err(|e| XtreamError::Network(e.to_string()))
        }
        .await;

        if result.is_err() {
            metrics::UPSTREAM_FAILURES.with_label_values(&[label]).inc();
        }
        result
    }

    fn parse<T: DeserializeOwned>(action: &str, text: &str) -> Result<T, XtreamError> {
        serde_json::from_str(text).map_err(|e| {
            error!(
                "Failed to parse Xtream response for action '{}': {}",
                action, e
            );
            debug!("Response text: {}", text.chars().take(500).collect::<String>());
            XtreamError::Parse(e.to_string())
        })
    }

    /// List endpoints: an empty or `null` body means "no items"
    async fn get_list<T: DeserializeOwned>(
        &self,
        creds: &XtreamCredentials,
        action: &str,
    ) -> Result<Vec<T>, XtreamError> {
        let text = self.get_text(creds, action).await?;
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(Vec::new());
        }
        Self::parse(action, trimmed)
    }
}

#[async_trait]
impl CatalogApi for XtreamClient {
    async fn authenticate(
        &self,
        creds: &XtreamCredentials,
    ) -> Result<XtreamAuthResponse, XtreamError> {
        let text = self.get_text(creds, "").await?;
        let trimmed = text.trim();

        if trimmed.is_empty() || trimmed == "null" {
            return Err(XtreamError::EmptyResponse);
        }
        // Some servers return HTML error pages instead of JSON
        if trimmed.starts_with('<') {
            return Err(XtreamError::Parse(
                "server returned HTML instead of JSON".to_string(),
            ));
        }
        Self::parse("auth", trimmed)
    }

    async fn live_categories(
        &self,
        creds: &XtreamCredentials,
    ) -> Result<Vec<Category>, XtreamError> {
        self.get_list(creds, "get_live_categories").await
    }

    async fn live_streams(
        &self,
        creds: &XtreamCredentials,
    ) -> Result<Vec<ChannelDetail>, XtreamError> {
        self.get_list(creds, "get_live_streams").await
    }

    async fn live_streams_by_category(
        &self,
        creds: &XtreamCredentials,
        category_id: &str,
    ) -> Result<Vec<ChannelDetail>, XtreamError> {
        self.get_list(
            creds,
            &format!(
                "get_live_streams&category_id={}",
                urlencoding::encode(category_id)
            ),
        )
        .await
    }

    async fn vod_streams(
        &self,
        creds: &XtreamCredentials,
    ) -> Result<Vec<XtreamVodStream>, XtreamError> {
        self.get_list(creds, "get_vod_streams").await
    }

    async fn series(&self, creds: &XtreamCredentials) -> Result<Vec<XtreamSeries>, XtreamError> {
        self.get_list(creds, "get_series").await
    }
}

/// Xtream API Error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XtreamError {
    /// Network/connection error, carrying the underlying message
    #[error("{0}")]
    Network(String),
    /// HTTP error (non-2xx status)
    #[error("server error {0}")]
    Http(u16),
    /// JSON parsing error
    #[error("invalid server response: {0}")]
    Parse(String),
    /// Empty response from server
    #[error("empty server response")]
    EmptyResponse,
}
