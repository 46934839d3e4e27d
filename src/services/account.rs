//! Login, logout, account info and home screen counters.

use std::sync::Arc;
use thiserror::Error;

use crate::models::account::{current_time_label, format_epoch_date};
use crate::models::{AccountInfo, AccountStatus, HomeCounters};
use crate::services::catalog_cache::CatalogCache;
use crate::services::credentials::{CredentialStore, UserCredentials};
use crate::services::xtream::{CatalogApi, XtreamAuthResponse, XtreamError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Todos los campos son obligatorios")]
    MissingFields,
    /// Panel answered but the account is not "Active"
    #[error("Usuario inactivo o credenciales inválidas")]
    Inactive { status: String },
    #[error("Respuesta del servidor vacía")]
    EmptyResponse,
    #[error("No hay sesión activa")]
    NotLoggedIn,
    #[error(transparent)]
    Upstream(XtreamError),
    #[error("failed to store credentials: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<XtreamError> for AuthError {
    fn from(err: XtreamError) -> Self {
        match err {
            XtreamError::EmptyResponse => AuthError::EmptyResponse,
            other => AuthError::Upstream(other),
        }
    }
}

pub struct AccountService {
    api: Arc<dyn CatalogApi>,
    credentials: Arc<CredentialStore>,
    catalog: Arc<CatalogCache>,
}

impl AccountService {
    pub fn new(
        api: Arc<dyn CatalogApi>,
        credentials: Arc<CredentialStore>,
        catalog: Arc<CatalogCache>,
    ) -> Self {
        Self {
            api,
            credentials,
            catalog,
        }
    }

    /// Authenticate against the panel and persist the login on success
    pub async fn login(
        &self,
        host: &str,
        username: &str,
        password: &str,
    ) -> Result<XtreamAuthResponse, AuthError> {
        if host.trim().is_empty() || username.trim().is_empty() || password.trim().is_empty() {
            return Err(AuthError::MissingFields);
        }

        let user = UserCredentials {
            host: host.trim().trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
            exp_date: None,
            status: None,
        };

        tracing::info!("Login attempt at {}/player_api.php", user.host);

        let auth = self.api.authenticate(&user.xtream()).await?;
        if !auth.user_info.is_active() {
            tracing::warn!(
                "Login rejected for {}: status {}",
                username,
                auth.user_info.status
            );
            return Err(AuthError::Inactive {
                status: auth.user_info.status.clone(),
            });
        }

        self.credentials
            .save(UserCredentials {
                exp_date: auth.user_info.exp_date.clone(),
                status: Some(auth.user_info.status.clone()),
                ..user
            })
            .await?;

        // Catalog entries belong to whichever account was logged in before
        self.catalog.clear_cache().await;

        tracing::info!("Login succeeded for {}", username);
        Ok(auth)
    }

    /// Forget the stored login and every cached catalog entry
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.credentials.clear().await?;
        self.catalog.clear_cache().await;
        tracing::info!("Session closed");
        Ok(())
    }

    /// Stored login, or `NotLoggedIn`
    pub fn current_user(&self) -> Result<UserCredentials, AuthError> {
        self.credentials.current().ok_or(AuthError::NotLoggedIn)
    }

    /// Fresh account details from the panel
    pub async fn account_info(&self) -> Result<AccountInfo, AuthError> {
        let user = self.current_user()?;
        let auth = self.api.authenticate(&user.xtream()).await?;
        let info = &auth.user_info;

        let host_url = url::Url::parse(&user.host)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();

        Ok(AccountInfo {
            user_name: user.username.clone(),
            host_url,
            creation_date_formatted: format_epoch_date(info.created_at.as_deref()),
            expiry_date_formatted: format_epoch_date(info.exp_date.as_deref()),
            is_trial: info.is_trial_account(),
            active_connections: info.active_connections(),
            max_connections: info.max_connections(),
            time_zone: auth
                .server_info
                .timezone
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
            status: AccountStatus::from_panel_status(&info.status),
        })
    }

    /// Live channel, movie and series counts, fetched in parallel.
    /// A failed count is reported as zero.
    pub async fn counters(&self) -> Result<HomeCounters, AuthError> {
        let creds = self.current_user()?.xtream();

        let (live, movies, series) = tokio::join!(
            self.api.live_streams(&creds),
            self.api.vod_streams(&creds),
            self.api.series(&creds),
        );

        Ok(HomeCounters {
            live_channels: count_or_zero("live channels", live.map(|v| v.len())),
            movies: count_or_zero("movies", movies.map(|v| v.len())),
            series: count_or_zero("series", series.map(|v| v.len())),
            last_update: current_time_label(),
        })
    }
}

fn count_or_zero(what: &str, result: Result<usize, XtreamError>) -> usize {
    match result {
        Ok(count) => {
            tracing::debug!("{}: {}", what, count);
            count
        }
        Err(e) => {
            tracing::warn!("Failed to count {}: {}", what, e);
            0
        }
    }
}
