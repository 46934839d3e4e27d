//! Shared fakes for unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::models::{Category, ChannelDetail};
use crate::services::account::AccountService;
use crate::services::catalog_cache::{CatalogCache, Clock, SystemClock};
use crate::services::credentials::CredentialStore;
use crate::services::player::PlayerRegistry;
use crate::services::xtream::{
    CatalogApi, XtreamAuthResponse, XtreamCredentials, XtreamError, XtreamSeries,
    XtreamServerInfo, XtreamUserInfo, XtreamVodStream,
};
use crate::AppState;

pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self(AtomicI64::new(start_ms))
    }

    pub fn advance(&self, ms: i64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn sample_categories() -> Vec<Category> {
    vec![Category {
        id: "1".to_string(),
        display_name: "Sports".to_string(),
        parent_id: None,
    }]
}

/// Two channels per category; stream ids are `category * 1000 + 1` and `+ 2`
pub fn sample_channels(category_id: &str) -> Vec<ChannelDetail> {
    let base: i64 = category_id.parse().unwrap_or(0) * 1000;
    (1..=2)
        .map(|n| ChannelDetail {
            number: n as i32,
            name: format!("Channel {}-{}", category_id, n),
            stream_id: base + n,
            icon_url: None,
            category_id: Some(category_id.to_string()),
            category_name: None,
            has_archive: false,
            archive_duration_days: None,
            epg_channel_id: None,
        })
        .collect()
}

pub fn auth_response(status: &str) -> XtreamAuthResponse {
    XtreamAuthResponse {
        user_info: XtreamUserInfo {
            username: "alice".to_string(),
            message: None,
            status: status.to_string(),
            exp_date: Some("1735689600".to_string()),
            is_trial: Some("1".to_string()),
            active_cons: Some("1".to_string()),
            created_at: Some("1704067200".to_string()),
            max_connections: Some("2".to_string()),
            allowed_output_formats: None,
        },
        server_info: XtreamServerInfo {
            timezone: Some("Europe/Madrid".to_string()),
            ..Default::default()
        },
    }
}

/// In-memory panel that counts calls and can be told to fail
pub struct FakeCatalogApi {
    category_calls: AtomicUsize,
    channel_calls: Mutex<HashMap<String, usize>>,
    failure: Mutex<Option<XtreamError>>,
    delay: Mutex<Duration>,
    status: Mutex<String>,
    vod_count: usize,
    series_count: usize,
}

impl FakeCatalogApi {
    pub fn new() -> Self {
        Self {
            category_calls: AtomicUsize::new(0),
            channel_calls: Mutex::new(HashMap::new()),
            failure: Mutex::new(None),
            delay: Mutex::new(Duration::ZERO),
            status: Mutex::new("Active".to_string()),
            vod_count: 3,
            series_count: 4,
        }
    }

    pub fn fail_with(&self, error: Option<XtreamError>) {
        *self.failure.lock().unwrap() = error;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn set_account_status(&self, status: &str) {
        *self.status.lock().unwrap() = status.to_string();
    }

    pub fn category_calls(&self) -> usize {
        self.category_calls.load(Ordering::SeqCst)
    }

    pub fn channel_calls(&self, category_id: &str) -> usize {
        self.channel_calls
            .lock()
            .unwrap()
            .get(category_id)
            .copied()
            .unwrap_or(0)
    }

    async fn respond<T>(&self, value: T) -> Result<T, XtreamError> {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let failure = self.failure.lock().unwrap().clone();
        match failure {
            Some(e) => Err(e),
            None => Ok(value),
        }
    }
}

#[async_trait]
impl CatalogApi for FakeCatalogApi {
    async fn authenticate(
        &self,
        _creds: &XtreamCredentials,
    ) -> Result<XtreamAuthResponse, XtreamError> {
        let status = self.status.lock().unwrap().clone();
        self.respond(auth_response(&status)).await
    }

    async fn live_categories(
        &self,
        _creds: &XtreamCredentials,
    ) -> Result<Vec<Category>, XtreamError> {
        self.category_calls.fetch_add(1, Ordering::SeqCst);
        self.respond(sample_categories()).await
    }

    async fn live_streams(
        &self,
        _creds: &XtreamCredentials,
    ) -> Result<Vec<ChannelDetail>, XtreamError> {
        self.respond(sample_channels("1")).await
    }

    async fn live_streams_by_category(
        &self,
        _creds: &XtreamCredentials,
        category_id: &str,
    ) -> Result<Vec<ChannelDetail>, XtreamError> {
        *self
            .channel_calls
            .lock()
            .unwrap()
            .entry(category_id.to_string())
            .or_default() += 1;
        self.respond(sample_channels(category_id)).await
    }

    async fn vod_streams(
        &self,
        _creds: &XtreamCredentials,
    ) -> Result<Vec<XtreamVodStream>, XtreamError> {
        let items = (0..self.vod_count)
            .map(|i| XtreamVodStream {
                num: Some(i as i32),
                name: format!("Movie {}", i),
                stream_id: i as i64,
                stream_icon: None,
                rating: None,
                category_id: None,
                container_extension: Some("mkv".to_string()),
            })
            .collect();
        self.respond(items).await
    }

    async fn series(&self, _creds: &XtreamCredentials) -> Result<Vec<XtreamSeries>, XtreamError> {
        let items = (0..self.series_count)
            .map(|i| XtreamSeries {
                series_id: i as i64,
                name: format!("Series {}", i),
                cover: None,
                rating: None,
                category_id: None,
            })
            .collect();
        self.respond(items).await
    }
}

/// Unique path under the system temp dir
pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("iptvplayer-test-{}", uuid::Uuid::new_v4()))
        .join(name)
}

/// App state wired to `api`, with a fresh credentials file and no login
pub async fn test_state(api: Arc<FakeCatalogApi>) -> Arc<AppState> {
    let credentials = Arc::new(
        CredentialStore::open(temp_path("credentials.json"))
            .await
            .unwrap(),
    );
    let catalog = Arc::new(CatalogCache::new(api.clone(), Arc::new(SystemClock)));
    let accounts = Arc::new(AccountService::new(api, credentials.clone(), catalog.clone()));

    Arc::new(AppState {
        config: Config::default(),
        catalog,
        accounts,
        credentials,
        players: Arc::new(PlayerRegistry::new(8)),
        start_time: Instant::now(),
    })
}
