//! Background reaper for abandoned player sessions.
//!
//! A TV that crashes or drops off the network never sends DELETE, so its
//! session would hold an engine and a slot forever. Sessions with no device
//! request for `idle_timeout_secs` are disposed periodically.

use std::sync::Arc;
use std::time::Duration;
use tokio::time;

use crate::services::player::PlayerRegistry;

/// Configuration for the cleanup task
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// How often to run cleanup (in seconds)
    pub interval_secs: u64,
    /// A session idle this long is closed
    pub idle_timeout_secs: u64,
}

/// Run a single cleanup cycle; returns the number of sessions closed
pub async fn run_cleanup(players: &PlayerRegistry, config: &CleanupConfig) -> usize {
    let closed = players
        .reap_idle(Duration::from_secs(config.idle_timeout_secs))
        .await;
    if closed > 0 {
        tracing::info!("Cleanup: closed {} idle player sessions", closed);
    }
    closed
}

/// Start the background cleanup task.
///
/// Should be spawned with `tokio::spawn`; runs until the runtime shuts down.
pub async fn start_cleanup_task(players: Arc<PlayerRegistry>, config: CleanupConfig) {
    tracing::info!(
        "Starting cleanup task (interval: {}s, idle timeout: {}s)",
        config.interval_secs,
        config.idle_timeout_secs
    );

    let mut interval = time::interval(Duration::from_secs(config.interval_secs.max(1)));
    loop {
        interval.tick().await;
        run_cleanup(&players, &config).await;
    }
}
