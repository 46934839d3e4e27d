//! Prometheus metrics registered in the default registry and exposed on `/metrics`.

use lazy_static::lazy_static;
use prometheus::{
    register_int_counter_vec, register_int_gauge, IntCounterVec, IntGauge,
};

lazy_static! {
    /// Catalog lookups served from memory, by resource ("categories" / "channels")
    pub static ref CATALOG_CACHE_HITS: IntCounterVec = register_int_counter_vec!(
        "catalog_cache_hits_total",
        "Catalog lookups answered from the in-memory cache",
        &["resource"]
    )
    .unwrap();

    /// Catalog lookups that went to the panel
    pub static ref CATALOG_CACHE_MISSES: IntCounterVec = register_int_counter_vec!(
        "catalog_cache_misses_total",
        "Catalog lookups that required an upstream request",
        &["resource"]
    )
    .unwrap();

    pub static ref UPSTREAM_REQUESTS: IntCounterVec = register_int_counter_vec!(
        "xtream_requests_total",
        "Requests sent to the Xtream panel",
        &["action"]
    )
    .unwrap();

    pub static ref UPSTREAM_FAILURES: IntCounterVec = register_int_counter_vec!(
        "xtream_request_failures_total",
        "Xtream panel requests that failed (transport or non-2xx)",
        &["action"]
    )
    .unwrap();

    pub static ref PLAYER_SESSIONS: IntGauge = register_int_gauge!(
        "player_sessions_active",
        "Player sessions currently holding a media engine"
    )
    .unwrap();

    /// Engine errors folded into player state, by mapped kind
    pub static ref PLAYBACK_ERRORS: IntCounterVec = register_int_counter_vec!(
        "playback_errors_total",
        "Media engine errors reported by player sessions",
        &["kind"]
    )
    .unwrap();
}
