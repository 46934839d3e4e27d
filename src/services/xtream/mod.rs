//! Xtream Codes Integration
//!
//! Client for the Xtream Codes Player API v2 consumed by the TV client:
//!
//! - **Authentication**: account and server info for a host/username/password
//! - **Catalog**: live categories, live channels (all or per category), VOD and series lists
//! - **Playback URLs**: `<host>/live/<user>/<pass>/<stream_id>.<ext>` and friends
//!
//! Every request goes to:
//! ```text
//! http://server:port/player_api.php?username=X&password=Y[&action=...]
//! ```
//!
//! The rest of the server talks to the panel only through the [`CatalogApi`]
//! trait, so the catalog cache and account service can be exercised without
//! a network.

pub mod client;
pub mod types;

// Re-exports for convenience
pub use client::{CatalogApi, XtreamClient, XtreamError};
pub use types::{
    XtreamAuthResponse, XtreamCredentials, XtreamSeries, XtreamServerInfo, XtreamUserInfo,
    XtreamVodStream,
};
