pub mod account;
pub mod catalog_cache;
pub mod cleanup;
pub mod credentials;
pub mod metrics;
pub mod player;
pub mod xtream;
