pub mod account;
pub mod api;
pub mod catalog;
pub mod lenient;

pub use account::{AccountInfo, AccountStatus, HomeCounters};
pub use api::ApiResponse;
pub use catalog::{Category, ChannelDetail, DEFAULT_STREAM_EXTENSION};
