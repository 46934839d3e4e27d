use chrono::{DateTime, Local, Locale, Utc};
use serde::Serialize;

/// Account status shown on the account screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn from_panel_status(status: &str) -> Self {
        if status.eq_ignore_ascii_case("active") {
            Self::Active
        } else {
            Self::Inactive
        }
    }
}

/// Account details derived from the panel's auth response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub user_name: String,
    pub host_url: String,
    pub creation_date_formatted: String,
    pub expiry_date_formatted: String,
    pub is_trial: bool,
    pub active_connections: u32,
    pub max_connections: u32,
    pub time_zone: String,
    pub status: AccountStatus,
}

/// Catalog size counters for the home screen
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeCounters {
    pub live_channels: usize,
    pub movies: usize,
    pub series: usize,
    pub last_update: String,
}

/// Format an epoch-seconds string as "mes dd, yyyy" with Spanish month names.
///
/// Missing values render as "N/A"; values that are not a timestamp are
/// returned unchanged.
pub fn format_epoch_date(timestamp: Option<&str>) -> String {
    let Some(raw) = timestamp else {
        return "N/A".to_string();
    };

    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|dt| dt.format_localized("%B %d, %Y", Locale::es_ES).to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Wall-clock "HH:MM:SS" used for the home screen's last-update label
pub fn current_time_label() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_epoch_date() {
        assert_eq!(format_epoch_date(Some("1735689600")), "enero 01, 2025");
        assert_eq!(format_epoch_date(None), "N/A");
        assert_eq!(format_epoch_date(Some("unlimited")), "unlimited");
    }

    #[test]
    fn test_status_is_case_insensitive() {
        assert_eq!(AccountStatus::from_panel_status("Active"), AccountStatus::Active);
        assert_eq!(AccountStatus::from_panel_status("ACTIVE"), AccountStatus::Active);
        assert_eq!(AccountStatus::from_panel_status("Expired"), AccountStatus::Inactive);
    }
}
