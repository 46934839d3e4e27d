use serde::Deserialize;

use super::lenient;
use crate::services::xtream::XtreamCredentials;

/// Extension used for live streams when the caller does not ask for one
pub const DEFAULT_STREAM_EXTENSION: &str = "m3u8";

/// Live TV category (`get_live_categories`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    #[serde(rename = "category_id", deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(rename = "category_name", default, deserialize_with = "lenient::text")]
    pub display_name: String,
    #[serde(default, deserialize_with = "lenient::opt_i32")]
    pub parent_id: Option<i32>,
}

/// Live channel as listed by `get_live_streams&category_id=...`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChannelDetail {
    #[serde(rename = "num", default, deserialize_with = "lenient::i32_or_zero")]
    pub number: i32,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(deserialize_with = "lenient::i64")]
    pub stream_id: i64,
    #[serde(rename = "stream_icon", default, deserialize_with = "lenient::opt_string")]
    pub icon_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub category_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub category_name: Option<String>,
    #[serde(rename = "tv_archive", default, deserialize_with = "lenient::flag")]
    pub has_archive: bool,
    #[serde(
        rename = "tv_archive_duration",
        default,
        deserialize_with = "lenient::opt_i32"
    )]
    pub archive_duration_days: Option<i32>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub epg_channel_id: Option<String>,
}

impl ChannelDetail {
    /// Playback URL for this channel. `extension` falls back to `m3u8`.
    pub fn stream_url(&self, creds: &XtreamCredentials, extension: Option<&str>) -> String {
        creds.live_url(self.stream_id, extension.unwrap_or(DEFAULT_STREAM_EXTENSION))
    }
}

/// Case-insensitive name search over a channel list.
/// A blank query returns every channel.
pub fn filter_channels(channels: &[ChannelDetail], query: &str) -> Vec<ChannelDetail> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return channels.to_vec();
    }

    channels
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&query))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(stream_id: i64, name: &str) -> ChannelDetail {
        ChannelDetail {
            number: 1,
            name: name.to_string(),
            stream_id,
            icon_url: None,
            category_id: Some("1".to_string()),
            category_name: None,
            has_archive: false,
            archive_duration_days: None,
            epg_channel_id: None,
        }
    }

    #[test]
    fn test_category_from_panel_json() {
        let json = r#"[{"category_id":"1","category_name":"Sports","parent_id":0},
                       {"category_id":2,"category_name":"News"}]"#;
        let categories: Vec<Category> = serde_json::from_str(json).unwrap();

        assert_eq!(categories[0].id, "1");
        assert_eq!(categories[0].display_name, "Sports");
        assert_eq!(categories[0].parent_id, Some(0));
        assert_eq!(categories[1].id, "2");
        assert_eq!(categories[1].parent_id, None);
    }

    #[test]
    fn test_channel_from_panel_json() {
        let json = r#"{"num":"3","name":"Sports HD","stream_type":"live","stream_id":1001,
                       "stream_icon":"http://img/1.png","category_id":"1","tv_archive":1,
                       "tv_archive_duration":"7","epg_channel_id":null}"#;
        let c: ChannelDetail = serde_json::from_str(json).unwrap();

        assert_eq!(c.number, 3);
        assert_eq!(c.stream_id, 1001);
        assert_eq!(c.icon_url.as_deref(), Some("http://img/1.png"));
        assert!(c.has_archive);
        assert_eq!(c.archive_duration_days, Some(7));
        assert_eq!(c.category_name, None);
    }

    #[test]
    fn test_odd_names_do_not_fail_the_list() {
        let json = r#"[{"name":null,"stream_id":1},{"name":2024,"stream_id":2},{"stream_id":3}]"#;
        let channels: Vec<ChannelDetail> = serde_json::from_str(json).unwrap();
        assert_eq!(channels.len(), 3);
        assert_eq!(channels[0].name, "");
        assert_eq!(channels[1].name, "2024");

        let json = r#"[{"category_id":"9","category_name":null},{"category_id":"10","category_name":7}]"#;
        let categories: Vec<Category> = serde_json::from_str(json).unwrap();
        assert_eq!(categories[0].display_name, "");
        assert_eq!(categories[1].display_name, "7");
    }

    #[test]
    fn test_stream_url_default_extension() {
        let creds = XtreamCredentials::new("http://tv.example.com:80", "alice", "secret");
        assert_eq!(
            channel(1001, "Sports").stream_url(&creds, None),
            "http://tv.example.com:80/live/alice/secret/1001.m3u8"
        );
    }

    #[test]
    fn test_stream_url_strips_trailing_slash() {
        let creds = XtreamCredentials::new(" http://tv.example.com:80/ ", "alice", "secret");
        assert_eq!(
            channel(7, "News").stream_url(&creds, Some("ts")),
            "http://tv.example.com:80/live/alice/secret/7.ts"
        );
    }

    #[test]
    fn test_filter_channels() {
        let channels = vec![channel(1, "Sports HD"), channel(2, "News 24"), channel(3, "SPORTS+")];

        let filtered = filter_channels(&channels, "sports");
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[1].stream_id, 3);

        assert_eq!(filter_channels(&channels, "  ").len(), 3);
        assert!(filter_channels(&channels, "movies").is_empty());
    }
}
