use serde::Deserialize;

/// Channel category derived from the channel name at serialization time.
/// Never stored on the channel itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Cctv,
    Satellite,
    Other,
}

impl Category {
    /// Section label used in the output artifact
    pub fn label(&self) -> &'static str {
        match self {
            Category::Cctv => "央视频道",
            Category::Satellite => "卫视频道",
            Category::Other => "其他频道",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One entry of the `data` list returned by an IPTV API endpoint.
/// Entries missing either field are skipped during probing.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiChannel {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Response body of the canonical `/iptv/live/1000.json` endpoint.
/// Any shape without a top-level `data` list fails deserialization.
#[derive(Debug, Deserialize)]
pub struct ApiListing {
    pub data: Vec<ApiChannel>,
}

/// A channel with its resolved absolute stream URL
#[derive(Debug, Clone)]
pub struct ChannelRecord {
    pub name: String,
    pub url: String,
}

impl ChannelRecord {
    /// Output line format: `name,url`
    pub fn line(&self) -> String {
        format!("{},{}", self.name, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_requires_data_list() {
        assert!(serde_json::from_str::<ApiListing>(r#"{"data":[]}"#).is_ok());
        assert!(serde_json::from_str::<ApiListing>(r#"{"data":{}}"#).is_err());
        assert!(serde_json::from_str::<ApiListing>(r#"{"channels":[]}"#).is_err());
        assert!(serde_json::from_str::<ApiListing>("not json").is_err());
    }

    #[test]
    fn test_entries_tolerate_missing_fields() {
        let listing: ApiListing =
            serde_json::from_str(r#"{"data":[{"name":"CCTV-1"},{"url":"x"},{}]}"#).unwrap();
        assert_eq!(listing.data.len(), 3);
        assert!(listing.data[0].url.is_none());
        assert!(listing.data[1].name.is_none());
    }

    #[test]
    fn test_channel_line() {
        let record = ChannelRecord {
            name: "CCTV-1".to_string(),
            url: "http://1.2.3.4/live/1".to_string(),
        };
        assert_eq!(record.line(), "CCTV-1,http://1.2.3.4/live/1");
    }
}
