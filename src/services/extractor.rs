//! Candidate endpoint extraction
//!
//! Scans free-form seed documents for URL-shaped substrings and rewrites each
//! into the canonical channel-listing API address. Extraction is heuristic by
//! design: independent patterns are unioned, and anything that fails to parse
//! is dropped without comment.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;
use url::Url;

/// Fixed path of the channel-listing API
const API_PATH: &str = "/iptv/live/1000.json";
/// Fixed query of the channel-listing API
const API_QUERY: &str = "key=txiptv";

lazy_static! {
    /// Bare .m3u/.m3u8 playlist URLs
    static ref M3U_URL: Regex = Regex::new(r"(?i)(https?://\S+?\.m3u8?)\b").unwrap();
    /// URL following an #EXTINF playlist directive
    static ref EXTINF_URL: Regex = Regex::new(r"(?i)#EXTINF:-1.*?(http\S+)").unwrap();
    /// Quoted URL in host=/url= key-value assignments
    static ref ASSIGNED_URL: Regex =
        Regex::new(r#"(?i)(?:host|url)\s*=\s*['"](http[^'"]+)"#).unwrap();
}

/// Extract every candidate endpoint from `text` and normalize each into the
/// canonical API address. The result is a set: duplicates collapse, and the
/// iteration order is stable.
pub fn extract_api_urls(text: &str) -> BTreeSet<String> {
    let mut candidates = BTreeSet::new();
    for pattern in [&*M3U_URL, &*EXTINF_URL, &*ASSIGNED_URL] {
        for caps in pattern.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                candidates.insert(m.as_str().to_string());
            }
        }
    }

    candidates
        .iter()
        .filter_map(|raw| normalize_url(raw))
        .collect()
}

/// Rewrite a raw candidate into `{scheme}://{host[:port]}/iptv/live/1000.json?key=txiptv`,
/// discarding any incoming path, query or fragment.
///
/// Returns `None` when the candidate cannot be parsed or has no host.
pub fn normalize_url(raw: &str) -> Option<String> {
    let parsed = match Url::parse(raw) {
        Ok(url) => url,
        // Scheme defaults to http when absent
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("http://{}", raw)).ok()?
        }
        Err(_) => return None,
    };

    let host = parsed.host_str()?;
    let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();

    Some(format!(
        "{}://{}{}{}?{}",
        parsed.scheme(),
        host,
        port,
        API_PATH,
        API_QUERY
    ))
}
