//! API endpoint probing
//!
//! Fetches one channel-listing API, enumerates its channels and speed-tests
//! every stream URL under a bounded worker pool. Channels that sustain the
//! acceptance threshold are appended to the shared accepted collection.
//! Every failure here is scoped to one endpoint or one channel and absorbed.

use futures::{stream, StreamExt};
use std::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::models::{ApiListing, ChannelRecord};
use crate::services::http::HttpClient;
use crate::services::speed::SpeedTester;

fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}

/// Query one API endpoint and append every channel that passes the speed
/// threshold to `accepted` as a `name,url` line.
pub async fn probe_api(
    api_url: &str,
    client: &HttpClient,
    tester: &SpeedTester,
    speed_threshold: f64,
    max_workers: usize,
    accepted: &Mutex<Vec<String>>,
) {
    info!("Processing API endpoint: {}", api_url);

    let body = match client.fetch_text(api_url).await {
        Ok(body) => body,
        Err(e) => {
            warn!("Request failed [{}]: {}", api_url, e);
            return;
        }
    };

    let listing: ApiListing = match serde_json::from_str(&body) {
        Ok(listing) => listing,
        Err(e) => {
            warn!("JSON parse failed [{}]: {}", api_url, e);
            debug!("Response text: {}", preview(&body));
            return;
        }
    };

    let base = match Url::parse(api_url) {
        Ok(url) => url,
        Err(e) => {
            warn!("Invalid API address [{}]: {}", api_url, e);
            return;
        }
    };

    // Entries missing a name or url are skipped; relative stream URLs
    // resolve against the API address
    let channels: Vec<ChannelRecord> = listing
        .data
        .into_iter()
        .filter_map(|entry| {
            let name = entry.name?;
            let url = base.join(&entry.url?).ok()?;
            Some(ChannelRecord {
                name,
                url: url.to_string(),
            })
        })
        .collect();

    debug!("{} testable channels at {}", channels.len(), api_url);

    let results = stream::iter(channels)
        .map(|record| async move {
            let speed = tester.measure(&record.url).await;
            (record, speed)
        })
        .buffer_unordered(max_workers.max(1))
        .collect::<Vec<_>>()
        .await;

    for (record, speed) in results {
        if speed >= speed_threshold {
            info!("Accepted channel: {} ({:.2} KB/s)", record.name, speed);
            accepted.lock().unwrap().push(record.line());
        } else {
            debug!("Rejected channel: {} ({:.2} KB/s)", record.name, speed);
        }
    }
}
