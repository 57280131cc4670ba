//! Pipeline orchestration
//!
//! Sequences the three stages — discovery, probing, persistence — with a
//! completion barrier between each. Failures scoped to a single seed source,
//! API endpoint or channel are absorbed where they happen; only a broken or
//! unverifiable artifact makes the run fail.

use anyhow::{Context, Result};
use futures::{stream, StreamExt};
use std::collections::BTreeSet;
use std::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::services::catalog;
use crate::services::extractor;
use crate::services::http::HttpClient;
use crate::services::prober;
use crate::services::speed::SpeedTester;

pub struct Updater {
    config: Config,
    client: HttpClient,
    tester: SpeedTester,
    build_id: String,
}

impl Updater {
    pub fn new(config: Config) -> Self {
        let client = HttpClient::new(&config.user_agent, config.request_timeout_secs);
        let tester = SpeedTester::new(&config.user_agent, config.probe_timeout_secs);
        // Short random token distinguishing this run's artifact
        let build_id = Uuid::new_v4().simple().to_string()[..8].to_string();

        Self {
            config,
            client,
            tester,
            build_id,
        }
    }

    /// Run the full pipeline. Returns the accepted channel count on success;
    /// the only errors that surface are persistence and validation failures.
    pub async fn run(&self) -> Result<usize> {
        // Stage 1: collect API endpoints from all seed sources
        let api_urls = self.discover().await;
        info!("Discovered {} API endpoints", api_urls.len());

        // Stage 2: probe every endpoint; all probes retire before persisting
        let accepted = self.probe_all(&api_urls).await;

        // Stage 3: persist and verify
        catalog::save_channels(&accepted, &self.config.output_file, &self.build_id).await?;
        catalog::validate_output(&self.config.output_file, self.config.min_output_bytes)
            .await
            .context("Output validation failed")?;

        info!("Updated {} channels", accepted.len());
        Ok(accepted.len())
    }

    /// Fetch every seed source (primary, then backup) and union the extracted
    /// API addresses. A failed source contributes nothing.
    async fn discover(&self) -> BTreeSet<String> {
        let mut api_urls = BTreeSet::new();
        for source in self.config.sources.iter().chain(&self.config.backup_sources) {
            match self.client.fetch_text(source).await {
                Ok(text) => {
                    api_urls.extend(extractor::extract_api_urls(&text));
                }
                Err(e) => warn!("Source fetch failed [{}]: {}", source, e),
            }
        }
        api_urls
    }

    /// Probe all endpoints under the endpoint-level concurrency ceiling.
    /// The accepted collection lives only for this stage.
    async fn probe_all(&self, api_urls: &BTreeSet<String>) -> Vec<String> {
        let accepted = Mutex::new(Vec::new());

        stream::iter(api_urls)
            .map(|api_url| {
                prober::probe_api(
                    api_url,
                    &self.client,
                    &self.tester,
                    self.config.speed_threshold,
                    self.config.max_workers,
                    &accepted,
                )
            })
            .buffer_unordered(self.config.api_workers.max(1))
            .collect::<Vec<()>>()
            .await;

        accepted.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}
