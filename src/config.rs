use std::env;

/// Default seed document scanned for candidate stream endpoints
const DEFAULT_SOURCES: &str = "https://d.kstore.dev/download/10694/zmtvid.txt";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Seed sources
    pub sources: Vec<String>,
    pub backup_sources: Vec<String>,

    // Output
    pub output_file: String,
    pub min_output_bytes: usize,

    // Probing
    pub speed_threshold: f64,
    pub max_workers: usize,
    pub api_workers: usize,

    // Timeouts
    pub request_timeout_secs: u64,
    pub probe_timeout_secs: u64,

    // Misc
    pub user_agent: String,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            // Seed sources (comma-separated URL lists)
            sources: split_list(
                &env::var("IPTV_SOURCES").unwrap_or_else(|_| DEFAULT_SOURCES.to_string()),
            ),
            backup_sources: split_list(&env::var("IPTV_BACKUP_SOURCES").unwrap_or_default()),

            // Output
            output_file: env::var("OUTPUT_FILE").unwrap_or_else(|_| "zby.txt".to_string()),
            min_output_bytes: env::var("MIN_OUTPUT_BYTES")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .unwrap_or(500),

            // Probing
            speed_threshold: env::var("SPEED_THRESHOLD")
                .unwrap_or_else(|_| "0.3".to_string())
                .parse()
                .unwrap_or(0.3), // KB/s
            max_workers: env::var("MAX_WORKERS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .unwrap_or(15), // concurrent speed probes per endpoint
            api_workers: env::var("API_WORKERS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5), // concurrent API endpoints

            // Timeouts
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "25".to_string())
                .parse()
                .unwrap_or(25),
            probe_timeout_secs: env::var("PROBE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),

            // Misc - desktop browser UA, some portals reject unknown agents
            user_agent: env::var("USER_AGENT").unwrap_or_else(|_| {
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36"
                    .to_string()
            }),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
