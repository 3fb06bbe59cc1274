use crate::error::{CrawlError, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.twitter.com/1.1";
const DEFAULT_TARGET_NODES: usize = 100;
/// Number of reciprocal connections kept per account.
pub const DEFAULT_TOP_K: usize = 5;
/// Cap on each friends / followers listing, bounding cost on high-degree accounts.
pub const DEFAULT_LIST_CAP: usize = 5000;
const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 10;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Retry and throttling constants for the request executor.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// First backoff wait after a transient failure
    pub initial_wait: Duration,
    /// Growth factor applied to the wait after every transient failure
    pub multiplier: f64,
    /// Consecutive transient failures tolerated before giving up
    pub max_consecutive_errors: u32,
    /// Upper bound on the cumulative backoff wait of one retry sequence
    pub max_total_wait: Duration,
    /// Suspension applied on a rate-limit response (15 minutes plus margin)
    pub rate_limit_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_wait: Duration::from_secs(2),
            multiplier: 1.5,
            max_consecutive_errors: DEFAULT_MAX_CONSECUTIVE_ERRORS,
            max_total_wait: Duration::from_secs(3600),
            rate_limit_cooldown: Duration::from_secs(60 * 15 + 5),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_consecutive_errors(mut self, max: u32) -> Self {
        self.max_consecutive_errors = max;
        self
    }
}

#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub api_base: String,
    pub bearer_token: String,
    pub target_nodes: usize,
    pub top_k: usize,
    /// Cap applied to each friends / followers listing
    pub list_cap: usize,
    pub http_timeout: Duration,
    pub output_dir: PathBuf,
    pub retry: RetryPolicy,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            bearer_token: String::new(),
            target_nodes: DEFAULT_TARGET_NODES,
            top_k: DEFAULT_TOP_K,
            list_cap: DEFAULT_LIST_CAP,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            output_dir: PathBuf::from("."),
            retry: RetryPolicy::default(),
        }
    }
}

impl CrawlerConfig {
    /// Build the configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`CrawlerConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_base = lookup("SOCIAL_API_BASE")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base);
        let bearer_token = lookup("SOCIAL_API_BEARER_TOKEN").unwrap_or_default();

        let target_nodes = parse_var(&lookup, "CRAWLER_TARGET_NODES")?.unwrap_or(defaults.target_nodes);
        let top_k = parse_var(&lookup, "CRAWLER_TOP_K")?.unwrap_or(defaults.top_k);
        let list_cap = parse_var(&lookup, "CRAWLER_LIST_CAP")?.unwrap_or(defaults.list_cap);
        let max_errors = parse_var(&lookup, "CRAWLER_MAX_CONSECUTIVE_ERRORS")?
            .unwrap_or(DEFAULT_MAX_CONSECUTIVE_ERRORS);
        let timeout_secs =
            parse_var(&lookup, "CRAWLER_HTTP_TIMEOUT_SECS")?.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        let output_dir = lookup("CRAWLER_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        if target_nodes == 0 {
            return Err(CrawlError::Config(
                "CRAWLER_TARGET_NODES must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            api_base,
            bearer_token,
            target_nodes,
            top_k,
            list_cap,
            http_timeout: Duration::from_secs(timeout_secs),
            output_dir,
            retry: defaults.retry.with_max_consecutive_errors(max_errors),
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CrawlError::Config(format!("{} has an invalid value: {:?}", key, raw))),
        None => Ok(None),
    }
}
