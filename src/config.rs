//! Runtime configuration, pulled from environment variables with compiled-in
//! defaults.
//!
//! Grounded on `cleanappio-cleanapp_back_end_v2/report-listener-v4/src/cfg.rs`'s
//! `Config::from_env()` shape: every field is read via
//! `std::env::var(...).ok().and_then(|s| s.parse().ok()).unwrap_or(default)`.

use std::path::PathBuf;

pub const DEFAULT_TIMEZONE: &str = "Asia/Shanghai";
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_MAX_EMPTY_PAGES: u32 = 3;

const DEFAULT_RATE_LIMIT_RESET_BUFFER_SECONDS: i64 = 2;
const DEFAULT_MAX_RATE_LIMIT_WAIT_SECONDS: i64 = 900;
const DEFAULT_RATE_LIMIT_FALLBACK_WAIT_SECONDS: i64 = 180;
const DEFAULT_RATE_LIMIT_PROACTIVE_THRESHOLD: i64 = 0;
const DEFAULT_RATE_LIMIT_PACING_USAGE_RATIO: f64 = 0.7;
const DEFAULT_RATE_LIMIT_PACING_FACTOR: f64 = 1.0;
const DEFAULT_RATE_LIMIT_MIN_INTERVAL_SECONDS: f64 = 1.0;
const DEFAULT_RATE_LIMIT_MAX_INTERVAL_SECONDS: f64 = 60.0;

const DEFAULT_SEARCH_TIMELINE_QUERY_ID: &str = "cGK-Qeg1XJc2sZ6kgQw_Iw";
const DEFAULT_BEARER_TOKEN: &str = "AAAAAAAAAAAAAAAAAAAAANRILgAAAAAAnNwIzUejRCOuH5E6I8xnZz4puTs=1Zv7ttfk8LF81IUq16cHjhLTvJu4FA33AGWWjCpTnA";

/// Environment-overridable rate-limit and protocol knobs consulted by
/// [`crate::client::ProtocolClient`].
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub rate_limit_reset_buffer_seconds: i64,
    pub max_rate_limit_wait_seconds: i64,
    pub rate_limit_fallback_wait_seconds: i64,
    pub rate_limit_proactive_threshold: i64,
    pub rate_limit_pacing_usage_ratio: f64,
    pub rate_limit_pacing_factor: f64,
    pub rate_limit_min_interval_seconds: f64,
    pub rate_limit_max_interval_seconds: f64,
    pub search_timeline_query_id: String,
    pub bearer_token: String,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self {
            rate_limit_reset_buffer_seconds: env_parsed(
                "X_RATE_LIMIT_RESET_BUFFER_SECONDS",
                DEFAULT_RATE_LIMIT_RESET_BUFFER_SECONDS,
            ),
            max_rate_limit_wait_seconds: env_parsed(
                "X_MAX_RATE_LIMIT_WAIT_SECONDS",
                DEFAULT_MAX_RATE_LIMIT_WAIT_SECONDS,
            ),
            rate_limit_fallback_wait_seconds: env_parsed(
                "X_RATE_LIMIT_FALLBACK_WAIT_SECONDS",
                DEFAULT_RATE_LIMIT_FALLBACK_WAIT_SECONDS,
            ),
            rate_limit_proactive_threshold: env_parsed(
                "X_RATE_LIMIT_PROACTIVE_THRESHOLD",
                DEFAULT_RATE_LIMIT_PROACTIVE_THRESHOLD,
            ),
            rate_limit_pacing_usage_ratio: DEFAULT_RATE_LIMIT_PACING_USAGE_RATIO,
            rate_limit_pacing_factor: DEFAULT_RATE_LIMIT_PACING_FACTOR,
            rate_limit_min_interval_seconds: DEFAULT_RATE_LIMIT_MIN_INTERVAL_SECONDS,
            rate_limit_max_interval_seconds: DEFAULT_RATE_LIMIT_MAX_INTERVAL_SECONDS,
            search_timeline_query_id: std::env::var("X_SEARCH_TIMELINE_QUERY_ID")
                .unwrap_or_else(|_| DEFAULT_SEARCH_TIMELINE_QUERY_ID.to_owned()),
            bearer_token: std::env::var("X_BEARER_TOKEN")
                .unwrap_or_else(|_| DEFAULT_BEARER_TOKEN.to_owned()),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Browser channels tried by the (out-of-scope) interactive login provider.
/// Kept here even though the login flow itself is an external collaborator
/// this crate does not implement.
pub fn login_browser_channels() -> Vec<String> {
    std::env::var("X_LOGIN_BROWSER_CHANNELS")
        .unwrap_or_else(|_| "chrome,msedge".to_owned())
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Default file locations, relative to the crate root, matching
/// `original_source/src/config.py`'s `ROOT_DIR`-relative defaults.
pub fn default_accounts_file() -> PathBuf {
    PathBuf::from("docs/Accounts.txt")
}

pub fn default_keys_file() -> PathBuf {
    PathBuf::from("docs/Keys.txt")
}

pub fn default_cookies_file() -> PathBuf {
    PathBuf::from("state/cookies.json")
}

pub fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
