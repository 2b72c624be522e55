use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the scraping engine
///
/// Every section is optional; a missing section takes its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(rename = "rate-limit", default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub presets: PresetsConfig,
}

/// Per-domain pacing and block cooldown
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Delay between requests to one domain before backoff kicks in (milliseconds)
    #[serde(rename = "min-delay-ms", default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Upper bound for the stepped backoff delay (milliseconds)
    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Request count after which the delay starts to grow
    #[serde(rename = "requests-before-increase", default = "default_requests_before_increase")]
    pub requests_before_increase: u32,

    /// How long a domain is left alone after it blocked us (milliseconds)
    #[serde(rename = "block-cooldown-ms", default = "default_block_cooldown_ms")]
    pub block_cooldown_ms: u64,
}

impl RateLimitConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn block_cooldown(&self) -> Duration {
        Duration::from_millis(self.block_cooldown_ms)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            requests_before_increase: default_requests_before_increase(),
            block_cooldown_ms: default_block_cooldown_ms(),
        }
    }
}

fn default_min_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_requests_before_increase() -> u32 {
    10
}

fn default_block_cooldown_ms() -> u64 {
    60_000
}

/// Retry policy and request identity shared by both fetch strategies
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Attempts per strategy, including the first one
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wait before the second attempt; doubles afterwards (milliseconds)
    #[serde(rename = "backoff-base-ms", default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Cap for the exponential wait (milliseconds)
    #[serde(rename = "backoff-cap-ms", default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,

    /// User agents rotated round-robin by the static strategy
    #[serde(rename = "user-agents", default = "default_user_agents")]
    pub user_agents: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
            user_agents: default_user_agents(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    2_000
}

fn default_backoff_cap_ms() -> u64 {
    10_000
}

/// Desktop user agents used when the config names none
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

fn default_user_agents() -> Vec<String> {
    DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect()
}

/// Headless browser session settings for the dynamic strategy
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    /// Chrome/Chromium binary; searched on PATH when unset
    #[serde(default)]
    pub executable: Option<PathBuf>,

    #[serde(rename = "viewport-width", default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(rename = "viewport-height", default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Pause between scroll steps (milliseconds)
    #[serde(rename = "scroll-pause-ms", default = "default_scroll_pause_ms")]
    pub scroll_pause_ms: u64,

    /// Upper bound on viewport-sized scroll steps per page
    #[serde(rename = "max-scroll-steps", default = "default_max_scroll_steps")]
    pub max_scroll_steps: u32,

    /// Wait after scrolling before the document is captured (milliseconds)
    #[serde(rename = "settle-ms", default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: None,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            scroll_pause_ms: default_scroll_pause_ms(),
            max_scroll_steps: default_max_scroll_steps(),
            settle_ms: default_settle_ms(),
        }
    }
}

fn default_viewport_width() -> u32 {
    1920
}

fn default_viewport_height() -> u32 {
    1080
}

fn default_scroll_pause_ms() -> u64 {
    200
}

fn default_max_scroll_steps() -> u32 {
    50
}

fn default_settle_ms() -> u64 {
    1_000
}

/// Page type detection
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    /// Timeout for the preliminary fetch (seconds)
    #[serde(rename = "timeout-secs", default = "default_detector_timeout")]
    pub timeout_secs: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_detector_timeout(),
        }
    }
}

fn default_detector_timeout() -> u64 {
    10
}

/// Preset catalogue
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PresetsConfig {
    /// Directory of extra preset TOML files layered over the built-in ones
    #[serde(rename = "custom-dir", default)]
    pub custom_dir: Option<PathBuf>,
}
