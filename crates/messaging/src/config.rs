use std::env;
use std::time::Duration;

use bazaar_shared::constants::{
    DEFAULT_POLL_INTERVAL_SECS, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_SCROLL_THRESHOLD_PX,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    pub poll_interval_secs: u64,
    pub scroll_threshold_px: f32,
}

impl Config {
    /// Loads `.env` if present, then reads the environment.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Self {
        Self {
            api_base_url: env::var("BAZAAR_API_URL")
                .unwrap_or_else(|_| "http://localhost:5000/api".into()),
            request_timeout_ms: env::var("BAZAAR_REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
            poll_interval_secs: env::var("BAZAAR_POLL_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            scroll_threshold_px: env::var("BAZAAR_SCROLL_THRESHOLD_PX")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|px: &f32| px.is_finite() && *px >= 0.0)
                .unwrap_or(DEFAULT_SCROLL_THRESHOLD_PX),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn sync(&self) -> SyncConfig {
        SyncConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            scroll_threshold_px: self.scroll_threshold_px,
        }
    }
}

/// The part of [`Config`] the conversation sync loop needs.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub poll_interval: Duration,
    pub scroll_threshold_px: f32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            scroll_threshold_px: DEFAULT_SCROLL_THRESHOLD_PX,
        }
    }
}
