use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

/// Endpoints and timings for a review session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Webhook that generates a script from a topic
    pub generate_url: String,

    /// Webhook receiving approve/refine decisions
    pub decision_url: String,

    pub video_approve_url: String,
    pub video_reject_url: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// How long success notices stay visible
    pub notice_duration_ms: u64,

    /// How long failure notices stay visible
    pub error_notice_duration_ms: u64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }
}

impl ReviewConfig {
    /// Config pointing every webhook at `base`, using the mock server's routes.
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            generate_url: format!("{base}/webhook/frontend"),
            decision_url: format!("{base}/webhook/approve"),
            video_approve_url: format!("{base}/webhook/approve-video"),
            video_reject_url: format!("{base}/webhook/reject-video"),
            request_timeout_secs: 120,
            notice_duration_ms: 2000,
            error_notice_duration_ms: 4000,
        }
    }

    pub fn with_generate_url(mut self, url: String) -> Self {
        self.generate_url = url;
        self
    }

    pub fn with_decision_url(mut self, url: String) -> Self {
        self.decision_url = url;
        self
    }

    pub fn with_video_urls(mut self, approve: String, reject: String) -> Self {
        self.video_approve_url = approve;
        self.video_reject_url = reject;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.notice_duration_ms)
    }

    pub fn error_notice_duration(&self) -> Duration {
        Duration::from_millis(self.error_notice_duration_ms)
    }

    /// `<config dir>/script-review/config.json`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("script-review").join("config.json"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Save configuration to JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from JSON
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// Missing file means defaults; a malformed one is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
