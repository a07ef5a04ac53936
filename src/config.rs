//! System configuration parameters
//!
//! Operational knobs for the FlowWatch firmware.  Defaults are compiled in;
//! a JSON override can be baked in at build time through the
//! `FLOWWATCH_CONFIG` environment variable.
//!
//! The flow timeout and the page refresh interval are behavioural
//! constants, not configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Silence (ms) after the last pulse before flow is reported as stopped.
pub const FLOW_TIMEOUT_MS: u64 = 2_000;

/// Auto-refresh interval (seconds) requested by the status page.
pub const REFRESH_INTERVAL_SECS: u32 = 30;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Network ---
    /// TCP port the status page is served on
    pub http_port: u16,
    /// Delay after a reconnect attempt while the link is down (milliseconds)
    pub reconnect_backoff_ms: u32,
    /// Sleep between polls when no client is waiting (milliseconds)
    pub idle_poll_ms: u32,

    // --- Diagnostics ---
    /// Route loop events to the serial log; `false` installs a no-op sink
    pub diagnostics: bool,
    /// Maximum log level: off, error, warn, info, debug, trace
    pub log_level: heapless::String<8>,

    // --- Supervision ---
    /// Task watchdog timeout (milliseconds)
    pub watchdog_timeout_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut log_level: heapless::String<8> = heapless::String::new();
        let _ = log_level.push_str("info");
        Self {
            http_port: 80,
            reconnect_backoff_ms: 1_000,
            idle_poll_ms: 10,
            diagnostics: true,
            log_level,
            watchdog_timeout_ms: 10_000,
        }
    }
}

impl SystemConfig {
    /// Parse a JSON override.  Missing fields fall back to defaults.
    pub fn from_json(doc: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(doc).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, overridden by `override_doc` when present.
    pub fn load(override_doc: Option<&str>) -> Result<Self, ConfigError> {
        match override_doc {
            Some(doc) => Self::from_json(doc),
            None => Ok(Self::default()),
        }
    }

    /// Reject values that would stall or starve the control loop.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http_port == 0 {
            return Err(ConfigError::ValidationFailed("http_port must be non-zero"));
        }
        if self.reconnect_backoff_ms == 0 {
            return Err(ConfigError::ValidationFailed("reconnect_backoff_ms must be non-zero"));
        }
        // The loop sleeps for the full backoff between watchdog feeds.
        if self.reconnect_backoff_ms > self.watchdog_timeout_ms / 2 {
            return Err(ConfigError::ValidationFailed(
                "reconnect_backoff_ms must be at most half of watchdog_timeout_ms",
            ));
        }
        if self.idle_poll_ms == 0 || self.idle_poll_ms > self.watchdog_timeout_ms / 2 {
            return Err(ConfigError::ValidationFailed(
                "idle_poll_ms must be non-zero and at most half of watchdog_timeout_ms",
            ));
        }
        if self.level_filter().is_none() {
            return Err(ConfigError::ValidationFailed("log_level is not a known level"));
        }
        Ok(())
    }

    /// The configured log level as a [`log::LevelFilter`].
    pub fn level_filter(&self) -> Option<log::LevelFilter> {
        self.log_level.parse().ok()
    }
}
