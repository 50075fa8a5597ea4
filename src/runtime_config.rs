// =============================================================================
// Runtime Configuration: service settings loaded once at startup
// =============================================================================
//
// Loaded from a JSON file, then overridden from the environment.  All fields
// carry `#[serde(default = "...")]` so that a partial file (or `{}`) loads and
// older files keep working when fields are added.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_yahoo_base_url() -> String {
    "https://query1.finance.yahoo.com/v8/finance/chart".to_string()
}

fn default_lookback_days() -> u32 {
    365
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_overbought() -> f64 {
    70.0
}

fn default_oversold() -> f64 {
    30.0
}

fn default_display_utc_offset_hours() -> i32 {
    8
}

fn default_display_zone_label() -> String {
    "SG".to_string()
}

// =============================================================================
// RuntimeConfig
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Chart API base; the symbol is appended as the last path segment.
    #[serde(default = "default_yahoo_base_url")]
    pub yahoo_base_url: String,

    /// Calendar days of daily bars requested per chart.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Upstream HTTP timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upper reference line on both RSI panels.
    #[serde(default = "default_overbought")]
    pub overbought: f64,

    /// Lower reference line on both RSI panels.
    #[serde(default = "default_oversold")]
    pub oversold: f64,

    /// Offset used for the "generated at" stamp in chart titles.
    #[serde(default = "default_display_utc_offset_hours")]
    pub display_utc_offset_hours: i32,

    #[serde(default = "default_display_zone_label")]
    pub display_zone_label: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            yahoo_base_url: default_yahoo_base_url(),
            lookback_days: default_lookback_days(),
            request_timeout_secs: default_request_timeout_secs(),
            overbought: default_overbought(),
            oversold: default_oversold(),
            display_utc_offset_hours: default_display_utc_offset_hours(),
            display_zone_label: default_display_zone_label(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("invalid runtime config in {}", path.display()))?;

        info!(
            path = %path.display(),
            lookback_days = config.lookback_days,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Apply `PORT`, `RSI_BIND_ADDR` and `YAHOO_BASE_URL` from the environment.
    /// `RSI_BIND_ADDR` wins over `PORT` when both are set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => self.bind_addr = format!("0.0.0.0:{port}"),
                Err(_) => warn!(port = %port, "ignoring non-numeric PORT"),
            }
        }
        if let Some(addr) = lookup("RSI_BIND_ADDR").filter(|a| !a.trim().is_empty()) {
            self.bind_addr = addr.trim().to_string();
        }
        if let Some(url) = lookup("YAHOO_BASE_URL").filter(|u| !u.trim().is_empty()) {
            self.yahoo_base_url = url.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.lookback_days == 0 {
            anyhow::bail!("lookback_days must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be at least 1");
        }
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(self.overbought) || !in_range(self.oversold) {
            anyhow::bail!(
                "RSI thresholds must lie in [0, 100] (overbought={}, oversold={})",
                self.overbought,
                self.oversold
            );
        }
        if self.oversold >= self.overbought {
            anyhow::bail!(
                "oversold ({}) must be below overbought ({})",
                self.oversold,
                self.overbought
            );
        }
        if !(-14..=14).contains(&self.display_utc_offset_hours) {
            anyhow::bail!(
                "display_utc_offset_hours must be within ±14 (got {})",
                self.display_utc_offset_hours
            );
        }
        Ok(())
    }
}
