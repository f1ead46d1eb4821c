//! Runtime configuration
//!
//! Values come from `COLLOQUY_*` environment variables with defaults for
//! anything unset or unparsable.

use std::env;
use std::time::Duration;

use colloquy_core::DebateFormat;
use colloquy_layout::ForceConfig;

/// Session runtime settings
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Simulated latency of the mock provider (env: COLLOQUY_MOCK_LATENCY_MS)
    pub mock_latency: Duration,
    /// Deadline for every provider call (env: COLLOQUY_REQUEST_TIMEOUT_MS)
    pub request_timeout: Duration,
    /// Interval between layout ticks when animating (env: COLLOQUY_TICK_INTERVAL_MS)
    pub tick_interval: Duration,
    /// Tick budget of a force layout (env: COLLOQUY_MAX_TICKS)
    pub max_ticks: usize,
    /// Format used when none is given (env: COLLOQUY_DEFAULT_FORMAT)
    pub default_format: DebateFormat,
    /// Enable debug output (env: COLLOQUY_DEBUG)
    pub debug: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            mock_latency: Duration::ZERO,
            request_timeout: Duration::from_millis(10_000),
            tick_interval: Duration::from_millis(16),
            max_ticks: 300,
            default_format: DebateFormat::Standard,
            debug: false,
        }
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}

impl RuntimeConfig {
    /// Load from environment
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            mock_latency: env_millis("COLLOQUY_MOCK_LATENCY_MS").unwrap_or(defaults.mock_latency),
            request_timeout: env_millis("COLLOQUY_REQUEST_TIMEOUT_MS")
                .unwrap_or(defaults.request_timeout),
            tick_interval: env_millis("COLLOQUY_TICK_INTERVAL_MS")
                .unwrap_or(defaults.tick_interval),
            max_ticks: env::var("COLLOQUY_MAX_TICKS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_ticks),
            default_format: env::var("COLLOQUY_DEFAULT_FORMAT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_format),
            debug: env::var("COLLOQUY_DEBUG")
                .map(|v| v == "1" || v == "true")
                .unwrap_or(false),
        }
    }

    /// Force layout settings carrying this configuration's tick cadence
    pub fn force_config(&self) -> ForceConfig {
        ForceConfig {
            max_ticks: self.max_ticks,
            tick_interval: self.tick_interval,
            ..ForceConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RuntimeConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.default_format, DebateFormat::Standard);
        assert!(!config.debug);
    }

    #[test]
    fn test_force_config_follows_runtime() {
        let config = RuntimeConfig {
            max_ticks: 50,
            tick_interval: Duration::from_millis(33),
            ..Default::default()
        };
        let force = config.force_config();
        assert_eq!(force.max_ticks, 50);
        assert_eq!(force.tick_interval, Duration::from_millis(33));
        assert_eq!(force.link_distance, ForceConfig::default().link_distance);
    }
}
