//! miIO transport configuration.

use std::time::Duration;

use serde::Deserialize;

/// Default miIO UDP port.
pub const DEFAULT_PORT: u16 = 54321;

/// Settings shared by every miIO driver.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MiioConfig {
    /// How long to wait for each datagram reply, in milliseconds.
    pub timeout_ms: u64,
    /// Device UDP port.
    pub port: u16,
}

impl Default for MiioConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            port: DEFAULT_PORT,
        }
    }
}

impl MiioConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
