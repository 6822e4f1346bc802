//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `daylight.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

use daylight_adapter_miio::MiioConfig;
use daylight_adapter_mqtt::MqttConfig;
use daylight_app::services::SwitchDelays;
use daylight_domain::power::RedundantCommandPolicy;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// MQTT broker and trigger topic.
    pub mqtt: MqttConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Delays and redundant-command policy.
    pub actuation: ActuationConfig,
    /// miIO transport settings.
    pub miio: MiioConfig,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// How triggers turn into actuations.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ActuationConfig {
    /// Seconds to wait after sunrise before switching on. Zero or negative
    /// switches immediately.
    pub switch_on_delay: i64,
    /// Seconds to wait after sunset before switching off.
    pub switch_off_delay: i64,
    /// Whether to re-send a command to a device already in the target state.
    pub redundant_commands: RedundantCommandPolicy,
}

impl ActuationConfig {
    #[must_use]
    pub fn delays(&self) -> SwitchDelays {
        SwitchDelays {
            switch_on_secs: self.switch_on_delay,
            switch_off_secs: self.switch_off_delay,
        }
    }
}

impl Config {
    /// Load configuration from `daylight.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("daylight.toml")?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("DAYLIGHT_MQTT_HOST") {
            self.mqtt.broker_host = val;
        }
        if let Some(port) = var("DAYLIGHT_MQTT_PORT").and_then(|v| v.parse().ok()) {
            self.mqtt.broker_port = port;
        }
        if let Some(val) = var("DAYLIGHT_MQTT_CLIENT_ID") {
            self.mqtt.client_id = val;
        }
        if let Some(val) = var("DAYLIGHT_MQTT_USERNAME") {
            self.mqtt.username = val;
        }
        if let Some(val) = var("DAYLIGHT_MQTT_PASSWORD") {
            self.mqtt.password = val;
        }
        if let Some(val) = var("DAYLIGHT_MQTT_TOPIC") {
            self.mqtt.topic = val;
        }
        if let Some(val) = var("DAYLIGHT_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("DAYLIGHT_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(secs) = var("DAYLIGHT_SWITCH_ON_DELAY").and_then(|v| v.parse().ok()) {
            self.actuation.switch_on_delay = secs;
        }
        if let Some(secs) = var("DAYLIGHT_SWITCH_OFF_DELAY").and_then(|v| v.parse().ok()) {
            self.actuation.switch_off_delay = secs;
        }
        if let Some(policy) = var("DAYLIGHT_REDUNDANT_COMMANDS").and_then(|v| parse_policy(&v)) {
            self.actuation.redundant_commands = policy;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.mqtt
            .validate()
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        if self.database.url.is_empty() {
            return Err(ConfigError::Validation(
                "database url must not be empty".to_string(),
            ));
        }
        if self.miio.port == 0 {
            return Err(ConfigError::Validation(
                "miio port must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

fn parse_policy(value: &str) -> Option<RedundantCommandPolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "send" => Some(RedundantCommandPolicy::Send),
        "skip" => Some(RedundantCommandPolicy::Skip),
        _ => None,
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:daylight.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "daylightd=info,daylight=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
