//! MQTT intake configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::MqttError;

/// Configuration for the MQTT event intake.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Broker username. Empty means anonymous.
    pub username: String,
    pub password: String,
    /// Topic the trigger events are published on.
    pub topic: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Capacity of the channel between the intake and the consumer.
    pub channel_capacity: usize,
    /// Pause before polling again after a connection error, in seconds.
    pub reconnect_delay_secs: u16,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "daylight".to_string(),
            username: String::new(),
            password: String::new(),
            topic: "daylight/events".to_string(),
            keep_alive_secs: 30,
            channel_capacity: 64,
            reconnect_delay_secs: 5,
        }
    }
}

impl MqttConfig {
    /// Credentials to present, if any.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if self.username.is_empty() {
            None
        } else {
            Some((self.username.as_str(), self.password.as_str()))
        }
    }

    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(u64::from(self.keep_alive_secs))
    }

    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(u64::from(self.reconnect_delay_secs))
    }

    /// Check the settings the client cannot work without.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::InvalidConfig`] for a zero port, an empty topic or
    /// client id, or a zero channel capacity.
    pub fn validate(&self) -> Result<(), MqttError> {
        if self.broker_port == 0 {
            return Err(MqttError::InvalidConfig("broker_port must be non-zero"));
        }
        if self.topic.is_empty() {
            return Err(MqttError::InvalidConfig("topic must not be empty"));
        }
        if self.client_id.is_empty() {
            return Err(MqttError::InvalidConfig("client_id must not be empty"));
        }
        if self.channel_capacity == 0 {
            return Err(MqttError::InvalidConfig("channel_capacity must be non-zero"));
        }
        Ok(())
    }
}
