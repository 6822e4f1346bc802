//! MQTT adapter error types.

use daylight_domain::error::{DaylightError, EventParseError};

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The configuration cannot be used to connect.
    #[error("invalid MQTT configuration: {0}")]
    InvalidConfig(&'static str),

    /// The rumqttc client returned an error.
    #[error("MQTT client error")]
    Client(#[from] rumqttc::ClientError),

    /// The connection to the broker failed.
    #[error("MQTT connection error")]
    Connection(#[from] rumqttc::ConnectionError),

    /// An incoming payload is not a valid event.
    #[error("failed to parse MQTT payload: {0}")]
    PayloadParse(#[source] EventParseError),
}

impl MqttError {
    /// Convert into a [`DaylightError`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> DaylightError {
        match self {
            Self::PayloadParse(err) => DaylightError::MalformedEvent(err),
            other => DaylightError::Transport(Box::new(other)),
        }
    }
}

impl From<MqttError> for DaylightError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}
