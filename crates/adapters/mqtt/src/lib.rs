//! # daylight-adapter-mqtt
//!
//! MQTT adapter: the inbound side of daylight.
//!
//! ## Responsibilities
//! - Connect to an MQTT broker (optionally with credentials)
//! - Subscribe to the trigger topic, re-subscribing after reconnects
//! - Decode each payload into a domain [`Event`](daylight_domain::event::Event)
//! - Forward events to the consumer over a bounded channel
//!
//! ## Dependency rule
//! Depends on `daylight-domain` only; it never calls into the app layer
//! directly, it just feeds the channel the consumer reads.

mod config;
mod error;
mod intake;

pub use config::MqttConfig;
pub use error::MqttError;
pub use intake::{MqttIntake, decode_event};
