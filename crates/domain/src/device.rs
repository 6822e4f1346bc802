//! Device: a controllable actuator installed at a location.
//!
//! Device records are owned by the storage layer. The dispatch core only
//! reads them; it changes the physical device's power state, never the
//! stored record.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DaylightError, ValidationError};
use crate::id::DeviceId;
use crate::location::Location;

/// Family of a device. Only plugs are actuated today; anything else is
/// kept verbatim so it can be reported as unsupported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceType {
    Plug,
    Other(String),
}

impl DeviceType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Plug => "plug",
            Self::Other(value) => value,
        }
    }
}

impl From<String> for DeviceType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "plug" => Self::Plug,
            _ => Self::Other(value),
        }
    }
}

impl From<DeviceType> for String {
    fn from(value: DeviceType) -> Self {
        match value {
            DeviceType::Plug => "plug".to_string(),
            DeviceType::Other(value) => value,
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physical actuator together with the credentials needed to reach it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub device_type: DeviceType,
    /// Exact vendor model string, used to pick a driver.
    pub model: String,
    pub host: String,
    /// Hex-encoded protocol token.
    pub token: String,
    /// Vendor-side device id, required by some models.
    pub did: Option<String>,
    pub location: Location,
    #[serde(default)]
    pub config: BTreeMap<String, serde_json::Value>,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DaylightError::Validation`] when `id`, `model` or `host` is empty.
    pub fn validate(&self) -> Result<(), DaylightError> {
        if self.id.is_empty() {
            return Err(ValidationError::EmptyId.into());
        }
        if self.model.is_empty() {
            return Err(ValidationError::EmptyModel.into());
        }
        if self.host.is_empty() {
            return Err(ValidationError::EmptyHost.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    device_type: Option<DeviceType>,
    model: Option<String>,
    host: Option<String>,
    token: Option<String>,
    did: Option<String>,
    location: Option<Location>,
    config: BTreeMap<String, serde_json::Value>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<DeviceId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = Some(device_type);
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn did(mut self, did: impl Into<String>) -> Self {
        self.did = Some(did.into());
        self
    }

    #[must_use]
    pub fn location(mut self, location: impl Into<Location>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn config(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// The device type defaults to [`DeviceType::Plug`].
    ///
    /// # Errors
    ///
    /// Returns [`DaylightError::Validation`] if `id`, `model` or `host` is
    /// missing or empty.
    pub fn build(self) -> Result<Device, DaylightError> {
        let device = Device {
            id: self.id.unwrap_or_else(|| DeviceId::new("")),
            device_type: self.device_type.unwrap_or(DeviceType::Plug),
            model: self.model.unwrap_or_default(),
            host: self.host.unwrap_or_default(),
            token: self.token.unwrap_or_default(),
            did: self.did,
            location: self.location.unwrap_or_else(|| Location::new("")),
            config: self.config,
        };
        device.validate()?;
        Ok(device)
    }
}
