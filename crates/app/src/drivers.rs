//! Driver registry: the model → driver table built once at startup.
//!
//! Each adapter contributes constructors for the exact model strings it
//! supports. Supporting a new device family means registering one more
//! constructor; existing drivers are untouched.

use std::collections::HashMap;

use daylight_domain::device::Device;
use daylight_domain::error::{DaylightError, UnsupportedDeviceError};

use crate::ports::{DeviceDriver, DriverFactory};

/// Builds a driver for a device whose model matched the registration.
pub type DriverConstructor =
    Box<dyn Fn(&Device) -> Result<Box<dyn DeviceDriver>, DaylightError> + Send + Sync>;

/// [`DriverFactory`] selecting a constructor by exact `device.model` match.
#[derive(Default)]
pub struct DriverRegistry {
    constructors: HashMap<String, DriverConstructor>,
}

impl DriverRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `constructor` for devices whose model is exactly `model`.
    ///
    /// A later registration for the same model replaces the earlier one.
    pub fn register<F>(&mut self, model: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&Device) -> Result<Box<dyn DeviceDriver>, DaylightError> + Send + Sync + 'static,
    {
        let model = model.into();
        if self
            .constructors
            .insert(model.clone(), Box::new(constructor))
            .is_some()
        {
            tracing::warn!(%model, "driver registration replaced");
        }
        self
    }

    #[must_use]
    pub fn supports(&self, model: &str) -> bool {
        self.constructors.contains_key(model)
    }

    /// Registered model strings, sorted.
    #[must_use]
    pub fn models(&self) -> Vec<&str> {
        let mut models: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        models.sort_unstable();
        models
    }
}

impl DriverFactory for DriverRegistry {
    fn create(&self, device: &Device) -> Result<Box<dyn DeviceDriver>, DaylightError> {
        let constructor = self
            .constructors
            .get(&device.model)
            .ok_or_else(|| UnsupportedDeviceError::Model(device.model.clone()))?;
        constructor(device)
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("models", &self.models())
            .finish()
    }
}
