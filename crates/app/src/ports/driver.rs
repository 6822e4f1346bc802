//! Driver ports: protocol-specific control of a device's power state.
//!
//! Drivers are picked per device at actuation time, so both traits are
//! object safe: driver futures are boxed.

use daylight_domain::device::Device;
use daylight_domain::error::DaylightError;
use daylight_domain::power::PowerState;

use super::BoxFuture;

/// Query and set the binary state of one physical device.
pub trait DeviceDriver: Send + Sync {
    /// Read the live power state from the device.
    fn query_state(&self) -> BoxFuture<'_, Result<PowerState, DaylightError>>;

    /// Command the device into `state`.
    fn set_state(&self, state: PowerState) -> BoxFuture<'_, Result<(), DaylightError>>;
}

/// Resolves a device record to a driver able to control it.
pub trait DriverFactory: Send + Sync {
    /// Build a driver for `device`.
    ///
    /// # Errors
    ///
    /// Returns [`DaylightError::UnsupportedDevice`] when no driver handles the
    /// device's model, or any error raised while constructing the driver.
    fn create(&self, device: &Device) -> Result<Box<dyn DeviceDriver>, DaylightError>;
}
