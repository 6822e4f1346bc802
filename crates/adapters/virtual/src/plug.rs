//! Virtual plug: an in-memory power switch answering the driver port.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use daylight_app::ports::{BoxFuture, DeviceDriver};
use daylight_domain::device::Device;
use daylight_domain::error::DaylightError;
use daylight_domain::id::DeviceId;
use daylight_domain::power::PowerState;

use crate::error::VirtualError;

/// `config` key holding the power state a plug starts in (`"on"` / `"off"`).
pub const INITIAL_STATE_KEY: &str = "initial_state";
/// `config` key holding a simulated round-trip latency in milliseconds.
pub const LATENCY_KEY: &str = "latency_ms";
/// `config` key that makes every call fail as if the plug were offline.
pub const UNREACHABLE_KEY: &str = "unreachable";

/// Power state of every virtual plug, shared by all driver instances.
///
/// Drivers are built per actuation, so the state lives here rather than in
/// the driver itself.
#[derive(Debug, Default)]
pub struct VirtualPlugBank {
    states: Mutex<HashMap<DeviceId, PowerState>>,
}

impl VirtualPlugBank {
    /// Current state of `id`, if the plug was ever touched.
    #[must_use]
    pub fn state(&self, id: &DeviceId) -> Option<PowerState> {
        self.lock().get(id).copied()
    }

    /// Force the state of `id`, as if someone pressed the physical button.
    pub fn set(&self, id: DeviceId, state: PowerState) {
        self.lock().insert(id, state);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DeviceId, PowerState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Driver bound to one registered device.
pub struct VirtualPlug {
    id: DeviceId,
    latency: Option<Duration>,
    unreachable: bool,
    bank: Arc<VirtualPlugBank>,
}

impl VirtualPlug {
    /// Build a driver for `device`, seeding the bank from its `config` on
    /// first sight.
    ///
    /// # Errors
    ///
    /// Returns [`VirtualError::InvalidConfig`] when a `config` entry has the
    /// wrong shape.
    pub fn new(device: &Device, bank: Arc<VirtualPlugBank>) -> Result<Self, VirtualError> {
        let initial = match device.config.get(INITIAL_STATE_KEY) {
            Some(value) => serde_json::from_value::<PowerState>(value.clone())
                .map_err(|_| VirtualError::InvalidConfig(INITIAL_STATE_KEY))?,
            None => PowerState::Off,
        };
        let latency = match device.config.get(LATENCY_KEY) {
            Some(value) => Some(Duration::from_millis(
                value
                    .as_u64()
                    .ok_or(VirtualError::InvalidConfig(LATENCY_KEY))?,
            )),
            None => None,
        };
        let unreachable = match device.config.get(UNREACHABLE_KEY) {
            Some(value) => value
                .as_bool()
                .ok_or(VirtualError::InvalidConfig(UNREACHABLE_KEY))?,
            None => false,
        };

        bank.lock().entry(device.id.clone()).or_insert(initial);

        Ok(Self {
            id: device.id.clone(),
            latency,
            unreachable,
            bank,
        })
    }

    async fn round_trip(&self) -> Result<(), VirtualError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.unreachable {
            return Err(VirtualError::Unreachable(self.id.clone()));
        }
        Ok(())
    }
}

impl DeviceDriver for VirtualPlug {
    fn query_state(&self) -> BoxFuture<'_, Result<PowerState, DaylightError>> {
        Box::pin(async move {
            self.round_trip().await?;
            let state = self.bank.state(&self.id).unwrap_or(PowerState::Off);
            tracing::debug!(device_id = %self.id, %state, "virtual plug queried");
            Ok(state)
        })
    }

    fn set_state(&self, state: PowerState) -> BoxFuture<'_, Result<(), DaylightError>> {
        Box::pin(async move {
            self.round_trip().await?;
            self.bank.set(self.id.clone(), state);
            tracing::debug!(device_id = %self.id, %state, "virtual plug switched");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(id: &str) -> Device {
        Device::builder()
            .id(id)
            .model("virtual.plug")
            .host("localhost")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_default_to_off() {
        let bank = Arc::new(VirtualPlugBank::default());
        let plug = VirtualPlug::new(&device("V1"), bank).unwrap();
        assert_eq!(plug.query_state().await.unwrap(), PowerState::Off);
    }

    #[tokio::test]
    async fn should_start_in_configured_state() {
        let bank = Arc::new(VirtualPlugBank::default());
        let mut dev = device("V1");
        dev.config
            .insert(INITIAL_STATE_KEY.to_string(), serde_json::json!("on"));

        let plug = VirtualPlug::new(&dev, bank).unwrap();
        assert_eq!(plug.query_state().await.unwrap(), PowerState::On);
    }

    #[tokio::test]
    async fn should_keep_state_across_driver_instances() {
        let bank = Arc::new(VirtualPlugBank::default());
        let first = VirtualPlug::new(&device("V1"), Arc::clone(&bank)).unwrap();
        first.set_state(PowerState::On).await.unwrap();

        let second = VirtualPlug::new(&device("V1"), Arc::clone(&bank)).unwrap();
        assert_eq!(second.query_state().await.unwrap(), PowerState::On);
        assert_eq!(bank.state(&DeviceId::new("V1")), Some(PowerState::On));
    }

    #[tokio::test]
    async fn should_fail_with_transport_error_when_unreachable() {
        let bank = Arc::new(VirtualPlugBank::default());
        let mut dev = device("V1");
        dev.config
            .insert(UNREACHABLE_KEY.to_string(), serde_json::json!(true));

        let plug = VirtualPlug::new(&dev, Arc::clone(&bank)).unwrap();
        assert!(matches!(
            plug.set_state(PowerState::On).await,
            Err(DaylightError::Transport(_))
        ));
        assert_eq!(bank.state(&DeviceId::new("V1")), Some(PowerState::Off));
    }

    #[tokio::test(start_paused = true)]
    async fn should_wait_for_configured_latency() {
        let bank = Arc::new(VirtualPlugBank::default());
        let mut dev = device("V1");
        dev.config
            .insert(LATENCY_KEY.to_string(), serde_json::json!(250));
        let plug = VirtualPlug::new(&dev, bank).unwrap();

        let start = tokio::time::Instant::now();
        plug.query_state().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[test]
    fn should_reject_malformed_initial_state() {
        let bank = Arc::new(VirtualPlugBank::default());
        let mut dev = device("V1");
        dev.config
            .insert(INITIAL_STATE_KEY.to_string(), serde_json::json!("dim"));

        let result = VirtualPlug::new(&dev, bank);
        assert!(matches!(
            result,
            Err(VirtualError::InvalidConfig(INITIAL_STATE_KEY))
        ));
    }
}
