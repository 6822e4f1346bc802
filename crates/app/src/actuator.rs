//! Actuator: drives one device into a target power state.
//!
//! Every failure is contained here and reported as an [`ActuationOutcome`];
//! nothing escapes past the device boundary.

use daylight_domain::device::{Device, DeviceType};
use daylight_domain::error::{DaylightError, UnsupportedDeviceError};
use daylight_domain::job::ScheduledJob;
use daylight_domain::power::{PowerState, RedundantCommandPolicy};

use crate::ports::{DriverFactory, JobRunner};

/// Result of a single actuation attempt.
#[derive(Debug)]
pub enum ActuationOutcome {
    /// The device was in the other state and the command was sent.
    Applied,
    /// The device already reported the target state. `sent` tells whether
    /// the command was issued anyway.
    AlreadyInState { sent: bool },
    /// No driver handles this device; it was skipped.
    Unsupported(UnsupportedDeviceError),
    /// Driver construction or device I/O failed.
    Failed(DaylightError),
}

impl ActuationOutcome {
    /// Whether the device is now known to be in the target state.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Applied | Self::AlreadyInState { .. })
    }
}

/// Performs query-then-set actuations through drivers from a [`DriverFactory`].
pub struct Actuator<F> {
    factory: F,
    policy: RedundantCommandPolicy,
}

impl<F: DriverFactory> Actuator<F> {
    pub fn new(factory: F, policy: RedundantCommandPolicy) -> Self {
        Self { factory, policy }
    }

    #[must_use]
    pub fn policy(&self) -> RedundantCommandPolicy {
        self.policy
    }

    /// Bring `device` into `target`.
    ///
    /// The live state is always queried first. When it already matches,
    /// the command is still sent unless the policy is
    /// [`RedundantCommandPolicy::Skip`].
    #[tracing::instrument(skip(self, device), fields(device_id = %device.id, model = %device.model))]
    pub async fn actuate(&self, device: &Device, target: PowerState) -> ActuationOutcome {
        if device.device_type != DeviceType::Plug {
            tracing::error!(device_type = %device.device_type, "unsupported device type");
            return ActuationOutcome::Unsupported(UnsupportedDeviceError::Type(
                device.device_type.clone(),
            ));
        }

        let driver = match self.factory.create(device) {
            Ok(driver) => driver,
            Err(DaylightError::UnsupportedDevice(err)) => {
                tracing::error!(error = %err, "unsupported device model");
                return ActuationOutcome::Unsupported(err);
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to build driver");
                return ActuationOutcome::Failed(err);
            }
        };

        let current = match driver.query_state().await {
            Ok(state) => state,
            Err(err) => {
                tracing::error!(error = %err, "failed to query device state");
                return ActuationOutcome::Failed(err);
            }
        };

        let already = current == target;
        if already {
            tracing::info!(state = %current, "device already in target state");
            if self.policy == RedundantCommandPolicy::Skip {
                return ActuationOutcome::AlreadyInState { sent: false };
            }
        }

        if let Err(err) = driver.set_state(target).await {
            tracing::error!(error = %err, "failed to set device state");
            return ActuationOutcome::Failed(err);
        }
        tracing::info!(from = %current, to = %target, "device switched");

        if already {
            ActuationOutcome::AlreadyInState { sent: true }
        } else {
            ActuationOutcome::Applied
        }
    }
}

impl<F: DriverFactory> JobRunner for Actuator<F> {
    async fn run(&self, job: ScheduledJob) -> Result<(), DaylightError> {
        match self.actuate(&job.device, job.target).await {
            ActuationOutcome::Applied | ActuationOutcome::AlreadyInState { .. } => Ok(()),
            ActuationOutcome::Unsupported(err) => Err(err.into()),
            ActuationOutcome::Failed(err) => Err(err),
        }
    }
}
