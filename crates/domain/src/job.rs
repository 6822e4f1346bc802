//! Scheduled job: a deferred actuation bound to a run time.
//!
//! A job id is derived from the trigger direction and the device, so at
//! most one job can be pending per `(event type, device)` pair. Submitting
//! a job whose id is already pending replaces the earlier one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::device::Device;
use crate::event::EventType;
use crate::id::DeviceId;
use crate::power::PowerState;
use crate::time::Timestamp;

/// Deterministic job identifier, formatted as `"{event_type}:{device_id}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    #[must_use]
    pub fn for_trigger(event_type: EventType, device_id: &DeviceId) -> Self {
        Self(format!("{event_type}:{device_id}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Drive `device` to `target` at `run_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledJob {
    pub id: JobId,
    pub run_at: Timestamp,
    pub device: Device,
    pub target: PowerState,
}

impl ScheduledJob {
    /// Build the job for a trigger, deriving its id from the direction and
    /// the device.
    #[must_use]
    pub fn for_trigger(event_type: EventType, run_at: Timestamp, device: Device) -> Self {
        Self {
            id: JobId::for_trigger(event_type, &device.id),
            run_at,
            target: event_type.target_state(),
            device,
        }
    }
}
