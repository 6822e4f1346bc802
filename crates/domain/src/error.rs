//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`DaylightError`] via `From`. Adapter errors are boxed into the
//! [`Transport`](DaylightError::Transport) or [`Storage`](DaylightError::Storage)
//! variants so the application layer never names adapter types.

use crate::device::DeviceType;
use crate::id::SensorId;

/// Boxed error coming from an adapter.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error for the daylight workspace.
#[derive(Debug, thiserror::Error)]
pub enum DaylightError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// An event referenced a sensor that is not registered.
    #[error("sensor {0} not found")]
    SensorNotFound(SensorId),

    /// No driver can handle the device.
    #[error("unsupported device")]
    UnsupportedDevice(#[from] UnsupportedDeviceError),

    /// Querying or commanding a physical device failed.
    #[error("device transport error")]
    Transport(#[source] BoxError),

    /// An inbound payload could not be turned into an [`Event`](crate::event::Event).
    #[error("malformed event")]
    MalformedEvent(#[from] EventParseError),

    /// The delayed-action scheduler refused a job.
    #[error("scheduling error")]
    Scheduling(#[from] SchedulingError),

    /// The persistence layer failed.
    #[error("storage error")]
    Storage(#[source] BoxError),
}

/// Domain invariant violations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("identifier must not be empty")]
    EmptyId,

    #[error("device model must not be empty")]
    EmptyModel,

    #[error("device host must not be empty")]
    EmptyHost,

    #[error("timestamp {0} is out of range")]
    TimestampOutOfRange(i64),
}

/// A device that no registered driver can control.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UnsupportedDeviceError {
    /// The device family is not handled at all.
    #[error("unsupported device type {0}")]
    Type(DeviceType),

    /// The device family is handled but the exact model is unknown.
    #[error("no driver registered for model {0:?}")]
    Model(String),
}

/// Reasons an inbound event payload is rejected.
#[derive(Debug, thiserror::Error)]
pub enum EventParseError {
    #[error("invalid event payload")]
    Json(#[from] serde_json::Error),

    #[error("event payload is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("event sensor_id must not be empty")]
    EmptySensorId,

    #[error("event timestamp {0} is out of range")]
    TimestampOutOfRange(i64),
}

/// Failures raised by the delayed-action scheduler itself.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("scheduler has been shut down")]
    ShutDown,

    #[error("run time of job {0} is out of range")]
    RunAtOutOfRange(String),
}
