//! Storage ports: read-only lookups over sensor and device records.
//!
//! Records are owned by the persistence layer; the dispatch core never
//! writes them.

use std::future::Future;
use std::sync::Arc;

use daylight_domain::device::Device;
use daylight_domain::error::DaylightError;
use daylight_domain::id::SensorId;
use daylight_domain::location::Location;
use daylight_domain::sensor::Sensor;

/// Lookup of registered [`Sensor`]s.
pub trait SensorRepository {
    /// Find a sensor by its unique identifier.
    fn find_by_id(
        &self,
        id: &SensorId,
    ) -> impl Future<Output = Result<Option<Sensor>, DaylightError>> + Send;
}

/// Lookup of registered [`Device`]s.
pub trait DeviceRepository {
    /// Find every device installed at `location`. Order is unspecified.
    fn find_by_location(
        &self,
        location: &Location,
    ) -> impl Future<Output = Result<Vec<Device>, DaylightError>> + Send;
}

impl<T: SensorRepository + Send + Sync> SensorRepository for Arc<T> {
    fn find_by_id(
        &self,
        id: &SensorId,
    ) -> impl Future<Output = Result<Option<Sensor>, DaylightError>> + Send {
        (**self).find_by_id(id)
    }
}

impl<T: DeviceRepository + Send + Sync> DeviceRepository for Arc<T> {
    fn find_by_location(
        &self,
        location: &Location,
    ) -> impl Future<Output = Result<Vec<Device>, DaylightError>> + Send {
        (**self).find_by_location(location)
    }
}
