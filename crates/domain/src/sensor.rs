//! Sensor: a located environmental input that emits trigger events.

use serde::{Deserialize, Serialize};

use crate::error::{DaylightError, ValidationError};
use crate::id::SensorId;
use crate::location::Location;

/// What a sensor is able to measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// Temperature, humidity and pressure.
    Thp,
    Illuminance,
}

/// A registered sensor. Read-only to the dispatch core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    pub sensor_id: SensorId,
    pub location: Location,
    pub capabilities: Vec<SensorKind>,
}

impl Sensor {
    /// Create a builder for constructing a [`Sensor`].
    #[must_use]
    pub fn builder() -> SensorBuilder {
        SensorBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DaylightError::Validation`] when `sensor_id` is empty.
    pub fn validate(&self) -> Result<(), DaylightError> {
        if self.sensor_id.is_empty() {
            return Err(ValidationError::EmptyId.into());
        }
        Ok(())
    }

    #[must_use]
    pub fn has_capability(&self, kind: SensorKind) -> bool {
        self.capabilities.contains(&kind)
    }
}

/// Step-by-step builder for [`Sensor`].
#[derive(Debug, Default)]
pub struct SensorBuilder {
    sensor_id: Option<SensorId>,
    location: Option<Location>,
    capabilities: Vec<SensorKind>,
}

impl SensorBuilder {
    #[must_use]
    pub fn sensor_id(mut self, id: impl Into<SensorId>) -> Self {
        self.sensor_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn location(mut self, location: impl Into<Location>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn capability(mut self, kind: SensorKind) -> Self {
        if !self.capabilities.contains(&kind) {
            self.capabilities.push(kind);
        }
        self
    }

    /// Consume the builder, validate, and return a [`Sensor`].
    ///
    /// # Errors
    ///
    /// Returns [`DaylightError::Validation`] if `sensor_id` is missing or empty.
    pub fn build(self) -> Result<Sensor, DaylightError> {
        let sensor = Sensor {
            sensor_id: self.sensor_id.unwrap_or_else(|| SensorId::new("")),
            location: self.location.unwrap_or_else(|| Location::new("")),
            capabilities: self.capabilities,
        };
        sensor.validate()?;
        Ok(sensor)
    }
}
