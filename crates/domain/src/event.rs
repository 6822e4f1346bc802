//! Event: a directional environmental trigger emitted by a sensor.
//!
//! Events are produced externally and exist only for the duration of
//! handling. Wire format:
//!
//! ```json
//! { "type": "sunrise", "sensor_id": "S1", "timestamp": 1700000000 }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::EventParseError;
use crate::id::SensorId;
use crate::power::PowerState;
use crate::time::{Timestamp, from_unix_seconds};

/// Direction of a trigger event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Sunrise,
    Sunset,
}

impl EventType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sunrise => "sunrise",
            Self::Sunset => "sunset",
        }
    }

    /// Power state devices should end up in: on at sunrise, off at sunset.
    #[must_use]
    pub fn target_state(self) -> PowerState {
        match self {
            Self::Sunrise => PowerState::On,
            Self::Sunset => PowerState::Off,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable trigger tied to a sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub sensor_id: SensorId,
    /// Unix seconds.
    pub timestamp: i64,
}

impl Event {
    #[must_use]
    pub fn new(event_type: EventType, sensor_id: impl Into<SensorId>, timestamp: i64) -> Self {
        Self {
            event_type,
            sensor_id: sensor_id.into(),
            timestamp,
        }
    }

    /// Parse a raw inbound payload.
    ///
    /// # Errors
    ///
    /// Returns [`EventParseError`] when the payload is not UTF-8, not valid
    /// JSON for the wire schema, has an empty `sensor_id`, or carries a
    /// timestamp that cannot be represented.
    pub fn from_json(payload: &[u8]) -> Result<Self, EventParseError> {
        let text = std::str::from_utf8(payload)?;
        let event: Self = serde_json::from_str(text)?;
        if event.sensor_id.is_empty() {
            return Err(EventParseError::EmptySensorId);
        }
        if from_unix_seconds(event.timestamp).is_none() {
            return Err(EventParseError::TimestampOutOfRange(event.timestamp));
        }
        Ok(event)
    }

    /// The event time as a [`Timestamp`].
    ///
    /// # Errors
    ///
    /// Returns [`EventParseError::TimestampOutOfRange`] for timestamps chrono
    /// cannot represent.
    pub fn occurred_at(&self) -> Result<Timestamp, EventParseError> {
        from_unix_seconds(self.timestamp)
            .ok_or(EventParseError::TimestampOutOfRange(self.timestamp))
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(sensor={}, at={})",
            self.event_type, self.sensor_id, self.timestamp
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_sunset_payload() {
        let event =
            Event::from_json(br#"{"type":"sunset","sensor_id":"S1","timestamp":1700000000}"#)
                .unwrap();
        assert_eq!(event, Event::new(EventType::Sunset, "S1", 1_700_000_000));
    }

    #[test]
    fn should_ignore_unknown_fields() {
        let event = Event::from_json(
            br#"{"type":"sunrise","sensor_id":"S1","timestamp":1,"lux":12.5}"#,
        )
        .unwrap();
        assert_eq!(event.event_type, EventType::Sunrise);
    }

    #[test]
    fn should_reject_unknown_event_type() {
        let result = Event::from_json(br#"{"type":"noon","sensor_id":"S1","timestamp":1}"#);
        assert!(matches!(result, Err(EventParseError::Json(_))));
    }

    #[test]
    fn should_reject_missing_fields() {
        let result = Event::from_json(br#"{"type":"sunset"}"#);
        assert!(matches!(result, Err(EventParseError::Json(_))));
    }

    #[test]
    fn should_reject_non_utf8_payload() {
        let result = Event::from_json(&[0xff, 0xfe, 0x00]);
        assert!(matches!(result, Err(EventParseError::Utf8(_))));
    }

    #[test]
    fn should_reject_empty_sensor_id() {
        let result = Event::from_json(br#"{"type":"sunset","sensor_id":"","timestamp":1}"#);
        assert!(matches!(result, Err(EventParseError::EmptySensorId)));
    }

    #[test]
    fn should_reject_unrepresentable_timestamp() {
        let payload = format!(
            r#"{{"type":"sunset","sensor_id":"S1","timestamp":{}}}"#,
            i64::MAX
        );
        let result = Event::from_json(payload.as_bytes());
        assert!(matches!(
            result,
            Err(EventParseError::TimestampOutOfRange(_))
        ));
    }

    #[test]
    fn should_map_direction_to_target_state() {
        assert_eq!(EventType::Sunrise.target_state(), PowerState::On);
        assert_eq!(EventType::Sunset.target_state(), PowerState::Off);
    }

    #[test]
    fn should_convert_timestamp() {
        let event = Event::new(EventType::Sunrise, "S1", 1_700_000_000);
        assert_eq!(event.occurred_at().unwrap().timestamp(), 1_700_000_000);
    }
}
