//! Event dispatch: routes an inbound [`Event`] to the handler registered for
//! its type.
//!
//! The registry is built once at startup through
//! [`EventDispatchRegistry::builder`] and is immutable afterwards, so it can
//! be shared by reference without synchronisation.

use std::collections::HashMap;
use std::sync::Arc;

use daylight_domain::error::DaylightError;
use daylight_domain::event::{Event, EventType};
use daylight_domain::id::DeviceId;

use crate::actuator::ActuationOutcome;
use crate::ports::{BoxFuture, ScheduleOutcome};

/// What happened to one device while handling an event.
#[derive(Debug)]
pub enum Disposition {
    /// A deferred job was submitted.
    Scheduled(ScheduleOutcome),
    /// The device was actuated inline.
    Actuated(ActuationOutcome),
    /// The deferred job could not be submitted.
    SchedulingFailed(DaylightError),
}

impl Disposition {
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            Self::Scheduled(_) => true,
            Self::Actuated(outcome) => outcome.is_success(),
            Self::SchedulingFailed(_) => false,
        }
    }
}

/// Per-device results for one handled event.
#[derive(Debug)]
pub struct HandleReport {
    pub event_type: EventType,
    pub devices: Vec<(DeviceId, Disposition)>,
}

impl HandleReport {
    #[must_use]
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            devices: Vec::new(),
        }
    }

    pub fn push(&mut self, device_id: DeviceId, disposition: Disposition) {
        self.devices.push((device_id, disposition));
    }

    #[must_use]
    pub fn scheduled(&self) -> usize {
        self.devices
            .iter()
            .filter(|(_, d)| matches!(d, Disposition::Scheduled(_)))
            .count()
    }

    #[must_use]
    pub fn actuated(&self) -> usize {
        self.devices
            .iter()
            .filter(|(_, d)| matches!(d, Disposition::Actuated(outcome) if outcome.is_success()))
            .count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.devices.iter().filter(|(_, d)| !d.is_success()).count()
    }

    /// Disposition recorded for `device_id`, if it was processed.
    #[must_use]
    pub fn get(&self, device_id: &DeviceId) -> Option<&Disposition> {
        self.devices
            .iter()
            .find(|(id, _)| id == device_id)
            .map(|(_, d)| d)
    }
}

/// Handles events of the type(s) it was registered for.
pub trait EventHandler: Send + Sync {
    /// Handle `event` to completion, including any inline actuation.
    ///
    /// Errors abort handling of this event only.
    fn handle_event<'a>(
        &'a self,
        event: &'a Event,
    ) -> BoxFuture<'a, Result<HandleReport, DaylightError>>;
}

/// Builds a handler bound to the shared context (scheduler, repositories, …).
pub type HandlerConstructor<C> = fn(Arc<C>) -> Box<dyn EventHandler>;

/// Immutable map from [`EventType`] to [`HandlerConstructor`].
pub struct EventDispatchRegistry<C> {
    constructors: HashMap<EventType, HandlerConstructor<C>>,
}

impl<C> EventDispatchRegistry<C> {
    #[must_use]
    pub fn builder() -> EventDispatchRegistryBuilder<C> {
        EventDispatchRegistryBuilder {
            constructors: HashMap::new(),
        }
    }

    #[must_use]
    pub fn handles(&self, event_type: EventType) -> bool {
        self.constructors.contains_key(&event_type)
    }

    /// Instantiate the handler registered for `event.event_type` and run it.
    ///
    /// Returns `Ok(None)` after logging a warning when no handler is
    /// registered for the type.
    ///
    /// # Errors
    ///
    /// Propagates event-level errors from the handler (unknown sensor,
    /// storage failure).
    #[tracing::instrument(skip(self, context, event), fields(event_type = %event.event_type, sensor_id = %event.sensor_id))]
    pub async fn dispatch(
        &self,
        context: &Arc<C>,
        event: &Event,
    ) -> Result<Option<HandleReport>, DaylightError> {
        let Some(constructor) = self.constructors.get(&event.event_type) else {
            tracing::warn!("no handler registered for event type");
            return Ok(None);
        };

        tracing::info!(timestamp = event.timestamp, "handling event");
        let handler = constructor(Arc::clone(context));
        handler.handle_event(event).await.map(Some)
    }
}

impl<C> std::fmt::Debug for EventDispatchRegistry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<&str> = self.constructors.keys().map(|t| t.as_str()).collect();
        types.sort_unstable();
        f.debug_struct("EventDispatchRegistry")
            .field("event_types", &types)
            .finish()
    }
}

/// Ordered startup registration for [`EventDispatchRegistry`].
pub struct EventDispatchRegistryBuilder<C> {
    constructors: HashMap<EventType, HandlerConstructor<C>>,
}

impl<C> EventDispatchRegistryBuilder<C> {
    /// Associate `event_type` with `constructor`. Registering the same type
    /// twice keeps the last constructor.
    #[must_use]
    pub fn register(mut self, event_type: EventType, constructor: HandlerConstructor<C>) -> Self {
        self.constructors.insert(event_type, constructor);
        self
    }

    #[must_use]
    pub fn build(self) -> EventDispatchRegistry<C> {
        EventDispatchRegistry {
            constructors: self.constructors,
        }
    }
}
