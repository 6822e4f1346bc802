//! Sunrise/sunset handler: turns a directional trigger into device
//! actuations at the sensor's location.
//!
//! For each device co-located with the triggering sensor the handler either
//! submits a deferred job (configured delay > 0) or actuates inline before
//! moving on to the next device. Devices are processed independently: a
//! failure for one never stops the others.

use std::sync::Arc;

use chrono::TimeDelta;

use daylight_domain::device::Device;
use daylight_domain::error::{DaylightError, SchedulingError};
use daylight_domain::event::{Event, EventType};
use daylight_domain::job::{JobId, ScheduledJob};

use crate::actuator::Actuator;
use crate::dispatch::{Disposition, EventHandler, HandleReport};
use crate::ports::{BoxFuture, DeviceRepository, DriverFactory, Scheduler, SensorRepository};

/// Per-direction actuation delays, in seconds. Zero or negative means
/// immediate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitchDelays {
    pub switch_on_secs: i64,
    pub switch_off_secs: i64,
}

impl SwitchDelays {
    /// Delay to apply for `event_type`, or `None` for immediate actuation.
    #[must_use]
    pub fn for_event(self, event_type: EventType) -> Option<TimeDelta> {
        let secs = match event_type {
            EventType::Sunrise => self.switch_on_secs,
            EventType::Sunset => self.switch_off_secs,
        };
        if secs > 0 {
            TimeDelta::try_seconds(secs)
        } else {
            None
        }
    }
}

/// Collaborators shared by every handler instance.
pub struct HandlerContext<SR, DR, S, F> {
    pub sensors: SR,
    pub devices: DR,
    pub scheduler: S,
    pub actuator: Arc<Actuator<F>>,
    pub delays: SwitchDelays,
}

/// Handler for [`EventType::Sunrise`] and [`EventType::Sunset`].
pub struct SunriseSunsetHandler<SR, DR, S, F> {
    context: Arc<HandlerContext<SR, DR, S, F>>,
}

impl<SR, DR, S, F> SunriseSunsetHandler<SR, DR, S, F>
where
    SR: SensorRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    S: Scheduler + Send + Sync + 'static,
    F: DriverFactory + 'static,
{
    pub fn new(context: Arc<HandlerContext<SR, DR, S, F>>) -> Self {
        Self { context }
    }

    /// [`HandlerConstructor`](crate::dispatch::HandlerConstructor) for the
    /// dispatch registry.
    #[must_use]
    pub fn boxed(context: Arc<HandlerContext<SR, DR, S, F>>) -> Box<dyn EventHandler> {
        Box::new(Self::new(context))
    }

    /// Resolve the sensor, then its co-located devices, then drive each one.
    ///
    /// # Errors
    ///
    /// Returns [`DaylightError::SensorNotFound`] when the sensor is unknown, or
    /// a storage error when a lookup fails. Per-device failures are reported
    /// in the returned [`HandleReport`] instead.
    #[tracing::instrument(skip(self, event), fields(event_type = %event.event_type, sensor_id = %event.sensor_id))]
    pub async fn handle(&self, event: &Event) -> Result<HandleReport, DaylightError> {
        let sensor = self
            .context
            .sensors
            .find_by_id(&event.sensor_id)
            .await?
            .ok_or_else(|| DaylightError::SensorNotFound(event.sensor_id.clone()))?;

        let devices = self
            .context
            .devices
            .find_by_location(&sensor.location)
            .await?;
        tracing::info!(location = %sensor.location, count = devices.len(), "devices found for location");

        let target = event.event_type.target_state();
        let delay = self.context.delays.for_event(event.event_type);
        let mut report = HandleReport::new(event.event_type);

        for device in devices {
            let device_id = device.id.clone();
            let disposition = match delay {
                Some(delay) => self.schedule(event, device, delay).await,
                None => Disposition::Actuated(self.context.actuator.actuate(&device, target).await),
            };
            report.push(device_id, disposition);
        }

        tracing::info!(
            scheduled = report.scheduled(),
            actuated = report.actuated(),
            failed = report.failed(),
            "event handled"
        );
        Ok(report)
    }

    async fn schedule(&self, event: &Event, device: Device, delay: TimeDelta) -> Disposition {
        let run_at = event
            .occurred_at()
            .ok()
            .and_then(|at| at.checked_add_signed(delay));
        let Some(run_at) = run_at else {
            let job_id = JobId::for_trigger(event.event_type, &device.id);
            tracing::error!(%job_id, "job run time out of range");
            return Disposition::SchedulingFailed(
                SchedulingError::RunAtOutOfRange(job_id.to_string()).into(),
            );
        };

        let job = ScheduledJob::for_trigger(event.event_type, run_at, device);
        let job_id = job.id.clone();
        match self.context.scheduler.schedule(job).await {
            Ok(outcome) => Disposition::Scheduled(outcome),
            Err(err) => {
                tracing::error!(%job_id, error = %err, "failed to schedule job");
                Disposition::SchedulingFailed(err)
            }
        }
    }
}

impl<SR, DR, S, F> EventHandler for SunriseSunsetHandler<SR, DR, S, F>
where
    SR: SensorRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    S: Scheduler + Send + Sync + 'static,
    F: DriverFactory + 'static,
{
    fn handle_event<'a>(
        &'a self,
        event: &'a Event,
    ) -> BoxFuture<'a, Result<HandleReport, DaylightError>> {
        Box::pin(self.handle(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::ActuationOutcome;
    use crate::actuator::tests::{FakePlugs, plug};
    use crate::drivers::DriverRegistry;
    use crate::ports::ScheduleOutcome;
    use daylight_domain::id::SensorId;
    use daylight_domain::location::Location;
    use daylight_domain::power::{PowerState, RedundantCommandPolicy};
    use daylight_domain::sensor::Sensor;
    use daylight_domain::time::from_unix_seconds;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::Mutex;

    // ── In-memory sensor repo ──────────────────────────────────────

    struct InMemorySensorRepo {
        store: HashMap<SensorId, Sensor>,
    }

    impl InMemorySensorRepo {
        fn with(sensors: Vec<Sensor>) -> Self {
            Self {
                store: sensors
                    .into_iter()
                    .map(|s| (s.sensor_id.clone(), s))
                    .collect(),
            }
        }
    }

    impl SensorRepository for InMemorySensorRepo {
        fn find_by_id(
            &self,
            id: &SensorId,
        ) -> impl Future<Output = Result<Option<Sensor>, DaylightError>> + Send {
            let r = self.store.get(id).cloned();
            async { Ok(r) }
        }
    }

    // ── In-memory device repo ──────────────────────────────────────

    struct InMemoryDeviceRepo {
        store: Vec<Device>,
        fail: bool,
    }

    impl DeviceRepository for InMemoryDeviceRepo {
        fn find_by_location(
            &self,
            location: &Location,
        ) -> impl Future<Output = Result<Vec<Device>, DaylightError>> + Send {
            let r: Vec<_> = self
                .store
                .iter()
                .filter(|d| d.location == *location)
                .cloned()
                .collect();
            let fail = self.fail;
            async move {
                if fail {
                    let io = std::io::Error::other("database is locked");
                    return Err(DaylightError::Storage(Box::new(io)));
                }
                Ok(r)
            }
        }
    }

    // ── Spy scheduler ──────────────────────────────────────────────

    #[derive(Default)]
    struct SpyScheduler {
        jobs: Mutex<Vec<ScheduledJob>>,
        reject: bool,
    }

    impl Scheduler for SpyScheduler {
        fn schedule(
            &self,
            job: ScheduledJob,
        ) -> impl Future<Output = Result<ScheduleOutcome, DaylightError>> + Send {
            let result = if self.reject {
                Err(SchedulingError::ShutDown.into())
            } else {
                let mut jobs = self.jobs.lock().unwrap();
                let replaced = jobs.iter().position(|j| j.id == job.id);
                let outcome = match replaced {
                    Some(index) => {
                        jobs[index] = job;
                        ScheduleOutcome::Replaced
                    }
                    None => {
                        jobs.push(job);
                        ScheduleOutcome::Created
                    }
                };
                Ok(outcome)
            };
            async move { result }
        }
    }

    // ── Helpers ────────────────────────────────────────────────────

    type TestHandler =
        SunriseSunsetHandler<InMemorySensorRepo, InMemoryDeviceRepo, SpyScheduler, DriverRegistry>;

    const MODEL: &str = "fake.plug";

    fn sensor(id: &str, location: &str) -> Sensor {
        Sensor::builder()
            .sensor_id(id)
            .location(location)
            .build()
            .unwrap()
    }

    fn make_handler(
        plugs: &Arc<FakePlugs>,
        devices: Vec<Device>,
        delays: SwitchDelays,
    ) -> TestHandler {
        make_handler_with(plugs, devices, delays, SpyScheduler::default(), false)
    }

    fn make_handler_with(
        plugs: &Arc<FakePlugs>,
        devices: Vec<Device>,
        delays: SwitchDelays,
        scheduler: SpyScheduler,
        fail_devices: bool,
    ) -> TestHandler {
        SunriseSunsetHandler::new(Arc::new(HandlerContext {
            sensors: InMemorySensorRepo::with(vec![sensor("S1", "L1"), sensor("S2", "L2")]),
            devices: InMemoryDeviceRepo {
                store: devices,
                fail: fail_devices,
            },
            scheduler,
            actuator: Arc::new(Actuator::new(
                plugs.registry(MODEL),
                RedundantCommandPolicy::Send,
            )),
            delays,
        }))
    }

    fn sunset() -> Event {
        Event::new(EventType::Sunset, "S1", 1_700_000_000)
    }

    // ── Tests ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn should_switch_off_immediately_when_no_delay() {
        let plugs = FakePlugs::with(&[("D1", PowerState::On), ("D2", PowerState::Off)]);
        let handler = make_handler(
            &plugs,
            vec![plug("D1", MODEL), plug("D2", MODEL)],
            SwitchDelays::default(),
        );

        let report = handler.handle(&sunset()).await.unwrap();

        assert_eq!(plugs.set_calls("D1"), vec![PowerState::Off]);
        assert_eq!(plugs.query_count("D2"), 1);
        // D2 is already off; the command is still sent.
        assert_eq!(plugs.set_calls("D2"), vec![PowerState::Off]);
        assert!(matches!(
            report.get(&"D1".into()),
            Some(Disposition::Actuated(ActuationOutcome::Applied))
        ));
        assert!(matches!(
            report.get(&"D2".into()),
            Some(Disposition::Actuated(ActuationOutcome::AlreadyInState {
                sent: true
            }))
        ));
        assert_eq!(report.actuated(), 2);
        assert!(handler.context.scheduler.jobs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_schedule_one_job_per_device_when_delay_configured() {
        let plugs = FakePlugs::with(&[("D1", PowerState::On), ("D2", PowerState::Off)]);
        let handler = make_handler(
            &plugs,
            vec![plug("D1", MODEL), plug("D2", MODEL)],
            SwitchDelays {
                switch_on_secs: 0,
                switch_off_secs: 120,
            },
        );

        let report = handler.handle(&sunset()).await.unwrap();

        assert_eq!(report.scheduled(), 2);
        assert_eq!(plugs.total_calls(), 0);

        let jobs = handler.context.scheduler.jobs.lock().unwrap();
        let mut ids: Vec<&str> = jobs.iter().map(|j| j.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["sunset:D1", "sunset:D2"]);
        let expected = from_unix_seconds(1_700_000_120).unwrap();
        assert!(jobs.iter().all(|j| j.run_at == expected));
        assert!(jobs.iter().all(|j| j.target == PowerState::Off));
    }

    #[tokio::test]
    async fn should_use_switch_on_delay_for_sunrise() {
        let plugs = FakePlugs::with(&[("D1", PowerState::Off)]);
        let handler = make_handler(
            &plugs,
            vec![plug("D1", MODEL)],
            SwitchDelays {
                switch_on_secs: 9000,
                switch_off_secs: 0,
            },
        );

        let event = Event::new(EventType::Sunrise, "S1", 1_700_000_000);
        handler.handle(&event).await.unwrap();

        let jobs = handler.context.scheduler.jobs.lock().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id.as_str(), "sunrise:D1");
        assert_eq!(jobs[0].run_at, from_unix_seconds(1_700_009_000).unwrap());
        assert_eq!(jobs[0].target, PowerState::On);
    }

    #[tokio::test]
    async fn should_act_immediately_when_delay_is_negative() {
        let plugs = FakePlugs::with(&[("D1", PowerState::Off)]);
        let handler = make_handler(
            &plugs,
            vec![plug("D1", MODEL)],
            SwitchDelays {
                switch_on_secs: -5,
                switch_off_secs: 0,
            },
        );

        let event = Event::new(EventType::Sunrise, "S1", 1_700_000_000);
        handler.handle(&event).await.unwrap();

        assert_eq!(plugs.state("D1"), Some(PowerState::On));
        assert!(handler.context.scheduler.jobs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_replace_job_when_same_event_repeats() {
        let plugs = FakePlugs::with(&[("D1", PowerState::On)]);
        let handler = make_handler(
            &plugs,
            vec![plug("D1", MODEL)],
            SwitchDelays {
                switch_on_secs: 0,
                switch_off_secs: 60,
            },
        );

        handler.handle(&sunset()).await.unwrap();
        let later = Event::new(EventType::Sunset, "S1", 1_700_000_500);
        let report = handler.handle(&later).await.unwrap();

        assert!(matches!(
            report.get(&"D1".into()),
            Some(Disposition::Scheduled(ScheduleOutcome::Replaced))
        ));
        let jobs = handler.context.scheduler.jobs.lock().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].run_at, from_unix_seconds(1_700_000_560).unwrap());
    }

    #[tokio::test]
    async fn should_return_sensor_not_found_for_unknown_sensor() {
        let plugs = FakePlugs::with(&[("D1", PowerState::On)]);
        let handler = make_handler(&plugs, vec![plug("D1", MODEL)], SwitchDelays::default());

        let event = Event::new(EventType::Sunset, "S404", 1_700_000_000);
        let result = handler.handle(&event).await;

        assert!(matches!(result, Err(DaylightError::SensorNotFound(id)) if id.as_str() == "S404"));
        assert_eq!(plugs.total_calls(), 0);
    }

    #[tokio::test]
    async fn should_do_nothing_when_location_has_no_devices() {
        let plugs = FakePlugs::with(&[("D1", PowerState::On)]);
        let handler = make_handler(&plugs, vec![plug("D1", MODEL)], SwitchDelays::default());

        let event = Event::new(EventType::Sunset, "S2", 1_700_000_000);
        let report = handler.handle(&event).await.unwrap();

        assert!(report.devices.is_empty());
        assert_eq!(plugs.total_calls(), 0);
    }

    #[tokio::test]
    async fn should_only_touch_devices_at_sensor_location() {
        let plugs = FakePlugs::with(&[("D1", PowerState::On), ("D9", PowerState::On)]);
        let mut elsewhere = plug("D9", MODEL);
        elsewhere.location = Location::new("L2");
        let handler = make_handler(
            &plugs,
            vec![plug("D1", MODEL), elsewhere],
            SwitchDelays::default(),
        );

        handler.handle(&sunset()).await.unwrap();

        assert_eq!(plugs.state("D1"), Some(PowerState::Off));
        assert_eq!(plugs.state("D9"), Some(PowerState::On));
    }

    #[tokio::test]
    async fn should_keep_going_when_one_device_fails() {
        let plugs = FakePlugs::with(&[("D1", PowerState::On), ("D2", PowerState::On)]);
        plugs.break_device("D1");
        let handler = make_handler(
            &plugs,
            vec![plug("D1", MODEL), plug("D2", MODEL)],
            SwitchDelays::default(),
        );

        let report = handler.handle(&sunset()).await.unwrap();

        assert!(matches!(
            report.get(&"D1".into()),
            Some(Disposition::Actuated(ActuationOutcome::Failed(_)))
        ));
        assert_eq!(plugs.set_calls("D2"), vec![PowerState::Off]);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.actuated(), 1);
    }

    #[tokio::test]
    async fn should_skip_unsupported_model_and_continue() {
        let plugs = FakePlugs::with(&[("D2", PowerState::On)]);
        let handler = make_handler(
            &plugs,
            vec![plug("D1", "acme.plug.v9"), plug("D2", MODEL)],
            SwitchDelays::default(),
        );

        let report = handler.handle(&sunset()).await.unwrap();

        assert!(matches!(
            report.get(&"D1".into()),
            Some(Disposition::Actuated(ActuationOutcome::Unsupported(_)))
        ));
        assert_eq!(plugs.state("D2"), Some(PowerState::Off));
    }

    #[tokio::test]
    async fn should_record_scheduling_failure_per_device() {
        let plugs = FakePlugs::with(&[]);
        let scheduler = SpyScheduler {
            reject: true,
            ..SpyScheduler::default()
        };
        let handler = make_handler_with(
            &plugs,
            vec![plug("D1", MODEL), plug("D2", MODEL)],
            SwitchDelays {
                switch_on_secs: 0,
                switch_off_secs: 30,
            },
            scheduler,
            false,
        );

        let report = handler.handle(&sunset()).await.unwrap();

        assert_eq!(report.devices.len(), 2);
        assert_eq!(report.failed(), 2);
    }

    #[tokio::test]
    async fn should_propagate_device_lookup_failure() {
        let plugs = FakePlugs::with(&[]);
        let handler = make_handler_with(
            &plugs,
            vec![plug("D1", MODEL)],
            SwitchDelays::default(),
            SpyScheduler::default(),
            true,
        );

        let result = handler.handle(&sunset()).await;
        assert!(matches!(result, Err(DaylightError::Storage(_))));
    }

    #[test]
    fn should_treat_zero_delay_as_immediate() {
        let delays = SwitchDelays {
            switch_on_secs: 0,
            switch_off_secs: 30,
        };
        assert!(delays.for_event(EventType::Sunrise).is_none());
        assert_eq!(
            delays.for_event(EventType::Sunset),
            Some(TimeDelta::seconds(30))
        );
    }
}
