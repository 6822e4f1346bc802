//! Event consumer: drains the intake channel and dispatches events serially.
//!
//! Events are handled one at a time in arrival order. An error while
//! handling one event is logged and the loop moves on to the next.

use std::sync::Arc;

use tokio::sync::mpsc;

use daylight_domain::error::DaylightError;
use daylight_domain::event::Event;

use crate::dispatch::EventDispatchRegistry;

/// Totals over the lifetime of a consumer loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerStats {
    pub handled: usize,
    pub ignored: usize,
    pub failed: usize,
}

/// Serial consumer feeding an [`EventDispatchRegistry`].
pub struct EventConsumer<C> {
    registry: EventDispatchRegistry<C>,
    context: Arc<C>,
}

impl<C> EventConsumer<C>
where
    C: Send + Sync + 'static,
{
    pub fn new(registry: EventDispatchRegistry<C>, context: Arc<C>) -> Self {
        Self { registry, context }
    }

    /// Process events until every sender is dropped.
    pub async fn run(self, mut events: mpsc::Receiver<Event>) -> ConsumerStats {
        let mut stats = ConsumerStats::default();
        while let Some(event) = events.recv().await {
            self.consume(&event, &mut stats).await;
        }
        tracing::info!(
            handled = stats.handled,
            ignored = stats.ignored,
            failed = stats.failed,
            "event consumer stopped"
        );
        stats
    }

    async fn consume(&self, event: &Event, stats: &mut ConsumerStats) {
        match self.registry.dispatch(&self.context, event).await {
            Ok(Some(report)) => {
                stats.handled += 1;
                tracing::debug!(%event, devices = report.devices.len(), "event dispatched");
            }
            Ok(None) => stats.ignored += 1,
            Err(DaylightError::SensorNotFound(sensor_id)) => {
                stats.failed += 1;
                tracing::warn!(%sensor_id, %event, "sensor not found, event dropped");
            }
            Err(err) => {
                stats.failed += 1;
                tracing::error!(%event, error = %err, "failed to handle event");
            }
        }
    }
}
