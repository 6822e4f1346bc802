//! MQTT intake: subscribes to the trigger topic and forwards decoded events.
//!
//! [`MqttIntake`] owns the rumqttc event loop on a background task. The
//! subscription is re-issued on every `ConnAck`, so a broker restart does not
//! silently drop the topic. Malformed payloads are logged and skipped; valid
//! events go to a bounded channel drained by the event consumer.

use rumqttc::{AsyncClient, Event as MqttEvent, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use daylight_domain::event::Event;

use crate::config::MqttConfig;
use crate::error::MqttError;

/// Capacity of rumqttc's internal request queue.
const REQUEST_CAPACITY: usize = 10;

/// Decode one publish payload into an [`Event`].
///
/// # Errors
///
/// Returns [`MqttError::PayloadParse`] when the payload is not a valid event.
pub fn decode_event(payload: &[u8]) -> Result<Event, MqttError> {
    Event::from_json(payload).map_err(MqttError::PayloadParse)
}

/// Handle on the running intake task.
pub struct MqttIntake {
    client: AsyncClient,
    task: JoinHandle<()>,
}

impl MqttIntake {
    /// Connect to the broker and start forwarding events into `sink`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::InvalidConfig`] when `config` fails validation.
    pub fn start(config: &MqttConfig, sink: mpsc::Sender<Event>) -> Result<Self, MqttError> {
        config.validate()?;

        let mut options =
            MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
        options.set_keep_alive(config.keep_alive());
        if let Some((username, password)) = config.credentials() {
            options.set_credentials(username, password);
        }

        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let runner = IntakeLoop {
            client: client.clone(),
            eventloop,
            topic: config.topic.clone(),
            sink,
            reconnect_delay: config.reconnect_delay(),
        };

        tracing::info!(
            host = %config.broker_host,
            port = config.broker_port,
            topic = %config.topic,
            "starting MQTT intake"
        );
        let task = tokio::spawn(runner.run());
        Ok(Self { client, task })
    }

    /// Whether the background loop has stopped (consumer gone or aborted).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Disconnect from the broker and stop the background loop.
    pub async fn shutdown(self) {
        if let Err(err) = self.client.disconnect().await {
            tracing::warn!(error = %MqttError::from(err), "failed to send MQTT disconnect");
        }
        self.task.abort();
        tracing::info!("MQTT intake stopped");
    }
}

struct IntakeLoop {
    client: AsyncClient,
    eventloop: EventLoop,
    topic: String,
    sink: mpsc::Sender<Event>,
    reconnect_delay: std::time::Duration,
}

impl IntakeLoop {
    async fn run(mut self) {
        loop {
            match self.eventloop.poll().await {
                Ok(MqttEvent::Incoming(Packet::ConnAck(_))) => {
                    tracing::info!(topic = %self.topic, "connected to broker, subscribing");
                    if let Err(err) = self.client.subscribe(&self.topic, QoS::AtLeastOnce).await {
                        tracing::error!(error = %MqttError::from(err), "failed to subscribe");
                    }
                }
                Ok(MqttEvent::Incoming(Packet::Publish(publish))) => {
                    let event = match decode_event(&publish.payload) {
                        Ok(event) => event,
                        Err(err) => {
                            tracing::error!(topic = ?publish.topic, error = %err, "malformed event dropped");
                            continue;
                        }
                    };
                    tracing::debug!(%event, "event received");
                    if self.sink.send(event).await.is_err() {
                        tracing::info!("event consumer closed, stopping MQTT intake");
                        break;
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(
                        error = %MqttError::from(err),
                        retry_in = ?self.reconnect_delay,
                        "MQTT connection failed, retrying"
                    );
                    tokio::time::sleep(self.reconnect_delay).await;
                }
            }
        }
    }
}
