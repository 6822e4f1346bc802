//! # daylightd
//!
//! Composition root that wires all adapters together and runs the event loop.
//!
//! ## Responsibilities
//! - Parse configuration (`daylight.toml`, env vars)
//! - Install the tracing subscriber
//! - Initialize the `SQLite` connection pool and run migrations
//! - Build the driver registry from every driver adapter
//! - Construct the actuator, scheduler and sunrise/sunset handler
//! - Start the MQTT intake and the serial event consumer
//! - Handle graceful shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer. No domain logic belongs here.

mod config;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use daylight_adapter_mqtt::MqttIntake;
use daylight_adapter_storage_sqlite_sqlx::{
    Config as StorageConfig, SqliteDeviceRepository, SqliteSensorRepository,
};
use daylight_app::actuator::Actuator;
use daylight_app::consumer::EventConsumer;
use daylight_app::dispatch::EventDispatchRegistry;
use daylight_app::drivers::DriverRegistry;
use daylight_app::scheduler::InProcessScheduler;
use daylight_app::services::{HandlerContext, SunriseSunsetHandler};
use daylight_domain::event::EventType;

type Runner = Arc<Actuator<DriverRegistry>>;
type Context = HandlerContext<
    SqliteSensorRepository,
    SqliteDeviceRepository,
    InProcessScheduler<Runner>,
    DriverRegistry,
>;

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::load()?;
    init_tracing(&config.logging.filter);

    // Database
    let db = StorageConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();

    // Repositories
    let sensors = SqliteSensorRepository::new(pool.clone());
    let devices = SqliteDeviceRepository::new(pool);

    // Drivers
    let mut drivers = DriverRegistry::new();
    daylight_adapter_miio::register_drivers(&mut drivers, &config.miio);
    daylight_adapter_virtual::register_drivers(&mut drivers);
    tracing::info!(models = ?drivers.models(), "drivers registered");

    // Actuation and scheduling
    let actuator = Arc::new(Actuator::new(
        drivers,
        config.actuation.redundant_commands,
    ));
    let scheduler = InProcessScheduler::new(Arc::clone(&actuator));

    let context: Arc<Context> = Arc::new(HandlerContext {
        sensors,
        devices,
        scheduler: scheduler.clone(),
        actuator,
        delays: config.actuation.delays(),
    });

    let registry = EventDispatchRegistry::<Context>::builder()
        .register(EventType::Sunrise, SunriseSunsetHandler::boxed)
        .register(EventType::Sunset, SunriseSunsetHandler::boxed)
        .build();
    tracing::debug!(?registry, "event handlers registered");

    // Intake
    let (sender, receiver) = mpsc::channel(config.mqtt.channel_capacity);
    let intake = MqttIntake::start(&config.mqtt, sender)?;
    let consumer = tokio::spawn(EventConsumer::new(registry, context).run(receiver));

    tracing::info!(
        switch_on_delay = config.actuation.switch_on_delay,
        switch_off_delay = config.actuation.switch_off_delay,
        policy = ?config.actuation.redundant_commands,
        "daylightd running"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");
    if intake.is_finished() {
        tracing::warn!("MQTT intake had already stopped");
    }

    intake.shutdown().await;
    if let Err(err) = consumer.await {
        tracing::error!(error = %err, "event consumer task failed");
    }

    let dropped = scheduler.shutdown();
    if dropped > 0 {
        tracing::warn!(count = dropped, "scheduled jobs dropped at shutdown");
    }

    Ok(())
}
