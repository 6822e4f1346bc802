//! # daylight-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `SensorRepository`: sensor lookup by id
//!   - `DeviceRepository`: device lookup by location
//!   - `DeviceDriver` / `DriverFactory`: live device I/O
//!   - `Scheduler` / `JobRunner`: deferred actuation
//! - Route inbound events to handlers (`EventDispatchRegistry`, `EventConsumer`)
//! - Turn sunrise/sunset triggers into actuations (`SunriseSunsetHandler`)
//! - Provide **in-process infrastructure** that doesn't need IO
//!   (`InProcessScheduler`, `DriverRegistry`)
//!
//! ## Dependency rule
//! Depends on `daylight-domain` only (plus `tokio` for timers and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod actuator;
pub mod consumer;
pub mod dispatch;
pub mod drivers;
pub mod ports;
pub mod scheduler;
pub mod services;
