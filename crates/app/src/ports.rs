//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod driver;
pub mod scheduler;
pub mod storage;

use std::future::Future;
use std::pin::Pin;

pub use driver::{DeviceDriver, DriverFactory};
pub use scheduler::{JobRunner, ScheduleOutcome, Scheduler};
pub use storage::{DeviceRepository, SensorRepository};

/// Boxed, sendable future returned by object-safe ports.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
