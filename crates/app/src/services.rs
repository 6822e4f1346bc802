//! Application services: event handlers.
//!
//! Handlers accept port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod sunrise_sunset;

pub use sunrise_sunset::{HandlerContext, SunriseSunsetHandler, SwitchDelays};
