//! # daylight-adapter-virtual
//!
//! Virtual/demo driver that simulates a smart plug in memory, for testing
//! and demonstration purposes.
//!
//! ## Provided models
//!
//! | Model | Behaviour |
//! |-------|-----------|
//! | `virtual.plug` | Holds an on/off state; honours `initial_state`, `latency_ms` and `unreachable` from the device `config` |
//!
//! ## Dependency rule
//!
//! Depends on `daylight-app` (port traits) and `daylight-domain` only.

mod error;
mod plug;

use std::sync::Arc;

use daylight_app::drivers::DriverRegistry;
use daylight_app::ports::DeviceDriver;

pub use error::VirtualError;
pub use plug::{INITIAL_STATE_KEY, LATENCY_KEY, UNREACHABLE_KEY, VirtualPlug, VirtualPlugBank};

/// Model string the virtual plug registers under.
pub const MODEL: &str = "virtual.plug";

/// Register the virtual plug driver and return the bank holding plug states.
pub fn register_drivers(registry: &mut DriverRegistry) -> Arc<VirtualPlugBank> {
    let bank = Arc::new(VirtualPlugBank::default());
    let shared = Arc::clone(&bank);
    registry.register(MODEL, move |device| {
        let plug = VirtualPlug::new(device, Arc::clone(&shared))?;
        Ok(Box::new(plug) as Box<dyn DeviceDriver>)
    });
    bank
}
