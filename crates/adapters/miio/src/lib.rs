//! # daylight-adapter-miio
//!
//! Xiaomi miIO adapter: drives Wi-Fi smart plugs over the encrypted miIO
//! UDP protocol.
//!
//! ## Supported models
//!
//! | Model | Driver | Power property |
//! |-------|--------|----------------|
//! | `chuangmi.plug.212a01` | [`ChuangmiPlug212a01`] | `{did, siid: 2, piid: 1}` |
//! | `cuco.plug.v3` | [`CucoPlugV3`] | `{siid: 2, piid: 1}` |
//!
//! ## Dependency rule
//! Depends on `daylight-app` (driver port) and `daylight-domain` only.

mod client;
mod config;
mod error;
mod plug;
pub mod protocol;

use daylight_app::drivers::DriverRegistry;
use daylight_app::ports::DeviceDriver;

pub use client::MiioClient;
pub use config::{DEFAULT_PORT, MiioConfig};
pub use error::MiioError;
pub use plug::{ChuangmiPlug212a01, CucoPlugV3};

/// Register both plug drivers, sharing `config` for transport settings.
pub fn register_drivers(registry: &mut DriverRegistry, config: &MiioConfig) {
    let chuangmi = config.clone();
    registry.register(ChuangmiPlug212a01::MODEL, move |device| {
        let plug = ChuangmiPlug212a01::new(device, &chuangmi)?;
        Ok(Box::new(plug) as Box<dyn DeviceDriver>)
    });

    let cuco = config.clone();
    registry.register(CucoPlugV3::MODEL, move |device| {
        let plug = CucoPlugV3::new(device, &cuco)?;
        Ok(Box::new(plug) as Box<dyn DeviceDriver>)
    });
}
