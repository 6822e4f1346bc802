//! # daylight-domain
//!
//! Pure domain model for the daylight sunrise/sunset actuation service.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Sensors** (located environmental inputs that emit trigger events)
//! - Define **Devices** (controllable actuators such as smart plugs)
//! - Define **Locations** (opaque join key between sensors and devices)
//! - Define **Events** (directional sunrise/sunset triggers)
//! - Define **Jobs** (deferred, deduplicated actuation requests)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod device;
pub mod event;
pub mod job;
pub mod location;
pub mod power;
pub mod sensor;
