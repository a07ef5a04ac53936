//! Application core: pure domain logic, zero I/O.
//!
//! The request loop that turns pulse counts into a served status page.
//! All interaction with the network and clocks happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
