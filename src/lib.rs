//! FlowWatch firmware library.
//!
//! Exposes the pure-logic modules (pulse counter, flow evaluation, page
//! rendering, the status loop) for integration testing.  All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod flow_state;
pub mod pins;
pub mod sensors;
pub mod status_page;

pub mod adapters;
pub mod drivers;
