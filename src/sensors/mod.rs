//! Sensor subsystem.
//!
//! The flow sensor is the only input on this board; its ISR-side state
//! lives in [`flow`].

pub mod flow;
