//! GPIO pin assignments for the FlowWatch board.
//!
//! Single source of truth: drivers reference this module rather than
//! hard-coding pin numbers.

/// YF-S201 hall-effect flow sensor: pulse output, interrupt-driven on the
/// rising edge.  Externally pulled up by the sensor's open-collector stage.
pub const FLOW_SENSOR_GPIO: i32 = 2;
